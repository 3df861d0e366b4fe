//! MongoDB implementation of ProductRepository

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::{
    bson::{doc, from_bson, from_document, Bson, Document},
    options::IndexOptions,
    Collection, Database, IndexModel,
};
use tracing::instrument;
use uuid::Uuid;

use crate::error::{ProductError, ProductResult};
use crate::models::{Product, ProductDetails, Repository};
use crate::repository::ProductRepository;
use crate::uuid_str;

const PRODUCTS: &str = "products";
const REPOSITORIES: &str = "repositories";

/// Field the `$lookup` stage writes the joined repository into; matches `populate_pipeline`
const POPULATED: &str = "repository";

pub struct MongoProductRepository {
    products: Collection<Product>,
    repositories: Collection<Repository>,
}

impl MongoProductRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            products: db.collection::<Product>(PRODUCTS),
            repositories: db.collection::<Repository>(REPOSITORIES),
        }
    }

    /// Create the unique `code` index and the `repositoryId` lookup index.
    pub async fn init_indexes(&self) -> ProductResult<()> {
        let indexes = vec![
            IndexModel::builder()
                .keys(doc! { "code": 1 })
                .options(
                    IndexOptions::builder()
                        .unique(true)
                        .name("idx_code_unique".to_string())
                        .build(),
                )
                .build(),
            IndexModel::builder()
                .keys(doc! { "repositoryId": 1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_repository".to_string())
                        .build(),
                )
                .build(),
        ];

        self.products.create_indexes(indexes).await?;
        tracing::info!("Product indexes created successfully");
        Ok(())
    }

    async fn aggregate_details(&self, pipeline: Vec<Document>) -> ProductResult<Vec<ProductDetails>> {
        let documents: Vec<Document> = self.products.aggregate(pipeline).await?.try_collect().await?;
        documents.into_iter().map(split_populated).collect()
    }
}

/// `$lookup` of the product's repository, optionally preceded by `$match`.
fn populate_pipeline(filter: Option<Document>) -> Vec<Document> {
    let mut pipeline = Vec::with_capacity(4);
    if let Some(filter) = filter {
        pipeline.push(doc! { "$match": filter });
        pipeline.push(doc! { "$limit": 1 });
    }
    pipeline.push(doc! {
        "$lookup": {
            "from": REPOSITORIES,
            "localField": "repositoryId",
            "foreignField": "_id",
            "as": POPULATED,
        }
    });
    pipeline.push(doc! { "$set": { "repository": { "$first": "$repository" } } });
    pipeline
}

/// Separate the joined repository from the product fields.
fn split_populated(mut document: Document) -> ProductResult<ProductDetails> {
    let repository = match document.remove(POPULATED) {
        Some(value @ Bson::Document(_)) => Some(from_bson::<Repository>(value)?),
        _ => None,
    };
    let product: Product = from_document(document)?;
    Ok(ProductDetails::new(product, repository))
}

fn id_filter(id: Uuid) -> Document {
    doc! { "_id": uuid_str::to_db(id) }
}

#[async_trait]
impl ProductRepository for MongoProductRepository {
    #[instrument(skip(self))]
    async fn list_with_repository(&self) -> ProductResult<Vec<ProductDetails>> {
        self.aggregate_details(populate_pipeline(None)).await
    }

    #[instrument(skip(self))]
    async fn find_by_code_with_repository(
        &self,
        code: &str,
    ) -> ProductResult<Option<ProductDetails>> {
        let mut found = self
            .aggregate_details(populate_pipeline(Some(doc! { "code": code })))
            .await?;
        Ok(found.pop())
    }

    #[instrument(skip(self))]
    async fn exists_by_code(&self, code: &str) -> ProductResult<bool> {
        let count = self.products.count_documents(doc! { "code": code }).await?;
        Ok(count > 0)
    }

    #[instrument(skip(self))]
    async fn repository_exists(&self, id: Uuid) -> ProductResult<bool> {
        let count = self.repositories.count_documents(id_filter(id)).await?;
        Ok(count > 0)
    }

    #[instrument(skip(self, product), fields(product_code = %product.code))]
    async fn insert(&self, product: Product) -> ProductResult<Product> {
        self.products
            .insert_one(&product)
            .await
            .map_err(|e| ProductError::from_write(e, &product.code))?;

        tracing::info!(product_id = %product.id, "Product created");
        Ok(product)
    }

    #[instrument(skip(self, product), fields(product_code = %product.code))]
    async fn replace(&self, product: Product) -> ProductResult<Product> {
        let result = self
            .products
            .replace_one(id_filter(product.id), &product)
            .await
            .map_err(|e| ProductError::from_write(e, &product.code))?;

        if result.matched_count == 0 {
            return Err(ProductError::NotFound(product.code));
        }

        tracing::info!(product_id = %product.id, "Product updated");
        Ok(product)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> ProductResult<Option<Product>> {
        let removed = self.products.find_one_and_delete(id_filter(id)).await?;
        if removed.is_some() {
            tracing::info!(product_id = %id, "Product deleted");
        }
        Ok(removed)
    }

    #[instrument(skip(self))]
    async fn delete_by_codes(&self, codes: Vec<String>) -> ProductResult<u64> {
        let result = self
            .products
            .delete_many(doc! { "code": { "$in": codes } })
            .await?;

        tracing::info!(deleted = result.deleted_count, "Products deleted by code");
        Ok(result.deleted_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mongodb::bson::{to_bson, to_document, to_raw_document_buf};

    fn product() -> Product {
        let now = Utc::now();
        Product {
            id: Uuid::now_v7(),
            code: "SKU1".into(),
            name: "Widget".into(),
            price: 10.0,
            total: 3,
            image: String::new(),
            repository_id: Uuid::now_v7(),
            user_id: Some(Uuid::now_v7()),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_id_filter_matches_inserted_document() {
        let product = product();
        let stored = to_raw_document_buf(&product).unwrap().to_document().unwrap();

        assert_eq!(stored.get("_id"), id_filter(product.id).get("_id"));
    }

    #[test]
    fn test_lookup_keys_share_encoding() {
        let product = product();
        let repository = Repository {
            id: product.repository_id,
            name: "Main".into(),
            description: None,
        };

        let stored_product = to_raw_document_buf(&product).unwrap().to_document().unwrap();
        let stored_repository = to_raw_document_buf(&repository).unwrap().to_document().unwrap();

        assert_eq!(stored_product.get("repositoryId"), stored_repository.get("_id"));
        assert_eq!(stored_repository.get("_id"), id_filter(repository.id).get("_id"));
    }

    #[test]
    fn test_list_pipeline_has_no_match() {
        let pipeline = populate_pipeline(None);
        assert_eq!(pipeline.len(), 2);
        assert!(pipeline[0].contains_key("$lookup"));
        assert_eq!(
            pipeline[1],
            doc! { "$set": { "repository": { "$first": "$repository" } } }
        );
    }

    #[test]
    fn test_code_pipeline_matches_first() {
        let pipeline = populate_pipeline(Some(doc! { "code": "SKU1" }));
        assert_eq!(pipeline[0], doc! { "$match": { "code": "SKU1" } });
        assert_eq!(pipeline[1], doc! { "$limit": 1 });
        assert_eq!(pipeline.len(), 4);
    }

    #[test]
    fn test_split_populated_with_repository() {
        let product = product();
        let repository = Repository {
            id: product.repository_id,
            name: "Main".into(),
            description: Some("Ground floor".into()),
        };
        let mut document = to_document(&product).unwrap();
        document.insert(POPULATED, to_bson(&repository).unwrap());

        let details = split_populated(document).unwrap();

        assert_eq!(details.repository, Some(repository));
        assert_eq!(details.into_product(), product);
    }

    #[test]
    fn test_split_populated_without_match() {
        let product = product();
        let document = to_document(&product).unwrap();

        let details = split_populated(document).unwrap();

        assert!(details.repository.is_none());
        assert_eq!(details.repository_id, product.repository_id);
    }

    #[test]
    fn test_split_populated_rejects_malformed_document() {
        let result = split_populated(doc! { "code": "SKU1" });
        assert!(matches!(result, Err(ProductError::Internal(_))));
    }
}
