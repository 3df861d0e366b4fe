//! Product Service - Business logic layer

use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{ProductError, ProductResult};
use crate::models::{Product, ProductDetails, ProductInput};
use crate::repository::ProductRepository;
use crate::validation::FieldError;

/// Product operations on top of a [`ProductRepository`]
///
/// The service owns the write rules: the caller always becomes the product's
/// user, `code` never changes after creation and `repositoryId` must point at
/// an existing repository.
pub struct ProductService<R: ProductRepository> {
    repository: Arc<R>,
}

impl<R: ProductRepository> Clone for ProductService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

impl<R: ProductRepository> ProductService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> ProductResult<Vec<ProductDetails>> {
        self.repository.list_with_repository().await
    }

    /// Look a product up by code for the `{code}` routes
    #[instrument(skip(self))]
    pub async fn find_by_code(&self, code: &str) -> ProductResult<Option<ProductDetails>> {
        self.repository.find_by_code_with_repository(code).await
    }

    #[instrument(skip(self, input))]
    pub async fn create(&self, input: ProductInput, user_id: Uuid) -> ProductResult<Product> {
        let product = Product::from_input(input, user_id).map_err(ProductError::Validation)?;
        product.check_rules().map_err(ProductError::Validation)?;
        self.ensure_repository(product.repository_id).await?;

        if self.repository.exists_by_code(&product.code).await? {
            return Err(ProductError::DuplicateCode(product.code));
        }

        self.repository.insert(product).await
    }

    /// Merge `input` into `existing` and store the result.
    #[instrument(skip(self, existing, input), fields(product_code = %existing.code))]
    pub async fn update(
        &self,
        existing: Product,
        input: ProductInput,
        user_id: Uuid,
    ) -> ProductResult<Product> {
        let mut product = existing;
        let previous_repository = product.repository_id;

        product.apply_update(input, user_id);
        product.check_rules().map_err(ProductError::Validation)?;

        if product.repository_id != previous_repository {
            self.ensure_repository(product.repository_id).await?;
        }

        self.repository.replace(product).await
    }

    #[instrument(skip(self, product), fields(product_code = %product.code))]
    pub async fn remove(&self, product: Product) -> ProductResult<Product> {
        self.repository
            .delete(product.id)
            .await?
            .ok_or(ProductError::NotFound(product.code))
    }

    /// Delete every listed code. An empty list never reaches the store.
    #[instrument(skip(self))]
    pub async fn remove_list(&self, codes: Vec<String>) -> ProductResult<u64> {
        if codes.is_empty() {
            return Ok(0);
        }
        self.repository.delete_by_codes(codes).await
    }

    async fn ensure_repository(&self, id: Uuid) -> ProductResult<()> {
        if self.repository.repository_exists(id).await? {
            Ok(())
        } else {
            Err(ProductError::Validation(vec![FieldError::new(
                "repositoryId",
                format!("Repository {id} does not exist"),
            )]))
        }
    }
}
