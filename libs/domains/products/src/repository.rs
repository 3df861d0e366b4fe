use async_trait::async_trait;
use uuid::Uuid;

use crate::error::ProductResult;
use crate::models::{Product, ProductDetails};

/// Storage operations behind the product endpoints
///
/// Implementations must be thread-safe; the service is shared across requests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Every product with its repository populated
    async fn list_with_repository(&self) -> ProductResult<Vec<ProductDetails>>;

    /// A single product by code with its repository populated
    async fn find_by_code_with_repository(&self, code: &str)
        -> ProductResult<Option<ProductDetails>>;

    async fn exists_by_code(&self, code: &str) -> ProductResult<bool>;

    /// Whether a repository with this id exists
    async fn repository_exists(&self, id: Uuid) -> ProductResult<bool>;

    async fn insert(&self, product: Product) -> ProductResult<Product>;

    /// Overwrite the stored product with the same id
    async fn replace(&self, product: Product) -> ProductResult<Product>;

    /// Delete by id, returning the removed document
    async fn delete(&self, id: Uuid) -> ProductResult<Option<Product>>;

    /// Delete every product whose code is in `codes`, returning the count
    async fn delete_by_codes(&self, codes: Vec<String>) -> ProductResult<u64>;
}
