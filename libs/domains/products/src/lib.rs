//! Products Domain
//!
//! The product catalogue stored in MongoDB: each product belongs to a
//! repository (stock location) that is populated on reads.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints, `{code}` resolution
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← Write rules, validation
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← Data access (trait + MongoDB implementation)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Entities, request coercion
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_products::{handlers, MongoProductRepository, ProductService};
//! use mongodb::Client;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::with_uri_str("mongodb://localhost:27017").await?;
//! let db = client.database("storefront");
//!
//! let repository = MongoProductRepository::new(&db);
//! repository.init_indexes().await?;
//!
//! // Writes need the JWT middleware layered by the application
//! let router = handlers::router(ProductService::new(repository));
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod extractor;
pub mod handlers;
pub mod models;
pub mod mongodb;
pub mod repository;
pub mod service;
pub mod validation;
mod uuid_str;

pub use error::{ProductError, ProductResult};
pub use extractor::ResolvedProduct;
pub use handlers::ApiDoc;
pub use models::{DeleteManyResult, Product, ProductDetails, ProductInput, Repository};
pub use mongodb::MongoProductRepository;
pub use repository::ProductRepository;
pub use service::ProductService;
pub use validation::{is_considerably_empty, FieldError};
