//! MongoDB connection management shared by the storefront services.
//!
//! # Features
//!
//! - `mongodb` (default) - client construction, retrying startup connect, health probes
//! - `config` - `core_config::FromEnv` for [`mongodb::MongoConfig`] and [`common::RetryConfig`]
//!
//! # Example
//!
//! ```ignore
//! use core_config::FromEnv;
//! use database::mongodb::{self, MongoConfig};
//!
//! let config = MongoConfig::from_env()?;
//! let client = mongodb::connect_from_config_with_retry(&config, None).await?;
//! let db = client.database(config.database());
//! ```

pub mod common;

#[cfg(feature = "mongodb")]
pub mod mongodb;

pub use common::{DatabaseError, DatabaseResult};
