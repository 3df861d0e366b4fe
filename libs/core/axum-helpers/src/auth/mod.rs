//! Stateless JWT authentication.
//!
//! - [`JwtAuth`] issues and verifies HS256 access tokens
//! - [`optional_jwt_auth_middleware`] attaches [`JwtClaims`] when a valid token is sent
//! - [`AuthUser`] is the extractor for handlers that require a caller
//!
//! ```ignore
//! use axum_helpers::auth::{JwtAuth, JwtConfig, optional_jwt_auth_middleware};
//! use core_config::FromEnv;
//!
//! let auth = JwtAuth::new(&JwtConfig::from_env()?);
//! let app = routes.layer(axum::middleware::from_fn_with_state(
//!     auth,
//!     optional_jwt_auth_middleware,
//! ));
//! ```

pub mod config;
pub mod extractor;
pub mod jwt;
pub mod middleware;

pub use config::JwtConfig;
pub use extractor::AuthUser;
pub use jwt::{ACCESS_TOKEN_TTL, JwtAuth, JwtClaims};
pub use middleware::optional_jwt_auth_middleware;
