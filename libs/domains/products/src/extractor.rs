//! Resolution of the `{code}` path parameter

use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use axum_helpers::AppError;
use std::sync::Arc;

use crate::error::ProductError;
use crate::models::ProductDetails;
use crate::repository::ProductRepository;
use crate::service::ProductService;

/// The product named by the `{code}` path segment, with its repository populated.
///
/// Resolved before the handler body runs. An unknown code answers `400`
/// `{"message": "No Product with that identifier has been found"}` and the
/// handler is never invoked; a store fault answers `500`.
#[derive(Debug, Clone)]
pub struct ResolvedProduct(pub ProductDetails);

impl<R> FromRequestParts<Arc<ProductService<R>>> for ResolvedProduct
where
    R: ProductRepository + 'static,
{
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<ProductService<R>>,
    ) -> Result<Self, Self::Rejection> {
        let Path(code) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        match state.find_by_code(&code).await {
            Ok(Some(details)) => Ok(Self(details)),
            Ok(None) => {
                tracing::debug!(product_code = %code, "No product for code");
                Err(ProductError::NotFound(code).into_response())
            }
            Err(e) => Err(AppError::from(e).into_response()),
        }
    }
}
