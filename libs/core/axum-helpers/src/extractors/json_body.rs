//! JSON body extractor whose rejection is an [`AppError`].

use crate::errors::AppError;
use axum::extract::{FromRequest, Json, Request};
use serde::de::DeserializeOwned;

/// Like [`axum::Json`], but a malformed body or a wrong content type is
/// reported as a structured [`ErrorResponse`](crate::ErrorResponse)
/// instead of axum's plain-text rejection.
///
/// ```ignore
/// use axum_helpers::JsonBody;
/// use serde_json::{Map, Value};
///
/// async fn update(JsonBody(body): JsonBody<Map<String, Value>>) { /* ... */ }
/// ```
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = Json::<T>::from_request(req, state).await?;
        Ok(JsonBody(data))
    }
}
