use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use axum_helpers::AppError;
use mongodb::error::{ErrorKind, WriteFailure};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::validation::FieldError;

/// MongoDB duplicate-key error code
const DUPLICATE_KEY: i32 = 11000;

#[derive(Debug, Error)]
pub enum ProductError {
    /// No product carries the requested code
    #[error("No Product with that identifier has been found")]
    NotFound(String),

    #[error("Validation failed: {}", summarize(.0))]
    Validation(Vec<FieldError>),

    #[error("Product with code '{0}' already exists")]
    DuplicateCode(String),

    #[error("Query parameter 'code' is required")]
    MissingCodes,

    #[error("{0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type ProductResult<T> = Result<T, ProductError>;

/// `{"message": ...}` body of a failed product operation
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageBody {
    #[schema(example = "No Product with that identifier has been found")]
    pub message: String,
}

/// `{"validate": [...]}` body of a rejected product payload
#[derive(Debug, Serialize, ToSchema)]
pub struct ValidationBody {
    pub validate: Vec<FieldError>,
}

impl ProductError {
    /// Map a driver error, recognising unique-index violations on `code`.
    pub(crate) fn from_write(err: mongodb::error::Error, code: &str) -> Self {
        if is_duplicate_key(&err) {
            ProductError::DuplicateCode(code.to_string())
        } else {
            err.into()
        }
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match &*err.kind {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY,
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY,
        _ => false,
    }
}

/// Used where a failure must surface as a standard server error, e.g. a
/// store fault while resolving the `code` path parameter.
impl From<ProductError> for AppError {
    fn from(err: ProductError) -> Self {
        match err {
            ProductError::NotFound(_) | ProductError::MissingCodes => {
                AppError::BadRequest(err.to_string())
            }
            ProductError::Validation(_) => AppError::BadRequest(err.to_string()),
            ProductError::DuplicateCode(_) => AppError::Conflict(err.to_string()),
            ProductError::Database(msg) | ProductError::Internal(msg) => {
                AppError::InternalServerError(msg)
            }
        }
    }
}

/// Handler outcomes are all `400`: validation failures carry `validate`,
/// everything else a `message`.
impl IntoResponse for ProductError {
    fn into_response(self) -> Response {
        match self {
            ProductError::Validation(errors) => {
                tracing::info!(count = errors.len(), "Product payload rejected");
                (
                    StatusCode::BAD_REQUEST,
                    Json(ValidationBody { validate: errors }),
                )
                    .into_response()
            }
            other => {
                if matches!(other, ProductError::Database(_) | ProductError::Internal(_)) {
                    tracing::error!(error = %other, "Product store operation failed");
                }
                (
                    StatusCode::BAD_REQUEST,
                    Json(MessageBody {
                        message: other.to_string(),
                    }),
                )
                    .into_response()
            }
        }
    }
}

impl From<mongodb::error::Error> for ProductError {
    fn from(err: mongodb::error::Error) -> Self {
        ProductError::Database(err.to_string())
    }
}

impl From<mongodb::bson::de::Error> for ProductError {
    fn from(err: mongodb::bson::de::Error) -> Self {
        ProductError::Internal(format!("Malformed product document: {err}"))
    }
}
