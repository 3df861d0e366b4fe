use axum::http::{HeaderName, HeaderValue, Method, header};
use core_config::{ConfigError, env_list};
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Environment variable holding comma-separated allowed origins
pub const CORS_ALLOWED_ORIGIN: &str = "CORS_ALLOWED_ORIGIN";

/// CORS layer for the given origins.
///
/// - Methods: GET, POST, PUT, DELETE, PATCH, OPTIONS
/// - Headers: Content-Type, Authorization, Accept, Cookie, x-csrf-token
/// - Credentials allowed, 1 hour max age
pub fn create_cors_layer(allowed_origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            header::COOKIE,
            HeaderName::from_static("x-csrf-token"),
        ])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}

/// Read and parse `CORS_ALLOWED_ORIGIN`.
///
/// Fails when unset, empty, or when an entry is not a valid header value.
pub fn allowed_origins_from_env() -> Result<Vec<HeaderValue>, ConfigError> {
    let origins = env_list(CORS_ALLOWED_ORIGIN)?;
    if origins.is_empty() {
        return Err(ConfigError::ParseError {
            key: CORS_ALLOWED_ORIGIN.to_string(),
            details: "must list at least one origin".to_string(),
        });
    }

    origins
        .iter()
        .map(|origin| {
            origin.parse::<HeaderValue>().map_err(|e| ConfigError::ParseError {
                key: CORS_ALLOWED_ORIGIN.to_string(),
                details: format!("{origin}: {e}"),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_origins_from_env() {
        temp_env::with_var(
            CORS_ALLOWED_ORIGIN,
            Some("http://localhost:3000, https://shop.example.com"),
            || {
                let origins = allowed_origins_from_env().unwrap();
                assert_eq!(origins.len(), 2);
                assert_eq!(origins[1], "https://shop.example.com");
            },
        );
    }

    #[test]
    fn test_allowed_origins_missing_or_empty() {
        temp_env::with_var_unset(CORS_ALLOWED_ORIGIN, || {
            assert!(allowed_origins_from_env().is_err());
        });
        temp_env::with_var(CORS_ALLOWED_ORIGIN, Some(" , "), || {
            assert!(allowed_origins_from_env().is_err());
        });
    }

    #[test]
    fn test_allowed_origins_invalid_value() {
        temp_env::with_var(CORS_ALLOWED_ORIGIN, Some("http://ok.test,bad\u{7f}"), || {
            assert!(allowed_origins_from_env().is_err());
        });
    }
}
