use super::jwt::JwtAuth;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};

/// Name of the cookie checked when no `Authorization` header is present
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// `Authorization: Bearer <token>` first, then the `access_token` cookie
pub(crate) fn extract_token_from_request(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .or_else(|| {
            headers
                .get_all(header::COOKIE)
                .iter()
                .filter_map(|v| v.to_str().ok())
                .flat_map(|cookies| cookies.split(';'))
                .find_map(|cookie| {
                    let (name, value) = cookie.trim().split_once('=')?;
                    (name == ACCESS_TOKEN_COOKIE).then(|| value.to_string())
                })
        })
        .filter(|token| !token.is_empty())
}

/// Attach [`JwtClaims`](super::JwtClaims) to the request when a valid token is present.
///
/// Requests without a token, or with an invalid one, pass through anonymously;
/// handlers that need an identity take [`AuthUser`](super::AuthUser).
///
/// ```ignore
/// let app = Router::new()
///     .merge(routes)
///     .layer(axum::middleware::from_fn_with_state(auth, optional_jwt_auth_middleware));
/// ```
pub async fn optional_jwt_auth_middleware(
    State(auth): State<JwtAuth>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = extract_token_from_request(&headers) {
        match auth.verify_token(&token) {
            Ok(claims) => {
                request.extensions_mut().insert(claims);
            }
            Err(e) => tracing::debug!("JWT verification failed: {}", e),
        }
    }

    next.run(request).await
}
