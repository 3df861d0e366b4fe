use super::jwt::JwtClaims;
use crate::errors::AppError;
use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

/// The authenticated caller.
///
/// Requires [`optional_jwt_auth_middleware`](super::optional_jwt_auth_middleware)
/// to have run; rejects with `401` when it found no valid token or when the
/// subject is not a UUID.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub claims: JwtClaims,
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts
            .extensions
            .get::<JwtClaims>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

        let id = Uuid::parse_str(&claims.sub).map_err(|_| {
            tracing::debug!(sub = %claims.sub, "Token subject is not a UUID");
            AppError::Unauthorized("Invalid token subject".to_string())
        })?;

        Ok(Self { id, claims })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn claims(sub: &str) -> JwtClaims {
        JwtClaims {
            sub: sub.to_string(),
            email: "a@b.test".to_string(),
            name: "Alice".to_string(),
            roles: vec![],
            exp: 0,
            iat: 0,
            jti: "jti".to_string(),
        }
    }

    async fn extract(claims: Option<JwtClaims>) -> Result<AuthUser, AppError> {
        let mut request = Request::new(());
        if let Some(claims) = claims {
            request.extensions_mut().insert(claims);
        }
        let (mut parts, _) = request.into_parts();
        AuthUser::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_auth_user_from_claims() {
        let id = Uuid::now_v7();
        let user = extract(Some(claims(&id.to_string()))).await.unwrap();
        assert_eq!(user.id, id);
    }

    #[tokio::test]
    async fn test_auth_user_missing_claims() {
        let err = extract(None).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_auth_user_non_uuid_subject() {
        let err = extract(Some(claims("user-1"))).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
