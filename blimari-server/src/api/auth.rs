//! Caller identity extraction
//!
//! Session verification happens in the upstream auth proxy; this service
//! trusts the identity headers the proxy installs. Routes that take an
//! `AuthUser` argument reject requests without an identity with a 401.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::ApiError;

/// Authenticated caller identity from proxy headers
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// `X-User-Id`
    pub user_id: String,
    /// `X-User-Email`, when the proxy forwards it
    pub email: Option<String>,
    /// `X-User-Name`, when the proxy forwards it
    pub name: Option<String>,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let user_id = header("x-user-id").ok_or_else(|| {
            ApiError::Unauthorized("Missing caller identity (X-User-Id header)".to_string())
        })?;

        Ok(AuthUser {
            user_id,
            email: header("x-user-email"),
            name: header("x-user-name"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Result<AuthUser, ApiError> {
        let (mut parts, _) = request.into_parts();
        AuthUser::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn missing_identity_is_rejected() {
        let request = Request::builder().body(()).unwrap();
        assert!(matches!(
            extract(request).await,
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn blank_identity_is_rejected() {
        let request = Request::builder()
            .header("x-user-id", "   ")
            .body(())
            .unwrap();
        assert!(extract(request).await.is_err());
    }

    #[tokio::test]
    async fn identity_headers_are_extracted() {
        let request = Request::builder()
            .header("x-user-id", "user-1")
            .header("x-user-email", "u@example.com")
            .body(())
            .unwrap();
        let user = extract(request).await.unwrap();
        assert_eq!(user.user_id, "user-1");
        assert_eq!(user.email.as_deref(), Some("u@example.com"));
        assert!(user.name.is_none());
    }
}
