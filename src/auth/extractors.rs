use std::convert::Infallible;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};

use super::services::TokenAuthenticator;
use crate::error::AppError;
use crate::users::repo_types::User;

/// Raw bearer token from the `Authorization` header; empty when absent.
pub struct BearerToken(pub String);

impl BearerToken {
    pub fn from_parts(parts: &Parts) -> Self {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .map(|v| {
                v.strip_prefix("Bearer ")
                    .or_else(|| v.strip_prefix("bearer "))
                    .unwrap_or(v)
                    .trim()
            })
            .unwrap_or_default();
        Self(token.to_owned())
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for BearerToken {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts))
    }
}

/// Caller with a valid, unexpired session.
pub struct AuthUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    TokenAuthenticator: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_parts(parts);
        let auth = TokenAuthenticator::from_ref(state);
        Ok(AuthUser(auth.validate_user(&token, false).await?))
    }
}

/// Caller with a valid session and the admin role.
pub struct AdminUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    TokenAuthenticator: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_parts(parts);
        let auth = TokenAuthenticator::from_ref(state);
        Ok(AdminUser(auth.validate_user(&token, true).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(header: Option<&str>) -> Parts {
        let mut req = Request::builder().uri("/api/v1/me");
        if let Some(h) = header {
            req = req.header(AUTHORIZATION, h);
        }
        req.body(()).unwrap().into_parts().0
    }

    #[test]
    fn bearer_prefix_is_stripped() {
        assert_eq!(BearerToken::from_parts(&parts(Some("Bearer abc123"))).0, "abc123");
        assert_eq!(BearerToken::from_parts(&parts(Some("bearer abc123"))).0, "abc123");
    }

    #[test]
    fn bare_header_value_is_the_token() {
        assert_eq!(BearerToken::from_parts(&parts(Some("abc123"))).0, "abc123");
    }

    #[test]
    fn missing_header_is_empty_token() {
        assert_eq!(BearerToken::from_parts(&parts(None)).0, "");
    }
}
