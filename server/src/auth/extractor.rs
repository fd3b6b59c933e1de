use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

use super::AuthError;
use crate::models::Identity;
use crate::state::AppState;
use crate::utils::error::AppError;

/// Resolved caller identity. Adding this to a handler's arguments makes the
/// route require an `Authorization: Bearer <credential>` header.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let credential = bearer_credential(parts).ok_or(AuthError::MissingToken)?;
        let identity = state.verifier.verify(credential).await?;
        Ok(Self(identity))
    }
}

fn bearer_credential(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let mut split = value.splitn(2, ' ');
    let scheme = split.next()?;
    let credential = split.next()?.trim();

    if !scheme.eq_ignore_ascii_case("bearer") || credential.is_empty() {
        return None;
    }
    Some(credential)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(authorization: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/events");
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_credential_parsing() {
        assert_eq!(bearer_credential(&parts_with(Some("Bearer abc"))), Some("abc"));
        assert_eq!(bearer_credential(&parts_with(Some("bearer  abc "))), Some("abc"));
        assert_eq!(bearer_credential(&parts_with(Some("Bearer "))), None);
        assert_eq!(bearer_credential(&parts_with(Some("Basic abc"))), None);
        assert_eq!(bearer_credential(&parts_with(Some("abc"))), None);
        assert_eq!(bearer_credential(&parts_with(None)), None);
    }
}
