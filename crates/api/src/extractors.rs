//! Request extractors.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use tracking_core::{limits::MAX_USER_ID_LEN, AuthErrorCode, Error};

use crate::response::ApiError;

/// Authenticated user context for dashboard endpoints.
///
/// The identity provider sits in front of this service and hands us an
/// opaque user identifier; we only check presence and shape. The
/// tracking gateway itself never uses this extractor — it is
/// unauthenticated by design.
#[derive(Debug, Clone)]
pub struct UserContext {
    pub user_id: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for UserContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Authorization: Bearer <id> first, X-User-Id as fallback
        let bearer = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::trim);

        let header_id = parts
            .headers
            .get("X-User-Id")
            .and_then(|h| h.to_str().ok())
            .map(str::trim);

        let raw = bearer.or(header_id).ok_or_else(|| {
            ApiError::from(Error::auth(
                AuthErrorCode::MissingCredential,
                "User credential is required",
            ))
        })?;

        if raw.is_empty() || raw.len() > MAX_USER_ID_LEN || raw.chars().any(char::is_whitespace) {
            return Err(Error::auth(AuthErrorCode::InvalidFormat, "Malformed user credential").into());
        }

        Ok(UserContext {
            user_id: raw.to_string(),
        })
    }
}
