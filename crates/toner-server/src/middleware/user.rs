use axum::{extract::FromRequestParts, http::request::Parts};

use toner_core::UserId;

use crate::error::ApiError;

pub const USER_HEADER: &str = "x-user-id";

/// The acting user, taken from the `X-User-Id` header.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserId);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .headers
            .get(USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or(ApiError::MissingUser)?;
        Ok(CurrentUser(UserId::new(user)))
    }
}
