//! Requester-identity extractor.
//!
//! The portal's session layer authenticates requests upstream and forwards
//! the caller's user id in an `x-user-id` header. A missing or malformed
//! header is a 401; whether that user may act in the room is the engine's
//! decision, not this extractor's.

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::ApiError;

/// Header carrying the authenticated user's id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated portal user making this request.
#[derive(Debug, Clone, Copy)]
pub struct RequesterId(pub Uuid);

impl<S> FromRequestParts<S> for RequesterId
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &S,
  ) -> Result<Self, Self::Rejection> {
    let raw = parts
      .headers
      .get(USER_ID_HEADER)
      .and_then(|v| v.to_str().ok())
      .ok_or_else(|| {
        ApiError::Unauthorized(format!("missing {USER_ID_HEADER} header"))
      })?;

    let user_id = raw.parse::<Uuid>().map_err(|_| {
      ApiError::Unauthorized(format!("malformed {USER_ID_HEADER} header"))
    })?;

    Ok(RequesterId(user_id))
  }
}
