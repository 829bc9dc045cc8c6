use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::AppError;

/// Caller identity, supplied by the session layer in front of this service
/// as an `x-user-id` header.
#[derive(Debug, Clone, Copy)]
pub struct CallerId(pub Uuid);

impl<S> FromRequestParts<S> for CallerId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::BadRequest("missing x-user-id header".to_string()))?;

        let user_id = Uuid::parse_str(header)
            .map_err(|e| AppError::BadRequest(format!("invalid x-user-id header: {e}")))?;

        Ok(CallerId(user_id))
    }
}
