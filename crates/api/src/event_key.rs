//! Shared-secret check for the event webhook.
//!
//! Callers send the configured key as `Authorization: Bearer <key>`. Without a
//! configured key the webhook rejects every request.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::error::ApiError;
use crate::state::AppState;

/// Proof that the request carried the webhook key.
#[derive(Debug, Clone, Copy)]
pub struct EventKey;

#[async_trait]
impl FromRequestParts<AppState> for EventKey {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.event_key.as_deref() else {
            tracing::warn!("Event webhook called but TAPFLOW_EVENT_KEY is not set");
            return Err(ApiError::Unauthorized);
        };

        let presented = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .ok_or(ApiError::Unauthorized)?;

        if keys_match(presented.as_bytes(), expected.as_bytes()) {
            Ok(EventKey)
        } else {
            Err(ApiError::Unauthorized)
        }
    }
}

/// Compare without short-circuiting on the first differing byte.
fn keys_match(presented: &[u8], expected: &[u8]) -> bool {
    presented.len() == expected.len()
        && presented
            .iter()
            .zip(expected)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}
