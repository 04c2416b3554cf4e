//! Organization scoping for RPC calls.
//!
//! Authentication happens upstream; the identity proxy forwards the caller's
//! organization in the `X-Org-Id` header.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use database::{organization, DatabaseError, Organization};

use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the caller's organization ID.
pub const ORG_HEADER: &str = "x-org-id";

/// The organization the request acts for.
#[derive(Debug, Clone)]
pub struct CurrentOrg(pub Organization);

impl CurrentOrg {
    pub fn id(&self) -> &str {
        &self.0.id
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentOrg {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let org_id = parts
            .headers
            .get(ORG_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(ApiError::Unauthorized)?;

        match organization::get_organization(state.db.pool(), org_id).await {
            Ok(org) => Ok(CurrentOrg(org)),
            Err(DatabaseError::NotFound { .. }) => Err(ApiError::Unauthorized),
            Err(e) => Err(e.into()),
        }
    }
}
