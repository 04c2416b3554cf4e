//! Organization onboarding.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use database::{organization, Organization, Plan};
use serde::Deserialize;
use tracing::info;

use crate::error::Result;
use crate::org::CurrentOrg;
use crate::state::AppState;

/// Request to create an organization.
#[derive(Deserialize)]
pub struct CreateOrganization {
    pub name: String,
    #[serde(default)]
    pub plan: Plan,
}

/// Create an organization.
pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateOrganization>,
) -> Result<(StatusCode, Json<Organization>)> {
    let org = organization::create_organization(state.db.pool(), &req.name, req.plan).await?;
    info!(org_id = %org.id, "Organization created");
    Ok((StatusCode::CREATED, Json(org)))
}

/// The caller's organization.
pub async fn current(org: CurrentOrg) -> Json<Organization> {
    Json(org.0)
}

#[cfg(test)]
mod tests {
    use crate::routes::testing::TestApp;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_onboarding() {
        let app = TestApp::new().await;
        let (status, body) = app
            .call_as(None, "POST", "/api/organizations", Some(json!({"name": "Globex"})))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["plan"], "starter");

        let id = body["id"].as_str().unwrap().to_string();
        let (status, body) = app
            .call_as(Some(&id), "GET", "/api/organizations/current", None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Globex");
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let app = TestApp::new().await;
        let (status, _) = app
            .call_as(None, "POST", "/api/organizations", Some(json!({"name": "  "})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_missing_or_unknown_org_is_unauthorized() {
        let app = TestApp::new().await;
        let (status, body) = app
            .call_as(None, "GET", "/api/organizations/current", None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Unauthorized");

        let (status, _) = app
            .call_as(Some("nope"), "GET", "/api/campaigns", None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
