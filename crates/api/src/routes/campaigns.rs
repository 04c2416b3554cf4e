//! Campaign routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use database::{campaign, Campaign, CampaignStats, CampaignSummary, CampaignUpdate, NewCampaign};
use pipeline::PipelineEvent;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

use crate::error::Result;
use crate::org::CurrentOrg;
use crate::state::AppState;

/// A campaign with its prospect statistics.
#[derive(Serialize)]
pub struct CampaignDetail {
    #[serde(flatten)]
    pub campaign: Campaign,
    pub stats: CampaignStats,
}

/// List the organization's campaigns, newest first.
pub async fn list(
    State(state): State<AppState>,
    org: CurrentOrg,
) -> Result<Json<Vec<CampaignSummary>>> {
    let campaigns = campaign::list_campaigns(state.db.pool(), org.id()).await?;
    Ok(Json(campaigns))
}

/// Get a campaign with stats.
pub async fn get(
    State(state): State<AppState>,
    org: CurrentOrg,
    Path(id): Path<String>,
) -> Result<Json<CampaignDetail>> {
    let pool = state.db.pool();
    let campaign = campaign::get_campaign_for_org(pool, org.id(), &id).await?;
    let stats = campaign::campaign_stats(pool, &id).await?;
    Ok(Json(CampaignDetail { campaign, stats }))
}

/// Create a campaign and start discovery.
pub async fn create(
    State(state): State<AppState>,
    org: CurrentOrg,
    Json(input): Json<NewCampaign>,
) -> Result<(StatusCode, Json<Campaign>)> {
    let created = campaign::create_campaign(state.db.pool(), org.id(), &input).await?;

    state
        .events
        .publish(PipelineEvent::CampaignCreated {
            campaign_id: created.id.clone(),
            org_id: org.id().to_string(),
        })
        .await?;

    info!(campaign_id = %created.id, "Campaign created, discovery queued");
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update a campaign's name, status, business type or location.
pub async fn update(
    State(state): State<AppState>,
    org: CurrentOrg,
    Path(id): Path<String>,
    Json(update): Json<CampaignUpdate>,
) -> Result<Json<Campaign>> {
    let updated = campaign::update_campaign(state.db.pool(), org.id(), &id, &update).await?;
    Ok(Json(updated))
}

/// Delete a campaign and everything under it.
pub async fn delete(
    State(state): State<AppState>,
    org: CurrentOrg,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    campaign::delete_campaign(state.db.pool(), org.id(), &id).await?;
    info!(campaign_id = %id, "Campaign deleted");
    Ok(Json(json!({ "success": true })))
}
