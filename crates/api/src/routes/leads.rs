//! Lead (prospect) routes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use database::{campaign, contact, prospect, Contact, ImportRow, ImportSummary, NewContact};
use database::{NewProspect, PageRequest, Prospect, ProspectDetail, ProspectFilter, ProspectPage};
use database::{ProspectSource, ProspectStatus, Tier};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::error::Result;
use crate::org::CurrentOrg;
use crate::state::AppState;

/// Query parameters for listing a campaign's leads.
#[derive(Debug, Deserialize)]
pub struct LeadQuery {
    pub status: Option<ProspectStatus>,
    pub tier: Option<Tier>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Request to change a lead's status.
#[derive(Deserialize)]
pub struct StatusUpdate {
    pub status: ProspectStatus,
}

/// Request to bulk import leads.
#[derive(Deserialize)]
pub struct ImportRequest {
    pub prospects: Vec<ImportRow>,
}

/// Page through a campaign's leads with their contacts and scores.
pub async fn list(
    State(state): State<AppState>,
    org: CurrentOrg,
    Path(campaign_id): Path<String>,
    Query(query): Query<LeadQuery>,
) -> Result<Json<ProspectPage>> {
    let page = PageRequest::new(query.page, query.limit)?;
    let filter = ProspectFilter {
        status: query.status,
        tier: query.tier,
    };
    let leads = prospect::list_prospects(state.db.pool(), org.id(), &campaign_id, filter, page).await?;
    Ok(Json(leads))
}

/// Get a lead with contacts, score and messages.
pub async fn get(
    State(state): State<AppState>,
    org: CurrentOrg,
    Path(id): Path<String>,
) -> Result<Json<ProspectDetail>> {
    let detail = prospect::get_prospect_detail(state.db.pool(), org.id(), &id).await?;
    Ok(Json(detail))
}

/// Create a lead by hand.
pub async fn create(
    State(state): State<AppState>,
    org: CurrentOrg,
    Json(input): Json<NewProspect>,
) -> Result<(StatusCode, Json<Prospect>)> {
    let pool = state.db.pool();
    campaign::get_campaign_for_org(pool, org.id(), &input.campaign_id).await?;
    let created = prospect::create_prospect(pool, &input, ProspectSource::Manual).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Change a lead's status.
pub async fn update_status(
    State(state): State<AppState>,
    org: CurrentOrg,
    Path(id): Path<String>,
    Json(req): Json<StatusUpdate>,
) -> Result<Json<Prospect>> {
    let updated = prospect::update_status_for_org(state.db.pool(), org.id(), &id, req.status).await?;
    Ok(Json(updated))
}

/// Add a contact to a lead.
pub async fn add_contact(
    State(state): State<AppState>,
    org: CurrentOrg,
    Path(id): Path<String>,
    Json(input): Json<NewContact>,
) -> Result<(StatusCode, Json<Contact>)> {
    let created = contact::add_contact_for_org(state.db.pool(), org.id(), &id, &input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Bulk import leads into a campaign.
pub async fn import(
    State(state): State<AppState>,
    org: CurrentOrg,
    Path(campaign_id): Path<String>,
    Json(req): Json<ImportRequest>,
) -> Result<Json<ImportSummary>> {
    let summary =
        prospect::import_prospects(state.db.pool(), org.id(), &campaign_id, &req.prospects).await?;
    Ok(Json(summary))
}

/// Delete a lead.
pub async fn delete(
    State(state): State<AppState>,
    org: CurrentOrg,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    prospect::delete_prospect_for_org(state.db.pool(), org.id(), &id).await?;
    info!(prospect_id = %id, "Lead deleted");
    Ok(Json(json!({ "success": true })))
}
