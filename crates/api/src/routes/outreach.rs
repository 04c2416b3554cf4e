//! Outreach message routes: drafting, review, approval and stats.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use database::{outreach, NewOutreach, OutreachMessage, OutreachPage, OutreachStats};
use database::{OutreachStatus, OutreachWithContact, PageRequest, PendingOutreach};
use pipeline::PipelineEvent;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::error::{ApiError, Result};
use crate::org::CurrentOrg;
use crate::state::AppState;

/// Query parameters for listing a campaign's messages.
#[derive(Debug, Deserialize)]
pub struct OutreachQuery {
    pub status: Option<OutreachStatus>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Optional campaign scope.
#[derive(Debug, Deserialize)]
pub struct CampaignScope {
    pub campaign_id: Option<String>,
}

/// Edit to a message's content.
#[derive(Deserialize)]
pub struct ContentUpdate {
    pub subject: Option<String>,
    pub body: Option<String>,
}

/// Request to approve one message.
#[derive(Debug, Default, Deserialize)]
pub struct ApproveRequest {
    /// RFC 3339 send time; without it the message is approved for immediate send.
    #[serde(default)]
    pub scheduled_for: Option<String>,
}

/// Request to approve several messages.
#[derive(Deserialize)]
pub struct BulkApproveRequest {
    pub ids: Vec<String>,
}

/// Result of a bulk approval.
#[derive(Serialize)]
pub struct BulkApproveResponse {
    pub approved: usize,
    pub ids: Vec<String>,
}

/// Page through a campaign's messages.
pub async fn list(
    State(state): State<AppState>,
    org: CurrentOrg,
    Path(campaign_id): Path<String>,
    Query(query): Query<OutreachQuery>,
) -> Result<Json<OutreachPage>> {
    let page = PageRequest::new(query.page, query.limit)?;
    let messages =
        outreach::list_for_campaign(state.db.pool(), org.id(), &campaign_id, query.status, page)
            .await?;
    Ok(Json(messages))
}

/// The approval queue, oldest first.
pub async fn pending(
    State(state): State<AppState>,
    org: CurrentOrg,
    Query(scope): Query<CampaignScope>,
) -> Result<Json<Vec<PendingOutreach>>> {
    let messages =
        outreach::list_pending(state.db.pool(), org.id(), scope.campaign_id.as_deref()).await?;
    Ok(Json(messages))
}

/// Get a message with its contact.
pub async fn get(
    State(state): State<AppState>,
    org: CurrentOrg,
    Path(id): Path<String>,
) -> Result<Json<OutreachWithContact>> {
    let message = outreach::get_message_detail(state.db.pool(), org.id(), &id).await?;
    Ok(Json(message))
}

/// Write a draft by hand.
pub async fn create(
    State(state): State<AppState>,
    org: CurrentOrg,
    Json(input): Json<NewOutreach>,
) -> Result<(StatusCode, Json<OutreachMessage>)> {
    let message = outreach::create_draft_for_org(state.db.pool(), org.id(), &input).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// Edit a message's subject or body.
pub async fn update(
    State(state): State<AppState>,
    org: CurrentOrg,
    Path(id): Path<String>,
    Json(req): Json<ContentUpdate>,
) -> Result<Json<OutreachMessage>> {
    let message = outreach::update_content_for_org(
        state.db.pool(),
        org.id(),
        &id,
        req.subject.as_deref(),
        req.body.as_deref(),
    )
    .await?;
    Ok(Json(message))
}

/// Approve a message, optionally scheduling it.
pub async fn approve(
    State(state): State<AppState>,
    org: CurrentOrg,
    Path(id): Path<String>,
    body: Option<Json<ApproveRequest>>,
) -> Result<Json<OutreachMessage>> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let scheduled_for = req
        .scheduled_for
        .as_deref()
        .map(parse_schedule)
        .transpose()?;

    let message =
        outreach::approve_for_org(state.db.pool(), org.id(), &id, scheduled_for.as_deref()).await?;

    if message.status == OutreachStatus::Approved {
        state
            .events
            .publish(PipelineEvent::OutreachApproved {
                message_id: message.id.clone(),
            })
            .await?;
    }

    info!(message_id = %id, status = message.status.as_str(), "Message approved");
    Ok(Json(message))
}

/// Approve every listed message still awaiting approval.
pub async fn bulk_approve(
    State(state): State<AppState>,
    org: CurrentOrg,
    Json(req): Json<BulkApproveRequest>,
) -> Result<Json<BulkApproveResponse>> {
    let ids = outreach::bulk_approve_for_org(state.db.pool(), org.id(), &req.ids).await?;

    for id in &ids {
        state
            .events
            .publish(PipelineEvent::OutreachApproved {
                message_id: id.clone(),
            })
            .await?;
    }

    Ok(Json(BulkApproveResponse {
        approved: ids.len(),
        ids,
    }))
}

/// Reject a message. The message is deleted.
pub async fn reject(
    State(state): State<AppState>,
    org: CurrentOrg,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    outreach::reject_for_org(state.db.pool(), org.id(), &id).await?;
    info!(message_id = %id, "Message rejected");
    Ok(Json(json!({ "success": true })))
}

/// Status counts and engagement rates.
pub async fn stats(
    State(state): State<AppState>,
    org: CurrentOrg,
    Query(scope): Query<CampaignScope>,
) -> Result<Json<OutreachStats>> {
    let stats =
        outreach::stats_for_org(state.db.pool(), org.id(), scope.campaign_id.as_deref()).await?;
    Ok(Json(stats))
}

/// Normalize a schedule to UTC RFC 3339.
fn parse_schedule(value: &str) -> Result<String> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|at| at.with_timezone(&Utc).to_rfc3339())
        .map_err(|_| {
            ApiError::BadRequest(format!("scheduled_for is not an RFC 3339 timestamp: {value}"))
        })
}
