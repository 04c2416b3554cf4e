//! Campaign CRUD operations.
//!
//! Everything reachable from the RPC layer takes the caller's `org_id` and
//! filters on it; [`get_campaign`] is the unscoped lookup used by the pipeline.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{
    new_id, Campaign, CampaignStatus, CampaignSummary, IdealCustomerProfile, Tier,
};
use crate::validation::{
    validate_campaign_name, validate_range, validate_required, DEFAULT_RADIUS_MILES,
    MAX_RADIUS_MILES, MIN_RADIUS_MILES,
};

const CAMPAIGN_COLUMNS: &str = "id, org_id, name, business_type, target_location, \
     search_radius_miles, ideal_customer_profile, status, created_at, updated_at";

/// Input for creating a campaign.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewCampaign {
    pub name: String,
    pub business_type: String,
    pub target_location: String,
    #[serde(default)]
    pub search_radius_miles: Option<i64>,
    #[serde(default)]
    pub ideal_customer_profile: Option<IdealCustomerProfile>,
}

impl NewCampaign {
    fn validate(&self) -> Result<()> {
        validate_campaign_name(&self.name)?;
        validate_required("business_type", &self.business_type)?;
        validate_required("target_location", &self.target_location)?;
        if let Some(radius) = self.search_radius_miles {
            validate_range("search_radius_miles", radius, MIN_RADIUS_MILES, MAX_RADIUS_MILES)?;
        }
        Ok(())
    }
}

/// Partial update of a campaign. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CampaignUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<CampaignStatus>,
    #[serde(default)]
    pub business_type: Option<String>,
    #[serde(default)]
    pub target_location: Option<String>,
}

/// Per-tier prospect counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierCounts {
    #[serde(rename = "A")]
    pub a: i64,
    #[serde(rename = "B")]
    pub b: i64,
    #[serde(rename = "C")]
    pub c: i64,
}

/// Aggregate prospect statistics for a campaign.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignStats {
    pub total_prospects: i64,
    pub by_tier: TierCounts,
    pub by_status: BTreeMap<String, i64>,
}

/// Create a campaign in `active` status.
pub async fn create_campaign(pool: &SqlitePool, org_id: &str, input: &NewCampaign) -> Result<Campaign> {
    input.validate()?;

    let id = new_id();
    sqlx::query(
        r#"
        INSERT INTO campaigns (id, org_id, name, business_type, target_location,
                               search_radius_miles, ideal_customer_profile, status)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(org_id)
    .bind(input.name.trim())
    .bind(input.business_type.trim())
    .bind(input.target_location.trim())
    .bind(input.search_radius_miles.unwrap_or(DEFAULT_RADIUS_MILES))
    .bind(input.ideal_customer_profile.clone().map(Json))
    .bind(CampaignStatus::Active)
    .execute(pool)
    .await?;

    get_campaign(pool, &id).await
}

/// Get a campaign by ID without organization scoping.
pub async fn get_campaign(pool: &SqlitePool, id: &str) -> Result<Campaign> {
    let query = format!("SELECT {CAMPAIGN_COLUMNS} FROM campaigns WHERE id = ?");
    sqlx::query_as::<_, Campaign>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Campaign", id))
}

/// Get a campaign owned by `org_id`.
pub async fn get_campaign_for_org(pool: &SqlitePool, org_id: &str, id: &str) -> Result<Campaign> {
    let query = format!("SELECT {CAMPAIGN_COLUMNS} FROM campaigns WHERE id = ? AND org_id = ?");
    sqlx::query_as::<_, Campaign>(&query)
        .bind(id)
        .bind(org_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Campaign", id))
}

/// List an organization's campaigns, newest first, with prospect counts.
pub async fn list_campaigns(pool: &SqlitePool, org_id: &str) -> Result<Vec<CampaignSummary>> {
    let rows = sqlx::query_as::<_, CampaignSummary>(
        r#"
        SELECT c.id, c.org_id, c.name, c.business_type, c.target_location,
               c.search_radius_miles, c.ideal_customer_profile, c.status,
               c.created_at, c.updated_at,
               (SELECT COUNT(*) FROM prospects p WHERE p.campaign_id = c.id) AS prospect_count
        FROM campaigns c
        WHERE c.org_id = ?
        ORDER BY c.created_at DESC, c.rowid DESC
        "#,
    )
    .bind(org_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Apply a partial update to a campaign owned by `org_id`.
pub async fn update_campaign(
    pool: &SqlitePool,
    org_id: &str,
    id: &str,
    update: &CampaignUpdate,
) -> Result<Campaign> {
    if let Some(ref name) = update.name {
        validate_campaign_name(name)?;
    }
    if let Some(ref business_type) = update.business_type {
        validate_required("business_type", business_type)?;
    }
    if let Some(ref location) = update.target_location {
        validate_required("target_location", location)?;
    }

    let result = sqlx::query(
        r#"
        UPDATE campaigns
        SET name = COALESCE(?, name),
            status = COALESCE(?, status),
            business_type = COALESCE(?, business_type),
            target_location = COALESCE(?, target_location),
            updated_at = strftime('%Y-%m-%d %H:%M:%f', 'now')
        WHERE id = ? AND org_id = ?
        "#,
    )
    .bind(update.name.as_deref().map(str::trim))
    .bind(update.status)
    .bind(update.business_type.as_deref().map(str::trim))
    .bind(update.target_location.as_deref().map(str::trim))
    .bind(id)
    .bind(org_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("Campaign", id));
    }

    get_campaign(pool, id).await
}

/// Delete a campaign owned by `org_id`. Prospects, contacts, scores and
/// messages go with it.
pub async fn delete_campaign(pool: &SqlitePool, org_id: &str, id: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        DELETE FROM campaigns
        WHERE id = ? AND org_id = ?
        "#,
    )
    .bind(id)
    .bind(org_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("Campaign", id));
    }

    Ok(())
}

/// Count a campaign's prospects by tier and by status.
pub async fn campaign_stats(pool: &SqlitePool, campaign_id: &str) -> Result<CampaignStats> {
    let rows = sqlx::query_as::<_, (String, Option<Tier>)>(
        r#"
        SELECT p.status, s.tier
        FROM prospects p
        LEFT JOIN lead_scores s ON s.prospect_id = p.id
        WHERE p.campaign_id = ?
        "#,
    )
    .bind(campaign_id)
    .fetch_all(pool)
    .await?;

    let mut stats = CampaignStats {
        total_prospects: rows.len() as i64,
        ..Default::default()
    };

    for (status, tier) in rows {
        match tier {
            Some(Tier::A) => stats.by_tier.a += 1,
            Some(Tier::B) => stats.by_tier.b += 1,
            Some(Tier::C) => stats.by_tier.c += 1,
            None => {}
        }
        *stats.by_status.entry(status).or_insert(0) += 1;
    }

    Ok(stats)
}
