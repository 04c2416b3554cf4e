//! Prospect operations: discovery upserts, manual entry, bulk import and
//! paged listing.

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::SqlitePool;

use crate::campaign::get_campaign_for_org;
use crate::contact::{self, NewContact};
use crate::error::{DatabaseError, Result};
use crate::lead_score;
use crate::models::{
    new_id, Contact, ContactSource, LeadScore, OutreachMessage, Prospect, ProspectSource,
    ProspectStatus, Tier,
};
use crate::outreach;
use crate::validation::{validate_email, validate_required, validate_url, PageRequest};

const PROSPECT_COLUMNS: &str = "p.id, p.campaign_id, p.company_name, p.website, p.phone, \
     p.address, p.city, p.state, p.zip, p.source, p.source_id, p.tech_stack, p.status, \
     p.created_at, p.updated_at";

/// A business returned by a directory search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredProspect {
    pub company_name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub source: ProspectSource,
    pub source_id: String,
}

/// Input for a manually entered prospect.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewProspect {
    pub campaign_id: String,
    pub company_name: String,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zip: Option<String>,
}

/// One row of a bulk import.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportRow {
    pub company_name: String,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub contact_title: Option<String>,
}

/// Outcome of a bulk import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub created: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

/// Optional list filters.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ProspectFilter {
    #[serde(default)]
    pub status: Option<ProspectStatus>,
    #[serde(default)]
    pub tier: Option<Tier>,
}

/// A prospect with its contacts and score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProspectWithScore {
    #[serde(flatten)]
    pub prospect: Prospect,
    pub contacts: Vec<Contact>,
    pub lead_score: Option<LeadScore>,
}

/// One page of prospects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProspectPage {
    pub prospects: Vec<ProspectWithScore>,
    pub total: i64,
    pub page: i64,
    pub total_pages: i64,
}

/// Everything the lead detail view shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProspectDetail {
    #[serde(flatten)]
    pub prospect: Prospect,
    pub contacts: Vec<Contact>,
    pub lead_score: Option<LeadScore>,
    pub outreach_messages: Vec<OutreachMessage>,
    pub campaign_name: String,
    pub business_type: String,
}

/// Insert or refresh a discovered prospect.
///
/// Keyed on (campaign, source, source_id): rediscovering the same listing
/// updates the existing row and resets it to `new` rather than adding a row.
pub async fn upsert_discovered(
    pool: &SqlitePool,
    campaign_id: &str,
    found: &DiscoveredProspect,
) -> Result<Prospect> {
    sqlx::query(
        r#"
        INSERT INTO prospects (id, campaign_id, company_name, address, phone, website,
                               source, source_id, status)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT (campaign_id, source, source_id) DO UPDATE SET
            company_name = excluded.company_name,
            address = excluded.address,
            phone = excluded.phone,
            website = excluded.website,
            status = excluded.status,
            updated_at = strftime('%Y-%m-%d %H:%M:%f', 'now')
        "#,
    )
    .bind(new_id())
    .bind(campaign_id)
    .bind(&found.company_name)
    .bind(&found.address)
    .bind(&found.phone)
    .bind(&found.website)
    .bind(found.source)
    .bind(&found.source_id)
    .bind(ProspectStatus::New)
    .execute(pool)
    .await?;

    let query = format!(
        "SELECT {PROSPECT_COLUMNS} FROM prospects p \
         WHERE p.campaign_id = ? AND p.source = ? AND p.source_id = ?"
    );
    sqlx::query_as::<_, Prospect>(&query)
        .bind(campaign_id)
        .bind(found.source)
        .bind(&found.source_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Prospect", &found.source_id))
}

/// Create a prospect with the given source in `new` status.
pub async fn create_prospect(
    pool: &SqlitePool,
    input: &NewProspect,
    source: ProspectSource,
) -> Result<Prospect> {
    if let Some(ref website) = input.website {
        validate_url("website", website)?;
    }
    insert_prospect(pool, input, source).await
}

async fn insert_prospect(
    pool: &SqlitePool,
    input: &NewProspect,
    source: ProspectSource,
) -> Result<Prospect> {
    validate_required("company_name", &input.company_name)?;

    let id = new_id();
    sqlx::query(
        r#"
        INSERT INTO prospects (id, campaign_id, company_name, website, phone, address,
                               city, state, zip, source, status)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&input.campaign_id)
    .bind(input.company_name.trim())
    .bind(&input.website)
    .bind(&input.phone)
    .bind(&input.address)
    .bind(&input.city)
    .bind(&input.state)
    .bind(&input.zip)
    .bind(source)
    .bind(ProspectStatus::New)
    .execute(pool)
    .await?;

    get_prospect(pool, &id).await
}

/// Get a prospect by ID without organization scoping.
pub async fn get_prospect(pool: &SqlitePool, id: &str) -> Result<Prospect> {
    let query = format!("SELECT {PROSPECT_COLUMNS} FROM prospects p WHERE p.id = ?");
    sqlx::query_as::<_, Prospect>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Prospect", id))
}

/// Get a prospect whose campaign belongs to `org_id`.
pub async fn get_prospect_for_org(pool: &SqlitePool, org_id: &str, id: &str) -> Result<Prospect> {
    let query = format!(
        "SELECT {PROSPECT_COLUMNS} FROM prospects p \
         INNER JOIN campaigns c ON c.id = p.campaign_id \
         WHERE p.id = ? AND c.org_id = ?"
    );
    sqlx::query_as::<_, Prospect>(&query)
        .bind(id)
        .bind(org_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Prospect", id))
}

/// Record enrichment results and move the prospect to `enriched`.
pub async fn set_enrichment(
    pool: &SqlitePool,
    id: &str,
    tech_stack: Option<&serde_json::Value>,
) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE prospects
        SET tech_stack = ?, status = ?, updated_at = strftime('%Y-%m-%d %H:%M:%f', 'now')
        WHERE id = ?
        "#,
    )
    .bind(tech_stack.map(Json))
    .bind(ProspectStatus::Enriched)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("Prospect", id));
    }

    Ok(())
}

/// Set a prospect's status.
pub async fn set_status(pool: &SqlitePool, id: &str, status: ProspectStatus) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE prospects
        SET status = ?, updated_at = strftime('%Y-%m-%d %H:%M:%f', 'now')
        WHERE id = ?
        "#,
    )
    .bind(status)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("Prospect", id));
    }

    Ok(())
}

/// Set the status of a prospect owned by `org_id` and return the updated row.
pub async fn update_status_for_org(
    pool: &SqlitePool,
    org_id: &str,
    id: &str,
    status: ProspectStatus,
) -> Result<Prospect> {
    get_prospect_for_org(pool, org_id, id).await?;
    set_status(pool, id, status).await?;
    get_prospect(pool, id).await
}

/// Delete a prospect owned by `org_id`.
pub async fn delete_prospect_for_org(pool: &SqlitePool, org_id: &str, id: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        DELETE FROM prospects
        WHERE id = ?
          AND campaign_id IN (SELECT id FROM campaigns WHERE org_id = ?)
        "#,
    )
    .bind(id)
    .bind(org_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("Prospect", id));
    }

    Ok(())
}

/// List a campaign's prospects, newest first, with optional status/tier filters.
pub async fn list_prospects(
    pool: &SqlitePool,
    org_id: &str,
    campaign_id: &str,
    filter: ProspectFilter,
    page: PageRequest,
) -> Result<ProspectPage> {
    get_campaign_for_org(pool, org_id, campaign_id).await?;

    let filters = r#"
        FROM prospects p
        LEFT JOIN lead_scores s ON s.prospect_id = p.id
        WHERE p.campaign_id = ?
          AND (? IS NULL OR p.status = ?)
          AND (? IS NULL OR s.tier = ?)
    "#;

    let total = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) {filters}"))
        .bind(campaign_id)
        .bind(filter.status)
        .bind(filter.status)
        .bind(filter.tier)
        .bind(filter.tier)
        .fetch_one(pool)
        .await?;

    let query = format!(
        "SELECT {PROSPECT_COLUMNS} {filters} \
         ORDER BY p.created_at DESC, p.rowid DESC LIMIT ? OFFSET ?"
    );
    let prospects = sqlx::query_as::<_, Prospect>(&query)
        .bind(campaign_id)
        .bind(filter.status)
        .bind(filter.status)
        .bind(filter.tier)
        .bind(filter.tier)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(pool)
        .await?;

    let mut rows = Vec::with_capacity(prospects.len());
    for prospect in prospects {
        rows.push(with_score(pool, prospect).await?);
    }

    Ok(ProspectPage {
        prospects: rows,
        total,
        page: page.page,
        total_pages: page.total_pages(total),
    })
}

/// Load a prospect's contacts and lead score.
pub async fn with_score(pool: &SqlitePool, prospect: Prospect) -> Result<ProspectWithScore> {
    let contacts = contact::list_contacts(pool, &prospect.id).await?;
    let lead_score = lead_score::get_score(pool, &prospect.id).await?;
    Ok(ProspectWithScore {
        prospect,
        contacts,
        lead_score,
    })
}

/// Full detail of a prospect owned by `org_id`.
pub async fn get_prospect_detail(pool: &SqlitePool, org_id: &str, id: &str) -> Result<ProspectDetail> {
    let prospect = get_prospect_for_org(pool, org_id, id).await?;
    let campaign = get_campaign_for_org(pool, org_id, &prospect.campaign_id).await?;
    let contacts = contact::list_contacts(pool, id).await?;
    let lead_score = lead_score::get_score(pool, id).await?;
    let outreach_messages = outreach::list_for_prospect(pool, id).await?;

    Ok(ProspectDetail {
        prospect,
        contacts,
        lead_score,
        outreach_messages,
        campaign_name: campaign.name,
        business_type: campaign.business_type,
    })
}

/// Import prospects (and optional primary contacts) into a campaign owned by
/// `org_id`. Rows fail individually; the rest are still imported.
pub async fn import_prospects(
    pool: &SqlitePool,
    org_id: &str,
    campaign_id: &str,
    rows: &[ImportRow],
) -> Result<ImportSummary> {
    get_campaign_for_org(pool, org_id, campaign_id).await?;

    let mut summary = ImportSummary::default();

    for row in rows {
        match import_row(pool, campaign_id, row).await {
            Ok(()) => summary.created += 1,
            Err(err) => {
                summary.failed += 1;
                summary.errors.push(format!("{}: {}", row.company_name, err));
            }
        }
    }

    tracing::info!(
        campaign_id,
        created = summary.created,
        failed = summary.failed,
        "Bulk import finished"
    );

    Ok(summary)
}

async fn import_row(pool: &SqlitePool, campaign_id: &str, row: &ImportRow) -> Result<()> {
    if let Some(ref email) = row.contact_email {
        validate_email(email)?;
    }

    let input = NewProspect {
        campaign_id: campaign_id.to_string(),
        company_name: row.company_name.clone(),
        website: row.website.as_deref().and_then(import_website),
        phone: row.phone.clone(),
        address: row.address.clone(),
        ..Default::default()
    };
    let prospect = insert_prospect(pool, &input, ProspectSource::Import).await?;

    if row.contact_email.is_some() || row.contact_name.is_some() {
        let contact = NewContact {
            name: row.contact_name.clone(),
            email: row.contact_email.clone(),
            title: row.contact_title.clone(),
            is_primary: true,
            ..Default::default()
        };
        contact::create_contact(pool, &prospect.id, &contact, ContactSource::Import).await?;
    }

    Ok(())
}

/// Imported websites are free text. Bare domains gain an `https://` scheme;
/// anything that still is not a URL is kept as given.
fn import_website(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if validate_url("website", raw).is_ok() {
        return Some(raw.to_string());
    }
    let prefixed = format!("https://{raw}");
    if !raw.contains("://") && validate_url("website", &prefixed).is_ok() {
        return Some(prefixed);
    }
    Some(raw.to_string())
}
