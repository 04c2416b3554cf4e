//! Outreach message operations: drafts, the approval queue, approval and
//! rejection, and delivery statistics.
//!
//! Status only ever moves forward (see [`OutreachStatus::can_transition_to`]).
//! Rejecting a message deletes it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::SqlitePool;

use crate::campaign::get_campaign_for_org;
use crate::contact;
use crate::error::{DatabaseError, Result};
use crate::lead_score;
use crate::models::{new_id, Contact, LeadScore, OutreachMessage, OutreachStatus, PersonalizationData};
use crate::prospect;
use crate::validation::{validate_range, validate_required, PageRequest};

const MESSAGE_COLUMNS: &str = "m.id, m.contact_id, m.campaign_id, m.subject, m.body, m.status, \
     m.personalization_data, m.sequence_step, m.scheduled_for, m.sent_at, m.opened_at, \
     m.replied_at, m.created_at, m.updated_at";

/// Input for a manually written draft.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewOutreach {
    pub contact_id: String,
    pub campaign_id: String,
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub sequence_step: Option<i64>,
}

/// A message with its contact and the contact's company.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutreachWithContact {
    #[serde(flatten)]
    pub message: OutreachMessage,
    pub contact: Contact,
    pub company_name: String,
    pub website: Option<String>,
}

/// An entry in the approval queue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingOutreach {
    #[serde(flatten)]
    pub message: OutreachMessage,
    pub contact: Contact,
    pub company_name: String,
    pub website: Option<String>,
    pub lead_score: Option<LeadScore>,
    pub campaign_name: String,
}

/// One page of a campaign's messages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutreachPage {
    pub messages: Vec<OutreachWithContact>,
    pub total: i64,
    pub page: i64,
    pub total_pages: i64,
}

/// Message counts and engagement rates.
///
/// Open, reply and bounce rates are relative to sent messages; click rate is
/// relative to opened messages. Rates are percentages rounded to one decimal.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OutreachStats {
    pub total: i64,
    pub by_status: BTreeMap<String, i64>,
    pub open_rate: f64,
    pub click_rate: f64,
    pub reply_rate: f64,
    pub bounce_rate: f64,
}

/// Create a manually written draft for a contact in a campaign owned by `org_id`.
pub async fn create_draft_for_org(
    pool: &SqlitePool,
    org_id: &str,
    input: &NewOutreach,
) -> Result<OutreachMessage> {
    validate_required("subject", &input.subject)?;
    validate_required("body", &input.body)?;
    let sequence_step = input.sequence_step.unwrap_or(1);
    validate_range("sequence_step", sequence_step, 1, i64::MAX)?;

    get_campaign_for_org(pool, org_id, &input.campaign_id).await?;

    let in_campaign = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM contacts ct
        INNER JOIN prospects p ON p.id = ct.prospect_id
        WHERE ct.id = ? AND p.campaign_id = ?
        "#,
    )
    .bind(&input.contact_id)
    .bind(&input.campaign_id)
    .fetch_one(pool)
    .await?;

    if in_campaign == 0 {
        return Err(DatabaseError::not_found("Contact", &input.contact_id));
    }

    insert_message(
        pool,
        &input.contact_id,
        &input.campaign_id,
        &input.subject,
        &input.body,
        OutreachStatus::Draft,
        sequence_step,
        None,
    )
    .await
}

/// Persist a generated message awaiting human approval.
pub async fn create_pending(
    pool: &SqlitePool,
    contact_id: &str,
    campaign_id: &str,
    subject: &str,
    body: &str,
    personalization: &PersonalizationData,
) -> Result<OutreachMessage> {
    insert_message(
        pool,
        contact_id,
        campaign_id,
        subject,
        body,
        OutreachStatus::PendingApproval,
        1,
        Some(personalization),
    )
    .await
}

#[allow(clippy::too_many_arguments)]
async fn insert_message(
    pool: &SqlitePool,
    contact_id: &str,
    campaign_id: &str,
    subject: &str,
    body: &str,
    status: OutreachStatus,
    sequence_step: i64,
    personalization: Option<&PersonalizationData>,
) -> Result<OutreachMessage> {
    let id = new_id();
    sqlx::query(
        r#"
        INSERT INTO outreach_messages (id, contact_id, campaign_id, subject, body, status,
                                       personalization_data, sequence_step)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(contact_id)
    .bind(campaign_id)
    .bind(subject)
    .bind(body)
    .bind(status)
    .bind(personalization.map(Json))
    .bind(sequence_step)
    .execute(pool)
    .await?;

    get_message(pool, &id).await
}

/// Get a message by ID without organization scoping.
pub async fn get_message(pool: &SqlitePool, id: &str) -> Result<OutreachMessage> {
    let query = format!("SELECT {MESSAGE_COLUMNS} FROM outreach_messages m WHERE m.id = ?");
    sqlx::query_as::<_, OutreachMessage>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("OutreachMessage", id))
}

/// Get a message whose campaign belongs to `org_id`.
pub async fn get_message_for_org(pool: &SqlitePool, org_id: &str, id: &str) -> Result<OutreachMessage> {
    let query = format!(
        "SELECT {MESSAGE_COLUMNS} FROM outreach_messages m \
         INNER JOIN campaigns c ON c.id = m.campaign_id \
         WHERE m.id = ? AND c.org_id = ?"
    );
    sqlx::query_as::<_, OutreachMessage>(&query)
        .bind(id)
        .bind(org_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("OutreachMessage", id))
}

/// Get a message owned by `org_id` with its contact and company.
pub async fn get_message_detail(
    pool: &SqlitePool,
    org_id: &str,
    id: &str,
) -> Result<OutreachWithContact> {
    let message = get_message_for_org(pool, org_id, id).await?;
    with_contact(pool, message).await
}

async fn with_contact(pool: &SqlitePool, message: OutreachMessage) -> Result<OutreachWithContact> {
    let contact = contact::get_contact(pool, &message.contact_id).await?;
    let prospect = prospect::get_prospect(pool, &contact.prospect_id).await?;
    Ok(OutreachWithContact {
        message,
        contact,
        company_name: prospect.company_name,
        website: prospect.website,
    })
}

/// All messages addressed to a prospect's contacts, newest first.
pub async fn list_for_prospect(pool: &SqlitePool, prospect_id: &str) -> Result<Vec<OutreachMessage>> {
    let query = format!(
        "SELECT {MESSAGE_COLUMNS} FROM outreach_messages m \
         INNER JOIN contacts ct ON ct.id = m.contact_id \
         WHERE ct.prospect_id = ? \
         ORDER BY m.created_at DESC, m.rowid DESC"
    );
    let messages = sqlx::query_as::<_, OutreachMessage>(&query)
        .bind(prospect_id)
        .fetch_all(pool)
        .await?;

    Ok(messages)
}

/// The first-step message awaiting approval for a contact in a campaign, if any.
pub async fn find_pending_for_contact(
    pool: &SqlitePool,
    contact_id: &str,
    campaign_id: &str,
) -> Result<Option<OutreachMessage>> {
    let query = format!(
        "SELECT {MESSAGE_COLUMNS} FROM outreach_messages m \
         WHERE m.contact_id = ? AND m.campaign_id = ? AND m.status = ? AND m.sequence_step = 1 \
         ORDER BY m.created_at DESC, m.rowid DESC \
         LIMIT 1"
    );
    let message = sqlx::query_as::<_, OutreachMessage>(&query)
        .bind(contact_id)
        .bind(campaign_id)
        .bind(OutreachStatus::PendingApproval)
        .fetch_optional(pool)
        .await?;

    Ok(message)
}

/// Page through a campaign's messages, newest first.
pub async fn list_for_campaign(
    pool: &SqlitePool,
    org_id: &str,
    campaign_id: &str,
    status: Option<OutreachStatus>,
    page: PageRequest,
) -> Result<OutreachPage> {
    get_campaign_for_org(pool, org_id, campaign_id).await?;

    let total = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM outreach_messages m
        WHERE m.campaign_id = ? AND (? IS NULL OR m.status = ?)
        "#,
    )
    .bind(campaign_id)
    .bind(status)
    .bind(status)
    .fetch_one(pool)
    .await?;

    let query = format!(
        "SELECT {MESSAGE_COLUMNS} FROM outreach_messages m \
         WHERE m.campaign_id = ? AND (? IS NULL OR m.status = ?) \
         ORDER BY m.created_at DESC, m.rowid DESC LIMIT ? OFFSET ?"
    );
    let rows = sqlx::query_as::<_, OutreachMessage>(&query)
        .bind(campaign_id)
        .bind(status)
        .bind(status)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(pool)
        .await?;

    let mut messages = Vec::with_capacity(rows.len());
    for message in rows {
        messages.push(with_contact(pool, message).await?);
    }

    Ok(OutreachPage {
        messages,
        total,
        page: page.page,
        total_pages: page.total_pages(total),
    })
}

/// The approval queue for `org_id`, oldest first, optionally for one campaign.
pub async fn list_pending(
    pool: &SqlitePool,
    org_id: &str,
    campaign_id: Option<&str>,
) -> Result<Vec<PendingOutreach>> {
    let query = format!(
        "SELECT {MESSAGE_COLUMNS} FROM outreach_messages m \
         INNER JOIN campaigns c ON c.id = m.campaign_id \
         WHERE c.org_id = ? AND m.status = ? AND (? IS NULL OR m.campaign_id = ?) \
         ORDER BY m.created_at ASC, m.rowid ASC"
    );
    let rows = sqlx::query_as::<_, OutreachMessage>(&query)
        .bind(org_id)
        .bind(OutreachStatus::PendingApproval)
        .bind(campaign_id)
        .bind(campaign_id)
        .fetch_all(pool)
        .await?;

    let mut queue = Vec::with_capacity(rows.len());
    for message in rows {
        let campaign = get_campaign_for_org(pool, org_id, &message.campaign_id).await?;
        let item = with_contact(pool, message).await?;
        let lead_score = lead_score::get_score(pool, &item.contact.prospect_id).await?;
        queue.push(PendingOutreach {
            message: item.message,
            contact: item.contact,
            company_name: item.company_name,
            website: item.website,
            lead_score,
            campaign_name: campaign.name,
        });
    }

    Ok(queue)
}

/// Edit the subject and/or body of a message owned by `org_id`.
pub async fn update_content_for_org(
    pool: &SqlitePool,
    org_id: &str,
    id: &str,
    subject: Option<&str>,
    body: Option<&str>,
) -> Result<OutreachMessage> {
    if let Some(subject) = subject {
        validate_required("subject", subject)?;
    }
    if let Some(body) = body {
        validate_required("body", body)?;
    }

    get_message_for_org(pool, org_id, id).await?;

    sqlx::query(
        r#"
        UPDATE outreach_messages
        SET subject = COALESCE(?, subject),
            body = COALESCE(?, body),
            updated_at = strftime('%Y-%m-%d %H:%M:%f', 'now')
        WHERE id = ?
        "#,
    )
    .bind(subject)
    .bind(body)
    .bind(id)
    .execute(pool)
    .await?;

    get_message(pool, id).await
}

/// Approve a message owned by `org_id`.
///
/// With a schedule the message becomes `scheduled`, otherwise `approved`.
/// Only drafts and messages pending approval can be approved.
pub async fn approve_for_org(
    pool: &SqlitePool,
    org_id: &str,
    id: &str,
    scheduled_for: Option<&str>,
) -> Result<OutreachMessage> {
    let message = get_message_for_org(pool, org_id, id).await?;
    let next = if scheduled_for.is_some() {
        OutreachStatus::Scheduled
    } else {
        OutreachStatus::Approved
    };

    if !message.status.is_awaiting_approval() || !message.status.can_transition_to(next) {
        return Err(DatabaseError::InvalidTransition {
            entity: "OutreachMessage",
            id: id.to_string(),
            from: message.status.as_str(),
            to: next.as_str(),
        });
    }

    sqlx::query(
        r#"
        UPDATE outreach_messages
        SET status = ?, scheduled_for = ?,
            updated_at = strftime('%Y-%m-%d %H:%M:%f', 'now')
        WHERE id = ?
        "#,
    )
    .bind(next)
    .bind(scheduled_for)
    .bind(id)
    .execute(pool)
    .await?;

    get_message(pool, id).await
}

/// Approve every listed message owned by `org_id` that is still awaiting
/// approval. Returns the IDs that were approved; others are skipped.
pub async fn bulk_approve_for_org(pool: &SqlitePool, org_id: &str, ids: &[String]) -> Result<Vec<String>> {
    let mut approved = Vec::new();

    for id in ids {
        let updated = sqlx::query(
            r#"
            UPDATE outreach_messages
            SET status = ?, updated_at = strftime('%Y-%m-%d %H:%M:%f', 'now')
            WHERE id = ?
              AND status IN (?, ?)
              AND campaign_id IN (SELECT id FROM campaigns WHERE org_id = ?)
            "#,
        )
        .bind(OutreachStatus::Approved)
        .bind(id)
        .bind(OutreachStatus::Draft)
        .bind(OutreachStatus::PendingApproval)
        .bind(org_id)
        .execute(pool)
        .await?;

        if updated.rows_affected() > 0 {
            approved.push(id.clone());
        }
    }

    tracing::info!(requested = ids.len(), approved = approved.len(), "Bulk approve");

    Ok(approved)
}

/// Reject a message owned by `org_id`. The row is deleted.
pub async fn reject_for_org(pool: &SqlitePool, org_id: &str, id: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        DELETE FROM outreach_messages
        WHERE id = ?
          AND campaign_id IN (SELECT id FROM campaigns WHERE org_id = ?)
        "#,
    )
    .bind(id)
    .bind(org_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("OutreachMessage", id));
    }

    Ok(())
}

/// Count messages by status for `org_id`, optionally for one campaign.
pub async fn stats_for_org(
    pool: &SqlitePool,
    org_id: &str,
    campaign_id: Option<&str>,
) -> Result<OutreachStats> {
    let rows = sqlx::query_as::<_, (OutreachStatus, i64)>(
        r#"
        SELECT m.status, COUNT(*)
        FROM outreach_messages m
        INNER JOIN campaigns c ON c.id = m.campaign_id
        WHERE c.org_id = ? AND (? IS NULL OR m.campaign_id = ?)
        GROUP BY m.status
        "#,
    )
    .bind(org_id)
    .bind(campaign_id)
    .bind(campaign_id)
    .fetch_all(pool)
    .await?;

    let mut by_status: BTreeMap<String, i64> = OutreachStatus::ALL
        .iter()
        .map(|s| (s.as_str().to_string(), 0))
        .collect();
    let mut total = 0;
    for (status, count) in rows {
        by_status.insert(status.as_str().to_string(), count);
        total += count;
    }

    let count = |s: OutreachStatus| by_status.get(s.as_str()).copied().unwrap_or(0);
    let sent = count(OutreachStatus::Sent);
    let opened = count(OutreachStatus::Opened);

    Ok(OutreachStats {
        total,
        open_rate: percent(opened, sent),
        click_rate: percent(count(OutreachStatus::Clicked), opened),
        reply_rate: percent(count(OutreachStatus::Replied), sent),
        bounce_rate: percent(count(OutreachStatus::Bounced), sent),
        by_status,
    })
}

fn percent(part: i64, whole: i64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 / whole as f64 * 1000.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::campaign::{create_campaign, NewCampaign};
    use crate::contact::{create_contact, NewContact};
    use crate::models::{ContactSource, Plan, ProspectSource, Tier};
    use crate::prospect::{create_prospect, NewProspect};
    use crate::{organization, Database};

    struct Fixture {
        db: Database,
        org_id: String,
        campaign_id: String,
        contact_id: String,
    }

    async fn fixture() -> Fixture {
        let db = Database::in_memory().await.unwrap();
        let org = organization::create_organization(db.pool(), "Acme", Plan::Growth)
            .await
            .unwrap();
        let campaign = create_campaign(
            db.pool(),
            &org.id,
            &NewCampaign {
                name: "Salons".to_string(),
                business_type: "hair salon".to_string(),
                target_location: "Tampa".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let prospect = create_prospect(
            db.pool(),
            &NewProspect {
                campaign_id: campaign.id.clone(),
                company_name: "Shear Bliss".to_string(),
                website: Some("https://shearbliss.example".to_string()),
                ..Default::default()
            },
            ProspectSource::Manual,
        )
        .await
        .unwrap();
        let contact = create_contact(
            db.pool(),
            &prospect.id,
            &NewContact {
                name: Some("Dana Cruz".to_string()),
                email: Some("dana@shearbliss.example".to_string()),
                is_primary: true,
                ..Default::default()
            },
            ContactSource::Manual,
        )
        .await
        .unwrap();

        Fixture {
            db,
            org_id: org.id,
            campaign_id: campaign.id,
            contact_id: contact.id,
        }
    }

    async fn pending(f: &Fixture) -> OutreachMessage {
        create_pending(
            f.db.pool(),
            &f.contact_id,
            &f.campaign_id,
            "Quick question about Shear Bliss",
            "Hi Dana",
            &PersonalizationData {
                notes: Some("fallback".to_string()),
                tier: Some(Tier::A),
                generated_at: None,
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_approve_without_schedule_sets_approved() {
        let f = fixture().await;
        let message = pending(&f).await;
        assert_eq!(message.status, OutreachStatus::PendingApproval);

        let approved = approve_for_org(f.db.pool(), &f.org_id, &message.id, None)
            .await
            .unwrap();
        assert_eq!(approved.status, OutreachStatus::Approved);
        assert!(approved.scheduled_for.is_none());

        // Approving twice would not move forward
        let again = approve_for_org(f.db.pool(), &f.org_id, &message.id, None).await;
        assert!(matches!(again, Err(DatabaseError::InvalidTransition { .. })));
    }

    #[tokio::test]
    async fn test_approve_with_schedule_sets_scheduled() {
        let f = fixture().await;
        let message = pending(&f).await;

        let scheduled = approve_for_org(
            f.db.pool(),
            &f.org_id,
            &message.id,
            Some("2030-01-01T09:00:00Z"),
        )
        .await
        .unwrap();
        assert_eq!(scheduled.status, OutreachStatus::Scheduled);
        assert_eq!(scheduled.scheduled_for.as_deref(), Some("2030-01-01T09:00:00Z"));
    }

    #[tokio::test]
    async fn test_reject_deletes() {
        let f = fixture().await;
        let message = pending(&f).await;

        reject_for_org(f.db.pool(), &f.org_id, &message.id).await.unwrap();
        let result = get_message(f.db.pool(), &message.id).await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));

        let again = reject_for_org(f.db.pool(), &f.org_id, &message.id).await;
        assert!(matches!(again, Err(DatabaseError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_pending_queue_and_bulk_approve() {
        let f = fixture().await;
        let first = pending(&f).await;
        let second = pending(&f).await;
        let draft = create_draft_for_org(
            f.db.pool(),
            &f.org_id,
            &NewOutreach {
                contact_id: f.contact_id.clone(),
                campaign_id: f.campaign_id.clone(),
                subject: "Hello".to_string(),
                body: "Body".to_string(),
                sequence_step: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(draft.status, OutreachStatus::Draft);
        assert_eq!(draft.sequence_step, 1);

        let queue = list_pending(f.db.pool(), &f.org_id, None).await.unwrap();
        assert_eq!(queue.len(), 2);
        assert_eq!(queue[0].message.id, first.id);
        assert_eq!(queue[0].company_name, "Shear Bliss");
        assert_eq!(queue[0].campaign_name, "Salons");

        approve_for_org(f.db.pool(), &f.org_id, &first.id, None).await.unwrap();

        let ids = vec![first.id.clone(), second.id.clone(), "missing".to_string()];
        let approved = bulk_approve_for_org(f.db.pool(), &f.org_id, &ids).await.unwrap();
        assert_eq!(approved, vec![second.id.clone()]);

        assert!(list_pending(f.db.pool(), &f.org_id, Some(&f.campaign_id))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_messages_scoped_to_org() {
        let f = fixture().await;
        let message = pending(&f).await;
        let other = organization::create_organization(f.db.pool(), "Other", Plan::Starter)
            .await
            .unwrap();

        assert!(get_message_for_org(f.db.pool(), &other.id, &message.id).await.is_err());
        assert!(approve_for_org(f.db.pool(), &other.id, &message.id, None).await.is_err());
        assert!(reject_for_org(f.db.pool(), &other.id, &message.id).await.is_err());
        assert!(list_pending(f.db.pool(), &other.id, None).await.unwrap().is_empty());
        let approved = bulk_approve_for_org(f.db.pool(), &other.id, &[message.id.clone()])
            .await
            .unwrap();
        assert!(approved.is_empty());
    }

    #[tokio::test]
    async fn test_stats_rates() {
        let f = fixture().await;
        for status in [
            OutreachStatus::Sent,
            OutreachStatus::Sent,
            OutreachStatus::Opened,
            OutreachStatus::Bounced,
        ] {
            let message = pending(&f).await;
            sqlx::query("UPDATE outreach_messages SET status = ? WHERE id = ?")
                .bind(status)
                .bind(&message.id)
                .execute(f.db.pool())
                .await
                .unwrap();
        }
        pending(&f).await;

        let stats = stats_for_org(f.db.pool(), &f.org_id, Some(&f.campaign_id))
            .await
            .unwrap();
        assert_eq!(stats.total, 5);
        assert_eq!(stats.by_status["sent"], 2);
        assert_eq!(stats.by_status["pending_approval"], 1);
        assert_eq!(stats.by_status["clicked"], 0);
        assert_eq!(stats.open_rate, 50.0);
        assert_eq!(stats.bounce_rate, 50.0);
        assert_eq!(stats.click_rate, 0.0);

        let empty = stats_for_org(f.db.pool(), "nobody", None).await.unwrap();
        assert_eq!(empty.total, 0);
        assert_eq!(empty.reply_rate, 0.0);
    }

    #[tokio::test]
    async fn test_draft_requires_contact_in_campaign() {
        let f = fixture().await;
        let result = create_draft_for_org(
            f.db.pool(),
            &f.org_id,
            &NewOutreach {
                contact_id: "not-a-contact".to_string(),
                campaign_id: f.campaign_id.clone(),
                subject: "Hi".to_string(),
                body: "Body".to_string(),
                sequence_step: Some(2),
            },
        )
        .await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));

        let result = create_draft_for_org(
            f.db.pool(),
            &f.org_id,
            &NewOutreach {
                contact_id: f.contact_id.clone(),
                campaign_id: f.campaign_id.clone(),
                subject: " ".to_string(),
                body: "Body".to_string(),
                sequence_step: None,
            },
        )
        .await;
        assert!(matches!(result, Err(DatabaseError::Validation(_))));
    }
}
