//! Content: drafts a cold email for an A/B-tier prospect.

use std::sync::Arc;

use async_trait::async_trait;
use brain_core::{parse_json_object, Brain, CompletionRequest};
use chrono::Utc;
use database::{campaign, contact, outreach, prospect, Campaign, Contact, Database, Prospect};
use database::{PersonalizationData, Tier};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::bus::EventPublisher;
use crate::error::{PipelineError, Result};
use crate::events::{PipelineEvent, PROSPECT_SCORED};
use crate::handler::EventHandler;

const MAX_TOKENS: u32 = 1000;

/// Subject, body and personalization notes of a generated email.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EmailDraft {
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub personalization_notes: Option<String>,
}

impl EmailDraft {
    /// Template used when no model is available.
    pub fn fallback(prospect: &Prospect, campaign: &Campaign, contact: &Contact) -> Self {
        let first_name = contact.greeting_name().unwrap_or("there");
        let company = &prospect.company_name;
        let audience = business_type_or_default(campaign);

        Self {
            subject: format!("Quick question about {}", company),
            body: format!(
                "Hi {first_name},\n\n\
                 I came across {company} and was impressed by what you're building.\n\n\
                 We help {audience} like yours find and qualify leads automatically using AI - \
                 typically saving 20+ hours per week on prospecting.\n\n\
                 Would you be open to a quick 15-minute call to see if this could help {company}?\n\n\
                 Best,\n\
                 [Your Name]"
            ),
            personalization_notes: Some("Used company name and business type".to_string()),
        }
    }

    fn is_usable(&self) -> bool {
        !self.subject.trim().is_empty() && !self.body.trim().is_empty()
    }
}

fn business_type_or_default(campaign: &Campaign) -> &str {
    let business_type = campaign.business_type.trim();
    if business_type.is_empty() {
        "businesses"
    } else {
        business_type
    }
}

fn content_prompt(prospect: &Prospect, campaign: &Campaign, contact: &Contact, tier: Tier) -> String {
    let tech_stack = prospect
        .tech_stack
        .as_ref()
        .map(|t| t.0.to_string())
        .unwrap_or_else(|| "Unknown".to_string());

    format!(
        r#"You are an expert B2B cold email copywriter. Write a personalized cold email for this prospect.

PROSPECT INFO:
- Company: {company}
- Website: {website}
- Contact Name: {contact_name}
- Contact Title: {title}
- Lead Tier: {tier} (A=hot, B=warm, C=cold)
- Tech Stack: {tech_stack}

CAMPAIGN CONTEXT:
- We help: {audience}
- Our value prop: AI-powered lead generation that finds and qualifies prospects automatically

REQUIREMENTS:
1. Keep it under 150 words
2. Personalize based on their website/business
3. One clear CTA (reply or book a call)
4. Professional but conversational tone
5. No spammy language or excessive punctuation

Return ONLY valid JSON:
{{
  "subject": "<email subject line>",
  "body": "<email body with \n for line breaks>",
  "personalization_notes": "<what you personalized>"
}}"#,
        company = prospect.company_name,
        website = prospect.website.as_deref().unwrap_or("N/A"),
        contact_name = contact.name.as_deref().unwrap_or("there"),
        title = contact.title.as_deref().unwrap_or("N/A"),
        tier = tier,
        tech_stack = tech_stack,
        audience = business_type_or_default(campaign),
    )
}

/// Handles `prospect/scored` by saving a `pending_approval` message for the
/// prospect's primary contact.
pub struct ContentHandler {
    db: Database,
    publisher: Arc<dyn EventPublisher>,
    brain: Option<Arc<dyn Brain>>,
}

impl ContentHandler {
    pub fn new(
        db: Database,
        publisher: Arc<dyn EventPublisher>,
        brain: Option<Arc<dyn Brain>>,
    ) -> Self {
        Self {
            db,
            publisher,
            brain,
        }
    }

    async fn draft(
        &self,
        prospect: &Prospect,
        campaign: &Campaign,
        contact: &Contact,
        tier: Tier,
    ) -> EmailDraft {
        let Some(brain) = self.brain.as_ref() else {
            debug!("No language model configured, using fallback email");
            return EmailDraft::fallback(prospect, campaign, contact);
        };

        let request = CompletionRequest::new(content_prompt(prospect, campaign, contact, tier))
            .with_max_tokens(MAX_TOKENS);

        let reply = match brain.complete(request).await {
            Ok(completion) => parse_json_object::<EmailDraft>(&completion.text),
            Err(e) => Err(e),
        };

        match reply {
            Ok(draft) if draft.is_usable() => draft,
            Ok(_) => {
                warn!(
                    "{} returned an empty email for {}, using fallback",
                    brain.name(),
                    prospect.id
                );
                EmailDraft::fallback(prospect, campaign, contact)
            }
            Err(e) => {
                warn!(
                    "Email generation with {} failed for {}, using fallback: {}",
                    brain.name(),
                    prospect.id,
                    e
                );
                EmailDraft::fallback(prospect, campaign, contact)
            }
        }
    }
}

#[async_trait]
impl EventHandler for ContentHandler {
    fn id(&self) -> &'static str {
        "content-agent"
    }

    fn trigger(&self) -> &'static str {
        PROSPECT_SCORED
    }

    fn concurrency(&self) -> usize {
        5
    }

    async fn handle(&self, event: &PipelineEvent) -> Result<Value> {
        let PipelineEvent::ProspectScored {
            prospect_id, tier, ..
        } = event
        else {
            return Err(PipelineError::UnexpectedEvent {
                handler: self.id(),
                event: event.name(),
            });
        };

        if !tier.proceeds_to_outreach() {
            info!("Prospect {} is tier {}, skipping content generation", prospect_id, tier);
            return Ok(json!({
                "prospect_id": prospect_id,
                "skipped": true,
                "reason": "tier_c",
            }));
        }

        let pool = self.db.pool();
        let found = prospect::get_prospect(pool, prospect_id).await?;
        let contacts = contact::list_contacts(pool, prospect_id).await?;
        let campaign = campaign::get_campaign(pool, &found.campaign_id).await?;

        let primary = contacts
            .iter()
            .find(|c| c.is_primary)
            .or_else(|| contacts.first())
            .filter(|c| c.email.is_some());
        let Some(primary) = primary else {
            info!(
                "No contact email for prospect {}, skipping content generation",
                prospect_id
            );
            return Ok(json!({
                "prospect_id": prospect_id,
                "skipped": true,
                "reason": "no_email",
            }));
        };

        // A retry after a failed publish finds the message it already saved
        if let Some(existing) =
            outreach::find_pending_for_contact(pool, &primary.id, &campaign.id).await?
        {
            info!(
                "Message {} already drafted for prospect {}, republishing",
                existing.id, prospect_id
            );
            self.publisher
                .publish(PipelineEvent::OutreachGenerated {
                    contact_id: primary.id.clone(),
                    message_id: existing.id.clone(),
                })
                .await?;
            return Ok(json!({
                "prospect_id": prospect_id,
                "message_id": existing.id,
                "subject": existing.subject,
            }));
        }

        let draft = self.draft(&found, &campaign, primary, *tier).await;

        let personalization = PersonalizationData {
            notes: draft.personalization_notes.clone(),
            tier: Some(*tier),
            generated_at: Some(Utc::now().to_rfc3339()),
        };
        let message = outreach::create_pending(
            pool,
            &primary.id,
            &campaign.id,
            &draft.subject,
            &draft.body,
            &personalization,
        )
        .await?;

        self.publisher
            .publish(PipelineEvent::OutreachGenerated {
                contact_id: primary.id.clone(),
                message_id: message.id.clone(),
            })
            .await?;

        info!(
            "Drafted message {} for prospect {} ({})",
            message.id, prospect_id, draft.subject
        );

        Ok(json!({
            "prospect_id": prospect_id,
            "message_id": message.id,
            "subject": draft.subject,
        }))
    }
}
