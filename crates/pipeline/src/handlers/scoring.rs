//! Scoring: rates an enriched prospect 0-100 and buckets it into a tier.
//!
//! With a language model configured the prospect is scored by prompt; any
//! model failure, missing JSON, out-of-range score or unknown tier falls back
//! to a deterministic tally over the enrichment data.

use std::sync::Arc;

use async_trait::async_trait;
use brain_core::{parse_json_object, Brain, CompletionRequest};
use database::{campaign, contact, lead_score, prospect, Campaign, Contact, Database, Prospect};
use database::{ProspectStatus, ScoringFactors, Tier};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::bus::EventPublisher;
use crate::error::{PipelineError, Result};
use crate::events::{PipelineEvent, PROSPECT_ENRICHED};
use crate::handler::EventHandler;

const MODEL_VERSION: &str = "v1";
const MAX_TOKENS: u32 = 500;

/// A computed lead score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreResult {
    pub score: i64,
    pub tier: Tier,
    pub factors: ScoringFactors,
}

/// Score reply as the model is asked to format it.
#[derive(Debug, Deserialize)]
struct ModelScore {
    score: f64,
    tier: String,
    #[serde(default)]
    factors: ModelFactors,
    #[serde(default)]
    notes: Vec<String>,
}

/// Factor breakdown as the model writes it; fractional points are rounded.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ModelFactors {
    website_quality: f64,
    contact_quality: f64,
    business_fit: f64,
    tech_fit: f64,
    location_fit: f64,
}

impl ModelFactors {
    fn into_factors(self, notes: Vec<String>) -> ScoringFactors {
        ScoringFactors {
            website_quality: self.website_quality.round() as i64,
            contact_quality: self.contact_quality.round() as i64,
            business_fit: self.business_fit.round() as i64,
            tech_fit: self.tech_fit.round() as i64,
            location_fit: self.location_fit.round() as i64,
            notes,
        }
    }
}

impl ModelScore {
    /// Accept the reply only with a 0-100 score and a known tier.
    fn into_result(self) -> Option<ScoreResult> {
        if !(0.0..=100.0).contains(&self.score) {
            return None;
        }
        let tier = Tier::parse(&self.tier)?;
        Some(ScoreResult {
            score: self.score.round() as i64,
            tier,
            factors: self.factors.into_factors(self.notes),
        })
    }
}

/// Deterministic score from the enrichment data alone.
pub fn fallback_score(prospect: &Prospect, contacts: &[Contact]) -> ScoreResult {
    let mut score = 50;
    let mut factors = ScoringFactors {
        website_quality: 0,
        contact_quality: 0,
        business_fit: 15,
        tech_fit: 5,
        location_fit: 10,
        notes: Vec::new(),
    };

    if prospect.website.is_some() {
        factors.website_quality = 15;
        score += 10;
        factors.notes.push("Has website".to_string());
    } else {
        factors.notes.push("No website found".to_string());
    }

    if let Some(first) = contacts.first() {
        factors.contact_quality = 10;
        score += 10;
        if first.email.is_some() {
            factors.contact_quality += 5;
            score += 5;
            factors.notes.push("Has email contact".to_string());
        }
    } else {
        factors.notes.push("No contacts found".to_string());
    }

    if prospect.tech_stack.is_some() {
        factors.tech_fit = 10;
        score += 5;
    }

    ScoreResult {
        score,
        tier: Tier::from_score(score),
        factors,
    }
}

fn scoring_prompt(prospect: &Prospect, contacts: &[Contact], campaign: &Campaign) -> String {
    let tech_stack = prospect
        .tech_stack
        .as_ref()
        .map(|t| t.0.to_string())
        .unwrap_or_else(|| "Unknown".to_string());
    let icp = campaign
        .ideal_customer_profile
        .as_ref()
        .and_then(|p| serde_json::to_string(&p.0).ok())
        .unwrap_or_else(|| "Not specified".to_string());
    let title = contacts
        .first()
        .and_then(|c| c.title.as_deref())
        .unwrap_or("Unknown");

    format!(
        r#"You are a lead scoring assistant. Analyze this prospect and provide a score from 0-100 and a tier (A, B, or C).

Prospect Data:
- Company: {company}
- Website: {website}
- Location: {location}
- Tech Stack: {tech_stack}
- Has Email Contact: {has_contact}
- Contact Title: {title}

Target Business Type: {business_type}
Ideal Customer Profile: {icp}

Scoring criteria:
- A tier (80-100): Perfect fit, has website, verified email, decision maker contact
- B tier (50-79): Good fit, missing some info but promising
- C tier (0-49): Poor fit or missing critical information

Respond in JSON format only:
{{
  "score": <number>,
  "tier": "<A|B|C>",
  "factors": {{
    "website_quality": <0-20>,
    "contact_quality": <0-20>,
    "business_fit": <0-30>,
    "tech_fit": <0-15>,
    "location_fit": <0-15>
  }},
  "notes": ["<reason1>", "<reason2>"]
}}"#,
        company = prospect.company_name,
        website = prospect.website.as_deref().unwrap_or("None"),
        location = prospect.address.as_deref().unwrap_or("Unknown"),
        tech_stack = tech_stack,
        has_contact = !contacts.is_empty(),
        title = title,
        business_type = campaign.business_type,
        icp = icp,
    )
}

/// Handles `prospect/enriched`.
pub struct ScoringHandler {
    db: Database,
    publisher: Arc<dyn EventPublisher>,
    brain: Option<Arc<dyn Brain>>,
}

impl ScoringHandler {
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

    async fn score(&self, prospect: &Prospect, contacts: &[Contact], campaign: &Campaign) -> ScoreResult {
        let Some(brain) = self.brain.as_ref() else {
            debug!("No language model configured, using fallback scoring");
            return fallback_score(prospect, contacts);
        };

        let request = CompletionRequest::new(scoring_prompt(prospect, contacts, campaign))
            .with_max_tokens(MAX_TOKENS);

        let reply = match brain.complete(request).await {
            Ok(completion) => parse_json_object::<ModelScore>(&completion.text),
            Err(e) => Err(e),
        };

        match reply {
            Ok(reply) => match reply.into_result() {
                Some(result) => result,
                None => {
                    warn!(
                        "{} returned an out-of-range score for {}, using fallback",
                        brain.name(),
                        prospect.id
                    );
                    fallback_score(prospect, contacts)
                }
            },
            Err(e) => {
                warn!(
                    "Scoring with {} failed for {}, using fallback: {}",
                    brain.name(),
                    prospect.id,
                    e
                );
                fallback_score(prospect, contacts)
            }
        }
    }
}

#[async_trait]
impl EventHandler for ScoringHandler {
    fn id(&self) -> &'static str {
        "scoring-agent"
    }

    fn trigger(&self) -> &'static str {
        PROSPECT_ENRICHED
    }

    fn concurrency(&self) -> usize {
        5
    }

    async fn handle(&self, event: &PipelineEvent) -> Result<Value> {
        let PipelineEvent::ProspectEnriched { prospect_id } = event else {
            return Err(PipelineError::UnexpectedEvent {
                handler: self.id(),
                event: event.name(),
            });
        };
        let pool = self.db.pool();

        let found = prospect::get_prospect(pool, prospect_id).await?;
        let contacts = contact::list_contacts(pool, prospect_id).await?;
        let campaign = campaign::get_campaign(pool, &found.campaign_id).await?;

        let result = self.score(&found, &contacts, &campaign).await;

        lead_score::upsert_score(
            pool,
            prospect_id,
            result.score,
            result.tier,
            &result.factors,
            MODEL_VERSION,
        )
        .await?;
        prospect::set_status(pool, prospect_id, ProspectStatus::Scored).await?;

        info!(
            "Scored prospect {}: {} (tier {})",
            prospect_id, result.score, result.tier
        );

        if result.tier.proceeds_to_outreach() {
            self.publisher
                .publish(PipelineEvent::ProspectScored {
                    prospect_id: prospect_id.clone(),
                    score: result.score,
                    tier: result.tier,
                })
                .await?;
        }

        Ok(json!({
            "prospect_id": prospect_id,
            "score": result.score,
            "tier": result.tier,
        }))
    }
}
