//! Pipeline event catalogue.
//!
//! Events travel as `{"name": "...", "data": {...}}`, the same shape the
//! webhook accepts.

use database::Tier;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{PipelineError, Result};

pub const CAMPAIGN_CREATED: &str = "campaign/created";
pub const DISCOVERY_STARTED: &str = "discovery/started";
pub const PROSPECT_FOUND: &str = "prospect/found";
pub const PROSPECT_ENRICHED: &str = "prospect/enriched";
pub const PROSPECT_SCORED: &str = "prospect/scored";
pub const OUTREACH_GENERATED: &str = "outreach/generated";
pub const OUTREACH_APPROVED: &str = "outreach/approved";
pub const OUTREACH_SENT: &str = "outreach/sent";
pub const REPLY_RECEIVED: &str = "reply/received";

/// Every event name the bus accepts.
pub const EVENT_NAMES: [&str; 9] = [
    CAMPAIGN_CREATED,
    DISCOVERY_STARTED,
    PROSPECT_FOUND,
    PROSPECT_ENRICHED,
    PROSPECT_SCORED,
    OUTREACH_GENERATED,
    OUTREACH_APPROVED,
    OUTREACH_SENT,
    REPLY_RECEIVED,
];

/// A named pipeline event and its payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "data")]
pub enum PipelineEvent {
    #[serde(rename = "campaign/created")]
    CampaignCreated { campaign_id: String, org_id: String },

    #[serde(rename = "discovery/started")]
    DiscoveryStarted { campaign_id: String },

    #[serde(rename = "prospect/found")]
    ProspectFound {
        prospect_id: String,
        campaign_id: String,
    },

    #[serde(rename = "prospect/enriched")]
    ProspectEnriched { prospect_id: String },

    #[serde(rename = "prospect/scored")]
    ProspectScored {
        prospect_id: String,
        score: i64,
        tier: Tier,
    },

    #[serde(rename = "outreach/generated")]
    OutreachGenerated {
        contact_id: String,
        message_id: String,
    },

    #[serde(rename = "outreach/approved")]
    OutreachApproved { message_id: String },

    #[serde(rename = "outreach/sent")]
    OutreachSent { message_id: String },

    #[serde(rename = "reply/received")]
    ReplyReceived {
        message_id: String,
        reply_text: String,
    },
}

impl PipelineEvent {
    /// The event's catalogue name.
    pub fn name(&self) -> &'static str {
        match self {
            PipelineEvent::CampaignCreated { .. } => CAMPAIGN_CREATED,
            PipelineEvent::DiscoveryStarted { .. } => DISCOVERY_STARTED,
            PipelineEvent::ProspectFound { .. } => PROSPECT_FOUND,
            PipelineEvent::ProspectEnriched { .. } => PROSPECT_ENRICHED,
            PipelineEvent::ProspectScored { .. } => PROSPECT_SCORED,
            PipelineEvent::OutreachGenerated { .. } => OUTREACH_GENERATED,
            PipelineEvent::OutreachApproved { .. } => OUTREACH_APPROVED,
            PipelineEvent::OutreachSent { .. } => OUTREACH_SENT,
            PipelineEvent::ReplyReceived { .. } => REPLY_RECEIVED,
        }
    }

    /// Rebuild an event from its name and payload.
    pub fn from_parts(name: &str, data: Value) -> Result<Self> {
        if !EVENT_NAMES.contains(&name) {
            return Err(PipelineError::UnknownEvent(name.to_string()));
        }
        let event = serde_json::from_value(serde_json::json!({ "name": name, "data": data }))?;
        Ok(event)
    }

    /// The payload without the name.
    pub fn data(&self) -> Result<Value> {
        let mut value = serde_json::to_value(self)?;
        Ok(value
            .get_mut("data")
            .map(Value::take)
            .unwrap_or(Value::Null))
    }
}
