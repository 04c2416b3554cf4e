//! Database models.

use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// Subscription plan of an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum Plan {
    #[default]
    Starter,
    Growth,
    Scale,
}

/// Campaign lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum CampaignStatus {
    Active,
    Paused,
    Completed,
    Draft,
}

/// Prospect pipeline status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ProspectStatus {
    New,
    Enriched,
    Scored,
    Contacted,
    Replied,
    Converted,
    Disqualified,
}

impl ProspectStatus {
    /// Database/wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProspectStatus::New => "new",
            ProspectStatus::Enriched => "enriched",
            ProspectStatus::Scored => "scored",
            ProspectStatus::Contacted => "contacted",
            ProspectStatus::Replied => "replied",
            ProspectStatus::Converted => "converted",
            ProspectStatus::Disqualified => "disqualified",
        }
    }
}

/// Where a prospect row came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ProspectSource {
    GoogleMaps,
    Yelp,
    Apollo,
    Manual,
    Import,
}

/// Where a contact row came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ContactSource {
    Hunter,
    Manual,
    Import,
}

/// Coarse lead-quality bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum Tier {
    /// Hot lead.
    A,
    /// Warm lead.
    B,
    /// Cold lead.
    C,
}

impl Tier {
    /// Bucket a 0-100 score: A at 80 and above, B at 50 and above.
    pub fn from_score(score: i64) -> Self {
        if score >= 80 {
            Tier::A
        } else if score >= 50 {
            Tier::B
        } else {
            Tier::C
        }
    }

    /// Only A and B leads get outreach drafted.
    pub fn proceeds_to_outreach(&self) -> bool {
        matches!(self, Tier::A | Tier::B)
    }

    /// Parse a tier letter, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Some(Tier::A),
            "B" => Some(Tier::B),
            "C" => Some(Tier::C),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::A => "A",
            Tier::B => "B",
            Tier::C => "C",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outreach message delivery status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum OutreachStatus {
    Draft,
    PendingApproval,
    Approved,
    Scheduled,
    Sent,
    Delivered,
    Opened,
    Clicked,
    Replied,
    Bounced,
    Failed,
}

impl OutreachStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [OutreachStatus; 11] = [
        OutreachStatus::Draft,
        OutreachStatus::PendingApproval,
        OutreachStatus::Approved,
        OutreachStatus::Scheduled,
        OutreachStatus::Sent,
        OutreachStatus::Delivered,
        OutreachStatus::Opened,
        OutreachStatus::Clicked,
        OutreachStatus::Replied,
        OutreachStatus::Bounced,
        OutreachStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OutreachStatus::Draft => "draft",
            OutreachStatus::PendingApproval => "pending_approval",
            OutreachStatus::Approved => "approved",
            OutreachStatus::Scheduled => "scheduled",
            OutreachStatus::Sent => "sent",
            OutreachStatus::Delivered => "delivered",
            OutreachStatus::Opened => "opened",
            OutreachStatus::Clicked => "clicked",
            OutreachStatus::Replied => "replied",
            OutreachStatus::Bounced => "bounced",
            OutreachStatus::Failed => "failed",
        }
    }

    /// Position in the forward-only lifecycle.
    fn stage(&self) -> u8 {
        match self {
            OutreachStatus::Draft | OutreachStatus::PendingApproval => 0,
            OutreachStatus::Approved | OutreachStatus::Scheduled => 1,
            OutreachStatus::Sent => 2,
            OutreachStatus::Delivered | OutreachStatus::Bounced | OutreachStatus::Failed => 3,
            OutreachStatus::Opened => 4,
            OutreachStatus::Clicked => 5,
            OutreachStatus::Replied => 6,
        }
    }

    /// Whether a message in this status may move to `next`.
    ///
    /// Transitions only move forward. Bounced and failed messages are terminal.
    pub fn can_transition_to(&self, next: OutreachStatus) -> bool {
        if matches!(self, OutreachStatus::Bounced | OutreachStatus::Failed) {
            return false;
        }
        next.stage() > self.stage()
    }

    /// Whether a human can still approve the message.
    pub fn is_awaiting_approval(&self) -> bool {
        matches!(self, OutreachStatus::Draft | OutreachStatus::PendingApproval)
    }
}

/// Status of a queued pipeline event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum EventStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Filters describing a campaign's ideal customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdealCustomerProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_employees: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_employees: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industries: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
}

/// Per-factor breakdown of a lead score.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringFactors {
    #[serde(default)]
    pub website_quality: i64,
    #[serde(default)]
    pub contact_quality: i64,
    #[serde(default)]
    pub business_fit: i64,
    #[serde(default)]
    pub tech_fit: i64,
    #[serde(default)]
    pub location_fit: i64,
    #[serde(default)]
    pub notes: Vec<String>,
}

/// Context stored alongside a generated email.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalizationData {
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub tier: Option<Tier>,
    #[serde(default)]
    pub generated_at: Option<String>,
}

/// A customer organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Organization {
    pub id: String,
    pub name: String,
    pub plan: Plan,
    pub stripe_customer_id: Option<String>,
    pub created_at: String,
}

/// A prospecting campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Campaign {
    pub id: String,
    /// Owning organization.
    pub org_id: String,
    pub name: String,
    /// Kind of business being searched for (e.g. "dentist").
    pub business_type: String,
    pub target_location: String,
    pub search_radius_miles: i64,
    pub ideal_customer_profile: Option<Json<IdealCustomerProfile>>,
    pub status: CampaignStatus,
    pub created_at: String,
    pub updated_at: String,
}

/// A campaign with its prospect count, for list views.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct CampaignSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub campaign: Campaign,
    pub prospect_count: i64,
}

/// A discovered or imported business.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Prospect {
    pub id: String,
    pub campaign_id: String,
    pub company_name: String,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub source: ProspectSource,
    /// Identifier within the source directory; unique per campaign and source.
    pub source_id: Option<String>,
    pub tech_stack: Option<Json<serde_json::Value>>,
    pub status: ProspectStatus,
    pub created_at: String,
    pub updated_at: String,
}

/// A person at a prospect business.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Contact {
    pub id: String,
    pub prospect_id: String,
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub title: Option<String>,
    pub email: Option<String>,
    pub email_verified: bool,
    pub phone: Option<String>,
    pub linkedin_url: Option<String>,
    pub is_primary: bool,
    pub source: ContactSource,
    pub created_at: String,
}

impl Contact {
    /// First name for greetings: explicit first name, else first word of the name.
    pub fn greeting_name(&self) -> Option<&str> {
        self.first_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .or_else(|| self.name.as_deref().and_then(|n| n.split_whitespace().next()))
    }
}

/// The fit score for a prospect. At most one per prospect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct LeadScore {
    pub id: String,
    pub prospect_id: String,
    pub score: i64,
    pub tier: Tier,
    pub scoring_factors: Json<ScoringFactors>,
    pub model_version: String,
    pub scored_at: String,
}

/// A drafted or sent outreach email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct OutreachMessage {
    pub id: String,
    pub contact_id: String,
    pub campaign_id: String,
    pub subject: String,
    pub body: String,
    pub status: OutreachStatus,
    pub personalization_data: Option<Json<PersonalizationData>>,
    pub sequence_step: i64,
    pub scheduled_for: Option<String>,
    pub sent_at: Option<String>,
    pub opened_at: Option<String>,
    pub replied_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// A queued pipeline event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct EventRecord {
    pub id: String,
    /// Event name, e.g. `prospect/found`.
    pub name: String,
    pub payload: Json<serde_json::Value>,
    pub status: EventStatus,
    pub attempts: i64,
    pub last_error: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Generate a new row identifier.
pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
