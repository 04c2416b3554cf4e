//! Enrichment: finds contacts and the tech stack for a discovered prospect.

use std::sync::Arc;

use async_trait::async_trait;
use database::{contact, prospect, ContactSource, Database, DatabaseError};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::bus::EventPublisher;
use crate::error::{PipelineError, Result};
use crate::events::{PipelineEvent, PROSPECT_FOUND};
use crate::handler::EventHandler;
use crate::providers::{ContactFinder, TechStackAnalyzer};

/// Handles `prospect/found`.
pub struct EnrichmentHandler {
    db: Database,
    publisher: Arc<dyn EventPublisher>,
    contacts: Arc<dyn ContactFinder>,
    tech_stack: Arc<dyn TechStackAnalyzer>,
}

impl EnrichmentHandler {
    pub fn new(
        db: Database,
        publisher: Arc<dyn EventPublisher>,
        contacts: Arc<dyn ContactFinder>,
        tech_stack: Arc<dyn TechStackAnalyzer>,
    ) -> Self {
        Self {
            db,
            publisher,
            contacts,
            tech_stack,
        }
    }
}

#[async_trait]
impl EventHandler for EnrichmentHandler {
    fn id(&self) -> &'static str {
        "enrichment-agent"
    }

    fn trigger(&self) -> &'static str {
        PROSPECT_FOUND
    }

    fn concurrency(&self) -> usize {
        20
    }

    async fn handle(&self, event: &PipelineEvent) -> Result<Value> {
        let PipelineEvent::ProspectFound { prospect_id, .. } = event else {
            return Err(PipelineError::UnexpectedEvent {
                handler: self.id(),
                event: event.name(),
            });
        };
        let pool = self.db.pool();

        let found = prospect::get_prospect(pool, prospect_id).await?;

        let candidates = match self.contacts.find(&found).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(
                    "Contact search failed for prospect {}, continuing without contacts: {}",
                    prospect_id, e
                );
                Vec::new()
            }
        };

        let tech_stack = match self.tech_stack.analyze(&found).await {
            Ok(stack) => stack,
            Err(e) => {
                warn!(
                    "Tech stack analysis failed for prospect {}: {}",
                    prospect_id, e
                );
                None
            }
        };

        // Contacts stored by an earlier attempt are not inserted twice
        let existing = contact::list_contacts(pool, prospect_id).await?;
        let mut inserted = 0;
        for candidate in &candidates {
            let known = candidate.email.as_deref().is_some_and(|email| {
                existing
                    .iter()
                    .filter_map(|c| c.email.as_deref())
                    .any(|stored| stored.eq_ignore_ascii_case(email.trim()))
            });
            if known {
                inserted += 1;
                continue;
            }
            match contact::create_contact(pool, prospect_id, candidate, ContactSource::Hunter).await {
                Ok(_) => inserted += 1,
                Err(e @ DatabaseError::Validation(_)) => {
                    warn!("Skipping invalid contact for prospect {}: {}", prospect_id, e)
                }
                Err(e) => return Err(e.into()),
            }
        }

        prospect::set_enrichment(pool, prospect_id, tech_stack.as_ref()).await?;

        self.publisher
            .publish(PipelineEvent::ProspectEnriched {
                prospect_id: prospect_id.clone(),
            })
            .await?;

        info!(
            "Enriched prospect {} ({} contacts, tech stack: {})",
            prospect_id,
            inserted,
            tech_stack.is_some()
        );

        Ok(json!({
            "prospect_id": prospect_id,
            "contacts_found": inserted,
            "has_tech_stack": tech_stack.is_some(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{FlakyPublisher, RecordingPublisher};
    use crate::providers::{SampleContactFinder, SampleTechStack};
    use database::{campaign, organization, NewCampaign, NewProspect, Plan, ProspectSource};
    use database::{Prospect, ProspectStatus};

    async fn setup() -> (Database, Arc<RecordingPublisher>, EnrichmentHandler) {
        let db = Database::in_memory().await.unwrap();
        let publisher = Arc::new(RecordingPublisher::new());
        let handler = EnrichmentHandler::new(
            db.clone(),
            publisher.clone(),
            Arc::new(SampleContactFinder),
            Arc::new(SampleTechStack),
        );
        (db, publisher, handler)
    }

    async fn new_prospect(db: &Database, website: Option<&str>) -> Prospect {
        let org = organization::create_organization(db.pool(), "Acme", Plan::Starter)
            .await
            .unwrap();
        let input = NewCampaign {
            name: "Austin dentists".to_string(),
            business_type: "dentist".to_string(),
            target_location: "Austin, TX".to_string(),
            ..Default::default()
        };
        let campaign = campaign::create_campaign(db.pool(), &org.id, &input)
            .await
            .unwrap();
        let input = NewProspect {
            campaign_id: campaign.id,
            company_name: "Bright Smiles".to_string(),
            website: website.map(str::to_string),
            ..Default::default()
        };
        prospect::create_prospect(db.pool(), &input, ProspectSource::Manual)
            .await
            .unwrap()
    }

    fn found(p: &Prospect) -> PipelineEvent {
        PipelineEvent::ProspectFound {
            prospect_id: p.id.clone(),
            campaign_id: p.campaign_id.clone(),
        }
    }

    #[tokio::test]
    async fn test_enriches_prospect_with_website() {
        let (db, publisher, handler) = setup().await;
        let p = new_prospect(&db, Some("https://brightsmiles.com")).await;

        let output = handler.handle(&found(&p)).await.unwrap();
        assert_eq!(output["contacts_found"], 1);
        assert_eq!(output["has_tech_stack"], true);

        let contacts = contact::list_contacts(db.pool(), &p.id).await.unwrap();
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].email.as_deref(), Some("john@brightsmiles.com"));
        assert_eq!(contacts[0].source, ContactSource::Hunter);
        assert!(contacts[0].is_primary);

        let updated = prospect::get_prospect(db.pool(), &p.id).await.unwrap();
        assert_eq!(updated.status, ProspectStatus::Enriched);
        assert_eq!(updated.tech_stack.unwrap().0["cms"], "WordPress");

        let events = publisher.events().await;
        assert_eq!(
            events,
            vec![PipelineEvent::ProspectEnriched {
                prospect_id: p.id.clone()
            }]
        );
    }

    #[tokio::test]
    async fn test_retry_after_failed_publish_keeps_one_contact() {
        let (db, _, _) = setup().await;
        let publisher = Arc::new(FlakyPublisher::failing(1));
        let handler = EnrichmentHandler::new(
            db.clone(),
            publisher.clone(),
            Arc::new(SampleContactFinder),
            Arc::new(SampleTechStack),
        );
        let p = new_prospect(&db, Some("https://brightsmiles.com")).await;

        assert!(handler.handle(&found(&p)).await.is_err());
        let output = handler.handle(&found(&p)).await.unwrap();
        assert_eq!(output["contacts_found"], 1);

        let contacts = contact::list_contacts(db.pool(), &p.id).await.unwrap();
        assert_eq!(contacts.len(), 1);
        assert_eq!(publisher.events().await.len(), 1);
    }

    #[tokio::test]
    async fn test_prospect_without_website() {
        let (db, publisher, handler) = setup().await;
        let p = new_prospect(&db, None).await;

        let output = handler.handle(&found(&p)).await.unwrap();
        assert_eq!(output["contacts_found"], 0);
        assert_eq!(output["has_tech_stack"], false);

        let updated = prospect::get_prospect(db.pool(), &p.id).await.unwrap();
        assert_eq!(updated.status, ProspectStatus::Enriched);
        assert!(updated.tech_stack.is_none());
        assert_eq!(publisher.events().await.len(), 1);
    }

    #[tokio::test]
    async fn test_wrong_event_is_rejected() {
        let (_db, _publisher, handler) = setup().await;
        let err = handler
            .handle(&PipelineEvent::OutreachSent {
                message_id: "m1".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::UnexpectedEvent {
                handler: "enrichment-agent",
                ..
            }
        ));
    }
}
