//! Discovery: finds prospects for a new campaign.

use std::sync::Arc;

use async_trait::async_trait;
use database::{campaign, prospect, Database};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::bus::EventPublisher;
use crate::error::{PipelineError, Result};
use crate::events::{PipelineEvent, CAMPAIGN_CREATED};
use crate::handler::EventHandler;
use crate::providers::{DirectorySearch, SearchQuery};

/// Handles `campaign/created` by searching every directory and upserting
/// the results as `new` prospects.
pub struct DiscoveryHandler {
    db: Database,
    publisher: Arc<dyn EventPublisher>,
    directories: Vec<Arc<dyn DirectorySearch>>,
}

impl DiscoveryHandler {
    pub fn new(
        db: Database,
        publisher: Arc<dyn EventPublisher>,
        directories: Vec<Arc<dyn DirectorySearch>>,
    ) -> Self {
        Self {
            db,
            publisher,
            directories,
        }
    }
}

#[async_trait]
impl EventHandler for DiscoveryHandler {
    fn id(&self) -> &'static str {
        "discovery-agent"
    }

    fn trigger(&self) -> &'static str {
        CAMPAIGN_CREATED
    }

    fn concurrency(&self) -> usize {
        10
    }

    async fn handle(&self, event: &PipelineEvent) -> Result<Value> {
        let PipelineEvent::CampaignCreated { campaign_id, .. } = event else {
            return Err(PipelineError::UnexpectedEvent {
                handler: self.id(),
                event: event.name(),
            });
        };
        let pool = self.db.pool();

        let campaign = campaign::get_campaign(pool, campaign_id).await?;
        let query = SearchQuery {
            business_type: campaign.business_type.clone(),
            location: campaign.target_location.clone(),
            radius_miles: campaign.search_radius_miles,
        };

        let mut found = Vec::new();
        for directory in &self.directories {
            match directory.search(&query).await {
                Ok(results) => found.extend(results),
                Err(e) => warn!(
                    "Directory {} failed for campaign {}, skipping: {}",
                    directory.name(),
                    campaign_id,
                    e
                ),
            }
        }

        let mut inserted = Vec::with_capacity(found.len());
        for listing in &found {
            inserted.push(prospect::upsert_discovered(pool, campaign_id, listing).await?);
        }

        for row in &inserted {
            self.publisher
                .publish(PipelineEvent::ProspectFound {
                    prospect_id: row.id.clone(),
                    campaign_id: campaign_id.clone(),
                })
                .await?;
        }

        info!(
            "Discovered {} prospects for campaign {}",
            inserted.len(),
            campaign_id
        );

        Ok(json!({
            "campaign_id": campaign_id,
            "prospects_found": inserted.len(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::RecordingPublisher;
    use crate::providers::{SampleGoogleMaps, SampleYelp};
    use database::{organization, NewCampaign, Plan, ProspectFilter, ProspectStatus};
    use database::{PageRequest, ProspectSource};

    async fn setup() -> (Database, Arc<RecordingPublisher>, DiscoveryHandler) {
        let db = Database::in_memory().await.unwrap();
        let publisher = Arc::new(RecordingPublisher::new());
        let handler = DiscoveryHandler::new(
            db.clone(),
            publisher.clone(),
            vec![Arc::new(SampleGoogleMaps), Arc::new(SampleYelp)],
        );
        (db, publisher, handler)
    }

    async fn new_campaign(db: &Database) -> (String, String) {
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
        (org.id, campaign.id)
    }

    #[tokio::test]
    async fn test_discovers_and_emits() {
        let (db, publisher, handler) = setup().await;
        let (org_id, campaign_id) = new_campaign(&db).await;

        let event = PipelineEvent::CampaignCreated {
            campaign_id: campaign_id.clone(),
            org_id: org_id.clone(),
        };
        let output = handler.handle(&event).await.unwrap();
        assert_eq!(output["prospects_found"], 2);
        assert_eq!(output["campaign_id"], campaign_id.as_str());

        let page = prospect::list_prospects(
            db.pool(),
            &org_id,
            &campaign_id,
            ProspectFilter::default(),
            PageRequest::default(),
        )
        .await
        .unwrap();
        assert_eq!(page.total, 2);
        assert!(page
            .prospects
            .iter()
            .all(|p| p.prospect.status == ProspectStatus::New
                && p.prospect.source == ProspectSource::GoogleMaps));

        let events = publisher.events().await;
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.name() == "prospect/found"));
    }

    #[tokio::test]
    async fn test_rediscovery_does_not_duplicate() {
        let (db, _publisher, handler) = setup().await;
        let (org_id, campaign_id) = new_campaign(&db).await;
        let event = PipelineEvent::CampaignCreated {
            campaign_id: campaign_id.clone(),
            org_id: org_id.clone(),
        };

        handler.handle(&event).await.unwrap();
        handler.handle(&event).await.unwrap();

        let page = prospect::list_prospects(
            db.pool(),
            &org_id,
            &campaign_id,
            ProspectFilter::default(),
            PageRequest::default(),
        )
        .await
        .unwrap();
        assert_eq!(page.total, 2);
    }

    #[tokio::test]
    async fn test_missing_campaign_is_an_error() {
        let (_db, publisher, handler) = setup().await;
        let event = PipelineEvent::CampaignCreated {
            campaign_id: "missing".to_string(),
            org_id: "o1".to_string(),
        };
        let err = handler.handle(&event).await.unwrap_err();
        assert!(matches!(err, PipelineError::Database(_)));
        assert!(publisher.events().await.is_empty());
    }
}
