//! End-to-end runs of the campaign pipeline against an in-memory store.

use std::sync::Arc;
use std::time::Duration;

use brain_core::Brain;
use database::{
    campaign, event_queue, organization, outreach, prospect, Database, EventStatus, NewCampaign,
    OutreachStatus, PageRequest, Plan, ProspectFilter, ProspectStatus, Tier,
};
use mock_brain::ScriptedBrain;
use pipeline::{
    standard_handlers, Dispatcher, DispatcherConfig, EventBus, EventPublisher, PipelineEvent,
    Providers,
};

struct Harness {
    db: Database,
    bus: Arc<EventBus>,
    dispatcher: Dispatcher,
    org_id: String,
    campaign_id: String,
}

async fn harness(brain: Option<Arc<dyn Brain>>) -> Harness {
    let db = Database::in_memory().await.unwrap();
    let bus = Arc::new(EventBus::new(db.clone()));

    let config = DispatcherConfig::default().with_retry_backoff(Duration::from_millis(1));
    let mut dispatcher = Dispatcher::for_bus(&bus, config);
    for handler in standard_handlers(db.clone(), bus.clone(), Providers::sample(), brain) {
        dispatcher.register(handler);
    }

    let org = organization::create_organization(db.pool(), "Acme Growth", Plan::Growth)
        .await
        .unwrap();
    let input = NewCampaign {
        name: "Austin dentists".to_string(),
        business_type: "dentist".to_string(),
        target_location: "Austin, TX".to_string(),
        ..Default::default()
    };
    let created = campaign::create_campaign(db.pool(), &org.id, &input)
        .await
        .unwrap();

    Harness {
        db,
        bus,
        dispatcher,
        org_id: org.id,
        campaign_id: created.id,
    }
}

impl Harness {
    async fn launch(&self) {
        self.bus
            .publish(PipelineEvent::CampaignCreated {
                campaign_id: self.campaign_id.clone(),
                org_id: self.org_id.clone(),
            })
            .await
            .unwrap();
        self.dispatcher.run_until_idle().await.unwrap();
    }
}

#[tokio::test]
async fn test_campaign_runs_to_pending_outreach() {
    let h = harness(None).await;
    h.launch().await;
    let pool = h.db.pool();

    let page = prospect::list_prospects(
        pool,
        &h.org_id,
        &h.campaign_id,
        ProspectFilter::default(),
        PageRequest::default(),
    )
    .await
    .unwrap();
    assert_eq!(page.total, 2);

    for row in &page.prospects {
        assert_eq!(row.prospect.status, ProspectStatus::Scored);
        assert_eq!(row.contacts.len(), 1);
        assert!(row.prospect.tech_stack.is_some());

        let score = row.lead_score.as_ref().unwrap();
        assert_eq!(score.score, 80);
        assert_eq!(score.tier, Tier::A);
    }

    let pending = outreach::list_pending(pool, &h.org_id, Some(&h.campaign_id))
        .await
        .unwrap();
    assert_eq!(pending.len(), 2);
    for message in &pending {
        assert_eq!(message.message.status, OutreachStatus::PendingApproval);
        assert!(message.message.subject.starts_with("Quick question about Sample dentist"));
        assert!(message.message.body.starts_with("Hi John,"));
        assert_eq!(message.campaign_name, "Austin dentists");
    }

    // campaign/created, then found, enriched, scored and generated per prospect
    let events = event_queue::list_recent(pool, 100).await.unwrap();
    assert_eq!(events.len(), 9);
    assert!(events.iter().all(|e| e.status == EventStatus::Completed));
    assert_eq!(
        event_queue::list_by_name(pool, "outreach/generated")
            .await
            .unwrap()
            .len(),
        2
    );

    let stats = campaign::campaign_stats(pool, &h.campaign_id).await.unwrap();
    assert_eq!(stats.total_prospects, 2);
    assert_eq!(stats.by_tier.a, 2);
}

#[tokio::test]
async fn test_tier_c_leads_get_no_outreach() {
    let brain = Arc::new(ScriptedBrain::always(
        r#"{"score": 20, "tier": "C", "notes": ["Not a fit"]}"#,
    ));
    let h = harness(Some(brain.clone())).await;
    h.launch().await;
    let pool = h.db.pool();

    let filter = ProspectFilter {
        tier: Some(Tier::C),
        ..Default::default()
    };
    let page = prospect::list_prospects(pool, &h.org_id, &h.campaign_id, filter, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total, 2);

    let pending = outreach::list_pending(pool, &h.org_id, None).await.unwrap();
    assert!(pending.is_empty());
    assert!(event_queue::list_by_name(pool, "prospect/scored")
        .await
        .unwrap()
        .is_empty());

    // Only the scoring agent prompted the model
    assert_eq!(brain.call_count().await, 2);
}

#[tokio::test]
async fn test_relaunch_does_not_duplicate_prospects() {
    let h = harness(None).await;
    h.launch().await;
    h.launch().await;

    let page = prospect::list_prospects(
        h.db.pool(),
        &h.org_id,
        &h.campaign_id,
        ProspectFilter::default(),
        PageRequest::default(),
    )
    .await
    .unwrap();
    assert_eq!(page.total, 2);
}
