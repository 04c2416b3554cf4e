//! Event webhook: send pipeline events and inspect the queue.
//!
//! Both routes require the webhook key (see [`EventKey`]).

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use database::{event_queue, EventRecord};
use pipeline::{HandlerInfo, PipelineEvent};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::error::Result;
use crate::event_key::EventKey;
use crate::state::AppState;

/// How many recent events the listing returns.
const RECENT_EVENTS: i64 = 50;

/// An event as posted to the webhook.
#[derive(Debug, Deserialize)]
pub struct IncomingEvent {
    pub name: String,
    #[serde(default)]
    pub data: Value,
}

/// Registered functions and recent events.
#[derive(Serialize)]
pub struct EventOverview {
    pub functions: Vec<HandlerInfo>,
    pub events: Vec<EventRecord>,
}

/// Validate an event against the catalogue and enqueue it.
pub async fn send(
    State(state): State<AppState>,
    _key: EventKey,
    Json(incoming): Json<IncomingEvent>,
) -> Result<(StatusCode, Json<Value>)> {
    let event = PipelineEvent::from_parts(&incoming.name, incoming.data)?;
    let id = state.events.publish(event).await?;

    info!(event_id = %id, name = %incoming.name, "Event received");
    Ok((StatusCode::ACCEPTED, Json(json!({ "id": id }))))
}

/// List registered functions and the most recent events.
pub async fn list(State(state): State<AppState>, _key: EventKey) -> Result<Json<EventOverview>> {
    let events = event_queue::list_recent(state.db.pool(), RECENT_EVENTS).await?;
    Ok(Json(EventOverview {
        functions: state.functions.as_ref().clone(),
        events,
    }))
}

#[cfg(test)]
mod tests {
    use crate::routes::testing::{TestApp, EVENT_KEY};
    use axum::http::StatusCode;
    use database::event_queue;
    use pipeline::PipelineEvent;
    use serde_json::json;

    #[tokio::test]
    async fn test_send_known_event() {
        let app = TestApp::new().await;
        let (status, body) = app
            .call_webhook(
                Some(EVENT_KEY),
                "POST",
                "/api/events",
                Some(json!({"name": "prospect/enriched", "data": {"prospect_id": "p1"}})),
            )
            .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body["id"], "recorded-1");
        assert_eq!(
            app.events.events().await,
            vec![PipelineEvent::ProspectEnriched {
                prospect_id: "p1".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_unknown_or_malformed_event_rejected() {
        let app = TestApp::new().await;
        let (status, body) = app
            .call_webhook(
                Some(EVENT_KEY),
                "POST",
                "/api/events",
                Some(json!({"name": "lead/exploded"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("lead/exploded"));

        let (status, _) = app
            .call_webhook(
                Some(EVENT_KEY),
                "POST",
                "/api/events",
                Some(json!({"name": "prospect/scored", "data": {"prospect_id": "p1"}})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(app.events.events().await.is_empty());
    }

    #[tokio::test]
    async fn test_list_recent_events() {
        let app = TestApp::new().await;
        event_queue::enqueue(app.db.pool(), "outreach/sent", &json!({"message_id": "m1"}))
            .await
            .unwrap();

        let (status, body) = app
            .call_webhook(Some(EVENT_KEY), "GET", "/api/events", None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["functions"].as_array().unwrap().is_empty());
        let events = body["events"].as_array().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["name"], "outreach/sent");
        assert_eq!(events[0]["status"], "pending");
        assert_eq!(events[0]["attempts"], 0);
    }

    #[tokio::test]
    async fn test_webhook_requires_key() {
        let app = TestApp::new().await;
        event_queue::enqueue(
            app.db.pool(),
            "campaign/created",
            &json!({"campaign_id": "c9", "org_id": "other-org"}),
        )
        .await
        .unwrap();

        for key in [None, Some("wrong-key")] {
            let (status, body) = app.call_webhook(key, "GET", "/api/events", None).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert!(body.get("events").is_none());

            let (status, _) = app
                .call_webhook(
                    key,
                    "POST",
                    "/api/events",
                    Some(json!({"name": "outreach/sent", "data": {"message_id": "m1"}})),
                )
                .await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
        }

        // An organization header is not a webhook credential
        let (status, _) = app.call("GET", "/api/events", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(app.events.events().await.is_empty());
    }
}
