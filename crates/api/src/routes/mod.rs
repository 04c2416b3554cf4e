//! Route handlers for the Tapflow API.

pub mod campaigns;
pub mod events;
pub mod health;
pub mod leads;
pub mod organizations;
pub mod outreach;

use axum::routing::{get, patch, post};
use axum::Router;

use crate::state::AppState;

/// Build the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/api/health", get(health::health))
        // Onboarding
        .route("/api/organizations", post(organizations::create))
        .route("/api/organizations/current", get(organizations::current))
        // Campaigns
        .route("/api/campaigns", get(campaigns::list).post(campaigns::create))
        .route(
            "/api/campaigns/:id",
            get(campaigns::get)
                .patch(campaigns::update)
                .delete(campaigns::delete),
        )
        // Leads
        .route("/api/campaigns/:id/leads", get(leads::list))
        .route("/api/campaigns/:id/leads/import", post(leads::import))
        .route("/api/leads", post(leads::create))
        .route("/api/leads/:id", get(leads::get).delete(leads::delete))
        .route("/api/leads/:id/status", patch(leads::update_status))
        .route("/api/leads/:id/contacts", post(leads::add_contact))
        // Outreach
        .route("/api/campaigns/:id/outreach", get(outreach::list))
        .route("/api/outreach", post(outreach::create))
        .route("/api/outreach/pending", get(outreach::pending))
        .route("/api/outreach/stats", get(outreach::stats))
        .route("/api/outreach/approve", post(outreach::bulk_approve))
        .route("/api/outreach/:id", get(outreach::get).patch(outreach::update))
        .route("/api/outreach/:id/approve", post(outreach::approve))
        .route("/api/outreach/:id/reject", post(outreach::reject))
        // Event webhook
        .route("/api/events", get(events::list).post(events::send))
}

#[cfg(test)]
pub(crate) mod testing {
    //! Router harness for route tests.

    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use database::{organization, Database, Plan};
    use pipeline::RecordingPublisher;
    use serde_json::Value;
    use tower::util::ServiceExt;

    use crate::org::ORG_HEADER;
    use crate::state::AppState;

    /// Webhook key the harness configures.
    pub const EVENT_KEY: &str = "test-event-key";

    pub struct TestApp {
        pub db: Database,
        pub events: Arc<RecordingPublisher>,
        pub org_id: String,
        router: Router,
    }

    impl TestApp {
        pub async fn new() -> Self {
            let db = Database::in_memory().await.unwrap();
            let events = Arc::new(RecordingPublisher::new());
            let org = organization::create_organization(db.pool(), "Acme", Plan::Starter)
                .await
                .unwrap();
            let state = AppState::new(db.clone(), events.clone(), Vec::new())
                .with_event_key(Some(EVENT_KEY.to_string()));

            Self {
                db,
                events,
                org_id: org.id,
                router: super::router().with_state(state),
            }
        }

        /// Send a request as the test organization.
        pub async fn call(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
            let org_id = self.org_id.clone();
            self.call_as(Some(&org_id), method, uri, body).await
        }

        /// Send a request with an explicit (or no) organization header.
        pub async fn call_as(
            &self,
            org_id: Option<&str>,
            method: &str,
            uri: &str,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let headers: Vec<(&str, String)> = org_id
                .map(|id| vec![(ORG_HEADER, id.to_string())])
                .unwrap_or_default();
            self.send(&headers, method, uri, body).await
        }

        /// Call the event webhook with the given (or no) key.
        pub async fn call_webhook(
            &self,
            key: Option<&str>,
            method: &str,
            uri: &str,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let headers: Vec<(&str, String)> = key
                .map(|key| vec![("authorization", format!("Bearer {key}"))])
                .unwrap_or_default();
            self.send(&headers, method, uri, body).await
        }

        async fn send(
            &self,
            headers: &[(&str, String)],
            method: &str,
            uri: &str,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            for (name, value) in headers {
                builder = builder.header(*name, value.as_str());
            }
            let request = match body {
                Some(json) => builder
                    .header("content-type", "application/json")
                    .body(Body::from(json.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };

            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let json = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap_or(Value::Null)
            };
            (status, json)
        }
    }
}
