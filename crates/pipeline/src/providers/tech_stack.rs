//! Website technology detection.

use async_trait::async_trait;
use database::Prospect;
use serde_json::{json, Value};
use tracing::info;

use crate::error::Result;

/// Detects the technologies a prospect's website runs on.
#[async_trait]
pub trait TechStackAnalyzer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Analyze the website; `None` when there is nothing to analyze.
    async fn analyze(&self, prospect: &Prospect) -> Result<Option<Value>>;
}

/// Analyzer reporting a fixed WordPress stack for any website.
#[derive(Debug, Clone, Copy, Default)]
pub struct SampleTechStack;

#[async_trait]
impl TechStackAnalyzer for SampleTechStack {
    fn name(&self) -> &'static str {
        "tech_stack"
    }

    async fn analyze(&self, prospect: &Prospect) -> Result<Option<Value>> {
        let Some(website) = prospect.website.as_deref() else {
            return Ok(None);
        };

        info!("Analyzing tech stack for: {}", website);

        Ok(Some(json!({
            "cms": "WordPress",
            "ecommerce": null,
            "analytics": ["Google Analytics"],
            "marketing": [],
        })))
    }
}
