//! Contact discovery for a company website.

use async_trait::async_trait;
use database::{NewContact, Prospect};
use tracing::info;
use url::Url;

use crate::error::{PipelineError, Result};

/// Finds decision-maker contacts for a prospect.
#[async_trait]
pub trait ContactFinder: Send + Sync {
    fn name(&self) -> &'static str;

    /// Find contacts. Prospects without a website yield none.
    async fn find(&self, prospect: &Prospect) -> Result<Vec<NewContact>>;
}

/// Email finder returning one sample owner per website.
#[derive(Debug, Clone, Copy, Default)]
pub struct SampleContactFinder;

#[async_trait]
impl ContactFinder for SampleContactFinder {
    fn name(&self) -> &'static str {
        "hunter"
    }

    async fn find(&self, prospect: &Prospect) -> Result<Vec<NewContact>> {
        let Some(website) = prospect.website.as_deref() else {
            return Ok(Vec::new());
        };

        info!("Searching Hunter.io for contacts at: {}", website);

        let url = Url::parse(website).map_err(|e| PipelineError::Provider {
            provider: self.name(),
            message: format!("invalid website {}: {}", website, e),
        })?;
        let host = url.host_str().ok_or_else(|| PipelineError::Provider {
            provider: self.name(),
            message: format!("website {} has no host", website),
        })?;

        Ok(vec![NewContact {
            name: Some("John Smith".to_string()),
            first_name: Some("John".to_string()),
            last_name: Some("Smith".to_string()),
            title: Some("Owner".to_string()),
            email: Some(format!("john@{}", host)),
            is_primary: true,
            ..Default::default()
        }])
    }
}
