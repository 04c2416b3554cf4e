//! Business directory search.

use async_trait::async_trait;
use database::{DiscoveredProspect, ProspectSource};
use tracing::info;

use crate::error::Result;

/// What discovery searches for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub business_type: String,
    pub location: String,
    pub radius_miles: i64,
}

/// A directory of local businesses, such as a maps or reviews listing.
#[async_trait]
pub trait DirectorySearch: Send + Sync {
    /// Provider name for logs.
    fn name(&self) -> &'static str;

    /// Source recorded on prospects found here.
    fn source(&self) -> ProspectSource;

    /// Search the directory.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<DiscoveredProspect>>;
}

/// Maps listing returning two fixed sample businesses.
#[derive(Debug, Clone, Copy, Default)]
pub struct SampleGoogleMaps;

#[async_trait]
impl DirectorySearch for SampleGoogleMaps {
    fn name(&self) -> &'static str {
        "google_maps"
    }

    fn source(&self) -> ProspectSource {
        ProspectSource::GoogleMaps
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<DiscoveredProspect>> {
        info!(
            "Searching Google Maps for: {} in {}",
            query.business_type, query.location
        );

        let listing = |n: u32, street: &str, phone: &str| DiscoveredProspect {
            company_name: format!("Sample {} {}", query.business_type, n),
            address: Some(format!("{}, {}", street, query.location)),
            phone: Some(phone.to_string()),
            website: Some(format!("https://example{}.com", n)),
            source: self.source(),
            source_id: format!("gm_sample_{}", n),
        };

        Ok(vec![
            listing(1, "123 Main St", "555-0100"),
            listing(2, "456 Oak Ave", "555-0200"),
        ])
    }
}

/// Reviews listing with no sample data.
#[derive(Debug, Clone, Copy, Default)]
pub struct SampleYelp;

#[async_trait]
impl DirectorySearch for SampleYelp {
    fn name(&self) -> &'static str {
        "yelp"
    }

    fn source(&self) -> ProspectSource {
        ProspectSource::Yelp
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<DiscoveredProspect>> {
        info!("Searching Yelp for: {} in {}", query.business_type, query.location);
        Ok(Vec::new())
    }
}
