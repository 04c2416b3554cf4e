//! External data providers used by discovery and enrichment.
//!
//! Each provider sits behind a trait so the handlers can run against the
//! built-in sample providers or a real integration.

mod contacts;
mod directory;
mod tech_stack;

use std::sync::Arc;

pub use contacts::{ContactFinder, SampleContactFinder};
pub use directory::{DirectorySearch, SampleGoogleMaps, SampleYelp, SearchQuery};
pub use tech_stack::{SampleTechStack, TechStackAnalyzer};

/// The provider set handed to the pipeline handlers.
#[derive(Clone)]
pub struct Providers {
    /// Directories searched by discovery, in order.
    pub directories: Vec<Arc<dyn DirectorySearch>>,
    pub contacts: Arc<dyn ContactFinder>,
    pub tech_stack: Arc<dyn TechStackAnalyzer>,
}

impl Providers {
    /// Providers that return canned sample data without network access.
    pub fn sample() -> Self {
        Self {
            directories: vec![Arc::new(SampleGoogleMaps), Arc::new(SampleYelp)],
            contacts: Arc::new(SampleContactFinder),
            tech_stack: Arc::new(SampleTechStack),
        }
    }
}

impl std::fmt::Debug for Providers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let directories: Vec<&str> = self.directories.iter().map(|d| d.name()).collect();
        f.debug_struct("Providers")
            .field("directories", &directories)
            .field("contacts", &self.contacts.name())
            .field("tech_stack", &self.tech_stack.name())
            .finish()
    }
}
