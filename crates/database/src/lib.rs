//! SQLite persistence layer for Tapflow.
//!
//! This crate provides async database operations for organizations,
//! campaigns, prospects, contacts, lead scores, outreach messages and the
//! pipeline event queue using SQLx with SQLite.
//!
//! # Example
//!
//! ```no_run
//! use database::{campaign, organization, Database, Plan};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:tapflow.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     // Onboard an organization and start a campaign
//!     let org = organization::create_organization(db.pool(), "Acme", Plan::Starter).await?;
//!     let input = campaign::NewCampaign {
//!         name: "Austin dentists".to_string(),
//!         business_type: "dentist".to_string(),
//!         target_location: "Austin, TX".to_string(),
//!         ..Default::default()
//!     };
//!     campaign::create_campaign(db.pool(), &org.id, &input).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod campaign;
pub mod contact;
pub mod error;
pub mod event_queue;
pub mod lead_score;
pub mod models;
pub mod organization;
pub mod outreach;
pub mod prospect;
pub mod validation;

pub use campaign::{CampaignStats, CampaignUpdate, NewCampaign, TierCounts};
pub use contact::NewContact;
pub use error::{DatabaseError, Result};
pub use models::{
    Campaign, CampaignStatus, CampaignSummary, Contact, ContactSource, EventRecord, EventStatus,
    IdealCustomerProfile, LeadScore, Organization, OutreachMessage, OutreachStatus,
    PersonalizationData, Plan, Prospect, ProspectSource, ProspectStatus, ScoringFactors, Tier,
};
pub use outreach::{NewOutreach, OutreachPage, OutreachStats, OutreachWithContact, PendingOutreach};
pub use prospect::{
    DiscoveredProspect, ImportRow, ImportSummary, NewProspect, ProspectDetail, ProspectFilter,
    ProspectPage, ProspectWithScore,
};
pub use validation::{PageRequest, ValidationError};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    /// Shared by the RPC handlers and the pipeline dispatcher.
    const DEFAULT_POOL_SIZE: u32 = 20;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example() -> database::Result<()> {
    /// let db = database::Database::connect("sqlite:data/tapflow.db?mode=rwc").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!(
            "Connected to database: {} (pool size: {})",
            url,
            pool_size
        );

        Ok(Self { pool })
    }

    /// Open a migrated in-memory database.
    ///
    /// Every `sqlite::memory:` connection is its own database, so the pool is
    /// held to a single connection.
    pub async fn in_memory() -> Result<Self> {
        let db = Self::connect_with_pool_size("sqlite::memory:", 1).await?;
        db.migrate().await?;
        Ok(db)
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_campaign_delete_cascades() {
        let db = Database::in_memory().await.unwrap();

        let org = organization::create_organization(db.pool(), "Acme", Plan::Starter)
            .await
            .unwrap();
        let campaign = campaign::create_campaign(
            db.pool(),
            &org.id,
            &NewCampaign {
                name: "Gyms".to_string(),
                business_type: "gym".to_string(),
                target_location: "Provo".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let prospect = prospect::upsert_discovered(
            db.pool(),
            &campaign.id,
            &DiscoveredProspect {
                company_name: "Iron Works".to_string(),
                address: None,
                phone: None,
                website: None,
                source: ProspectSource::Yelp,
                source_id: "y_1".to_string(),
            },
        )
        .await
        .unwrap();
        let contact = contact::create_contact(
            db.pool(),
            &prospect.id,
            &NewContact {
                email: Some("owner@ironworks.example".to_string()),
                ..Default::default()
            },
            ContactSource::Manual,
        )
        .await
        .unwrap();
        lead_score::upsert_score(
            db.pool(),
            &prospect.id,
            60,
            Tier::B,
            &ScoringFactors::default(),
            "v1",
        )
        .await
        .unwrap();

        let stats = campaign::campaign_stats(db.pool(), &campaign.id).await.unwrap();
        assert_eq!(stats.total_prospects, 1);
        assert_eq!(stats.by_tier.b, 1);
        assert_eq!(stats.by_status.get("new"), Some(&1));

        campaign::delete_campaign(db.pool(), &org.id, &campaign.id).await.unwrap();

        let result = prospect::get_prospect(db.pool(), &prospect.id).await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
        let result = contact::get_contact(db.pool(), &contact.id).await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
        assert!(lead_score::get_score(db.pool(), &prospect.id).await.unwrap().is_none());
    }
}
