//! Contact operations.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{new_id, Contact, ContactSource};
use crate::prospect::get_prospect_for_org;
use crate::validation::{validate_email, validate_url};

/// Input for a new contact.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewContact {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
}

/// Insert a contact for a prospect.
pub async fn create_contact(
    pool: &SqlitePool,
    prospect_id: &str,
    input: &NewContact,
    source: ContactSource,
) -> Result<Contact> {
    if let Some(ref email) = input.email {
        validate_email(email)?;
    }
    if let Some(ref linkedin) = input.linkedin_url {
        validate_url("linkedin_url", linkedin)?;
    }

    let id = new_id();
    sqlx::query(
        r#"
        INSERT INTO contacts (id, prospect_id, name, first_name, last_name, title, email,
                              email_verified, phone, linkedin_url, is_primary, source)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(prospect_id)
    .bind(&input.name)
    .bind(&input.first_name)
    .bind(&input.last_name)
    .bind(&input.title)
    .bind(input.email.as_deref().map(str::trim))
    .bind(input.email_verified)
    .bind(&input.phone)
    .bind(&input.linkedin_url)
    .bind(input.is_primary)
    .bind(source)
    .execute(pool)
    .await?;

    get_contact(pool, &id).await
}

/// Add a manually entered contact to a prospect owned by `org_id`.
pub async fn add_contact_for_org(
    pool: &SqlitePool,
    org_id: &str,
    prospect_id: &str,
    input: &NewContact,
) -> Result<Contact> {
    get_prospect_for_org(pool, org_id, prospect_id).await?;
    create_contact(pool, prospect_id, input, ContactSource::Manual).await
}

/// Get a contact by ID.
pub async fn get_contact(pool: &SqlitePool, id: &str) -> Result<Contact> {
    sqlx::query_as::<_, Contact>(
        r#"
        SELECT id, prospect_id, name, first_name, last_name, title, email, email_verified,
               phone, linkedin_url, is_primary, source, created_at
        FROM contacts
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::not_found("Contact", id))
}

/// List a prospect's contacts, primary contact first.
pub async fn list_contacts(pool: &SqlitePool, prospect_id: &str) -> Result<Vec<Contact>> {
    let contacts = sqlx::query_as::<_, Contact>(
        r#"
        SELECT id, prospect_id, name, first_name, last_name, title, email, email_verified,
               phone, linkedin_url, is_primary, source, created_at
        FROM contacts
        WHERE prospect_id = ?
        ORDER BY is_primary DESC, created_at ASC, rowid ASC
        "#,
    )
    .bind(prospect_id)
    .fetch_all(pool)
    .await?;

    Ok(contacts)
}
