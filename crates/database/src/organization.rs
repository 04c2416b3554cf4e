//! Organization CRUD operations.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{new_id, Organization, Plan};
use crate::validation::validate_required;

/// Create a new organization.
pub async fn create_organization(pool: &SqlitePool, name: &str, plan: Plan) -> Result<Organization> {
    validate_required("name", name)?;

    let id = new_id();
    sqlx::query(
        r#"
        INSERT INTO organizations (id, name, plan)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(name.trim())
    .bind(plan)
    .execute(pool)
    .await?;

    get_organization(pool, &id).await
}

/// Get an organization by ID.
pub async fn get_organization(pool: &SqlitePool, id: &str) -> Result<Organization> {
    sqlx::query_as::<_, Organization>(
        r#"
        SELECT id, name, plan, stripe_customer_id, created_at
        FROM organizations
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::not_found("Organization", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    #[tokio::test]
    async fn test_organization_roundtrip() {
        let db = Database::in_memory().await.unwrap();

        let org = create_organization(db.pool(), "  Acme Growth ", Plan::Growth)
            .await
            .unwrap();
        assert_eq!(org.name, "Acme Growth");
        assert_eq!(org.plan, Plan::Growth);
        assert!(org.stripe_customer_id.is_none());

        let fetched = get_organization(db.pool(), &org.id).await.unwrap();
        assert_eq!(fetched, org);
    }

    #[tokio::test]
    async fn test_organization_not_found() {
        let db = Database::in_memory().await.unwrap();
        let result = get_organization(db.pool(), "missing").await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
        assert!(create_organization(db.pool(), "", Plan::Starter).await.is_err());
    }
}
