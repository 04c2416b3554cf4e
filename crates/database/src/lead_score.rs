//! Lead score persistence. One score per prospect; rescoring replaces it.

use sqlx::types::Json;
use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{new_id, LeadScore, ScoringFactors, Tier};
use crate::validation::validate_range;

/// Insert or replace the score for a prospect.
pub async fn upsert_score(
    pool: &SqlitePool,
    prospect_id: &str,
    score: i64,
    tier: Tier,
    factors: &ScoringFactors,
    model_version: &str,
) -> Result<LeadScore> {
    validate_range("score", score, 0, 100)?;

    sqlx::query(
        r#"
        INSERT INTO lead_scores (id, prospect_id, score, tier, scoring_factors, model_version)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT (prospect_id) DO UPDATE SET
            score = excluded.score,
            tier = excluded.tier,
            scoring_factors = excluded.scoring_factors,
            model_version = excluded.model_version,
            scored_at = strftime('%Y-%m-%d %H:%M:%f', 'now')
        "#,
    )
    .bind(new_id())
    .bind(prospect_id)
    .bind(score)
    .bind(tier)
    .bind(Json(factors))
    .bind(model_version)
    .execute(pool)
    .await?;

    get_score(pool, prospect_id)
        .await?
        .ok_or_else(|| DatabaseError::not_found("LeadScore", prospect_id))
}

/// Get the score for a prospect, if it has been scored.
pub async fn get_score(pool: &SqlitePool, prospect_id: &str) -> Result<Option<LeadScore>> {
    let score = sqlx::query_as::<_, LeadScore>(
        r#"
        SELECT id, prospect_id, score, tier, scoring_factors, model_version, scored_at
        FROM lead_scores
        WHERE prospect_id = ?
        "#,
    )
    .bind(prospect_id)
    .fetch_optional(pool)
    .await?;

    Ok(score)
}
