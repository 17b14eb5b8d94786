//! Aggregated score persistence
//!
//! One row per tool. Writers upsert the full row, so concurrent recomputes
//! resolve as last-write-wins without application locks.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use crate::scoring::{AggregatedScore, MetricStats};
use crate::Result;

/// Insert or replace the aggregate row for `aggregated.tool_id`
pub async fn upsert_aggregated_score(pool: &SqlitePool, aggregated: &AggregatedScore) -> Result<()> {
    let metric_scores_json = serde_json::to_string(&aggregated.metric_scores)?;

    sqlx::query(
        r#"
        INSERT INTO aggregated_scores (
            tool_id, category, metric_scores, overall_average,
            total_reviews, verified_reviews, editorial_reviews,
            confidence_score, last_calculated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(tool_id) DO UPDATE SET
            category = excluded.category,
            metric_scores = excluded.metric_scores,
            overall_average = excluded.overall_average,
            total_reviews = excluded.total_reviews,
            verified_reviews = excluded.verified_reviews,
            editorial_reviews = excluded.editorial_reviews,
            confidence_score = excluded.confidence_score,
            last_calculated_at = excluded.last_calculated_at
        "#,
    )
    .bind(&aggregated.tool_id)
    .bind(&aggregated.category)
    .bind(&metric_scores_json)
    .bind(aggregated.overall_average)
    .bind(i64::from(aggregated.total_reviews))
    .bind(i64::from(aggregated.verified_reviews))
    .bind(i64::from(aggregated.editorial_reviews))
    .bind(aggregated.confidence_score)
    .bind(aggregated.last_calculated_at)
    .execute(pool)
    .await?;

    Ok(())
}

fn aggregated_from_row(row: &SqliteRow) -> Result<AggregatedScore> {
    let metric_scores_json: String = row.try_get("metric_scores")?;
    let metric_scores: BTreeMap<String, MetricStats> = serde_json::from_str(&metric_scores_json)?;
    let total_reviews: i64 = row.try_get("total_reviews")?;
    let verified_reviews: i64 = row.try_get("verified_reviews")?;
    let editorial_reviews: i64 = row.try_get("editorial_reviews")?;
    let last_calculated_at: DateTime<Utc> = row.try_get("last_calculated_at")?;

    Ok(AggregatedScore {
        tool_id: row.try_get("tool_id")?,
        category: row.try_get("category")?,
        metric_scores,
        overall_average: row.try_get("overall_average")?,
        total_reviews: total_reviews.max(0) as u32,
        verified_reviews: verified_reviews.max(0) as u32,
        editorial_reviews: editorial_reviews.max(0) as u32,
        confidence_score: row.try_get("confidence_score")?,
        last_calculated_at,
    })
}

/// Fetch the aggregate row for a tool, if one has been computed
pub async fn get_aggregated_score(pool: &SqlitePool, tool_id: &str) -> Result<Option<AggregatedScore>> {
    let row = sqlx::query(
        r#"
        SELECT tool_id, category, metric_scores, overall_average,
               total_reviews, verified_reviews, editorial_reviews,
               confidence_score, last_calculated_at
        FROM aggregated_scores
        WHERE tool_id = ?
        "#,
    )
    .bind(tool_id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(aggregated_from_row).transpose()
}

/// Overwrite the editorial count on an existing aggregate row
///
/// Returns false when the tool has no aggregate row yet.
pub async fn set_editorial_reviews(pool: &SqlitePool, tool_id: &str, editorial_reviews: u32) -> Result<bool> {
    let result = sqlx::query("UPDATE aggregated_scores SET editorial_reviews = ? WHERE tool_id = ?")
        .bind(i64::from(editorial_reviews))
        .bind(tool_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
