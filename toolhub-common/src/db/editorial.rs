//! Editorial override store
//!
//! Curators enter scores for tools whose user data is thin. Rows are never
//! deleted; deactivation retires a row and the newest active row per
//! tool/category is the one the resolver uses.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::{info, warn};
use uuid::Uuid;

use crate::criteria::{normalize_category, validate_metric_scores};
use crate::db::aggregates::{get_aggregated_score, set_editorial_reviews};
use crate::db::tools::get_tool;
use crate::scoring::{clamp_score, EditorialScore};
use crate::{Error, Result};

/// Curator submission
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEditorialScore {
    /// Defaults to the tool's own category; must match it when given
    pub category: Option<String>,
    pub metric_scores: BTreeMap<String, f64>,
    pub editor_id: String,
    pub notes: Option<String>,
    /// Retire earlier active rows for the same tool/category
    #[serde(default = "default_deactivate_previous")]
    pub deactivate_previous: bool,
}

fn default_deactivate_previous() -> bool {
    true
}

const SELECT_EDITORIAL: &str = r#"
    SELECT id, tool_id, category, metric_scores, editor_id, notes, is_active, created_at
    FROM editorial_scores
"#;

fn editorial_from_row(row: &SqliteRow) -> Result<EditorialScore> {
    let id: String = row.try_get("id")?;
    let metric_scores_json: String = row.try_get("metric_scores")?;
    let is_active: i64 = row.try_get("is_active")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;

    Ok(EditorialScore {
        id: Uuid::parse_str(&id)
            .map_err(|e| Error::Internal(format!("Corrupt editorial id {}: {}", id, e)))?,
        tool_id: row.try_get("tool_id")?,
        category: row.try_get("category")?,
        metric_scores: serde_json::from_str(&metric_scores_json)?,
        editor_id: row.try_get("editor_id")?,
        notes: row.try_get("notes")?,
        is_active: is_active != 0,
        created_at,
    })
}

async fn refresh_editorial_count(pool: &SqlitePool, tool_id: &str) -> Result<()> {
    let Some(aggregated) = get_aggregated_score(pool, tool_id).await? else {
        return Ok(());
    };
    let count = count_active_editorial(pool, tool_id, &aggregated.category).await?;
    set_editorial_reviews(pool, tool_id, count).await?;
    Ok(())
}

/// Keep the stored aggregate's editorial count in step with the active rows
///
/// A tool without an aggregate row is left alone; the next aggregation
/// counts the rows itself. A failure here leaves the count stale until the
/// next recompute, so it is logged rather than returned.
async fn sync_editorial_count(pool: &SqlitePool, tool_id: &str) {
    if let Err(e) = refresh_editorial_count(pool, tool_id).await {
        warn!("Editorial count for tool {} is stale: {}", tool_id, e);
    }
}

/// Store a curator's scores for a tool
///
/// The row is filed under the tool's own category, the one the resolver
/// reads. Metric keys must belong to that category's criteria.
pub async fn create_editorial_score(
    pool: &SqlitePool,
    tool_id: &str,
    new: NewEditorialScore,
) -> Result<EditorialScore> {
    let tool = get_tool(pool, tool_id).await?;
    let tool_category = normalize_category(&tool.category);
    let category = match new.category {
        Some(category) if normalize_category(&category) != tool_category => {
            return Err(Error::InvalidInput(format!(
                "Editorial category '{}' does not match tool category '{}'",
                category, tool.category
            )));
        }
        _ => tool_category,
    };

    if new.editor_id.trim().is_empty() {
        return Err(Error::InvalidInput("editorId must not be empty".to_string()));
    }
    validate_metric_scores(&category, &new.metric_scores)?;

    let editorial = EditorialScore {
        id: Uuid::new_v4(),
        tool_id: tool.id,
        category,
        metric_scores: new
            .metric_scores
            .into_iter()
            .map(|(k, v)| (k, clamp_score(v)))
            .collect(),
        editor_id: new.editor_id,
        notes: new.notes,
        is_active: true,
        created_at: Utc::now(),
    };

    let mut tx = pool.begin().await?;

    if new.deactivate_previous {
        sqlx::query(
            "UPDATE editorial_scores SET is_active = 0 WHERE tool_id = ? AND category = ? AND is_active = 1",
        )
        .bind(&editorial.tool_id)
        .bind(&editorial.category)
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query(
        r#"
        INSERT INTO editorial_scores (
            id, tool_id, category, metric_scores, editor_id, notes, is_active, created_at
        )
        VALUES (?, ?, ?, ?, ?, ?, 1, ?)
        "#,
    )
    .bind(editorial.id.to_string())
    .bind(&editorial.tool_id)
    .bind(&editorial.category)
    .bind(serde_json::to_string(&editorial.metric_scores)?)
    .bind(&editorial.editor_id)
    .bind(&editorial.notes)
    .bind(editorial.created_at)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    info!(
        "Editorial score {} stored for tool {} ({}) by {}",
        editorial.id, editorial.tool_id, editorial.category, editorial.editor_id
    );

    sync_editorial_count(pool, &editorial.tool_id).await;

    Ok(editorial)
}

/// Newest active editorial row for a tool/category (any letter case)
pub async fn active_editorial_score(
    pool: &SqlitePool,
    tool_id: &str,
    category: &str,
) -> Result<Option<EditorialScore>> {
    let sql = format!(
        "{} WHERE tool_id = ? AND category = ? AND is_active = 1 ORDER BY created_at DESC, rowid DESC LIMIT 1",
        SELECT_EDITORIAL
    );
    let row = sqlx::query(&sql)
        .bind(tool_id)
        .bind(normalize_category(category))
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(editorial_from_row).transpose()
}

/// Number of active editorial rows for a tool/category
pub async fn count_active_editorial(pool: &SqlitePool, tool_id: &str, category: &str) -> Result<u32> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM editorial_scores WHERE tool_id = ? AND category = ? AND is_active = 1",
    )
    .bind(tool_id)
    .bind(normalize_category(category))
    .fetch_one(pool)
    .await?;

    Ok(count.max(0) as u32)
}

/// Fetch one editorial row by id
pub async fn get_editorial_score(pool: &SqlitePool, id: Uuid) -> Result<EditorialScore> {
    let sql = format!("{} WHERE id = ?", SELECT_EDITORIAL);
    let row = sqlx::query(&sql)
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Editorial score {}", id)))?;

    editorial_from_row(&row)
}

/// Retire an editorial row; the row itself is kept
pub async fn deactivate_editorial_score(pool: &SqlitePool, id: Uuid) -> Result<EditorialScore> {
    let result = sqlx::query("UPDATE editorial_scores SET is_active = 0 WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Editorial score {}", id)));
    }

    info!("Editorial score {} deactivated", id);
    let retired = get_editorial_score(pool, id).await?;
    sync_editorial_count(pool, &retired.tool_id).await;

    Ok(retired)
}

/// Full editorial history for a tool, newest first
pub async fn list_editorial_scores(pool: &SqlitePool, tool_id: &str) -> Result<Vec<EditorialScore>> {
    let sql = format!(
        "{} WHERE tool_id = ? ORDER BY created_at DESC, rowid DESC",
        SELECT_EDITORIAL
    );
    let rows = sqlx::query(&sql).bind(tool_id).fetch_all(pool).await?;

    rows.iter().map(editorial_from_row).collect()
}
