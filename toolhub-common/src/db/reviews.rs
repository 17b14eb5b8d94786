//! Structured review store and moderation
//!
//! Reviews arrive as `pending` and only change through moderation. A status
//! change into or out of `approved` triggers a recompute of the tool's
//! aggregate. The recompute runs after the status write commits; if it
//! fails, the status change stands and the next scheduled recompute catches
//! the aggregate up.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::{info, warn};
use uuid::Uuid;

use crate::criteria::{is_known_metric, validate_metric_scores};
use crate::db::tools::get_tool;
use crate::scoring::{aggregate, ReviewStatus, StructuredReview, MAX_SCORE, MIN_SCORE};
use crate::{Error, Result};

/// User review submission
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    pub tool_id: String,
    pub user_id: String,
    /// Defaults to the tool's category; must match it when given
    pub category: Option<String>,
    pub metric_scores: BTreeMap<String, f64>,
    #[serde(default)]
    pub metric_comments: BTreeMap<String, String>,
    pub overall_rating: f64,
    #[serde(default)]
    pub is_verified: bool,
}

const SELECT_REVIEW: &str = r#"
    SELECT id, tool_id, user_id, category, metric_scores, metric_comments,
           overall_rating, is_verified, status, created_at, updated_at
    FROM structured_reviews
"#;

fn review_from_row(row: &SqliteRow) -> Result<StructuredReview> {
    let id: String = row.try_get("id")?;
    let metric_scores_json: String = row.try_get("metric_scores")?;
    let metric_comments_json: String = row.try_get("metric_comments")?;
    let is_verified: i64 = row.try_get("is_verified")?;
    let status: String = row.try_get("status")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at")?;

    Ok(StructuredReview {
        id: Uuid::parse_str(&id)
            .map_err(|e| Error::Internal(format!("Corrupt review id {}: {}", id, e)))?,
        tool_id: row.try_get("tool_id")?,
        user_id: row.try_get("user_id")?,
        category: row.try_get("category")?,
        metric_scores: serde_json::from_str(&metric_scores_json)?,
        metric_comments: serde_json::from_str(&metric_comments_json)?,
        overall_rating: row.try_get("overall_rating")?,
        is_verified: is_verified != 0,
        status: status.parse()?,
        created_at,
        updated_at,
    })
}

/// Validate and store a review as `pending`
pub async fn submit_review(pool: &SqlitePool, new: NewReview) -> Result<StructuredReview> {
    let tool = get_tool(pool, &new.tool_id).await?;

    let category = match new.category {
        Some(category) if !category.trim().eq_ignore_ascii_case(&tool.category) => {
            return Err(Error::InvalidInput(format!(
                "Review category '{}' does not match tool category '{}'",
                category, tool.category
            )));
        }
        _ => tool.category,
    };

    if new.user_id.trim().is_empty() {
        return Err(Error::InvalidInput("userId must not be empty".to_string()));
    }
    if !new.overall_rating.is_finite()
        || new.overall_rating < MIN_SCORE
        || new.overall_rating > MAX_SCORE
    {
        return Err(Error::InvalidInput(format!(
            "overallRating must be between {} and {}, got {}",
            MIN_SCORE, MAX_SCORE, new.overall_rating
        )));
    }
    validate_metric_scores(&category, &new.metric_scores)?;
    if let Some(key) = new
        .metric_comments
        .keys()
        .find(|key| !is_known_metric(&category, key))
    {
        return Err(Error::InvalidInput(format!(
            "Comment for unknown metric '{}' in category '{}'",
            key, category
        )));
    }

    let now = Utc::now();
    let review = StructuredReview {
        id: Uuid::new_v4(),
        tool_id: tool.id,
        user_id: new.user_id,
        category,
        metric_scores: new.metric_scores,
        metric_comments: new.metric_comments,
        overall_rating: new.overall_rating,
        is_verified: new.is_verified,
        status: ReviewStatus::Pending,
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO structured_reviews (
            id, tool_id, user_id, category, metric_scores, metric_comments,
            overall_rating, is_verified, status, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(review.id.to_string())
    .bind(&review.tool_id)
    .bind(&review.user_id)
    .bind(&review.category)
    .bind(serde_json::to_string(&review.metric_scores)?)
    .bind(serde_json::to_string(&review.metric_comments)?)
    .bind(review.overall_rating)
    .bind(review.is_verified)
    .bind(review.status.as_str())
    .bind(review.created_at)
    .bind(review.updated_at)
    .execute(pool)
    .await?;

    info!("Review {} submitted for tool {}", review.id, review.tool_id);
    Ok(review)
}

/// Fetch one review by id
pub async fn get_review(pool: &SqlitePool, id: Uuid) -> Result<StructuredReview> {
    let sql = format!("{} WHERE id = ?", SELECT_REVIEW);
    let row = sqlx::query(&sql)
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Review {}", id)))?;

    review_from_row(&row)
}

/// Reviews for a tool, oldest first, optionally filtered by status
pub async fn list_reviews(
    pool: &SqlitePool,
    tool_id: &str,
    status: Option<ReviewStatus>,
) -> Result<Vec<StructuredReview>> {
    let rows = match status {
        Some(status) => {
            let sql = format!(
                "{} WHERE tool_id = ? AND status = ? ORDER BY created_at ASC, rowid ASC",
                SELECT_REVIEW
            );
            sqlx::query(&sql)
                .bind(tool_id)
                .bind(status.as_str())
                .fetch_all(pool)
                .await?
        }
        None => {
            let sql = format!("{} WHERE tool_id = ? ORDER BY created_at ASC, rowid ASC", SELECT_REVIEW);
            sqlx::query(&sql).bind(tool_id).fetch_all(pool).await?
        }
    };

    rows.iter().map(review_from_row).collect()
}

/// Approved reviews for a tool, the aggregator's input set
pub async fn approved_reviews_for_tool(pool: &SqlitePool, tool_id: &str) -> Result<Vec<StructuredReview>> {
    list_reviews(pool, tool_id, Some(ReviewStatus::Approved)).await
}

/// Moderate a review
///
/// Moving into or out of `approved` recomputes the tool's aggregate.
pub async fn set_review_status(
    pool: &SqlitePool,
    id: Uuid,
    status: ReviewStatus,
) -> Result<StructuredReview> {
    let existing = get_review(pool, id).await?;
    let now = Utc::now();

    sqlx::query("UPDATE structured_reviews SET status = ?, updated_at = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(now)
        .bind(id.to_string())
        .execute(pool)
        .await?;

    info!(
        "Review {} for tool {}: {} -> {}",
        id, existing.tool_id, existing.status, status
    );

    let crosses_approval =
        (existing.status == ReviewStatus::Approved) != (status == ReviewStatus::Approved);
    if crosses_approval {
        let recomputed = match get_tool(pool, &existing.tool_id).await {
            Ok(tool) => aggregate(pool, &tool.id, &tool.category).await.map(|_| ()),
            Err(e) => Err(e),
        };
        if let Err(e) = recomputed {
            warn!(
                "Recompute after moderating review {} failed, aggregate for tool {} is stale: {}",
                id, existing.tool_id, e
            );
        }
    }

    Ok(StructuredReview {
        status,
        updated_at: now,
        ..existing
    })
}
