//! Tool lookups

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::criteria::normalize_category;
use crate::{Error, Result};

/// A directory tool as seen by the scoring core
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tool {
    pub id: String,
    pub name: String,
    pub category: String,
}

/// Insert or update a tool
///
/// The category is stored in canonical form.
pub async fn upsert_tool(pool: &SqlitePool, tool: &Tool) -> Result<()> {
    if tool.id.trim().is_empty() {
        return Err(Error::InvalidInput("Tool id must not be empty".to_string()));
    }

    sqlx::query(
        r#"
        INSERT INTO tools (id, name, category)
        VALUES (?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            category = excluded.category,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(&tool.id)
    .bind(&tool.name)
    .bind(normalize_category(&tool.category))
    .execute(pool)
    .await?;

    Ok(())
}

/// Fetch a tool if it exists
pub async fn find_tool(pool: &SqlitePool, tool_id: &str) -> Result<Option<Tool>> {
    let row = sqlx::query_as::<_, (String, String, String)>(
        "SELECT id, name, category FROM tools WHERE id = ?",
    )
    .bind(tool_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|(id, name, category)| Tool { id, name, category }))
}

/// Fetch a tool, failing with `NotFound` if it doesn't exist
pub async fn get_tool(pool: &SqlitePool, tool_id: &str) -> Result<Tool> {
    find_tool(pool, tool_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Tool {}", tool_id)))
}

/// Tools with at least one review of any status
pub async fn tools_with_reviews(pool: &SqlitePool) -> Result<Vec<Tool>> {
    let rows = sqlx::query_as::<_, (String, String, String)>(
        r#"
        SELECT t.id, t.name, t.category
        FROM tools t
        WHERE EXISTS (SELECT 1 FROM structured_reviews r WHERE r.tool_id = t.id)
        ORDER BY t.id ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, name, category)| Tool { id, name, category })
        .collect())
}
