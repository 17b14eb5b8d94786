//! Per-tool endpoints: registration, resolved scores, aggregates

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use toolhub_common::criteria::{get_criteria, MetricDefinition};
use toolhub_common::db::{aggregates, tools, Tool};
use toolhub_common::scoring::{self, AggregatedScore, ResolvedScoreView};

use crate::{ApiError, ApiResult, AppState};

/// Body of PUT /api/tools/:tool_id
#[derive(Debug, Deserialize)]
pub struct ToolBody {
    pub name: String,
    pub category: String,
}

/// PUT /api/tools/:tool_id
///
/// Registers or updates the tool projection the scoring core relies on.
pub async fn put_tool(
    State(state): State<AppState>,
    Path(tool_id): Path<String>,
    Json(body): Json<ToolBody>,
) -> ApiResult<Json<Tool>> {
    if body.category.trim().is_empty() {
        return Err(ApiError::BadRequest("category must not be empty".to_string()));
    }

    let tool = Tool {
        id: tool_id,
        name: body.name,
        category: body.category.trim().to_ascii_lowercase(),
    };
    tools::upsert_tool(&state.db, &tool).await?;

    Ok(Json(tool))
}

#[derive(Debug, Deserialize)]
pub struct ScoresQuery {
    /// Overrides the tool's own category
    pub category: Option<String>,
}

/// Resolved scores with the criteria needed to draw them
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoresResponse {
    pub tool_id: String,
    pub category: String,
    pub metrics: Vec<MetricDefinition>,
    #[serde(flatten)]
    pub resolved: ResolvedScoreView,
}

/// GET /api/tools/:tool_id/scores
pub async fn get_scores(
    State(state): State<AppState>,
    Path(tool_id): Path<String>,
    Query(query): Query<ScoresQuery>,
) -> ApiResult<Json<ScoresResponse>> {
    let tool = tools::get_tool(&state.db, &tool_id).await?;
    let category = query.category.unwrap_or(tool.category);

    let resolved = scoring::resolve(&state.db, &state.scoring, &tool.id, &category).await?;

    Ok(Json(ScoresResponse {
        tool_id: tool.id,
        metrics: get_criteria(&category).to_vec(),
        category,
        resolved,
    }))
}

/// GET /api/tools/:tool_id/aggregate
pub async fn get_aggregate(
    State(state): State<AppState>,
    Path(tool_id): Path<String>,
) -> ApiResult<Json<AggregatedScore>> {
    tools::get_tool(&state.db, &tool_id).await?;

    aggregates::get_aggregated_score(&state.db, &tool_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Aggregated score for tool {}", tool_id)))
}

/// POST /api/tools/:tool_id/aggregate
pub async fn recompute_aggregate(
    State(state): State<AppState>,
    Path(tool_id): Path<String>,
) -> ApiResult<Json<AggregatedScore>> {
    let tool = tools::get_tool(&state.db, &tool_id).await?;
    let aggregated = scoring::aggregate(&state.db, &tool.id, &tool.category).await?;
    Ok(Json(aggregated))
}
