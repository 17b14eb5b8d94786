//! Tool comparison endpoint

use axum::{extract::State, Json};
use serde::Deserialize;
use toolhub_common::scoring::{self, ComparisonResult};

use crate::{ApiResult, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareRequest {
    pub tool_ids: Vec<String>,
}

/// POST /api/compare
///
/// Too few and too many tools fail with distinct error codes
/// (`INSUFFICIENT_TOOLS`, `TOO_MANY_TOOLS`) so the UI can word its guidance.
pub async fn compare(
    State(state): State<AppState>,
    Json(request): Json<CompareRequest>,
) -> ApiResult<Json<ComparisonResult>> {
    let result = scoring::compare_tools(&state.db, &state.scoring, &request.tool_ids).await?;
    Ok(Json(result))
}
