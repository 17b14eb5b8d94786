//! Editorial override endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use toolhub_common::db::editorial::{self, NewEditorialScore};
use toolhub_common::db::tools;
use toolhub_common::scoring::EditorialScore;
use uuid::Uuid;

use crate::{ApiResult, AppState};

/// POST /api/tools/:tool_id/editorial
pub async fn create_editorial(
    State(state): State<AppState>,
    Path(tool_id): Path<String>,
    Json(new): Json<NewEditorialScore>,
) -> ApiResult<(StatusCode, Json<EditorialScore>)> {
    let created = editorial::create_editorial_score(&state.db, &tool_id, new).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/tools/:tool_id/editorial
///
/// Full history, newest first, inactive rows included.
pub async fn list_editorial(
    State(state): State<AppState>,
    Path(tool_id): Path<String>,
) -> ApiResult<Json<Vec<EditorialScore>>> {
    tools::get_tool(&state.db, &tool_id).await?;
    let history = editorial::list_editorial_scores(&state.db, &tool_id).await?;
    Ok(Json(history))
}

/// POST /api/editorial/:editorial_id/deactivate
pub async fn deactivate_editorial(
    State(state): State<AppState>,
    Path(editorial_id): Path<Uuid>,
) -> ApiResult<Json<EditorialScore>> {
    let retired = editorial::deactivate_editorial_score(&state.db, editorial_id).await?;
    Ok(Json(retired))
}
