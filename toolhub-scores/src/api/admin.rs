//! Maintenance endpoints

use axum::{extract::State, Json};
use serde::Serialize;
use toolhub_common::scoring;

use crate::{ApiResult, AppState};

#[derive(Debug, Serialize)]
pub struct RecomputeResponse {
    pub recomputed: usize,
}

/// POST /api/admin/recompute
///
/// Recomputes the aggregate of every tool that has reviews.
pub async fn recompute_all(State(state): State<AppState>) -> ApiResult<Json<RecomputeResponse>> {
    let recomputed = scoring::recompute_all(&state.db).await?;
    Ok(Json(RecomputeResponse { recomputed }))
}
