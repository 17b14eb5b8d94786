//! Review submission and moderation endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use toolhub_common::db::{reviews, tools};
use toolhub_common::db::reviews::NewReview;
use toolhub_common::scoring::{ReviewStatus, StructuredReview};
use uuid::Uuid;

use crate::{ApiResult, AppState};

/// POST /api/reviews
///
/// Stores the review as pending; it does not affect scores until approved.
pub async fn submit_review(
    State(state): State<AppState>,
    Json(new): Json<NewReview>,
) -> ApiResult<(StatusCode, Json<StructuredReview>)> {
    let review = reviews::submit_review(&state.db, new).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

#[derive(Debug, Deserialize)]
pub struct ReviewListQuery {
    pub status: Option<ReviewStatus>,
}

/// GET /api/tools/:tool_id/reviews
pub async fn list_tool_reviews(
    State(state): State<AppState>,
    Path(tool_id): Path<String>,
    Query(query): Query<ReviewListQuery>,
) -> ApiResult<Json<Vec<StructuredReview>>> {
    tools::get_tool(&state.db, &tool_id).await?;
    let list = reviews::list_reviews(&state.db, &tool_id, query.status).await?;
    Ok(Json(list))
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: ReviewStatus,
}

/// PUT /api/reviews/:review_id/status
///
/// Approving or un-approving a review recomputes the tool's aggregate.
pub async fn set_review_status(
    State(state): State<AppState>,
    Path(review_id): Path<Uuid>,
    Json(body): Json<StatusBody>,
) -> ApiResult<Json<StructuredReview>> {
    let review = reviews::set_review_status(&state.db, review_id, body.status).await?;
    Ok(Json(review))
}
