//! toolhub-scores library - scoring service
//!
//! HTTP front for the scoring core: criteria, resolved scores, comparisons,
//! review moderation and editorial overrides.

use axum::Router;
use sqlx::SqlitePool;
use toolhub_common::ScoringConfig;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;

pub use crate::error::{ApiError, ApiResult};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Resolver and comparison tunables
    pub scoring: ScoringConfig,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, scoring: ScoringConfig) -> Self {
        Self { db, scoring }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post, put};

    Router::new()
        .route("/api/criteria/:category", get(api::get_criteria))
        .route("/api/tools/:tool_id", put(api::put_tool))
        .route("/api/tools/:tool_id/scores", get(api::get_scores))
        .route(
            "/api/tools/:tool_id/aggregate",
            get(api::get_aggregate).post(api::recompute_aggregate),
        )
        .route(
            "/api/tools/:tool_id/reviews",
            get(api::list_tool_reviews),
        )
        .route(
            "/api/tools/:tool_id/editorial",
            get(api::list_editorial).post(api::create_editorial),
        )
        .route("/api/compare", post(api::compare))
        .route("/api/reviews", post(api::submit_review))
        .route("/api/reviews/:review_id/status", put(api::set_review_status))
        .route("/api/editorial/:editorial_id/deactivate", post(api::deactivate_editorial))
        .route("/api/admin/recompute", post(api::recompute_all))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
