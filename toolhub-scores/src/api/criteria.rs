//! Category criteria endpoint

use axum::{extract::Path, Json};
use serde::Serialize;
use toolhub_common::criteria::{self, MetricDefinition};

/// Criteria for one category
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CriteriaResponse {
    pub category: String,
    /// False when the category has no criteria and no chart should render
    pub supported: bool,
    pub metrics: Vec<MetricDefinition>,
}

/// GET /api/criteria/:category
///
/// An unknown category returns an empty metric list, not an error.
pub async fn get_criteria(Path(category): Path<String>) -> Json<CriteriaResponse> {
    let metrics = criteria::get_criteria(&category).to_vec();

    Json(CriteriaResponse {
        category,
        supported: !metrics.is_empty(),
        metrics,
    })
}
