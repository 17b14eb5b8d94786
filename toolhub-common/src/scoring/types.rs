//! Scoring data model
//!
//! Rows read from and written to the relational store, plus the per-request
//! views computed from them. JSON field names are camelCase because these
//! types are handed straight to the web frontend.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

/// Lowest score any metric can carry
pub const MIN_SCORE: f64 = 0.0;

/// Highest score any metric can carry
pub const MAX_SCORE: f64 = 10.0;

/// Clamp a metric score into `[MIN_SCORE, MAX_SCORE]`
///
/// NaN collapses to `MIN_SCORE` so a corrupt value can never escape the range.
pub fn clamp_score(value: f64) -> f64 {
    if value.is_nan() {
        MIN_SCORE
    } else {
        value.clamp(MIN_SCORE, MAX_SCORE)
    }
}

/// Moderation state of a structured review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Pending,
    Approved,
    Rejected,
}

impl ReviewStatus {
    /// Convert to database/string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::Approved => "approved",
            ReviewStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(ReviewStatus::Pending),
            "approved" => Ok(ReviewStatus::Approved),
            "rejected" => Ok(ReviewStatus::Rejected),
            other => Err(Error::InvalidInput(format!("Unknown review status: {}", other))),
        }
    }
}

/// One user's evaluation of one tool in one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredReview {
    pub id: Uuid,
    pub tool_id: String,
    pub user_id: String,
    pub category: String,
    pub metric_scores: BTreeMap<String, f64>,
    pub metric_comments: BTreeMap<String, String>,
    pub overall_rating: f64,
    pub is_verified: bool,
    pub status: ReviewStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Summary statistics for one metric across approved reviews
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricStats {
    pub avg: f64,
    pub count: u32,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

/// Cached aggregate of a tool's approved reviews, one row per tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedScore {
    pub tool_id: String,
    pub category: String,
    pub metric_scores: BTreeMap<String, MetricStats>,
    pub overall_average: f64,
    pub total_reviews: u32,
    pub verified_reviews: u32,
    pub editorial_reviews: u32,
    pub confidence_score: f64,
    pub last_calculated_at: DateTime<Utc>,
}

/// Curator-entered scores for a tool in a category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorialScore {
    pub id: Uuid,
    pub tool_id: String,
    pub category: String,
    pub metric_scores: BTreeMap<String, f64>,
    pub editor_id: String,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Which data source a resolved view was built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreSource {
    Aggregated,
    Editorial,
    Default,
}

impl ScoreSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreSource::Aggregated => "aggregated",
            ScoreSource::Editorial => "editorial",
            ScoreSource::Default => "default",
        }
    }
}

/// Scores to display for one tool, computed per request and never persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedScoreView {
    pub source: ScoreSource,
    pub metric_scores: BTreeMap<String, f64>,
    pub fallback_reason: Option<String>,
    /// Confidence of the aggregated row consulted, if one existed
    pub confidence_score: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_score() {
        assert_eq!(clamp_score(-3.0), 0.0);
        assert_eq!(clamp_score(4.25), 4.25);
        assert_eq!(clamp_score(11.0), 10.0);
        assert_eq!(clamp_score(f64::NAN), 0.0);
        assert_eq!(clamp_score(f64::INFINITY), 10.0);
    }

    #[test]
    fn test_review_status_parse() {
        assert_eq!("approved".parse::<ReviewStatus>().unwrap(), ReviewStatus::Approved);
        assert_eq!(" Pending ".parse::<ReviewStatus>().unwrap(), ReviewStatus::Pending);
        assert!("archived".parse::<ReviewStatus>().is_err());
    }

    #[test]
    fn test_resolved_view_serializes_camel_case() {
        let mut scores = BTreeMap::new();
        scores.insert("contentQuality".to_string(), 5.0);
        let view = ResolvedScoreView {
            source: ScoreSource::Default,
            metric_scores: scores,
            fallback_reason: Some("No aggregated or editorial scores".to_string()),
            confidence_score: None,
        };

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["source"], "default");
        assert_eq!(json["metricScores"]["contentQuality"], 5.0);
        assert_eq!(json["fallbackReason"], "No aggregated or editorial scores");
    }
}
