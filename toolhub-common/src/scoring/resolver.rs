//! Score resolver
//!
//! Decides which scores to present for a tool in a category. Policy, first
//! match wins:
//!
//! 1. aggregated row with `confidence_score >= confidence_threshold`
//! 2. most recent active editorial row
//! 3. neutral defaults for every metric
//!
//! Every call yields exactly one source. Lack of data is never an error.

use std::collections::BTreeMap;

use sqlx::SqlitePool;
use tracing::debug;

use super::types::{clamp_score, AggregatedScore, EditorialScore, ResolvedScoreView, ScoreSource};
use crate::config::ScoringConfig;
use crate::criteria::{get_criteria, normalize_category, MetricDefinition};
use crate::db;
use crate::Result;

pub const LOW_CONFIDENCE_REASON: &str = "Low confidence score";
pub const NO_AGGREGATED_REASON: &str = "No aggregated scores";
pub const NO_SCORES_REASON: &str = "No aggregated or editorial scores";

fn from_aggregated(
    criteria: &[MetricDefinition],
    aggregated: &AggregatedScore,
    default_score: f64,
) -> BTreeMap<String, f64> {
    criteria
        .iter()
        .map(|m| {
            let score = aggregated
                .metric_scores
                .get(&m.metric_key)
                .filter(|stats| stats.count > 0)
                .map(|stats| stats.avg)
                .unwrap_or(default_score);
            (m.metric_key.clone(), clamp_score(score))
        })
        .collect()
}

fn from_editorial(
    criteria: &[MetricDefinition],
    editorial: &EditorialScore,
    default_score: f64,
) -> BTreeMap<String, f64> {
    criteria
        .iter()
        .map(|m| {
            let score = editorial
                .metric_scores
                .get(&m.metric_key)
                .copied()
                .filter(|v| v.is_finite())
                .unwrap_or(default_score);
            (m.metric_key.clone(), clamp_score(score))
        })
        .collect()
}

fn defaults(criteria: &[MetricDefinition], default_score: f64) -> BTreeMap<String, f64> {
    criteria
        .iter()
        .map(|m| (m.metric_key.clone(), clamp_score(default_score)))
        .collect()
}

/// Apply the fallback policy to already-loaded rows
///
/// Output keys are exactly the criteria keys. A metric the chosen source
/// has no value for gets the neutral default. An inactive editorial row is
/// treated as absent.
pub fn resolve_from(
    criteria: &[MetricDefinition],
    aggregated: Option<&AggregatedScore>,
    editorial: Option<&EditorialScore>,
    config: &ScoringConfig,
) -> ResolvedScoreView {
    let confidence_score = aggregated.map(|a| a.confidence_score);

    if let Some(agg) = aggregated {
        if agg.confidence_score >= config.confidence_threshold {
            return ResolvedScoreView {
                source: ScoreSource::Aggregated,
                metric_scores: from_aggregated(criteria, agg, config.default_score),
                fallback_reason: None,
                confidence_score,
            };
        }
    }

    if let Some(editorial) = editorial.filter(|e| e.is_active) {
        let reason = if aggregated.is_some() {
            LOW_CONFIDENCE_REASON
        } else {
            NO_AGGREGATED_REASON
        };
        return ResolvedScoreView {
            source: ScoreSource::Editorial,
            metric_scores: from_editorial(criteria, editorial, config.default_score),
            fallback_reason: Some(reason.to_string()),
            confidence_score,
        };
    }

    ResolvedScoreView {
        source: ScoreSource::Default,
        metric_scores: defaults(criteria, config.default_score),
        fallback_reason: Some(NO_SCORES_REASON.to_string()),
        confidence_score,
    }
}

/// Resolve the scores to display for a tool in a category
///
/// Reads whatever aggregated and editorial rows are current; a concurrent
/// recompute simply means the policy runs against the snapshot read here.
/// An aggregate computed for another category (the tool was moved, or the
/// caller asked about a different category) counts as no aggregate.
pub async fn resolve(
    pool: &SqlitePool,
    config: &ScoringConfig,
    tool_id: &str,
    category: &str,
) -> Result<ResolvedScoreView> {
    let wanted = normalize_category(category);
    let aggregated = db::aggregates::get_aggregated_score(pool, tool_id)
        .await?
        .filter(|agg| {
            let matches = normalize_category(&agg.category) == wanted;
            if !matches {
                debug!(
                    "Ignoring aggregate for tool {} computed for '{}', not '{}'",
                    tool_id, agg.category, wanted
                );
            }
            matches
        });
    let editorial = db::editorial::active_editorial_score(pool, tool_id, category).await?;

    let view = resolve_from(
        get_criteria(category),
        aggregated.as_ref(),
        editorial.as_ref(),
        config,
    );

    debug!(
        "Resolved tool {} ({}) from {} source{}",
        tool_id,
        category,
        view.source.as_str(),
        view.fallback_reason
            .as_deref()
            .map(|r| format!(": {}", r))
            .unwrap_or_default()
    );

    Ok(view)
}
