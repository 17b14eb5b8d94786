//! Review aggregator
//!
//! Folds a tool's approved structured reviews into one [`AggregatedScore`]
//! and upserts it keyed by tool id. Recomputation always starts from the full
//! approved review set, so concurrent recomputes for the same tool converge
//! on the same row regardless of which write lands last.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{info, warn};

use super::confidence::{confidence_score, ConfidenceInputs};
use super::types::{clamp_score, AggregatedScore, MetricStats, ReviewStatus, StructuredReview};
use crate::criteria::get_criteria;
use crate::db;
use crate::Result;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Count, mean, population standard deviation, min and max of `values`
///
/// An empty slice yields the all-zero stats with `count = 0`.
pub fn metric_stats(values: &[f64]) -> MetricStats {
    if values.is_empty() {
        return MetricStats::default();
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    MetricStats {
        avg: mean,
        count: values.len() as u32,
        std_dev: variance.sqrt(),
        min,
        max,
    }
}

/// Compute the aggregate for a tool from its reviews
///
/// Only approved reviews contribute. Metrics come from the category's
/// criteria; a review that skips a metric is left out of that metric's
/// statistics rather than counted as zero. Keys outside the criteria are
/// ignored.
pub fn compute_aggregate(
    tool_id: &str,
    category: &str,
    reviews: &[StructuredReview],
    editorial_reviews: u32,
    calculated_at: DateTime<Utc>,
) -> AggregatedScore {
    let approved: Vec<&StructuredReview> = reviews
        .iter()
        .filter(|r| r.status == ReviewStatus::Approved)
        .collect();

    let criteria = get_criteria(category);

    let ignored: BTreeSet<&str> = approved
        .iter()
        .flat_map(|r| r.metric_scores.keys())
        .filter(|key| !criteria.iter().any(|m| &m.metric_key == *key))
        .map(String::as_str)
        .collect();
    if !ignored.is_empty() {
        warn!(
            "Ignoring metrics outside '{}' criteria for tool {}: {:?}",
            category, tool_id, ignored
        );
    }

    let mut metric_scores = BTreeMap::new();
    let mut std_devs = Vec::new();
    let mut averages = Vec::new();

    for metric in criteria {
        let values: Vec<f64> = approved
            .iter()
            .filter_map(|r| r.metric_scores.get(&metric.metric_key))
            .filter(|v| v.is_finite())
            .map(|v| clamp_score(*v))
            .collect();

        let stats = metric_stats(&values);
        if stats.count > 0 {
            std_devs.push(stats.std_dev);
            averages.push(stats.avg);
        }

        metric_scores.insert(
            metric.metric_key.clone(),
            MetricStats {
                avg: round2(stats.avg),
                std_dev: round2(stats.std_dev),
                ..stats
            },
        );
    }

    // Unweighted across metrics so heavily-answered metrics don't dominate
    let overall_average = if averages.is_empty() {
        0.0
    } else {
        round2(averages.iter().sum::<f64>() / averages.len() as f64)
    };

    let mean_std_dev = if std_devs.is_empty() {
        0.0
    } else {
        std_devs.iter().sum::<f64>() / std_devs.len() as f64
    };

    let total_reviews = approved.len() as u32;
    let verified_reviews = approved.iter().filter(|r| r.is_verified).count() as u32;

    AggregatedScore {
        tool_id: tool_id.to_string(),
        category: category.to_string(),
        metric_scores,
        overall_average,
        total_reviews,
        verified_reviews,
        editorial_reviews,
        confidence_score: confidence_score(ConfidenceInputs {
            total_reviews,
            verified_reviews,
            mean_std_dev,
        }),
        last_calculated_at: calculated_at,
    }
}

/// Recompute and upsert the aggregate for one tool
///
/// Zero approved reviews is not an error: the stored row is the all-zero
/// record with confidence 0. Fails with `NotFound` for an unknown tool id.
pub async fn aggregate(pool: &SqlitePool, tool_id: &str, category: &str) -> Result<AggregatedScore> {
    db::tools::get_tool(pool, tool_id).await?;

    let reviews = db::reviews::approved_reviews_for_tool(pool, tool_id).await?;
    let editorial_reviews = db::editorial::count_active_editorial(pool, tool_id, category).await?;

    let aggregated = compute_aggregate(tool_id, category, &reviews, editorial_reviews, Utc::now());
    db::aggregates::upsert_aggregated_score(pool, &aggregated).await?;

    info!(
        "Aggregated tool {} ({}): {} reviews, {} verified, confidence {:.2}",
        tool_id,
        category,
        aggregated.total_reviews,
        aggregated.verified_reviews,
        aggregated.confidence_score
    );

    Ok(aggregated)
}

/// Recompute aggregates for every tool that has at least one review
///
/// Returns the number of tools recomputed.
pub async fn recompute_all(pool: &SqlitePool) -> Result<usize> {
    let tools = db::tools::tools_with_reviews(pool).await?;

    for tool in &tools {
        aggregate(pool, &tool.id, &tool.category).await?;
    }

    info!("Recomputed aggregates for {} tools", tools.len());
    Ok(tools.len())
}
