//! Comparison engine
//!
//! Side-by-side view of two or three tools built from their resolved scores.
//! [`compare`] is a pure function; [`compare_tools`] loads and resolves the
//! tools first.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;

use super::resolver::resolve;
use super::types::{clamp_score, ResolvedScoreView, ScoreSource};
use crate::config::ScoringConfig;
use crate::criteria::get_criteria;
use crate::db;
use crate::Result;

/// Fewest tools a comparison accepts
pub const MIN_COMPARE_TOOLS: usize = 2;

/// Scores closer than this are tied
const TIE_TOLERANCE: f64 = 1e-9;

/// Rejected tool selections
///
/// Too few and too many are separate variants so callers can show different
/// guidance for each.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComparisonError {
    #[error("At least {min} tools are required for a comparison, got {count}")]
    InsufficientToolsForComparison { count: usize, min: usize },

    #[error("At most {max} tools can be compared at once, got {count}")]
    TooManyToolsForComparison { count: usize, max: usize },

    #[error("Tool {0} appears more than once")]
    DuplicateTool(String),
}

impl ComparisonError {
    /// Stable machine-readable code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            ComparisonError::InsufficientToolsForComparison { .. } => "INSUFFICIENT_TOOLS",
            ComparisonError::TooManyToolsForComparison { .. } => "TOO_MANY_TOOLS",
            ComparisonError::DuplicateTool(_) => "DUPLICATE_TOOL",
        }
    }
}

/// One tool's resolved scores, as fed to [`compare`]
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonEntry {
    pub tool_id: String,
    pub category: String,
    pub resolved: ResolvedScoreView,
}

/// Winners of one metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricChampion {
    pub metric_key: String,
    pub label: String,
    pub max_value: f64,
    /// Every tool scoring `max_value`; ties are not broken
    pub champions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolValue {
    pub tool_id: String,
    pub score: f64,
}

/// One bar group of the comparison chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarChartRow {
    pub metric_key: String,
    pub label: String,
    pub average: f64,
    pub values: Vec<ToolValue>,
}

/// One tool's row of the comparison table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    pub tool_id: String,
    pub category: String,
    pub source: ScoreSource,
    pub fallback_reason: Option<String>,
    pub scores: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub tool_ids: Vec<String>,
    /// Per-metric winners, in metric display order
    pub champions: Vec<MetricChampion>,
    /// Sorted by across-tool average, highest first
    pub bar_chart: Vec<BarChartRow>,
    /// Input tool order
    pub table: Vec<TableRow>,
}

/// Check the size and uniqueness of a tool selection
pub fn validate_selection<S: AsRef<str>>(
    tool_ids: &[S],
    max_tools: usize,
) -> std::result::Result<(), ComparisonError> {
    if tool_ids.len() < MIN_COMPARE_TOOLS {
        return Err(ComparisonError::InsufficientToolsForComparison {
            count: tool_ids.len(),
            min: MIN_COMPARE_TOOLS,
        });
    }
    if tool_ids.len() > max_tools {
        return Err(ComparisonError::TooManyToolsForComparison {
            count: tool_ids.len(),
            max: max_tools,
        });
    }

    let mut seen = HashSet::new();
    for id in tool_ids {
        if !seen.insert(id.as_ref()) {
            return Err(ComparisonError::DuplicateTool(id.as_ref().to_string()));
        }
    }

    Ok(())
}

/// Ordered (key, label) pairs across all entries, first-seen order
fn metric_columns(entries: &[ComparisonEntry]) -> Vec<(String, String)> {
    let mut columns: Vec<(String, String)> = Vec::new();

    for entry in entries {
        for metric in get_criteria(&entry.category) {
            if !columns.iter().any(|(key, _)| key == &metric.metric_key) {
                columns.push((metric.metric_key.clone(), metric.label.clone()));
            }
        }
        for key in entry.resolved.metric_scores.keys() {
            if !columns.iter().any(|(k, _)| k == key) {
                columns.push((key.clone(), key.clone()));
            }
        }
    }

    columns
}

/// Build champions, bar chart and table for two or more resolved tools
///
/// Tools may come from different sources or categories; a metric is compared
/// only among the tools that carry it.
pub fn compare(
    entries: &[ComparisonEntry],
    max_tools: usize,
) -> std::result::Result<ComparisonResult, ComparisonError> {
    let ids: Vec<&str> = entries.iter().map(|e| e.tool_id.as_str()).collect();
    validate_selection(&ids, max_tools)?;

    let mut champions = Vec::new();
    let mut bar_chart = Vec::new();

    for (metric_key, label) in metric_columns(entries) {
        let values: Vec<ToolValue> = entries
            .iter()
            .filter_map(|e| {
                e.resolved.metric_scores.get(&metric_key).map(|score| ToolValue {
                    tool_id: e.tool_id.clone(),
                    score: clamp_score(*score),
                })
            })
            .collect();

        if values.is_empty() {
            continue;
        }

        let max_value = values
            .iter()
            .map(|v| v.score)
            .fold(f64::NEG_INFINITY, f64::max);
        let winners = values
            .iter()
            .filter(|v| (max_value - v.score).abs() <= TIE_TOLERANCE)
            .map(|v| v.tool_id.clone())
            .collect();
        let average = values.iter().map(|v| v.score).sum::<f64>() / values.len() as f64;

        champions.push(MetricChampion {
            metric_key: metric_key.clone(),
            label: label.clone(),
            max_value,
            champions: winners,
        });
        bar_chart.push(BarChartRow {
            metric_key,
            label,
            average,
            values,
        });
    }

    // stable: equal averages keep display order
    bar_chart.sort_by(|a, b| b.average.partial_cmp(&a.average).unwrap_or(Ordering::Equal));

    let table = entries
        .iter()
        .map(|e| TableRow {
            tool_id: e.tool_id.clone(),
            category: e.category.clone(),
            source: e.resolved.source,
            fallback_reason: e.resolved.fallback_reason.clone(),
            scores: e
                .resolved
                .metric_scores
                .iter()
                .map(|(k, v)| (k.clone(), clamp_score(*v)))
                .collect(),
        })
        .collect();

    Ok(ComparisonResult {
        tool_ids: entries.iter().map(|e| e.tool_id.clone()).collect(),
        champions,
        bar_chart,
        table,
    })
}

/// Resolve each tool in its own category, concurrently, then compare
///
/// The selection is validated before any database access. Unknown tool ids
/// fail with `NotFound`.
pub async fn compare_tools(
    pool: &SqlitePool,
    config: &ScoringConfig,
    tool_ids: &[String],
) -> Result<ComparisonResult> {
    validate_selection(tool_ids, config.max_compare_tools)?;

    let entries = try_join_all(tool_ids.iter().map(|tool_id| async move {
        let tool = db::tools::get_tool(pool, tool_id).await?;
        let resolved = resolve(pool, config, &tool.id, &tool.category).await?;
        Ok::<_, crate::Error>(ComparisonEntry {
            tool_id: tool.id,
            category: tool.category,
            resolved,
        })
    }))
    .await?;

    Ok(compare(&entries, config.max_compare_tools)?)
}
