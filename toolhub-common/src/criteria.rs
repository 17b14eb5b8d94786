//! Category criteria registry
//!
//! Static mapping from a tool category to the ordered metrics that tools in
//! that category are scored on. The registry is the single authority on which
//! metric keys exist; review and editorial input is validated against it at
//! the boundary, and the resolver only ever emits keys listed here.
//!
//! An unknown category yields an empty criteria list. Callers treat that as
//! "scoring unsupported" and render no chart.

use std::collections::{BTreeMap, HashMap};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::scoring::{MAX_SCORE, MIN_SCORE};
use crate::{Error, Result};

/// One scoring axis of a category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricDefinition {
    pub metric_key: String,
    pub label: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub display_order: i32,
}

fn metric(key: &str, label: &str, icon: Option<&str>, color: Option<&str>, order: i32) -> MetricDefinition {
    MetricDefinition {
        metric_key: key.to_string(),
        label: label.to_string(),
        icon: icon.map(str::to_string),
        color: color.map(str::to_string),
        display_order: order,
    }
}

static REGISTRY: Lazy<HashMap<&'static str, Vec<MetricDefinition>>> = Lazy::new(|| {
    let mut registry = HashMap::new();

    registry.insert(
        "writing",
        vec![
            metric("contentQuality", "Content Quality", Some("file-text"), Some("#6366f1"), 1),
            metric("speedEfficiency", "Speed & Efficiency", Some("zap"), Some("#f59e0b"), 2),
            metric("easeOfUse", "Ease of Use", Some("mouse-pointer"), Some("#10b981"), 3),
            metric("accuracy", "Accuracy", Some("target"), Some("#ef4444"), 4),
            metric("creativity", "Creativity", Some("sparkles"), Some("#ec4899"), 5),
            metric("valueForMoney", "Value for Money", Some("dollar-sign"), Some("#14b8a6"), 6),
        ],
    );

    registry.insert(
        "image-generation",
        vec![
            metric("contentQuality", "Image Quality", Some("image"), Some("#6366f1"), 1),
            metric("speedEfficiency", "Generation Speed", Some("zap"), Some("#f59e0b"), 2),
            metric("easeOfUse", "Ease of Use", Some("mouse-pointer"), Some("#10b981"), 3),
            metric("promptAdherence", "Prompt Adherence", Some("crosshair"), Some("#ef4444"), 4),
            metric("styleVersatility", "Style Versatility", Some("palette"), Some("#8b5cf6"), 5),
            metric("valueForMoney", "Value for Money", Some("dollar-sign"), Some("#14b8a6"), 6),
        ],
    );

    registry.insert(
        "coding",
        vec![
            metric("contentQuality", "Code Quality", Some("code"), Some("#6366f1"), 1),
            metric("speedEfficiency", "Speed & Efficiency", Some("zap"), Some("#f59e0b"), 2),
            metric("easeOfUse", "Ease of Use", Some("mouse-pointer"), Some("#10b981"), 3),
            metric("accuracy", "Correctness", Some("check-circle"), Some("#ef4444"), 4),
            metric("integrationSupport", "Integrations", Some("plug"), Some("#0ea5e9"), 5),
            metric("valueForMoney", "Value for Money", Some("dollar-sign"), Some("#14b8a6"), 6),
        ],
    );

    registry.insert(
        "productivity",
        vec![
            metric("contentQuality", "Output Quality", Some("file-text"), Some("#6366f1"), 1),
            metric("speedEfficiency", "Speed & Efficiency", Some("zap"), Some("#f59e0b"), 2),
            metric("easeOfUse", "Ease of Use", Some("mouse-pointer"), Some("#10b981"), 3),
            metric("integrationSupport", "Integrations", Some("plug"), Some("#0ea5e9"), 4),
            metric("reliability", "Reliability", Some("shield"), None, 5),
            metric("valueForMoney", "Value for Money", Some("dollar-sign"), Some("#14b8a6"), 6),
        ],
    );

    registry.insert(
        "audio-video",
        vec![
            metric("contentQuality", "Media Quality", Some("film"), Some("#6366f1"), 1),
            metric("speedEfficiency", "Render Speed", Some("zap"), Some("#f59e0b"), 2),
            metric("easeOfUse", "Ease of Use", Some("mouse-pointer"), Some("#10b981"), 3),
            metric("outputFidelity", "Output Fidelity", Some("headphones"), None, 4),
            metric("customization", "Customization", Some("sliders"), None, 5),
            metric("valueForMoney", "Value for Money", Some("dollar-sign"), Some("#14b8a6"), 6),
        ],
    );

    for metrics in registry.values_mut() {
        metrics.sort_by_key(|m| m.display_order);
    }

    registry
});

/// Canonical form of a category name: trimmed, lowercase
pub fn normalize_category(category: &str) -> String {
    category.trim().to_ascii_lowercase()
}

/// Ordered criteria for a category; empty for an unknown category
pub fn get_criteria(category: &str) -> &'static [MetricDefinition] {
    REGISTRY
        .get(normalize_category(category).as_str())
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// All registered category names, sorted
pub fn known_categories() -> Vec<&'static str> {
    let mut categories: Vec<&'static str> = REGISTRY.keys().copied().collect();
    categories.sort_unstable();
    categories
}

/// True when `metric_key` is one of the category's criteria
pub fn is_known_metric(category: &str, metric_key: &str) -> bool {
    get_criteria(category).iter().any(|m| m.metric_key == metric_key)
}

/// Validate submitted metric scores against the category's criteria
///
/// Rejects unknown categories, unknown metric keys, and values that are not
/// finite numbers in `[0, 10]`. A submission is not required to score every
/// metric.
pub fn validate_metric_scores(category: &str, scores: &BTreeMap<String, f64>) -> Result<()> {
    let criteria = get_criteria(category);
    if criteria.is_empty() {
        return Err(Error::InvalidInput(format!(
            "Category '{}' has no scoring criteria",
            category
        )));
    }

    for (key, value) in scores {
        if !criteria.iter().any(|m| &m.metric_key == key) {
            return Err(Error::InvalidInput(format!(
                "Unknown metric '{}' for category '{}'",
                key, category
            )));
        }
        if !value.is_finite() || *value < MIN_SCORE || *value > MAX_SCORE {
            return Err(Error::InvalidInput(format!(
                "Score for '{}' must be between {} and {}, got {}",
                key, MIN_SCORE, MAX_SCORE, value
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_category_is_empty() {
        assert!(get_criteria("blockchain-oracles").is_empty());
        assert!(get_criteria("").is_empty());
    }

    #[test]
    fn test_criteria_are_ordered() {
        for category in known_categories() {
            let criteria = get_criteria(category);
            assert!(!criteria.is_empty(), "{} should have criteria", category);
            for pair in criteria.windows(2) {
                assert!(pair[0].display_order < pair[1].display_order);
            }
        }
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(get_criteria("Writing"), get_criteria("writing"));
        assert_eq!(get_criteria("  coding "), get_criteria("coding"));
    }

    #[test]
    fn test_every_category_shares_core_metrics() {
        for category in known_categories() {
            assert!(is_known_metric(category, "contentQuality"));
            assert!(is_known_metric(category, "speedEfficiency"));
        }
    }

    #[test]
    fn test_validate_rejects_unknown_key() {
        let mut scores = BTreeMap::new();
        scores.insert("contentQuality".to_string(), 8.0);
        scores.insert("vibes".to_string(), 9.0);

        let err = validate_metric_scores("writing", &scores).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(msg) if msg.contains("vibes")));
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let mut scores = BTreeMap::new();
        scores.insert("contentQuality".to_string(), 10.5);
        assert!(validate_metric_scores("writing", &scores).is_err());

        scores.insert("contentQuality".to_string(), f64::NAN);
        assert!(validate_metric_scores("writing", &scores).is_err());
    }

    #[test]
    fn test_validate_accepts_partial_scores() {
        let mut scores = BTreeMap::new();
        scores.insert("speedEfficiency".to_string(), 0.0);
        scores.insert("accuracy".to_string(), 10.0);
        assert!(validate_metric_scores("writing", &scores).is_ok());
    }

    #[test]
    fn test_validate_rejects_unknown_category() {
        let scores = BTreeMap::new();
        assert!(validate_metric_scores("unknown", &scores).is_err());
    }
}
