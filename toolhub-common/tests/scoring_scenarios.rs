//! End-to-end scoring scenarios against an in-memory database
//!
//! Covers the full path: review submission, moderation, aggregation,
//! editorial fallback, resolution and comparison.

use std::collections::BTreeMap;

use sqlx::SqlitePool;
use toolhub_common::criteria::get_criteria;
use toolhub_common::db::editorial::{create_editorial_score, NewEditorialScore};
use toolhub_common::db::init::init_memory_database;
use toolhub_common::db::reviews::{set_review_status, submit_review, NewReview};
use toolhub_common::db::tools::{upsert_tool, Tool};
use toolhub_common::scoring::{
    aggregate, compare_tools, recompute_all, resolve, ComparisonError, ReviewStatus, ScoreSource,
};
use toolhub_common::{Error, ScoringConfig};

async fn setup_test_db() -> SqlitePool {
    let pool = init_memory_database().await.unwrap();
    for (id, name) in [("tool-a", "Tool A"), ("tool-b", "Tool B"), ("tool-c", "Tool C"), ("tool-d", "Tool D")] {
        upsert_tool(
            &pool,
            &Tool {
                id: id.to_string(),
                name: name.to_string(),
                category: "writing".to_string(),
            },
        )
        .await
        .unwrap();
    }
    pool
}

/// Submit and approve one review
async fn approved_review(pool: &SqlitePool, tool_id: &str, scores: &[(&str, f64)], verified: bool) {
    let metric_scores: BTreeMap<String, f64> = scores.iter().map(|(k, v)| (k.to_string(), *v)).collect();
    let review = submit_review(
        pool,
        NewReview {
            tool_id: tool_id.to_string(),
            user_id: format!("user-{}", uuid::Uuid::new_v4()),
            category: None,
            metric_scores,
            metric_comments: BTreeMap::new(),
            overall_rating: 7.0,
            is_verified: verified,
        },
    )
    .await
    .unwrap();

    set_review_status(pool, review.id, ReviewStatus::Approved)
        .await
        .unwrap();
}

async fn editorial(pool: &SqlitePool, tool_id: &str, scores: &[(&str, f64)]) {
    create_editorial_score(
        pool,
        tool_id,
        NewEditorialScore {
            category: None,
            metric_scores: scores.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            editor_id: "editor-1".to_string(),
            notes: None,
            deactivate_previous: true,
        },
    )
    .await
    .unwrap();
}

/// Tool A: 25 approved reviews, contentQuality averaging 8.5 with low
/// spread, speedEfficiency 7.0, 22 of 25 verified
async fn seed_tool_a(pool: &SqlitePool) {
    for i in 0..25 {
        let content = match i {
            0 => 8.5,
            i if i % 2 == 0 => 8.0,
            _ => 9.0,
        };
        approved_review(
            pool,
            "tool-a",
            &[("contentQuality", content), ("speedEfficiency", 7.0)],
            i % 10 != 0,
        )
        .await;
    }
}

/// Tool B: two approved reviews that disagree sharply, plus an editorial row
async fn seed_tool_b(pool: &SqlitePool) {
    approved_review(pool, "tool-b", &[("contentQuality", 2.0)], true).await;
    approved_review(pool, "tool-b", &[("contentQuality", 9.0)], true).await;
    editorial(pool, "tool-b", &[("contentQuality", 7.5), ("speedEfficiency", 7.0)]).await;
}

#[tokio::test]
async fn test_scenario_confident_aggregate() {
    let pool = setup_test_db().await;
    seed_tool_a(&pool).await;
    let config = ScoringConfig::default();

    let agg = aggregate(&pool, "tool-a", "writing").await.unwrap();
    assert_eq!(agg.total_reviews, 25);
    assert_eq!(agg.verified_reviews, 22);
    assert_eq!(agg.metric_scores["contentQuality"].avg, 8.5);
    assert!(agg.confidence_score >= 70.0, "confidence {}", agg.confidence_score);

    let view = resolve(&pool, &config, "tool-a", "writing").await.unwrap();
    assert_eq!(view.source, ScoreSource::Aggregated);
    assert_eq!(view.fallback_reason, None);
    assert_eq!(view.metric_scores["contentQuality"], 8.5);
    assert!(view.confidence_score.unwrap() >= 70.0);
}

#[tokio::test]
async fn test_scenario_low_confidence_editorial() {
    let pool = setup_test_db().await;
    seed_tool_b(&pool).await;
    let config = ScoringConfig::default();

    let agg = aggregate(&pool, "tool-b", "writing").await.unwrap();
    assert_eq!(agg.metric_scores["contentQuality"].std_dev, 3.5);
    assert!(agg.confidence_score < config.confidence_threshold);
    assert_eq!(agg.editorial_reviews, 1);

    let view = resolve(&pool, &config, "tool-b", "writing").await.unwrap();
    assert_eq!(view.source, ScoreSource::Editorial);
    assert_eq!(view.fallback_reason.as_deref(), Some("Low confidence score"));
    assert_eq!(view.metric_scores["contentQuality"], 7.5);
}

#[tokio::test]
async fn test_scenario_no_data_defaults() {
    let pool = setup_test_db().await;
    let config = ScoringConfig::default();

    let view = resolve(&pool, &config, "tool-c", "writing").await.unwrap();
    assert_eq!(view.source, ScoreSource::Default);
    assert_eq!(view.fallback_reason.as_deref(), Some("No aggregated or editorial scores"));
    assert_eq!(view.metric_scores.len(), get_criteria("writing").len());
    assert!(view.metric_scores.values().all(|v| *v == 5.0));
}

#[tokio::test]
async fn test_scenario_editorial_without_aggregate() {
    let pool = setup_test_db().await;
    editorial(&pool, "tool-d", &[("contentQuality", 6.0)]).await;

    let view = resolve(&pool, &ScoringConfig::default(), "tool-d", "writing")
        .await
        .unwrap();
    assert_eq!(view.source, ScoreSource::Editorial);
    assert_eq!(view.fallback_reason.as_deref(), Some("No aggregated scores"));
}

#[tokio::test]
async fn test_scenario_comparison_ties() {
    let pool = setup_test_db().await;
    seed_tool_a(&pool).await;
    seed_tool_b(&pool).await;
    editorial(&pool, "tool-c", &[("speedEfficiency", 6.5)]).await;
    let config = ScoringConfig::default();

    let ids = vec!["tool-a".to_string(), "tool-b".to_string(), "tool-c".to_string()];
    let result = compare_tools(&pool, &config, &ids).await.unwrap();

    let speed = result
        .champions
        .iter()
        .find(|c| c.metric_key == "speedEfficiency")
        .unwrap();
    assert_eq!(speed.max_value, 7.0);
    assert_eq!(speed.champions, vec!["tool-a".to_string(), "tool-b".to_string()]);

    // sources differ per tool and the comparison still proceeds
    let sources: Vec<ScoreSource> = result.table.iter().map(|r| r.source).collect();
    assert_eq!(
        sources,
        vec![ScoreSource::Aggregated, ScoreSource::Editorial, ScoreSource::Editorial]
    );
}

#[tokio::test]
async fn test_compare_rejects_selection_sizes_distinctly() {
    let pool = setup_test_db().await;
    let config = ScoringConfig::default();

    let one = vec!["tool-a".to_string()];
    assert!(matches!(
        compare_tools(&pool, &config, &one).await,
        Err(Error::Comparison(ComparisonError::InsufficientToolsForComparison { .. }))
    ));

    let none: Vec<String> = Vec::new();
    assert!(matches!(
        compare_tools(&pool, &config, &none).await,
        Err(Error::Comparison(ComparisonError::InsufficientToolsForComparison { .. }))
    ));

    let four: Vec<String> = ["tool-a", "tool-b", "tool-c", "tool-d"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert!(matches!(
        compare_tools(&pool, &config, &four).await,
        Err(Error::Comparison(ComparisonError::TooManyToolsForComparison { .. }))
    ));
}

#[tokio::test]
async fn test_compare_unknown_tool_is_not_found() {
    let pool = setup_test_db().await;
    let ids = vec!["tool-a".to_string(), "ghost".to_string()];
    assert!(matches!(
        compare_tools(&pool, &ScoringConfig::default(), &ids).await,
        Err(Error::NotFound(_))
    ));
}

#[tokio::test]
async fn test_zero_reviews_aggregate_is_valid() {
    let pool = setup_test_db().await;
    let agg = aggregate(&pool, "tool-c", "writing").await.unwrap();
    assert_eq!(agg.total_reviews, 0);
    assert_eq!(agg.confidence_score, 0.0);

    // a stored zero-confidence row demotes the editorial reason wording
    editorial(&pool, "tool-c", &[("contentQuality", 6.0)]).await;
    let view = resolve(&pool, &ScoringConfig::default(), "tool-c", "writing")
        .await
        .unwrap();
    assert_eq!(view.fallback_reason.as_deref(), Some("Low confidence score"));
}

#[tokio::test]
async fn test_aggregate_unknown_tool_is_not_found() {
    let pool = setup_test_db().await;
    assert!(matches!(
        aggregate(&pool, "ghost", "writing").await,
        Err(Error::NotFound(_))
    ));
}

#[tokio::test]
async fn test_extra_verified_review_never_lowers_confidence() {
    let pool = setup_test_db().await;
    for _ in 0..3 {
        approved_review(&pool, "tool-d", &[("contentQuality", 6.0), ("accuracy", 7.0)], false).await;
    }
    let before = aggregate(&pool, "tool-d", "writing").await.unwrap();

    approved_review(&pool, "tool-d", &[("contentQuality", 6.0), ("accuracy", 7.0)], true).await;
    let after = aggregate(&pool, "tool-d", "writing").await.unwrap();

    assert!(after.confidence_score >= before.confidence_score);
}

#[tokio::test]
async fn test_every_resolved_value_is_in_range() {
    let pool = setup_test_db().await;
    seed_tool_a(&pool).await;
    seed_tool_b(&pool).await;
    let config = ScoringConfig::default();

    for tool in ["tool-a", "tool-b", "tool-c", "tool-d"] {
        let view = resolve(&pool, &config, tool, "writing").await.unwrap();
        assert!(
            view.metric_scores.values().all(|v| (0.0..=10.0).contains(v)),
            "{} out of range: {:?}",
            tool,
            view.metric_scores
        );
    }
}

#[tokio::test]
async fn test_resolve_is_deterministic() {
    let pool = setup_test_db().await;
    seed_tool_b(&pool).await;
    let config = ScoringConfig::default();

    let first = resolve(&pool, &config, "tool-b", "writing").await.unwrap();
    let second = resolve(&pool, &config, "tool-b", "writing").await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_recompute_all_converges() {
    let pool = setup_test_db().await;
    seed_tool_a(&pool).await;
    seed_tool_b(&pool).await;

    let before = aggregate(&pool, "tool-a", "writing").await.unwrap();
    let count = recompute_all(&pool).await.unwrap();
    assert_eq!(count, 2);

    let after = aggregate(&pool, "tool-a", "writing").await.unwrap();
    assert_eq!(before.metric_scores, after.metric_scores);
    assert_eq!(before.confidence_score, after.confidence_score);
}

#[tokio::test]
async fn test_lower_threshold_prefers_aggregate() {
    let pool = setup_test_db().await;
    seed_tool_b(&pool).await;
    aggregate(&pool, "tool-b", "writing").await.unwrap();

    let permissive = ScoringConfig {
        confidence_threshold: 0.0,
        ..ScoringConfig::default()
    };
    let view = resolve(&pool, &permissive, "tool-b", "writing").await.unwrap();
    assert_eq!(view.source, ScoreSource::Aggregated);
    assert_eq!(view.metric_scores["contentQuality"], 5.5);
}
