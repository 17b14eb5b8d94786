//! Tests for on-disk database initialization
//!
//! The database is created on first start and reopened on later starts
//! without losing rows.

use tempfile::TempDir;
use toolhub_common::config::database_path;
use toolhub_common::db::init::init_database;
use toolhub_common::db::tools::{get_tool, upsert_tool, Tool};

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = TempDir::new().unwrap();
    let db_path = database_path(&dir.path().join("nested"));
    assert!(!db_path.exists());

    let result = init_database(&db_path).await;
    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_reopens_with_data() {
    let dir = TempDir::new().unwrap();
    let db_path = database_path(dir.path());

    let pool = init_database(&db_path).await.unwrap();
    upsert_tool(
        &pool,
        &Tool {
            id: "tool-a".to_string(),
            name: "Tool A".to_string(),
            category: "coding".to_string(),
        },
    )
    .await
    .unwrap();
    pool.close().await;

    let reopened = init_database(&db_path).await.unwrap();
    let tool = get_tool(&reopened, "tool-a").await.unwrap();
    assert_eq!(tool.category, "coding");
}

#[tokio::test]
async fn test_wal_mode_enabled() {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&database_path(dir.path())).await.unwrap();

    let mode: String = sqlx::query_scalar("PRAGMA journal_mode")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(mode.to_lowercase(), "wal");
}
