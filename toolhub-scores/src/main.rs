//! toolhub-scores - scoring service for the Toolhub directory
//!
//! Serves resolved tool scores, comparisons, review moderation and editorial
//! overrides over HTTP. Zero-config startup: every setting has a default,
//! and the database is created on first run.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use sqlx::SqlitePool;
use toolhub_common::config::{
    database_path, resolve_root_folder, ScoringOverrides, TomlConfig, DEFAULT_BIND_ADDRESS,
    DEFAULT_PORT,
};
use toolhub_common::db::init::{init_database, init_memory_database};
use toolhub_common::scoring::recompute_all;
use toolhub_common::ScoringConfig;
use toolhub_scores::{build_router, AppState};
use tracing::{error, info, warn};

#[derive(Debug, Parser)]
#[command(name = "toolhub-scores", version, about = "Toolhub scoring service")]
struct Args {
    /// Folder holding toolhub.db (also TOOLHUB_ROOT_FOLDER)
    #[arg(long)]
    root_folder: Option<PathBuf>,

    /// Use a throwaway in-memory database
    #[arg(long)]
    in_memory: bool,

    /// HTTP port
    #[arg(long, env = "TOOLHUB_PORT")]
    port: Option<u16>,

    /// HTTP bind address
    #[arg(long, env = "TOOLHUB_BIND_ADDRESS")]
    bind_address: Option<String>,

    /// Minimum aggregated confidence (0-100) before user scores are shown
    #[arg(long, env = "TOOLHUB_CONFIDENCE_THRESHOLD")]
    confidence_threshold: Option<f64>,

    /// Neutral score used when no source has data (0-10)
    #[arg(long, env = "TOOLHUB_DEFAULT_SCORE")]
    default_score: Option<f64>,

    /// Largest tool selection accepted by /api/compare
    #[arg(long, env = "TOOLHUB_MAX_COMPARE_TOOLS")]
    max_compare_tools: Option<usize>,

    /// Recompute every aggregate on this interval (seconds, 0 disables)
    #[arg(long, env = "TOOLHUB_RECOMPUTE_INTERVAL_SECS")]
    recompute_interval_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!(
        "Starting Toolhub scoring service (toolhub-scores) v{}",
        env!("CARGO_PKG_VERSION")
    );

    let args = Args::parse();
    let toml_config = TomlConfig::load();

    let cli_scoring = ScoringOverrides {
        confidence_threshold: args.confidence_threshold,
        default_score: args.default_score,
        max_compare_tools: args.max_compare_tools,
    };
    let scoring = ScoringConfig::from_layers(&[&cli_scoring, &toml_config.scoring])?;
    info!(
        "Scoring: confidence threshold {}, default score {}, max compare {}",
        scoring.confidence_threshold, scoring.default_score, scoring.max_compare_tools
    );

    let pool = if args.in_memory {
        warn!("Using in-memory database; all data is lost on exit");
        init_memory_database().await?
    } else {
        let root_folder = resolve_root_folder(args.root_folder.as_deref(), &toml_config);
        let db_path = database_path(&root_folder);
        info!("Database path: {}", db_path.display());

        match init_database(&db_path).await {
            Ok(pool) => {
                info!("✓ Connected to database");
                pool
            }
            Err(e) => {
                error!("Failed to open database: {}", e);
                return Err(e.into());
            }
        }
    };

    let interval_secs = args
        .recompute_interval_secs
        .or(toml_config.recompute_interval_secs)
        .unwrap_or(0);
    if interval_secs > 0 {
        spawn_recompute_task(pool.clone(), Duration::from_secs(interval_secs));
    }

    let state = AppState::new(pool, scoring);
    let app = build_router(state);

    let bind_address = args
        .bind_address
        .or(toml_config.bind_address)
        .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());
    let port = args.port.or(toml_config.port).unwrap_or(DEFAULT_PORT);
    let addr = format!("{}:{}", bind_address, port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("toolhub-scores listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Scheduled recompute of every aggregate
///
/// Each pass rebuilds rows from the full approved review set, so a pass that
/// races a moderation-triggered recompute converges to the same values.
fn spawn_recompute_task(pool: SqlitePool, period: Duration) {
    info!("Scheduled recompute every {}s", period.as_secs());

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            if let Err(e) = recompute_all(&pool).await {
                error!("Scheduled recompute failed: {}", e);
            }
        }
    });
}
