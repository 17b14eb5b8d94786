//! # Toolhub Common Library
//!
//! Scoring core shared by the Toolhub services:
//! - Category criteria registry
//! - Review aggregation and confidence scoring
//! - Score resolution with editorial/default fallback
//! - Tool comparison
//! - SQLite persistence and configuration loading

pub mod config;
pub mod criteria;
pub mod db;
pub mod error;
pub mod scoring;

pub use config::ScoringConfig;
pub use error::{Error, Result};
