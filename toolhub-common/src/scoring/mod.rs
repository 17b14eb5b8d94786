//! Aggregated scoring and fallback resolution
//!
//! - [`aggregator`]: folds approved reviews into per-metric statistics
//! - [`confidence`]: confidence score for an aggregate
//! - [`resolver`]: aggregated / editorial / default fallback policy
//! - [`comparison`]: champions and chart projections for 2-3 tools

pub mod aggregator;
pub mod comparison;
pub mod confidence;
pub mod resolver;
pub mod types;

pub use aggregator::{aggregate, compute_aggregate, recompute_all};
pub use comparison::{compare, compare_tools, ComparisonEntry, ComparisonError, ComparisonResult};
pub use resolver::{resolve, resolve_from};
pub use types::*;
