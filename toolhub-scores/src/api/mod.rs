//! HTTP API handlers for toolhub-scores

pub mod admin;
pub mod compare;
pub mod criteria;
pub mod editorial;
pub mod health;
pub mod reviews;
pub mod tools;

pub use admin::recompute_all;
pub use compare::compare;
pub use criteria::get_criteria;
pub use editorial::{create_editorial, deactivate_editorial, list_editorial};
pub use health::health_routes;
pub use reviews::{list_tool_reviews, set_review_status, submit_review};
pub use tools::{get_aggregate, get_scores, put_tool, recompute_aggregate};
