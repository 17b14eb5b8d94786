//! Database schema and queries

pub mod aggregates;
pub mod editorial;
pub mod init;
pub mod reviews;
pub mod tools;

pub use init::*;
pub use tools::Tool;
