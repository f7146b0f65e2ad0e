//! talon-core - classification and search primitives for IOC lookup
//!
//! This crate provides the foundational, I/O-free pieces:
//! - Indicator classification (IP / hash / domain / URL)
//! - The substring search engine with capped, highlighted results
//! - Wire types for the aggregated IOC document

pub mod classify;
pub mod document;
pub mod search;

pub use classify::*;
pub use document::*;
pub use search::*;

/// Maximum matches materialized per search
pub const RESULT_CAP: usize = 100;

/// Minimum query length before a typed (non-submitted) search fires
pub const MIN_AUTO_QUERY_LEN: usize = 3;

/// Debounce interval for typed input, in milliseconds
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

/// Interval between periodic store refreshes, in seconds
pub const DEFAULT_REFRESH_SECS: u64 = 300;
