//! talon-feed - the data provider layer
//!
//! Everything that brings IOC data into the system:
//! - HTTP client construction
//! - Document sources (local file, remote URL with cache-busting)
//! - Fallback search-API client for degraded mode
//! - Aggregation of public threat feeds into the IOC document

pub mod aggregator;
pub mod api;
pub mod client;
pub mod source;

pub use aggregator::*;
pub use api::*;
pub use client::*;
pub use source::*;
