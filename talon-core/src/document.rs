//! IOC document wire types
//!
//! The JSON shape produced by the aggregator and consumed by the lookup
//! session. Missing fields parse to defaults rather than erroring.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The aggregated IOC document: `{iocs: [...], stats: {...}}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IocDocument {
    /// Ordered indicator list; duplicates permitted
    #[serde(default)]
    pub iocs: Vec<String>,
    #[serde(default)]
    pub stats: FeedStats,
}

/// Descriptive metadata about an aggregation run. Not used in search
/// logic; absent fields display as zero/unknown downstream.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedStats {
    /// Sum of entries across all feeds, before deduplication
    #[serde(default)]
    pub total: u64,
    /// Distinct indicator count after deduplication
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique: Option<u64>,
    /// Per-feed entry counts
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub feeds: BTreeMap<String, u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}
