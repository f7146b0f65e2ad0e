//! Threat feed aggregation
//!
//! Pulls public IOC feeds and merges them into the JSON document the
//! lookup session consumes. Fetches are best-effort: a dead feed logs a
//! warning and contributes nothing.

use chrono::Utc;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::{create_client, ClientConfig, FeedError};
use talon_core::{FeedStats, IocDocument};

/// A public threat intelligence feed
#[derive(Debug, Clone)]
pub struct Feed {
    pub name: &'static str,
    pub url: &'static str,
}

/// Default feed registry
pub static DEFAULT_FEEDS: &[Feed] = &[
    Feed {
        name: "URLhaus",
        url: "https://urlhaus.abuse.ch/downloads/text/",
    },
    Feed {
        name: "Spamhaus DROP",
        url: "https://www.spamhaus.org/drop/drop.txt",
    },
    Feed {
        name: "CINS Army",
        url: "https://cinsscore.com/list/ci-badguys.txt",
    },
    Feed {
        name: "OpenPhish",
        url: "https://openphish.com/feed.txt",
    },
    Feed {
        name: "Abuse.ch SSL Blacklist",
        url: "https://sslbl.abuse.ch/blacklist/sslblacklist.csv",
    },
    Feed {
        name: "URLhaus Online",
        url: "https://urlhaus.abuse.ch/downloads/text_online/",
    },
];

/// How many feeds to fetch concurrently
const MAX_CONCURRENT_FETCHES: usize = 4;

/// Cache entries younger than this are served without refetching
const CACHE_MAX_AGE_SECS: i64 = 3600;

/// Aggregator configuration
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Directory for cached feed responses; None disables caching
    pub cache_dir: Option<PathBuf>,
    /// Per-feed request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            cache_dir: Some(PathBuf::from("data/cache")),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    timestamp: i64,
    data: String,
}

/// Cache file for a feed, named by the feed's content-addressed hash
fn cache_path(dir: &Path, feed_name: &str) -> PathBuf {
    let mut hasher = Sha256::new();
    hasher.update(feed_name.as_bytes());
    dir.join(format!("{:x}.cache", hasher.finalize()))
}

async fn read_cache(dir: &Path, feed_name: &str) -> Option<String> {
    let raw = tokio::fs::read_to_string(cache_path(dir, feed_name))
        .await
        .ok()?;
    let entry: CacheEntry = serde_json::from_str(&raw).ok()?;
    let age = Utc::now().timestamp() - entry.timestamp;
    (age < CACHE_MAX_AGE_SECS).then_some(entry.data)
}

async fn write_cache(dir: &Path, feed_name: &str, data: &str) {
    if let Err(e) = tokio::fs::create_dir_all(dir).await {
        debug!("Cache directory unavailable: {}", e);
        return;
    }
    let entry = CacheEntry {
        timestamp: Utc::now().timestamp(),
        data: data.to_string(),
    };
    match serde_json::to_string(&entry) {
        Ok(json) => {
            if let Err(e) = tokio::fs::write(cache_path(dir, feed_name), json).await {
                debug!("Failed to write cache for {}: {}", feed_name, e);
            }
        }
        Err(e) => debug!("Failed to encode cache for {}: {}", feed_name, e),
    }
}

/// Fetch one feed's raw text, via the cache when it is fresh enough
pub async fn fetch_feed(
    client: &Client,
    feed: &Feed,
    cache_dir: Option<&Path>,
) -> Result<String, FeedError> {
    if let Some(dir) = cache_dir {
        if let Some(cached) = read_cache(dir, feed.name).await {
            debug!("Cache hit for {}", feed.name);
            return Ok(cached);
        }
    }

    let response = client.get(feed.url).send().await?;
    if !response.status().is_success() {
        return Err(FeedError::Status(response.status()));
    }
    let data = response.text().await?;

    if let Some(dir) = cache_dir {
        write_cache(dir, feed.name, &data).await;
    }
    Ok(data)
}

/// Extract indicator lines from raw feed text.
///
/// Blank lines and comment lines are skipped; for tabular lines the first
/// whitespace-separated column is the indicator.
pub fn parse_feed(data: &str) -> Vec<String> {
    let mut entries = Vec::new();
    for line in data.lines() {
        let line = line.trim();
        if line.is_empty()
            || line.starts_with('#')
            || line.starts_with(';')
            || line.starts_with("//")
            || line.starts_with('!')
        {
            continue;
        }

        let value = if line.contains([' ', '\t', '|']) {
            match line.split_whitespace().next() {
                Some(first) => first.to_string(),
                None => continue,
            }
        } else {
            line.to_string()
        };

        entries.push(value);
    }
    entries
}

/// Merge per-feed entry lists (in registry order) into one document:
/// dedup preserving first-seen order, per-feed counts, aggregate stats.
fn build_document(per_feed: Vec<(String, Vec<String>)>) -> IocDocument {
    let mut seen = HashSet::new();
    let mut iocs = Vec::new();
    let mut feed_counts = BTreeMap::new();
    let mut total = 0u64;

    for (name, entries) in per_feed {
        let count = entries.len() as u64;
        total += count;
        feed_counts.insert(name, count);

        for entry in entries {
            if seen.insert(entry.clone()) {
                iocs.push(entry);
            }
        }
    }

    let stats = FeedStats {
        total,
        unique: Some(iocs.len() as u64),
        feeds: feed_counts,
        last_updated: Some(Utc::now()),
    };

    IocDocument { iocs, stats }
}

/// Fetch, parse, and merge all feeds into a single document
pub async fn aggregate(
    feeds: &[Feed],
    config: &AggregatorConfig,
) -> Result<IocDocument, FeedError> {
    let client = create_client(&ClientConfig {
        timeout_secs: config.timeout_secs,
    })?;

    let fetched: Vec<(String, Vec<String>)> = stream::iter(feeds.iter().cloned())
        .map(|feed| {
            let client = client.clone();
            let cache_dir = config.cache_dir.clone();
            async move {
                match fetch_feed(&client, &feed, cache_dir.as_deref()).await {
                    Ok(data) => {
                        let entries = parse_feed(&data);
                        debug!("Feed {} yielded {} entries", feed.name, entries.len());
                        (feed.name.to_string(), entries)
                    }
                    Err(e) => {
                        warn!("Feed {} failed: {}", feed.name, e);
                        (feed.name.to_string(), Vec::new())
                    }
                }
            }
        })
        .buffer_unordered(MAX_CONCURRENT_FETCHES)
        .collect()
        .await;

    // Completion order is arbitrary; merge in registry order
    let mut by_feed: HashMap<String, Vec<String>> = fetched.into_iter().collect();
    let ordered: Vec<(String, Vec<String>)> = feeds
        .iter()
        .map(|f| (f.name.to_string(), by_feed.remove(f.name).unwrap_or_default()))
        .collect();

    let doc = build_document(ordered);
    info!(
        "Aggregated {} entries ({} unique) from {} feeds",
        doc.stats.total,
        doc.iocs.len(),
        feeds.len()
    );
    Ok(doc)
}

/// Write the document where a primary source can serve it
pub async fn save_document(doc: &IocDocument, path: &Path) -> Result<(), FeedError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| FeedError::File {
                    path: parent.display().to_string(),
                    reason: e.to_string(),
                })?;
        }
    }

    let json = serde_json::to_string(doc).map_err(|e| FeedError::Malformed(e.to_string()))?;
    tokio::fs::write(path, json)
        .await
        .map_err(|e| FeedError::File {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

    info!("Wrote {} indicators to {}", doc.iocs.len(), path.display());
    Ok(())
}
