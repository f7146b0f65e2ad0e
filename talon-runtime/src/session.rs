//! Lookup session
//!
//! Owns the IOC store explicitly: load with atomic replacement, degraded
//! mode when the primary source is gone, and assembly of the search view
//! the presentation layer renders.

use parking_lot::RwLock;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use talon_core::{search, FeedStats, MatchResult, SearchOutcome, RESULT_CAP};
use talon_feed::{create_client, search_api, ClientConfig, FeedError, LoadStrategy};

/// Store load status, surfaced to the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    NotLoaded,
    Loaded,
    Failed(String),
}

/// Shared store snapshot; replaced wholesale on every successful load
#[derive(Debug, Default)]
struct StoreInner {
    iocs: Vec<String>,
    stats: FeedStats,
    state: LoadState,
}

/// What one search presents to the user
#[derive(Debug, Clone)]
pub enum SearchView {
    /// Empty query: prompt for a term
    IdlePrompt,
    /// The store failed to load and no fallback produced results
    LoadError { message: String },
    /// A valid query matched nothing
    NoMatches { query: String },
    Results {
        matches: Vec<MatchResult>,
        total: usize,
        truncated: bool,
        /// True when results came from the fallback API, not the store
        degraded: bool,
    },
}

/// A lookup session over one load strategy
pub struct LookupSession {
    strategy: LoadStrategy,
    client: Client,
    store: RwLock<StoreInner>,
}

impl LookupSession {
    pub fn new(strategy: LoadStrategy) -> Result<Self, FeedError> {
        let client = create_client(&ClientConfig::default())?;
        Ok(Self {
            strategy,
            client,
            store: RwLock::new(StoreInner::default()),
        })
    }

    /// Run the load protocol once. On success the store contents are
    /// replaced wholesale; on failure a previously loaded store is kept
    /// (searches keep running against the stale snapshot).
    ///
    /// Returns the number of indicators loaded.
    pub async fn load(&self) -> Result<usize, FeedError> {
        match self.strategy.primary.fetch_document(&self.client).await {
            Ok(doc) => {
                let count = doc.iocs.len();
                let mut inner = self.store.write();
                inner.iocs = doc.iocs;
                inner.stats = doc.stats;
                inner.state = LoadState::Loaded;
                info!(
                    "Loaded {} indicators from {}",
                    count,
                    self.strategy.primary.describe()
                );
                Ok(count)
            }
            Err(e) => {
                warn!("Failed to load {}: {}", self.strategy.primary.describe(), e);
                let mut inner = self.store.write();
                if inner.state != LoadState::Loaded {
                    inner.state = LoadState::Failed(e.to_string());
                }
                Err(e)
            }
        }
    }

    /// Explicit reload; same protocol as the initial load
    pub async fn reload(&self) -> Result<usize, FeedError> {
        self.load().await
    }

    /// Refresh cadence from the load strategy, if one was configured
    pub fn refresh_interval(&self) -> Option<Duration> {
        self.strategy.refresh_interval
    }

    pub fn load_state(&self) -> LoadState {
        self.store.read().state.clone()
    }

    /// Number of indicators currently in the store
    pub fn store_len(&self) -> usize {
        self.store.read().iocs.len()
    }

    pub fn stats(&self) -> FeedStats {
        self.store.read().stats.clone()
    }

    /// Run one search against the current snapshot
    pub async fn search(&self, query: &str) -> SearchView {
        let query = query.trim();
        if query.is_empty() {
            return SearchView::IdlePrompt;
        }

        let (state, outcome) = {
            let inner = self.store.read();
            (inner.state.clone(), search(query, &inner.iocs))
        };

        if let LoadState::Failed(message) = state {
            return self.search_degraded(query, message).await;
        }

        match outcome {
            SearchOutcome::NoQuery => SearchView::IdlePrompt,
            SearchOutcome::Results { total: 0, .. } => SearchView::NoMatches {
                query: query.to_string(),
            },
            SearchOutcome::Results {
                matches,
                total,
                truncated,
            } => SearchView::Results {
                matches,
                total,
                truncated,
                degraded: false,
            },
        }
    }

    /// Degraded path: the primary source never loaded. Query the fallback
    /// API if one is configured; any failure there is caught here and
    /// surfaced as a message, leaving the session usable.
    async fn search_degraded(&self, query: &str, message: String) -> SearchView {
        let Some(base) = &self.strategy.fallback_api else {
            return SearchView::LoadError { message };
        };

        match search_api(&self.client, base, query).await {
            Ok(results) if results.is_empty() => SearchView::NoMatches {
                query: query.to_string(),
            },
            Ok(results) => {
                let total = results.len();
                let matches: Vec<MatchResult> = results
                    .into_iter()
                    .take(RESULT_CAP)
                    .map(|text| MatchResult::new(text, query))
                    .collect();
                SearchView::Results {
                    matches,
                    total,
                    truncated: total > RESULT_CAP,
                    degraded: true,
                }
            }
            Err(e) => {
                warn!("Fallback search failed: {}", e);
                SearchView::LoadError {
                    message: format!("{} (fallback: {})", message, e),
                }
            }
        }
    }
}

/// Convenience alias for sharing a session with background tasks
pub type SharedSession = Arc<LookupSession>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use talon_core::IocType;
    use talon_feed::FileSource;
    use tempfile::NamedTempFile;

    fn write_doc(iocs: &[&str], total: u64) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        let doc = serde_json::json!({
            "iocs": iocs,
            "stats": {"total": total, "last_updated": "2026-08-01T00:00:00Z"}
        });
        write!(file, "{}", doc).unwrap();
        file
    }

    fn file_session(path: &std::path::Path) -> LookupSession {
        LookupSession::new(LoadStrategy::new(Box::new(FileSource::new(path)))).unwrap()
    }

    #[tokio::test]
    async fn test_load_populates_store_and_stats() {
        let file = write_doc(&["evil.com", "1.2.3.4"], 2);
        let session = file_session(file.path());

        let count = session.load().await.unwrap();
        assert_eq!(count, 2);
        assert_eq!(session.store_len(), 2);
        assert_eq!(session.load_state(), LoadState::Loaded);
        assert_eq!(session.stats().total, 2);
        assert!(session.stats().last_updated.is_some());
    }

    #[tokio::test]
    async fn test_search_results_view() {
        let file = write_doc(&["evil.com", "good.org"], 2);
        let session = file_session(file.path());
        session.load().await.unwrap();

        match session.search("evil").await {
            SearchView::Results {
                matches,
                total,
                truncated,
                degraded,
            } => {
                assert_eq!(total, 1);
                assert!(!truncated);
                assert!(!degraded);
                assert_eq!(matches[0].text, "evil.com");
                assert_eq!(matches[0].ioc_type, IocType::Domain);
            }
            other => panic!("unexpected view: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_query_is_idle_prompt_not_zero_results() {
        let file = write_doc(&["evil.com"], 1);
        let session = file_session(file.path());
        session.load().await.unwrap();

        assert!(matches!(session.search("").await, SearchView::IdlePrompt));
        assert!(matches!(session.search("  ").await, SearchView::IdlePrompt));
    }

    #[tokio::test]
    async fn test_zero_matches_view() {
        let file = write_doc(&["evil.com"], 1);
        let session = file_session(file.path());
        session.load().await.unwrap();

        match session.search("nothing-here").await {
            SearchView::NoMatches { query } => assert_eq!(query, "nothing-here"),
            other => panic!("unexpected view: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_truncation_reports_true_total() {
        let iocs: Vec<String> = (0..150).map(|i| format!("host-{i}.evil.com")).collect();
        let refs: Vec<&str> = iocs.iter().map(String::as_str).collect();
        let file = write_doc(&refs, 150);
        let session = file_session(file.path());
        session.load().await.unwrap();

        match session.search("evil").await {
            SearchView::Results {
                matches,
                total,
                truncated,
                ..
            } => {
                assert_eq!(matches.len(), 100);
                assert_eq!(total, 150);
                assert!(truncated);
            }
            other => panic!("unexpected view: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_load_failure_degrades_without_crashing() {
        let session = file_session(std::path::Path::new("/nonexistent/iocs.json"));

        assert!(session.load().await.is_err());
        assert!(matches!(session.load_state(), LoadState::Failed(_)));
        assert_eq!(session.store_len(), 0);

        // Search still runs: load-error indicator, not a crash
        match session.search("x").await {
            SearchView::LoadError { message } => assert!(!message.is_empty()),
            other => panic!("unexpected view: {:?}", other),
        }
        // Empty query still shows the idle prompt
        assert!(matches!(session.search("").await, SearchView::IdlePrompt));
    }

    #[tokio::test]
    async fn test_reload_replaces_store_wholesale() {
        let file = write_doc(&["old-1.com", "old-2.com", "old-3.com"], 3);
        let session = file_session(file.path());
        session.load().await.unwrap();
        assert_eq!(session.store_len(), 3);

        let doc = serde_json::json!({"iocs": ["new.com"], "stats": {"total": 1}});
        std::fs::write(file.path(), doc.to_string()).unwrap();

        session.reload().await.unwrap();
        assert_eq!(session.store_len(), 1);
        match session.search("old").await {
            SearchView::NoMatches { .. } => {}
            other => panic!("old contents survived: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_store() {
        let file = write_doc(&["evil.com"], 1);
        let path = file.path().to_path_buf();
        let session = file_session(&path);
        session.load().await.unwrap();

        drop(file);
        assert!(session.reload().await.is_err());

        assert_eq!(session.load_state(), LoadState::Loaded);
        assert_eq!(session.store_len(), 1);
        assert!(matches!(
            session.search("evil").await,
            SearchView::Results { .. }
        ));
    }

    #[tokio::test]
    async fn test_missing_document_fields_default() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{}}").unwrap();
        let session = file_session(file.path());

        assert_eq!(session.load().await.unwrap(), 0);
        assert_eq!(session.load_state(), LoadState::Loaded);
        assert_eq!(session.stats().total, 0);
        assert!(session.stats().last_updated.is_none());
    }
}
