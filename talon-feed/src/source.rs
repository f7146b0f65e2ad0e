//! IOC document sources
//!
//! A source yields the full IOC document. The load protocol is two-tier
//! and non-retrying: one primary attempt, after which the configured
//! fallback API takes over. HTTP fetches carry a cache-busting timestamp
//! parameter to defeat intermediary caching.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

use crate::FeedError;
use talon_core::IocDocument;

/// A provider of the aggregated IOC document
#[async_trait]
pub trait IocSource: Send + Sync {
    /// Human-readable source description, for logs and error messages
    fn describe(&self) -> String;

    /// Fetch and parse the full document
    async fn fetch_document(&self, client: &Client) -> Result<IocDocument, FeedError>;
}

/// Local JSON document on disk
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl IocSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch_document(&self, _client: &Client) -> Result<IocDocument, FeedError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| FeedError::File {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            })?;
        serde_json::from_str(&raw).map_err(|e| FeedError::Malformed(e.to_string()))
    }
}

/// Remote JSON document over HTTP
#[derive(Debug, Clone)]
pub struct HttpSource {
    url: String,
}

impl HttpSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Append the cache-busting token, respecting an existing query string
    fn busted_url(&self) -> String {
        let sep = if self.url.contains('?') { '&' } else { '?' };
        format!("{}{}t={}", self.url, sep, Utc::now().timestamp_millis())
    }
}

#[async_trait]
impl IocSource for HttpSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    async fn fetch_document(&self, client: &Client) -> Result<IocDocument, FeedError> {
        let url = self.busted_url();
        debug!("Fetching IOC document from {}", url);

        let response = client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(FeedError::Status(response.status()));
        }

        Ok(response.json::<IocDocument>().await?)
    }
}

/// Where the session gets its data: one primary document source, an
/// optional fallback search API for degraded mode, and an optional
/// refresh cadence.
pub struct LoadStrategy {
    pub primary: Box<dyn IocSource>,
    pub fallback_api: Option<String>,
    pub refresh_interval: Option<Duration>,
}

impl LoadStrategy {
    pub fn new(primary: Box<dyn IocSource>) -> Self {
        Self {
            primary,
            fallback_api: None,
            refresh_interval: None,
        }
    }

    pub fn with_fallback_api(mut self, base_url: impl Into<String>) -> Self {
        self.fallback_api = Some(base_url.into());
        self
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = Some(interval);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_cache_bust_separator() {
        let plain = HttpSource::new("https://intel.example/iocs.json");
        assert!(plain.busted_url().contains("/iocs.json?t="));

        let with_query = HttpSource::new("https://intel.example/iocs.json?v=2");
        assert!(with_query.busted_url().contains("?v=2&t="));
    }

    #[tokio::test]
    async fn test_file_source_reads_document() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"iocs": ["evil.com", "1.2.3.4"], "stats": {{"total": 2}}}}"#
        )
        .unwrap();

        let client = Client::new();
        let source = FileSource::new(file.path());
        let doc = source.fetch_document(&client).await.unwrap();

        assert_eq!(doc.iocs, vec!["evil.com", "1.2.3.4"]);
        assert_eq!(doc.stats.total, 2);
    }

    #[tokio::test]
    async fn test_file_source_missing_file() {
        let client = Client::new();
        let source = FileSource::new("/nonexistent/iocs.json");
        let err = source.fetch_document(&client).await.unwrap_err();
        assert!(matches!(err, FeedError::File { .. }));
    }

    #[tokio::test]
    async fn test_file_source_malformed_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let client = Client::new();
        let source = FileSource::new(file.path());
        let err = source.fetch_document(&client).await.unwrap_err();
        assert!(matches!(err, FeedError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_file_source_defaults_missing_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{}}").unwrap();

        let client = Client::new();
        let source = FileSource::new(file.path());
        let doc = source.fetch_document(&client).await.unwrap();
        assert!(doc.iocs.is_empty());
        assert_eq!(doc.stats.total, 0);
    }

    #[test]
    fn test_load_strategy_builder() {
        let strategy = LoadStrategy::new(Box::new(FileSource::new("iocs.json")))
            .with_fallback_api("https://api.example")
            .with_refresh_interval(Duration::from_secs(300));

        assert_eq!(strategy.fallback_api.as_deref(), Some("https://api.example"));
        assert_eq!(strategy.refresh_interval, Some(Duration::from_secs(300)));
        assert_eq!(strategy.primary.describe(), "iocs.json");
    }
}
