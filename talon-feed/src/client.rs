//! HTTP client construction
//!
//! One builder-configured reqwest client is shared by document fetches,
//! fallback API queries, and feed pulls.

use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// User agent sent on all outbound requests
pub const USER_AGENT: &str = concat!("talon/", env!("CARGO_PKG_VERSION"));

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

/// Errors from the data provider layer
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("source returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("failed to read {path}: {reason}")]
    File { path: String, reason: String },

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Create the shared HTTP client
pub fn create_client(config: &ClientConfig) -> Result<Client, FeedError> {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| FeedError::ClientBuild(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_user_agent_names_the_tool() {
        assert!(USER_AGENT.starts_with("talon/"));
    }

    #[test]
    fn test_create_client() {
        assert!(create_client(&ClientConfig::default()).is_ok());
    }
}
