//! Fallback search API client
//!
//! When the primary document is unavailable, the session queries a remote
//! search endpoint per request instead of filtering a local store. The
//! endpoint accepts `q` and `limit` parameters and answers with
//! `{"results": [...]}`.

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::FeedError;
use talon_core::RESULT_CAP;

#[derive(Debug, Deserialize)]
struct ApiResponse {
    results: Vec<String>,
}

/// Query the fallback endpoint, returning raw indicator strings
pub async fn search_api(
    client: &Client,
    base_url: &str,
    query: &str,
) -> Result<Vec<String>, FeedError> {
    let url = format!("{}/search", base_url.trim_end_matches('/'));
    debug!("Querying fallback API {} for {:?}", url, query);

    let limit = RESULT_CAP.to_string();
    let response = client
        .get(&url)
        .query(&[("q", query), ("limit", limit.as_str())])
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(FeedError::Status(response.status()));
    }

    let body = response.text().await?;
    parse_results(&body)
}

/// Parse the `{results: [...]}` body. A missing `results` field is a
/// malformed response, not an empty result set.
fn parse_results(body: &str) -> Result<Vec<String>, FeedError> {
    let parsed: ApiResponse =
        serde_json::from_str(body).map_err(|e| FeedError::Malformed(e.to_string()))?;
    Ok(parsed.results)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_results() {
        let body = r#"{"results": ["evil.com", "1.2.3.4"]}"#;
        assert_eq!(parse_results(body).unwrap(), vec!["evil.com", "1.2.3.4"]);
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let body = r#"{"results": ["evil.com"], "count": 1, "total": 9000, "stats": {}}"#;
        assert_eq!(parse_results(body).unwrap(), vec!["evil.com"]);
    }

    #[test]
    fn test_missing_results_is_malformed() {
        let err = parse_results(r#"{"count": 0}"#).unwrap_err();
        assert!(matches!(err, FeedError::Malformed(_)));
    }

    #[test]
    fn test_non_json_is_malformed() {
        let err = parse_results("<html>busy</html>").unwrap_err();
        assert!(matches!(err, FeedError::Malformed(_)));
    }
}
