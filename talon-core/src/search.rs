//! Substring search over the indicator store
//!
//! A stable, case-insensitive filter: store order is preserved, at most
//! [`RESULT_CAP`](crate::RESULT_CAP) matches are materialized, and the
//! true match count is always reported alongside a truncation flag.

use serde::Serialize;

use crate::classify::{classify, IocType};
use crate::RESULT_CAP;

/// Byte range of the highlighted query occurrence within the match text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// A single classified, highlighted search hit
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    /// Indicator text, original casing preserved
    pub text: String,
    /// Classified type
    pub ioc_type: IocType,
    /// First case-insensitive occurrence of the query, if any
    pub highlight: Option<Span>,
}

impl MatchResult {
    /// Build a match for `text`, locating the first occurrence of `query`
    pub fn new(text: String, query: &str) -> Self {
        let highlight = find_ignore_ascii_case(&text, query).map(|start| Span {
            start,
            end: start + query.len(),
        });
        let ioc_type = classify(&text);
        Self {
            text,
            ioc_type,
            highlight,
        }
    }

    /// Split the text into (before, hit, after) around the highlight span
    pub fn segments(&self) -> (&str, &str, &str) {
        if let Some(span) = self.highlight {
            if let (Some(before), Some(hit), Some(after)) = (
                self.text.get(..span.start),
                self.text.get(span.start..span.end),
                self.text.get(span.end..),
            ) {
                return (before, hit, after);
            }
        }
        (self.text.as_str(), "", "")
    }
}

/// Outcome of one search invocation
#[derive(Debug, Clone)]
pub enum SearchOutcome {
    /// Empty or whitespace-only query; no search was performed
    NoQuery,
    /// Filter ran; `total` is the true match count, `matches` is capped
    Results {
        matches: Vec<MatchResult>,
        total: usize,
        truncated: bool,
    },
}

/// Search the store for indicators containing `query`, case-insensitively.
///
/// Store order is preserved. At most [`RESULT_CAP`](crate::RESULT_CAP)
/// matches are returned; `total` counts every match regardless.
pub fn search(query: &str, store: &[String]) -> SearchOutcome {
    let query = query.trim();
    if query.is_empty() {
        return SearchOutcome::NoQuery;
    }

    let mut matches = Vec::new();
    let mut total = 0usize;

    for indicator in store {
        let Some(start) = find_ignore_ascii_case(indicator, query) else {
            continue;
        };
        total += 1;
        if matches.len() < RESULT_CAP {
            matches.push(MatchResult {
                text: indicator.clone(),
                ioc_type: classify(indicator),
                highlight: Some(Span {
                    start,
                    end: start + query.len(),
                }),
            });
        }
    }

    SearchOutcome::Results {
        matches,
        total,
        truncated: total > RESULT_CAP,
    }
}

/// Byte offset of the first ASCII-case-insensitive occurrence of `needle`
fn find_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
    let h = haystack.as_bytes();
    let n = needle.as_bytes();
    if n.is_empty() || n.len() > h.len() {
        return None;
    }
    h.windows(n.len()).position(|w| w.eq_ignore_ascii_case(n))
}
