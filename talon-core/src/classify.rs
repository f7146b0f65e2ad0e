//! Indicator classification
//!
//! Maps a raw indicator string to a semantic type via anchored pattern
//! checks, evaluated in strict priority order (first match wins).

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Semantic type of an indicator string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IocType {
    /// IPv4 dotted quad
    Ip,
    /// MD5, SHA-1, or SHA-256 hex digest
    Hash,
    /// Domain name
    Domain,
    /// HTTP(S) URL
    Url,
    /// Anything else
    Unknown,
}

impl IocType {
    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ip => "IP",
            Self::Hash => "Hash",
            Self::Domain => "Domain",
            Self::Url => "URL",
            Self::Unknown => "Unknown",
        }
    }

    /// Style class for renderers
    pub fn style_class(&self) -> &'static str {
        match self {
            Self::Ip => "ip-type",
            Self::Hash => "hash-type",
            Self::Domain => "domain-type",
            Self::Url => "url-type",
            Self::Unknown => "",
        }
    }
}

impl fmt::Display for IocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// Octet values are intentionally unchecked: "999.999.999.999" still counts.
static IPV4_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}$").unwrap());

static HASH_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:[a-f0-9]{32}|[a-f0-9]{40}|[a-f0-9]{64})$").unwrap()
});

static DOMAIN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[a-z0-9.-]+\.[a-z]{2,}$").unwrap());

static URL_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^https?://").unwrap());

/// Classify an indicator string. Total over any input.
pub fn classify(indicator: &str) -> IocType {
    if IPV4_REGEX.is_match(indicator) {
        IocType::Ip
    } else if HASH_REGEX.is_match(indicator) {
        IocType::Hash
    } else if DOMAIN_REGEX.is_match(indicator) {
        IocType::Domain
    } else if URL_REGEX.is_match(indicator) {
        IocType::Url
    } else {
        IocType::Unknown
    }
}
