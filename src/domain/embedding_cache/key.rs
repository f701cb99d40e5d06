//! Cache key normalization

use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Canonical cache key for a query: lowercased, trimmed, with every run of
/// whitespace collapsed to a single space.
///
/// Two queries that normalize to the same string share one cache entry.
pub fn normalize_query(query: &str) -> String {
    let lowered = query.to_lowercase();
    WHITESPACE_RUN
        .replace_all(lowered.trim(), " ")
        .into_owned()
}
