//! Query tokenization and text normalization.
//!
//! # Invariants
//! - Tokens are trimmed, lower-cased and never empty.
//! - Quoted segments (`"..."` or `'...'`) stay a single token.

use once_cell::sync::Lazy;
use regex::Regex;

static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""([^"]*)"|'([^']*)'|(\S+)"#).expect("valid token regex"));

/// Normalizes text for case-insensitive substring matching.
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Splits a raw query into normalized tokens.
pub fn tokenize_query(raw: &str) -> Vec<String> {
    TOKEN_RE
        .captures_iter(raw)
        .filter_map(|captures| {
            captures
                .get(1)
                .or_else(|| captures.get(2))
                .or_else(|| captures.get(3))
        })
        .map(|segment| normalize(segment.as_str()))
        .filter(|token| !token.is_empty())
        .collect()
}

/// Normalizes caller-supplied tokens, dropping blanks.
pub fn normalize_tokens<I, S>(tokens: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tokens
        .into_iter()
        .map(|token| normalize(token.as_ref()))
        .filter(|token| !token.is_empty())
        .collect()
}
