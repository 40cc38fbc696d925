//! # Error Pattern Clustering
//!
//! Groups observed error messages into stable pattern clusters. Two layers:
//!
//! 1. **Categorization** by keyword scan into a small taxonomy
//!    (validation, not-found, permission, timeout, internal, unknown).
//! 2. **Normalization** that strips the volatile parts of a message
//!    (UUIDs, file paths, numbers, quoted strings) so that two occurrences
//!    of the same underlying failure hash identically.
//!
//! The cluster set of a tool is comparable across observation runs: a new
//! category appearing, or a known one disappearing, is a behavioral signal
//! even when individual messages never repeat verbatim.

use crate::canonical::sha256_hex;
use crate::sample::Sample;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Taxonomy of observed error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Validation,
    NotFound,
    Permission,
    Timeout,
    Internal,
    Unknown,
}

/// A cluster of equivalent error messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPattern {
    /// Keyword-derived category.
    pub category: ErrorCategory,

    /// Hash of the normalized message text.
    pub pattern_hash: String,

    /// First message observed for this cluster, verbatim.
    pub example: String,

    /// How many samples fell into this cluster.
    pub count: usize,
}

static CATEGORY_RULES: Lazy<Vec<(ErrorCategory, Regex)>> = Lazy::new(|| {
    vec![
        (
            ErrorCategory::Validation,
            Regex::new(r"(?i)\binvalid\b|\brequired\b|\bmissing\b|must be|\bexpected\b").unwrap(),
        ),
        (
            ErrorCategory::NotFound,
            Regex::new(r"(?i)not found|does not exist|no such|\b404\b").unwrap(),
        ),
        (
            ErrorCategory::Permission,
            Regex::new(r"(?i)\bpermission\b|\bdenied\b|\bunauthorized\b|\bforbidden\b|\baccess\b")
                .unwrap(),
        ),
        (
            ErrorCategory::Timeout,
            Regex::new(r"(?i)\btimeout\b|timed out").unwrap(),
        ),
        (
            ErrorCategory::Internal,
            Regex::new(r"(?i)\binternal\b|server error|\bunexpected\b").unwrap(),
        ),
    ]
});

static UUID_IN_TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
        .unwrap()
});
static PATH_IN_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:[A-Za-z]:)?(?:[/\\][\w.~-]+){2,}").unwrap());
static QUOTED_IN_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""[^"]*"|'[^']*'"#).unwrap());
static INT_IN_TEXT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());
static WS_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Assigns a category to an error message by keyword scan.
pub fn categorize_error(message: &str) -> ErrorCategory {
    for (category, rule) in CATEGORY_RULES.iter() {
        if rule.is_match(message) {
            return *category;
        }
    }
    ErrorCategory::Unknown
}

/// Normalizes an error message by replacing its volatile parts with
/// placeholders, lowercasing, and collapsing whitespace.
///
/// Replacement order matters: UUIDs before integer runs, so the hex
/// segments of an identifier are not shredded digit by digit.
pub fn normalize_error(message: &str) -> String {
    let text = UUID_IN_TEXT.replace_all(message, "<uuid>");
    let text = PATH_IN_TEXT.replace_all(&text, "<path>");
    let text = QUOTED_IN_TEXT.replace_all(&text, "<quoted>");
    let text = INT_IN_TEXT.replace_all(&text, "<int>");
    let text = text.to_lowercase();
    WS_RUN.replace_all(text.trim(), " ").into_owned()
}

/// Hash of the normalized form of a message.
pub fn pattern_hash(message: &str) -> String {
    let mut hash = sha256_hex(normalize_error(message).as_bytes());
    hash.truncate(16);
    hash
}

/// Clusters the error samples of a tool into patterns.
///
/// Clusters are keyed by pattern hash; the first message seen becomes the
/// cluster's example. The result is sorted by descending count, then hash,
/// so equal inputs always produce an identical cluster list.
pub fn cluster_errors(samples: &[Sample]) -> Vec<ErrorPattern> {
    let mut clusters: HashMap<String, ErrorPattern> = HashMap::new();

    for sample in samples {
        let message = match &sample.error_message {
            Some(m) if !m.is_empty() => m,
            _ => continue,
        };
        let hash = pattern_hash(message);
        clusters
            .entry(hash.clone())
            .and_modify(|p| p.count += 1)
            .or_insert_with(|| ErrorPattern {
                category: categorize_error(message),
                pattern_hash: hash,
                example: message.clone(),
                count: 1,
            });
    }

    let mut out: Vec<ErrorPattern> = clusters.into_values().collect();
    out.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.pattern_hash.cmp(&b.pattern_hash))
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn categories_by_keyword() {
        assert_eq!(categorize_error("Invalid argument: foo"), ErrorCategory::Validation);
        assert_eq!(categorize_error("field 'x' is required"), ErrorCategory::Validation);
        assert_eq!(categorize_error("resource not found"), ErrorCategory::NotFound);
        assert_eq!(categorize_error("no such table users"), ErrorCategory::NotFound);
        assert_eq!(categorize_error("Permission denied"), ErrorCategory::Permission);
        assert_eq!(categorize_error("request timed out"), ErrorCategory::Timeout);
        assert_eq!(categorize_error("Internal server error"), ErrorCategory::Internal);
        assert_eq!(categorize_error("something odd happened"), ErrorCategory::Unknown);
    }

    #[test]
    fn unexpected_is_internal_not_validation() {
        // "unexpected" must not match the word "expected".
        assert_eq!(categorize_error("unexpected failure"), ErrorCategory::Internal);
    }

    #[test]
    fn normalization_replaces_volatile_parts() {
        let a = normalize_error("user 123e4567-e89b-12d3-a456-426614174000 not found");
        let b = normalize_error("user 99999999-aaaa-bbbb-cccc-000011112222 not found");
        assert_eq!(a, b);
        assert!(a.contains("<uuid>"));
    }

    #[test]
    fn same_hash_for_differing_numbers() {
        assert_eq!(
            pattern_hash("row 42 exceeds limit 100"),
            pattern_hash("row 7 exceeds limit 500")
        );
    }

    #[test]
    fn same_hash_for_differing_quoted_strings() {
        assert_eq!(
            pattern_hash(r#"unknown key "alpha" in input"#),
            pattern_hash(r#"unknown key "omega" in input"#)
        );
    }

    #[test]
    fn same_hash_for_differing_paths() {
        assert_eq!(
            pattern_hash("cannot open /var/data/one.txt for reading"),
            pattern_hash("cannot open /home/user/two.log for reading")
        );
    }

    #[test]
    fn case_and_whitespace_do_not_matter() {
        assert_eq!(
            pattern_hash("Connection   REFUSED by peer"),
            pattern_hash("connection refused by peer")
        );
    }

    #[test]
    fn different_failures_hash_differently() {
        assert_ne!(
            pattern_hash("connection refused"),
            pattern_hash("disk quota exceeded")
        );
    }

    #[test]
    fn clustering_counts_and_orders() {
        let samples = vec![
            Sample::error("t", json!({}), 1, "value 1 is invalid"),
            Sample::error("t", json!({}), 1, "value 2 is invalid"),
            Sample::error("t", json!({}), 1, "item not found"),
        ];
        let clusters = cluster_errors(&samples);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].count, 2);
        assert_eq!(clusters[0].category, ErrorCategory::Validation);
        assert_eq!(clusters[0].example, "value 1 is invalid");
        assert_eq!(clusters[1].category, ErrorCategory::NotFound);
    }

    #[test]
    fn success_samples_are_ignored() {
        let samples = vec![Sample::success("t", json!({}), 1, json!("ok"))];
        assert!(cluster_errors(&samples).is_empty());
    }
}
