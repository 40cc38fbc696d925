//! # Category Extraction
//!
//! Assigns descriptive categories to free text (tool descriptions, error
//! notes, probe remarks) by keyword scan, with a calibrated confidence per
//! match. The extraction is fully deterministic; an optional LLM
//! collaborator can add factors upstream, but the keyword pipeline alone
//! always produces a complete result.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A category detected in a piece of text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryMatch {
    pub category: String,

    /// Calibrated 10-100 score.
    pub confidence: u32,

    /// Keywords that fired, sorted.
    pub keywords: Vec<String>,
}

/// A configured category with its keyword list.
#[derive(Debug, Clone)]
pub struct CategoryDef {
    pub name: &'static str,
    pub keywords: &'static [&'static str],
}

/// The built-in category table.
///
/// Callers may extract against their own table; this one covers the
/// vocabulary that shows up in tool descriptions and probe notes.
pub const DEFAULT_CATEGORIES: &[CategoryDef] = &[
    CategoryDef {
        name: "security",
        keywords: &[
            "security", "secure", "vulnerability", "exploit", "injection", "sanitize",
            "escape", "attack",
        ],
    },
    CategoryDef {
        name: "authentication",
        keywords: &["authentication", "login", "credential", "password", "token", "session"],
    },
    CategoryDef {
        name: "authorization",
        keywords: &["authorization", "permission", "role", "privilege", "forbidden", "scope"],
    },
    CategoryDef {
        name: "access_control",
        keywords: &["access control", "acl", "restricted", "allowlist", "denylist"],
    },
    CategoryDef {
        name: "limitation",
        keywords: &[
            "limit", "limitation", "maximum", "minimum", "quota", "bounded", "restricted",
            "capped",
        ],
    },
    CategoryDef {
        name: "performance",
        keywords: &["performance", "latency", "slow", "fast", "throughput", "cache", "timeout"],
    },
    CategoryDef {
        name: "validation",
        keywords: &["validate", "validation", "invalid", "required", "format", "schema"],
    },
    CategoryDef {
        name: "error_handling",
        keywords: &["error", "failure", "retry", "fallback", "exception", "recover"],
    },
    CategoryDef {
        name: "data_access",
        keywords: &["read", "write", "query", "database", "file", "storage", "fetch"],
    },
    CategoryDef {
        name: "destructive",
        keywords: &["delete", "remove", "destroy", "overwrite", "drop", "truncate"],
    },
];

/// Extracts categories from text against the built-in table.
pub fn extract_categories(text: &str) -> Vec<CategoryMatch> {
    extract_with(text, DEFAULT_CATEGORIES)
}

/// Extracts categories from text against a caller-supplied table.
///
/// Confidence sums a coverage ratio, a keyword-length bonus, a distinctness
/// bonus, and a sparse-match penalty for long texts, clamped to [10, 100].
pub fn extract_with(text: &str, table: &[CategoryDef]) -> Vec<CategoryMatch> {
    let lowered = text.to_lowercase();
    let word_count = lowered.split_whitespace().count();

    let mut out = Vec::new();
    for def in table {
        let matched: BTreeSet<&str> = def
            .keywords
            .iter()
            .copied()
            .filter(|kw| lowered.contains(kw))
            .collect();
        if matched.is_empty() {
            continue;
        }

        let coverage = matched.len() as f64 / def.keywords.len() as f64;
        let avg_len: f64 =
            matched.iter().map(|kw| kw.len() as f64).sum::<f64>() / matched.len() as f64;

        let mut score = 30.0 + coverage * 40.0;
        // Longer keywords are less likely to fire by accident.
        if avg_len >= 7.0 {
            score += 10.0;
        }
        if matched.len() >= 3 {
            score += 10.0;
        }
        // A single keyword buried in a long text is weak evidence.
        if word_count > 50 && matched.len() < 2 {
            score -= 15.0;
        }

        out.push(CategoryMatch {
            category: def.name.to_string(),
            confidence: (score.round() as i64).clamp(10, 100) as u32,
            keywords: matched.into_iter().map(String::from).collect(),
        });
    }

    out.sort_by(|a, b| {
        b.confidence
            .cmp(&a.confidence)
            .then_with(|| a.category.cmp(&b.category))
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_security_vocabulary() {
        let matches = extract_categories("Sanitize input to prevent injection attack vectors");
        assert_eq!(matches[0].category, "security");
        assert!(matches[0].confidence >= 10);
        assert!(matches[0].keywords.contains(&"injection".to_string()));
    }

    #[test]
    fn no_match_for_unrelated_text() {
        let matches = extract_categories("Returns the current weather for a city");
        assert!(matches.iter().all(|m| m.category != "security"));
    }

    #[test]
    fn more_keywords_raise_confidence() {
        let sparse = extract_categories("secure endpoint");
        let dense =
            extract_categories("secure endpoint; sanitize and escape input against injection");
        let sparse_score = sparse.iter().find(|m| m.category == "security").unwrap().confidence;
        let dense_score = dense.iter().find(|m| m.category == "security").unwrap().confidence;
        assert!(dense_score > sparse_score);
    }

    #[test]
    fn confidence_stays_in_bounds() {
        let long_tail = "word ".repeat(80) + "quota";
        for m in extract_categories(&long_tail) {
            assert!((10..=100).contains(&m.confidence));
        }
    }

    #[test]
    fn extraction_is_deterministic() {
        let text = "Delete files after validating the required format";
        assert_eq!(extract_categories(text), extract_categories(text));
    }
}
