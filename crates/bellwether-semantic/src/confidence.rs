//! # Change Confidence Model
//!
//! Every detected change carries a 0-100 confidence. Structural aspects
//! (schema hashes, tool presence) are exact observations and score a fixed
//! 100. Semantic aspects (description wording, notes) score a weighted
//! blend of text-similarity factors, then bin into a categorical label.
//!
//! Aggregation across a tool is inverse-confidence weighted: shaky
//! detections pull the aggregate down harder than solid ones pull it up, so
//! an aggregate number reflects the *uncertainty* in the set.

use crate::categories::extract_categories;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Categorical confidence bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConfidenceLabel {
    High,
    Medium,
    Low,
    VeryLow,
}

impl ConfidenceLabel {
    /// Bins a score: high ≥85, medium ≥60, low ≥40, very-low otherwise.
    pub fn from_score(score: u32) -> Self {
        if score >= 85 {
            ConfidenceLabel::High
        } else if score >= 60 {
            ConfidenceLabel::Medium
        } else if score >= 40 {
            ConfidenceLabel::Low
        } else {
            ConfidenceLabel::VeryLow
        }
    }
}

/// How a confidence score was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceMethod {
    /// Exact observation; always 100.
    Structural,
    /// Text-similarity blend.
    Semantic,
}

/// Confidence attached to one detected change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeConfidence {
    pub score: u32,
    pub label: ConfidenceLabel,
    pub method: ConfidenceMethod,
}

impl ChangeConfidence {
    /// Confidence for a structural aspect.
    pub fn structural() -> Self {
        Self {
            score: 100,
            label: ConfidenceLabel::High,
            method: ConfidenceMethod::Structural,
        }
    }

    /// Confidence for a semantic aspect, from the two texts involved.
    pub fn semantic(before: &str, after: &str) -> Self {
        let score = semantic_score(before, after);
        Self {
            score,
            label: ConfidenceLabel::from_score(score),
            method: ConfidenceMethod::Semantic,
        }
    }
}

static INDICATOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(must|should|cannot|only|requires?|returns?|accepts?|deprecated|optional|default|maximum|minimum)\b",
    )
    .expect("indicator regex")
});

/// Weighted semantic similarity score between two texts.
///
/// Factors: keyword Jaccard (30%), length similarity (25%), semantic
/// indicator overlap (25%), category consistency (20%; 100 when the
/// extracted category sets match, 30 otherwise).
pub fn semantic_score(before: &str, after: &str) -> u32 {
    let jaccard = word_jaccard(before, after);
    let length = length_similarity(before, after);
    let indicators = indicator_overlap(before, after);

    let cats_before: BTreeSet<String> = extract_categories(before)
        .into_iter()
        .map(|m| m.category)
        .collect();
    let cats_after: BTreeSet<String> = extract_categories(after)
        .into_iter()
        .map(|m| m.category)
        .collect();
    let category_factor = if cats_before == cats_after { 100.0 } else { 30.0 };

    let score = 30.0 * jaccard + 25.0 * length + 25.0 * indicators + 0.2 * category_factor;
    (score.round() as i64).clamp(0, 100) as u32
}

/// Word-level Jaccard overlap, 0.0-1.0.
pub fn word_jaccard(a: &str, b: &str) -> f64 {
    let words_a: BTreeSet<String> = a.to_lowercase().split_whitespace().map(String::from).collect();
    let words_b: BTreeSet<String> = b.to_lowercase().split_whitespace().map(String::from).collect();
    if words_a.is_empty() && words_b.is_empty() {
        return 1.0;
    }
    let intersection = words_a.intersection(&words_b).count();
    let union = words_a.union(&words_b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

fn length_similarity(a: &str, b: &str) -> f64 {
    let (la, lb) = (a.len() as f64, b.len() as f64);
    if la == 0.0 && lb == 0.0 {
        return 1.0;
    }
    la.min(lb) / la.max(lb)
}

fn indicator_overlap(a: &str, b: &str) -> f64 {
    let set_a: BTreeSet<String> = INDICATOR_RE
        .find_iter(a)
        .map(|m| m.as_str().to_lowercase())
        .collect();
    let set_b: BTreeSet<String> = INDICATOR_RE
        .find_iter(b)
        .map(|m| m.as_str().to_lowercase())
        .collect();
    if set_a.is_empty() && set_b.is_empty() {
        return 1.0;
    }
    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count();
    intersection as f64 / union as f64
}

/// Inverse-confidence-weighted mean: lower-confidence items weigh more.
///
/// Returns `None` for an empty set.
pub fn aggregate_inverse_weighted(scores: &[u32]) -> Option<u32> {
    if scores.is_empty() {
        return None;
    }
    let mut weighted = 0.0;
    let mut weights = 0.0;
    for &score in scores {
        let weight = (101 - score.min(100)) as f64;
        weighted += weight * score as f64;
        weights += weight;
    }
    Some((weighted / weights).round() as u32)
}

/// Confidence roll-up for a whole diff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceSummary {
    pub overall_score: u32,
    pub min_score: u32,
    pub max_score: u32,
    pub structural_count: usize,
    pub semantic_count: usize,
    pub structural_average: u32,
    pub semantic_average: u32,
}

impl ConfidenceSummary {
    /// Summarizes all confidences attached to a diff.
    pub fn summarize(items: &[ChangeConfidence]) -> Self {
        if items.is_empty() {
            return Self {
                overall_score: 100,
                min_score: 100,
                max_score: 100,
                structural_count: 0,
                semantic_count: 0,
                structural_average: 0,
                semantic_average: 0,
            };
        }

        let scores: Vec<u32> = items.iter().map(|c| c.score).collect();
        let mean = (scores.iter().sum::<u32>() as f64 / scores.len() as f64).round() as u32;

        let structural: Vec<u32> = items
            .iter()
            .filter(|c| c.method == ConfidenceMethod::Structural)
            .map(|c| c.score)
            .collect();
        let semantic: Vec<u32> = items
            .iter()
            .filter(|c| c.method == ConfidenceMethod::Semantic)
            .map(|c| c.score)
            .collect();

        let avg = |xs: &[u32]| {
            if xs.is_empty() {
                0
            } else {
                (xs.iter().sum::<u32>() as f64 / xs.len() as f64).round() as u32
            }
        };

        Self {
            overall_score: mean,
            min_score: *scores.iter().min().unwrap(),
            max_score: *scores.iter().max().unwrap(),
            structural_count: structural.len(),
            semantic_count: semantic.len(),
            structural_average: avg(&structural),
            semantic_average: avg(&semantic),
        }
    }
}
