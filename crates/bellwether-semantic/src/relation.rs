//! # Category Relationship Scoring
//!
//! Scores how related two categories are on a 0-100 scale:
//!
//! - identical names score 100;
//! - a direct entry in the similarity table wins next, looked up
//!   symmetrically;
//! - categories sharing a group in the group table score 70;
//! - anything else scores 0.
//!
//! The direct table takes precedence over group membership, which is how
//! `authentication`/`authorization` stay explicitly unrelated even though
//! `authorization` belongs to the access-control group.

use serde::{Deserialize, Serialize};

/// A direct similarity entry between two categories.
#[derive(Debug, Clone)]
pub struct DirectRelation {
    pub a: &'static str,
    pub b: &'static str,
    pub score: u32,
}

/// Built-in direct similarity entries. Lookup is symmetric.
pub const DIRECT_RELATIONS: &[DirectRelation] = &[
    DirectRelation { a: "security", b: "authorization", score: 60 },
    DirectRelation { a: "security", b: "access_control", score: 65 },
    DirectRelation { a: "security", b: "destructive", score: 55 },
    DirectRelation { a: "validation", b: "error_handling", score: 60 },
    DirectRelation { a: "limitation", b: "performance", score: 50 },
    DirectRelation { a: "data_access", b: "destructive", score: 45 },
    // Deliberately unrelated: knowing who a caller is and what a caller may
    // do are different properties, and conflating them hides drift.
    DirectRelation { a: "authentication", b: "authorization", score: 0 },
];

/// Built-in category groups. Members of the same group score 70.
pub const CATEGORY_GROUPS: &[(&str, &[&str])] = &[
    ("access_control", &["authorization", "access_control"]),
    ("robustness", &["validation", "error_handling", "limitation"]),
    ("data", &["data_access", "destructive"]),
];

/// Scores the relationship between two categories.
pub fn relationship_score(a: &str, b: &str) -> u32 {
    if a == b {
        return 100;
    }
    for entry in DIRECT_RELATIONS {
        if (entry.a == a && entry.b == b) || (entry.a == b && entry.b == a) {
            return entry.score;
        }
    }
    for (_, members) in CATEGORY_GROUPS {
        if members.contains(&a) && members.contains(&b) {
            return 70;
        }
    }
    0
}

/// Best cross-pairing between two category lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPair {
    pub before: String,
    pub after: String,
    pub relationship: u32,
    /// `round(0.4·c1 + 0.4·c2 + 0.2·rel)`.
    pub combined_confidence: u32,
}

/// Finds the strongest related pair across two `(category, confidence)`
/// lists. Pairs with a zero relationship are ignored; ranking is
/// lexicographic by `(relationship, combined_confidence)`.
pub fn best_match(
    before: &[(String, u32)],
    after: &[(String, u32)],
) -> Option<CategoryPair> {
    let mut best: Option<CategoryPair> = None;
    for (cat_a, conf_a) in before {
        for (cat_b, conf_b) in after {
            let rel = relationship_score(cat_a, cat_b);
            if rel == 0 {
                continue;
            }
            let combined = (0.4 * *conf_a as f64 + 0.4 * *conf_b as f64 + 0.2 * rel as f64)
                .round() as u32;
            let candidate = CategoryPair {
                before: cat_a.clone(),
                after: cat_b.clone(),
                relationship: rel,
                combined_confidence: combined,
            };
            let better = match &best {
                None => true,
                Some(current) => {
                    (candidate.relationship, candidate.combined_confidence)
                        > (current.relationship, current.combined_confidence)
                }
            };
            if better {
                best = Some(candidate);
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_scores_full() {
        assert_eq!(relationship_score("security", "security"), 100);
    }

    #[test]
    fn direct_table_is_symmetric() {
        for entry in DIRECT_RELATIONS {
            assert_eq!(
                relationship_score(entry.a, entry.b),
                relationship_score(entry.b, entry.a),
                "asymmetric entry: {} / {}",
                entry.a,
                entry.b
            );
        }
    }

    #[test]
    fn group_members_score_seventy() {
        assert_eq!(relationship_score("validation", "limitation"), 70);
        assert_eq!(relationship_score("authorization", "access_control"), 70);
    }

    #[test]
    fn direct_entry_beats_group() {
        // validation/error_handling share a group (70) but the direct entry
        // pins them at 60.
        assert_eq!(relationship_score("validation", "error_handling"), 60);
    }

    #[test]
    fn authentication_stays_unrelated_to_access_control() {
        assert_eq!(relationship_score("authentication", "authorization"), 0);
        assert_eq!(relationship_score("authentication", "access_control"), 0);
    }

    #[test]
    fn unknown_categories_score_zero() {
        assert_eq!(relationship_score("weather", "astrology"), 0);
    }

    #[test]
    fn every_configured_pair_is_symmetric() {
        let all: Vec<&str> = crate::categories::DEFAULT_CATEGORIES
            .iter()
            .map(|d| d.name)
            .collect();
        for a in &all {
            for b in &all {
                assert_eq!(relationship_score(a, b), relationship_score(b, a));
            }
        }
    }

    #[test]
    fn best_match_prefers_stronger_relationship() {
        let before = vec![("security".to_string(), 80), ("validation".to_string(), 90)];
        let after = vec![("validation".to_string(), 85), ("access_control".to_string(), 70)];
        let pair = best_match(&before, &after).unwrap();
        assert_eq!(pair.before, "validation");
        assert_eq!(pair.after, "validation");
        assert_eq!(pair.relationship, 100);
        // round(0.4*90 + 0.4*85 + 0.2*100) = round(90) = 90
        assert_eq!(pair.combined_confidence, 90);
    }

    #[test]
    fn best_match_none_when_all_unrelated() {
        let before = vec![("authentication".to_string(), 80)];
        let after = vec![("access_control".to_string(), 80)];
        assert!(best_match(&before, &after).is_none());
    }
}
