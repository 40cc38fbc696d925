//! # Protocol-Version Feature Gating
//!
//! Wire fields arrive and depart with protocol revisions. A field that one
//! side's protocol never carried is not drift — it is a difference in what
//! could be observed. The comparator therefore inspects an aspect only when
//! the feature is present in *both* baselines' protocol versions, and the
//! gate is symmetric: swapping old and new baselines never changes which
//! aspects participate.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A protocol-version-dependent capability of the wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FeatureFlag {
    /// Tool behavior hints (`destructiveHint`, `readOnlyHint`, ...).
    Annotations,
    /// Human-facing tool titles.
    ToolTitle,
    /// Declared output schemas.
    OutputSchema,
    /// Execution descriptors.
    Execution,
}

/// Protocol revisions are dated strings, so feature introduction is a plain
/// lexicographic threshold.
const ANNOTATIONS_SINCE: &str = "2025-03-26";
const TOOL_TITLE_SINCE: &str = "2025-06-18";
const OUTPUT_SCHEMA_SINCE: &str = "2025-06-18";
const EXECUTION_SINCE: &str = "2025-11-25";

/// Features a given protocol version carries.
pub fn feature_flags(protocol_version: &str) -> BTreeSet<FeatureFlag> {
    let mut flags = BTreeSet::new();
    if protocol_version >= ANNOTATIONS_SINCE {
        flags.insert(FeatureFlag::Annotations);
    }
    if protocol_version >= TOOL_TITLE_SINCE {
        flags.insert(FeatureFlag::ToolTitle);
    }
    if protocol_version >= OUTPUT_SCHEMA_SINCE {
        flags.insert(FeatureFlag::OutputSchema);
    }
    if protocol_version >= EXECUTION_SINCE {
        flags.insert(FeatureFlag::Execution);
    }
    flags
}

/// Features observable in both baselines.
pub fn shared_flags(before: &str, after: &str) -> BTreeSet<FeatureFlag> {
    feature_flags(before)
        .intersection(&feature_flags(after))
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn old_protocol_has_no_flags() {
        assert!(feature_flags("2024-11-05").is_empty());
    }

    #[test]
    fn features_accumulate_with_revisions() {
        let mid = feature_flags("2025-03-26");
        assert!(mid.contains(&FeatureFlag::Annotations));
        assert!(!mid.contains(&FeatureFlag::ToolTitle));

        let new = feature_flags("2025-06-18");
        assert!(new.contains(&FeatureFlag::Annotations));
        assert!(new.contains(&FeatureFlag::ToolTitle));
        assert!(new.contains(&FeatureFlag::OutputSchema));
    }

    #[test]
    fn shared_set_is_the_intersection() {
        let shared = shared_flags("2024-11-05", "2025-06-18");
        assert!(shared.is_empty());

        let shared = shared_flags("2025-03-26", "2025-06-18");
        assert_eq!(shared.into_iter().collect::<Vec<_>>(), vec![FeatureFlag::Annotations]);
    }

    #[test]
    fn gating_is_symmetric() {
        for (a, b) in [
            ("2024-11-05", "2025-06-18"),
            ("2025-03-26", "2025-06-18"),
            ("2025-06-18", "2025-06-18"),
        ] {
            assert_eq!(shared_flags(a, b), shared_flags(b, a));
        }
    }
}
