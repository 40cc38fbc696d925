//! Drift severity lattice.

use serde::{Deserialize, Serialize};

/// Graded impact of a detected change.
///
/// The ordering is the lattice the comparator folds over: a diff's overall
/// severity is the maximum of its parts, so adding a change can never lower
/// the grade and removing one can never raise it.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// No observable difference.
    #[default]
    None,
    /// Additive or cosmetic; consumers keep working.
    Info,
    /// Behavioral shift worth review; consumers may notice.
    Warning,
    /// Consumers relying on the previous behavior will break.
    Breaking,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Severity::None => "none",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Breaking => "breaking",
        };
        write!(f, "{label}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lattice_ordering() {
        assert!(Severity::None < Severity::Info);
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Breaking);
    }

    #[test]
    fn max_folding_is_monotone() {
        let base = [Severity::Info, Severity::Warning];
        let with_breaking = [Severity::Info, Severity::Warning, Severity::Breaking];
        let max = |xs: &[Severity]| xs.iter().copied().max().unwrap_or_default();
        assert!(max(&with_breaking) >= max(&base));
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Severity::Breaking).unwrap(), "\"breaking\"");
    }
}
