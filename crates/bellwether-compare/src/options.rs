//! Comparison options.

use crate::diff::Aspect;
use crate::severity::Severity;

/// Caller knobs for one comparison.
#[derive(Debug, Clone)]
pub struct CompareOptions {
    /// Aspects excluded from the comparison entirely.
    pub ignore_aspects: Vec<Aspect>,

    /// Drop changes whose confidence score falls below this.
    pub confidence_min: Option<u32>,

    /// Severity at which the caller wants a failing exit.
    pub fail_on_severity: Option<Severity>,

    /// Latency regression ratio that triggers a warning; double it for
    /// breaking. 0.5 means "50% slower".
    pub regression_threshold: f64,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            ignore_aspects: Vec::new(),
            confidence_min: None,
            fail_on_severity: None,
            regression_threshold: 0.5,
        }
    }
}

impl CompareOptions {
    /// Whether a diff at `severity` should fail the caller.
    pub fn should_fail(&self, severity: Severity) -> bool {
        match self.fail_on_severity {
            Some(threshold) => severity >= threshold,
            None => false,
        }
    }
}
