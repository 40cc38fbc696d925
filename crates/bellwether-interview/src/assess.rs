//! Expectation assessment.
//!
//! Each sample's observed outcome is checked against what its test case
//! anticipated. The pass-rate is reported per tool and per persona but
//! never gates baseline creation; a tool that fails its own contract is
//! still a tool worth recording.

use bellwether_baseline::{PersonaPassRate, ToolAssessment};
use bellwether_fingerprint::Outcome;
use bellwether_probe::ExpectedOutcome;
use std::collections::BTreeMap;

/// Whether an observed outcome satisfies the expectation.
pub fn matches_expectation(observed: Outcome, expected: ExpectedOutcome) -> bool {
    match expected {
        ExpectedOutcome::Either => true,
        ExpectedOutcome::Success => observed == Outcome::Success,
        ExpectedOutcome::Error => observed == Outcome::Error,
    }
}

/// Accumulates pass counts per persona while a tool is probed.
#[derive(Debug, Default)]
pub struct AssessmentTally {
    by_persona: BTreeMap<String, (usize, usize)>,
}

impl AssessmentTally {
    pub fn record(&mut self, persona: &str, observed: Outcome, expected: ExpectedOutcome) {
        let entry = self.by_persona.entry(persona.to_string()).or_insert((0, 0));
        entry.1 += 1;
        if matches_expectation(observed, expected) {
            entry.0 += 1;
        }
    }

    /// Folds the tally into the baseline's assessment record.
    pub fn finish(self) -> Option<ToolAssessment> {
        if self.by_persona.is_empty() {
            return None;
        }
        let mut passed = 0;
        let mut total = 0;
        let mut by_persona = Vec::new();
        for (persona, (p, t)) in self.by_persona {
            passed += p;
            total += t;
            by_persona.push(PersonaPassRate {
                persona,
                passed: p,
                total: t,
            });
        }
        Some(ToolAssessment {
            passed,
            total,
            by_persona,
        })
    }
}
