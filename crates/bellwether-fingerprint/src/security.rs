//! Security fingerprint types.
//!
//! The interview itself never attacks the target; an external probe may run
//! after the core interview and attach its findings here. The types exist in
//! this crate so baselines can persist them and the comparator can grade a
//! security regression without depending on any probe implementation.

use crate::canonical::hash_canonical;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Risk grading of a single finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Contribution of one finding of this level to the aggregate score.
    pub fn weight(self) -> u32 {
        match self {
            RiskLevel::Critical => 25,
            RiskLevel::High => 15,
            RiskLevel::Medium => 8,
            RiskLevel::Low => 3,
            RiskLevel::Info => 1,
        }
    }
}

/// One finding reported by a security probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityFinding {
    /// Probe-defined category, e.g. `sql_injection`.
    pub category: String,

    pub risk_level: RiskLevel,
    pub title: String,
    pub description: String,
    pub evidence: String,
    pub remediation: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwe_id: Option<String>,

    /// Parameter the probe exercised, when applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,

    /// Tool the finding concerns, when applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
}

/// Aggregated security posture observed for one tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityFingerprint {
    /// Whether a probe ran at all.
    pub tested: bool,

    /// Probe categories that were exercised.
    pub categories_tested: Vec<String>,

    pub findings: Vec<SecurityFinding>,

    /// Weighted sum of finding risk levels, capped at 100.
    pub risk_score: u32,

    pub tested_at: DateTime<Utc>,

    /// Canonical hash over the sorted findings.
    pub findings_hash: String,
}

impl SecurityFingerprint {
    /// Fingerprint for a tool no probe has examined.
    pub fn untested() -> Self {
        Self {
            tested: false,
            categories_tested: Vec::new(),
            findings: Vec::new(),
            risk_score: 0,
            tested_at: Utc::now(),
            findings_hash: String::new(),
        }
    }

    /// Builds a fingerprint from probe output, computing the aggregate
    /// score and the findings hash.
    pub fn from_findings(categories_tested: Vec<String>, mut findings: Vec<SecurityFinding>) -> Self {
        findings.sort_by(|a, b| {
            b.risk_level
                .cmp(&a.risk_level)
                .then_with(|| a.category.cmp(&b.category))
                .then_with(|| a.title.cmp(&b.title))
        });
        let risk_score = findings
            .iter()
            .map(|f| f.risk_level.weight())
            .sum::<u32>()
            .min(100);
        let findings_hash = hash_findings(&findings);

        Self {
            tested: true,
            categories_tested,
            findings,
            risk_score,
            tested_at: Utc::now(),
            findings_hash,
        }
    }

    /// Highest risk level among the findings, if any.
    pub fn max_risk(&self) -> Option<RiskLevel> {
        self.findings.iter().map(|f| f.risk_level).max()
    }
}

fn hash_findings(findings: &[SecurityFinding]) -> String {
    let value = serde_json::to_value(findings).unwrap_or(Value::Null);
    let mut hash = hash_canonical(&value);
    hash.truncate(16);
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(category: &str, level: RiskLevel) -> SecurityFinding {
        SecurityFinding {
            category: category.to_string(),
            risk_level: level,
            title: format!("{category} issue"),
            description: "observed during probing".to_string(),
            evidence: "payload reflected".to_string(),
            remediation: "validate inputs".to_string(),
            cwe_id: None,
            parameter: None,
            tool: None,
        }
    }

    #[test]
    fn risk_levels_are_ordered() {
        assert!(RiskLevel::Critical > RiskLevel::High);
        assert!(RiskLevel::High > RiskLevel::Medium);
        assert!(RiskLevel::Medium > RiskLevel::Low);
        assert!(RiskLevel::Low > RiskLevel::Info);
    }

    #[test]
    fn score_is_weighted_and_capped() {
        let fp = SecurityFingerprint::from_findings(
            vec!["injection".to_string()],
            vec![
                finding("sql_injection", RiskLevel::Critical),
                finding("xss", RiskLevel::Medium),
            ],
        );
        assert_eq!(fp.risk_score, 33);

        let many: Vec<SecurityFinding> =
            (0..10).map(|_| finding("sql_injection", RiskLevel::Critical)).collect();
        let capped = SecurityFingerprint::from_findings(Vec::new(), many);
        assert_eq!(capped.risk_score, 100);
    }

    #[test]
    fn findings_hash_ignores_input_order() {
        let a = SecurityFingerprint::from_findings(
            Vec::new(),
            vec![finding("a", RiskLevel::Low), finding("b", RiskLevel::High)],
        );
        let b = SecurityFingerprint::from_findings(
            Vec::new(),
            vec![finding("b", RiskLevel::High), finding("a", RiskLevel::Low)],
        );
        assert_eq!(a.findings_hash, b.findings_hash);
    }

    #[test]
    fn untested_is_inert() {
        let fp = SecurityFingerprint::untested();
        assert!(!fp.tested);
        assert_eq!(fp.risk_score, 0);
        assert!(fp.max_risk().is_none());
    }
}
