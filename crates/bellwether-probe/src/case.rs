//! Test case types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// What a test case is probing for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestCategory {
    HappyPath,
    EdgeCase,
    ErrorHandling,
    Security,
    Semantic,
}

/// The outcome a case anticipates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpectedOutcome {
    Success,
    Error,
    /// Servers legitimately differ; any outcome passes.
    Either,
}

/// One generated probe of one tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub description: String,
    pub category: TestCategory,
    pub args: Map<String, Value>,
    pub expected_outcome: ExpectedOutcome,
}

impl TestCase {
    pub fn new(
        description: impl Into<String>,
        category: TestCategory,
        args: Map<String, Value>,
        expected_outcome: ExpectedOutcome,
    ) -> Self {
        Self {
            description: description.into(),
            category,
            args,
            expected_outcome,
        }
    }

    /// Canonical form of the arguments; the per-tool deduplication key.
    pub fn args_key(&self) -> String {
        bellwether_fingerprint::canonical::canonicalize(&Value::Object(self.args.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn args_key_is_order_independent() {
        let mut a = Map::new();
        a.insert("x".to_string(), json!(1));
        a.insert("y".to_string(), json!(2));

        let mut b = Map::new();
        b.insert("y".to_string(), json!(2));
        b.insert("x".to_string(), json!(1));

        let case_a = TestCase::new("a", TestCategory::HappyPath, a, ExpectedOutcome::Success);
        let case_b = TestCase::new("b", TestCategory::HappyPath, b, ExpectedOutcome::Success);
        assert_eq!(case_a.args_key(), case_b.args_key());
    }
}
