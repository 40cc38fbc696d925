//! Generator configuration and value fixtures.

use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;

/// Tunables for test-case generation.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Hard ceiling on cases per tool.
    pub max_tests_per_tool: usize,

    /// Floor per tool; padded with varied happy-path cases when generation
    /// yields fewer.
    pub min_tests_per_tool: usize,

    /// How many optional parameters the full-args happy-path case fills.
    pub max_optional_params: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_tests_per_tool: 30,
            min_tests_per_tool: 5,
            max_optional_params: 3,
        }
    }
}

impl GeneratorConfig {
    /// Per-category ceiling, derived from the global ceiling so no single
    /// pass can crowd out the others.
    pub fn category_cap(&self) -> usize {
        (self.max_tests_per_tool / 3).max(2)
    }
}

/// Caller-supplied parameter values: exact name matches and regex patterns.
///
/// Fixtures outrank everything else in the value chain, so a caller who
/// knows that `repo` must be `"owner/name"` can pin it for every tool.
#[derive(Debug, Clone, Default)]
pub struct TestFixtures {
    exact: BTreeMap<String, Value>,
    patterns: Vec<(Regex, Value)>,
}

impl TestFixtures {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pins an exact parameter name to a value.
    pub fn with_exact(mut self, name: impl Into<String>, value: Value) -> Self {
        self.exact.insert(name.into(), value);
        self
    }

    /// Pins parameters whose name matches a regex. Invalid patterns are
    /// rejected here rather than surfacing mid-generation.
    pub fn with_pattern(mut self, pattern: &str, value: Value) -> Result<Self, regex::Error> {
        self.patterns.push((Regex::new(pattern)?, value));
        Ok(self)
    }

    /// Resolves a fixture for a parameter name: exact match first, then the
    /// first matching pattern.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        if let Some(v) = self.exact.get(name) {
            return Some(v);
        }
        self.patterns
            .iter()
            .find(|(re, _)| re.is_match(name))
            .map(|(_, v)| v)
    }
}
