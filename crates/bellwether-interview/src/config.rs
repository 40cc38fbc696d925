//! Interview configuration.

use bellwether_probe::{GeneratorConfig, TestFixtures};
use std::time::Duration;

/// Tunables for one interview run.
#[derive(Debug, Clone)]
pub struct InterviewConfig {
    /// Ceiling on generated cases per tool.
    pub max_questions_per_tool: usize,

    /// Floor on generated cases per tool.
    pub min_tests_per_tool: usize,

    /// Tools probed concurrently across the engine.
    pub parallel_tools: usize,

    /// Cases in flight per tool; non-idempotent tools are always serial.
    pub max_parallel_per_tool: usize,

    /// Deadline per JSON-RPC call.
    pub per_call_timeout: Duration,

    /// Upper bound on one tool's total probe time.
    pub per_tool_deadline: Duration,

    /// Hard stop for the whole interview.
    pub global_deadline: Duration,

    /// Persona ids to run, in order.
    pub personas: Vec<String>,

    /// Emit a partial baseline on early abort instead of failing.
    pub graceful_partial: bool,

    /// Caller-pinned parameter values.
    pub test_fixtures: TestFixtures,

    /// Schema versions retained per tool.
    pub history_cap: usize,
}

impl Default for InterviewConfig {
    fn default() -> Self {
        Self {
            max_questions_per_tool: 30,
            min_tests_per_tool: 5,
            parallel_tools: 4,
            max_parallel_per_tool: 2,
            per_call_timeout: Duration::from_secs(10),
            per_tool_deadline: Duration::from_secs(120),
            global_deadline: Duration::from_secs(600),
            personas: vec!["careful".to_string(), "adversarial".to_string()],
            graceful_partial: true,
            test_fixtures: TestFixtures::default(),
            history_cap: bellwether_fingerprint::DEFAULT_HISTORY_CAP,
        }
    }
}

impl InterviewConfig {
    /// The generator settings this interview implies.
    pub fn generator_config(&self) -> GeneratorConfig {
        GeneratorConfig {
            max_tests_per_tool: self.max_questions_per_tool,
            min_tests_per_tool: self.min_tests_per_tool,
            ..GeneratorConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = InterviewConfig::default();
        assert!(config.parallel_tools >= 1);
        assert!(config.max_questions_per_tool >= config.min_tests_per_tool);
        assert!(config.per_tool_deadline > config.per_call_timeout);
    }

    #[test]
    fn generator_config_mirrors_bounds() {
        let config = InterviewConfig {
            max_questions_per_tool: 12,
            min_tests_per_tool: 3,
            ..Default::default()
        };
        let generator = config.generator_config();
        assert_eq!(generator.max_tests_per_tool, 12);
        assert_eq!(generator.min_tests_per_tool, 3);
    }
}
