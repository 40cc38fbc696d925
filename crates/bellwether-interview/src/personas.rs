//! Interview personas.
//!
//! A persona is a slice through the generated battery: the careful user
//! exercises the documented surface, the adversarial one leans on the
//! failure paths, the explorer runs everything. Persona selection is pure
//! filtering; the case battery itself is generated once per tool.

use bellwether_probe::{TestCase, TestCategory};

/// A probing perspective applied to a tool's battery.
#[derive(Debug, Clone)]
pub struct Persona {
    pub id: String,
    pub description: String,
    categories: Vec<TestCategory>,
}

impl Persona {
    /// Whether this persona runs the given case.
    pub fn covers(&self, case: &TestCase) -> bool {
        self.categories.contains(&case.category)
    }
}

/// Resolves persona ids to persona definitions, in the given order.
///
/// Unknown ids fall back to the explorer so a typo widens coverage instead
/// of silently skipping cases.
pub fn resolve(ids: &[String]) -> Vec<Persona> {
    if ids.is_empty() {
        return vec![explorer()];
    }
    ids.iter()
        .map(|id| match id.as_str() {
            "careful" => careful(),
            "adversarial" => adversarial(),
            _ => Persona {
                id: id.clone(),
                ..explorer()
            },
        })
        .collect()
}

fn careful() -> Persona {
    Persona {
        id: "careful".to_string(),
        description: "uses the tool as documented".to_string(),
        categories: vec![TestCategory::HappyPath, TestCategory::EdgeCase],
    }
}

fn adversarial() -> Persona {
    Persona {
        id: "adversarial".to_string(),
        description: "leans on failure paths and implausible values".to_string(),
        categories: vec![
            TestCategory::ErrorHandling,
            TestCategory::Security,
            TestCategory::Semantic,
        ],
    }
}

fn explorer() -> Persona {
    Persona {
        id: "explorer".to_string(),
        description: "runs the full battery".to_string(),
        categories: vec![
            TestCategory::HappyPath,
            TestCategory::EdgeCase,
            TestCategory::ErrorHandling,
            TestCategory::Security,
            TestCategory::Semantic,
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bellwether_probe::ExpectedOutcome;
    use serde_json::Map;

    fn case(category: TestCategory) -> TestCase {
        TestCase::new("c", category, Map::new(), ExpectedOutcome::Either)
    }

    #[test]
    fn careful_skips_error_paths() {
        let personas = resolve(&["careful".to_string()]);
        assert!(personas[0].covers(&case(TestCategory::HappyPath)));
        assert!(!personas[0].covers(&case(TestCategory::ErrorHandling)));
    }

    #[test]
    fn careful_and_adversarial_partition_the_battery() {
        let personas = resolve(&["careful".to_string(), "adversarial".to_string()]);
        for category in [
            TestCategory::HappyPath,
            TestCategory::EdgeCase,
            TestCategory::ErrorHandling,
            TestCategory::Security,
            TestCategory::Semantic,
        ] {
            let covered = personas.iter().filter(|p| p.covers(&case(category))).count();
            assert_eq!(covered, 1, "{category:?} must be covered exactly once");
        }
    }

    #[test]
    fn unknown_id_falls_back_to_full_coverage() {
        let personas = resolve(&["qa-bot".to_string()]);
        assert_eq!(personas[0].id, "qa-bot");
        assert!(personas[0].covers(&case(TestCategory::Security)));
    }

    #[test]
    fn empty_selection_gets_the_explorer() {
        let personas = resolve(&[]);
        assert_eq!(personas.len(), 1);
        assert_eq!(personas[0].id, "explorer");
    }
}
