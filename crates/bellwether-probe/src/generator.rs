//! # Test Battery Generation
//!
//! Turns one tool descriptor into an ordered, deduplicated battery of test
//! cases. Eight passes run in a fixed order, each bounded by a per-category
//! ceiling so no single pass crowds out the others, with a hard global
//! ceiling and a floor padded by varied happy-path mutations.
//!
//! Pass order: happy path, boundary, type coercion, enum, array shapes,
//! nullability, error handling, semantic. Generation is deterministic: the
//! same descriptor, config, and fixtures always yield the same battery.

use crate::case::{ExpectedOutcome, TestCase, TestCategory};
use crate::config::{GeneratorConfig, TestFixtures};
use crate::error::{ProbeError, Result};
use crate::schema;
use crate::values::{
    semantic_invalid_value, semantic_kind, smart_value, wrong_type_value,
};
use bellwether_baseline::ToolDescriptor;
use serde_json::{json, Map, Value};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Generates the full battery for one tool.
pub fn generate_cases(
    tool: &ToolDescriptor,
    config: &GeneratorConfig,
    fixtures: &TestFixtures,
) -> Result<Vec<TestCase>> {
    schema::validate_input_schema(&tool.input_schema).map_err(ProbeError::Schema)?;

    let mut battery = Battery::new(config.clone());
    let input = &tool.input_schema;

    happy_path_pass(&mut battery, input, config, fixtures);
    boundary_pass(&mut battery, input, fixtures);
    coercion_pass(&mut battery, input, fixtures);
    enum_pass(&mut battery, input, fixtures);
    array_shapes_pass(&mut battery, input, fixtures);
    nullability_pass(&mut battery, input, fixtures);
    error_handling_pass(&mut battery, input, fixtures);
    semantic_pass(&mut battery, input, fixtures);

    battery.pad_to_floor(input, fixtures);

    debug!(tool = %tool.name, cases = battery.cases.len(), "battery generated");
    Ok(battery.cases)
}

/// Minimal fallback battery when full generation fails: one happy-path
/// probe, plus a missing-required probe when the schema declares required
/// parameters.
pub fn fallback_cases(tool: &ToolDescriptor, fixtures: &TestFixtures) -> Vec<TestCase> {
    let input = &tool.input_schema;
    let mut out = Vec::new();

    let minimal = minimal_args(input, fixtures);
    out.push(TestCase::new(
        "minimal happy-path call",
        TestCategory::HappyPath,
        minimal,
        ExpectedOutcome::Either,
    ));

    if !schema::required(input).is_empty() {
        out.push(TestCase::new(
            "call with all required parameters missing",
            TestCategory::ErrorHandling,
            Map::new(),
            ExpectedOutcome::Error,
        ));
    }
    out
}

/// Accumulates cases with dedup, a global ceiling, and per-category caps.
struct Battery {
    cases: Vec<TestCase>,
    seen: BTreeSet<String>,
    per_category: HashMap<TestCategory, usize>,
    config: GeneratorConfig,
}

impl Battery {
    fn new(config: GeneratorConfig) -> Self {
        Self {
            cases: Vec::new(),
            seen: BTreeSet::new(),
            per_category: HashMap::new(),
            config,
        }
    }

    fn full(&self) -> bool {
        self.cases.len() >= self.config.max_tests_per_tool
    }

    fn category_full(&self, category: TestCategory) -> bool {
        *self.per_category.get(&category).unwrap_or(&0) >= self.config.category_cap()
    }

    /// Adds a case unless it duplicates an earlier one or busts a ceiling.
    fn push(&mut self, case: TestCase) -> bool {
        if self.full() || self.category_full(case.category) {
            return false;
        }
        self.push_unchecked(case)
    }

    /// Adds a case subject to the global ceiling only; used by padding.
    fn push_unchecked(&mut self, case: TestCase) -> bool {
        if self.full() {
            return false;
        }
        let key = case.args_key();
        if !self.seen.insert(key) {
            return false;
        }
        *self.per_category.entry(case.category).or_insert(0) += 1;
        self.cases.push(case);
        true
    }

    /// Pads with varied happy-path mutations until the floor is met or no
    /// further distinct argument set can be produced.
    fn pad_to_floor(&mut self, input: &Value, fixtures: &TestFixtures) {
        let floor = self.config.min_tests_per_tool.min(self.config.max_tests_per_tool);
        if self.cases.len() >= floor {
            return;
        }

        let base = minimal_args(input, fixtures);
        let props = schema::properties(input);

        // Alternative valid strings.
        for word in ["alpha", "beta", "gamma", "delta", "epsilon"] {
            if self.cases.len() >= floor {
                return;
            }
            for (name, prop) in &props {
                if schema::type_of(prop) != "string" || schema::enum_values(prop).is_some() {
                    continue;
                }
                let mut args = base.clone();
                args.insert(name.clone(), json!(word));
                self.push_unchecked(TestCase::new(
                    format!("happy-path variation: {name} = \"{word}\""),
                    TestCategory::HappyPath,
                    args,
                    ExpectedOutcome::Either,
                ));
            }
        }

        // Numeric quartiles within declared bounds.
        for quarter in [1u32, 3] {
            if self.cases.len() >= floor {
                return;
            }
            for (name, prop) in &props {
                let t = schema::type_of(prop);
                if t != "integer" && t != "number" {
                    continue;
                }
                let lo = schema::minimum(prop).unwrap_or(0.0);
                let hi = schema::maximum(prop).unwrap_or(100.0);
                let v = lo + (hi - lo) * quarter as f64 / 4.0;
                let mut args = base.clone();
                let value = if t == "integer" { json!(v.round() as i64) } else { json!(v) };
                args.insert(name.clone(), value);
                self.push_unchecked(TestCase::new(
                    format!("happy-path variation: {name} at quartile {quarter}"),
                    TestCategory::HappyPath,
                    args,
                    ExpectedOutcome::Either,
                ));
            }
        }

        // Boolean permutations.
        for (name, prop) in &props {
            if self.cases.len() >= floor {
                return;
            }
            if schema::type_of(prop) != "boolean" {
                continue;
            }
            for flag in [true, false] {
                let mut args = base.clone();
                args.insert(name.clone(), json!(flag));
                self.push_unchecked(TestCase::new(
                    format!("happy-path variation: {name} = {flag}"),
                    TestCategory::HappyPath,
                    args,
                    ExpectedOutcome::Either,
                ));
            }
        }

        // Consistency probes: distinct string payloads on the first free
        // string parameter. A tool with no parameters cannot be padded
        // further; the battery stays below the floor in that case.
        if let Some((name, _)) = props
            .iter()
            .find(|(_, p)| schema::type_of(p) == "string" && schema::enum_values(p).is_none())
        {
            let mut round = 0u32;
            while self.cases.len() < floor && round < 50 {
                let mut args = base.clone();
                args.insert(name.clone(), json!(format!("probe-{round}")));
                self.push_unchecked(TestCase::new(
                    format!("consistency probe {round}"),
                    TestCategory::HappyPath,
                    args,
                    ExpectedOutcome::Either,
                ));
                round += 1;
            }
        }
    }
}

/// Arguments covering exactly the required parameters.
fn minimal_args(input: &Value, fixtures: &TestFixtures) -> Map<String, Value> {
    let props = schema::properties(input);
    let mut args = Map::new();
    for name in schema::required(input) {
        let prop = props.get(&name).cloned().unwrap_or(json!({}));
        args.insert(name.clone(), smart_value(&name, &prop, fixtures));
    }
    args
}

fn happy_path_pass(
    battery: &mut Battery,
    input: &Value,
    config: &GeneratorConfig,
    fixtures: &TestFixtures,
) {
    let required = schema::required(input);
    let props = schema::properties(input);

    if required.is_empty() {
        battery.push(TestCase::new(
            "call with no arguments",
            TestCategory::HappyPath,
            Map::new(),
            ExpectedOutcome::Success,
        ));
    }

    let minimal = minimal_args(input, fixtures);
    if !minimal.is_empty() {
        battery.push(TestCase::new(
            "minimal required arguments",
            TestCategory::HappyPath,
            minimal.clone(),
            ExpectedOutcome::Success,
        ));
    }

    // Full call: required plus the first few optional parameters.
    let mut full = minimal;
    for name in schema::optional(input).iter().take(config.max_optional_params) {
        let prop = props.get(name).cloned().unwrap_or(json!({}));
        full.insert(name.clone(), smart_value(name, &prop, fixtures));
    }
    if !full.is_empty() {
        battery.push(TestCase::new(
            "required plus optional arguments",
            TestCategory::HappyPath,
            full,
            ExpectedOutcome::Success,
        ));
    }
}

fn boundary_pass(battery: &mut Battery, input: &Value, fixtures: &TestFixtures) {
    let base = minimal_args(input, fixtures);

    for (name, prop) in schema::properties(input) {
        if battery.full() {
            return;
        }
        match schema::type_of(&prop) {
            "string" => {
                let mut args = base.clone();
                args.insert(name.clone(), json!(""));
                battery.push(TestCase::new(
                    format!("boundary: empty string for '{name}'"),
                    TestCategory::EdgeCase,
                    args,
                    ExpectedOutcome::Either,
                ));

                if schema::max_length(&prop).is_none() {
                    let mut args = base.clone();
                    args.insert(name.clone(), json!("x".repeat(5_000)));
                    battery.push(TestCase::new(
                        format!("boundary: very long string for '{name}'"),
                        TestCategory::EdgeCase,
                        args,
                        ExpectedOutcome::Either,
                    ));
                }
            }
            "integer" | "number" => {
                let minimum = schema::minimum(&prop);

                let mut args = base.clone();
                args.insert(name.clone(), json!(0));
                battery.push(TestCase::new(
                    format!("boundary: zero for '{name}'"),
                    TestCategory::EdgeCase,
                    args,
                    ExpectedOutcome::Either,
                ));

                if minimum.map(|m| m < 0.0).unwrap_or(true) {
                    let mut args = base.clone();
                    args.insert(name.clone(), json!(-10));
                    battery.push(TestCase::new(
                        format!("boundary: negative value for '{name}'"),
                        TestCategory::EdgeCase,
                        args,
                        ExpectedOutcome::Either,
                    ));
                }

                let large = schema::maximum(&prop).unwrap_or(999_999_999.0);
                let mut args = base.clone();
                args.insert(name.clone(), json!(large));
                battery.push(TestCase::new(
                    format!("boundary: large value for '{name}'"),
                    TestCategory::EdgeCase,
                    args,
                    ExpectedOutcome::Either,
                ));
            }
            "array" => {
                let min_items = schema::min_items(&prop).unwrap_or(0);
                if min_items == 0 {
                    let mut args = base.clone();
                    args.insert(name.clone(), json!([]));
                    battery.push(TestCase::new(
                        format!("boundary: empty array for '{name}'"),
                        TestCategory::EdgeCase,
                        args,
                        ExpectedOutcome::Either,
                    ));
                } else {
                    let mut args = base.clone();
                    args.insert(name.clone(), array_of(&name, &prop, fixtures, min_items - 1));
                    battery.push(TestCase::new(
                        format!("boundary: fewer than minItems for '{name}'"),
                        TestCategory::ErrorHandling,
                        args,
                        ExpectedOutcome::Error,
                    ));
                }

                if let Some(max_items) = schema::max_items(&prop) {
                    let mut args = base.clone();
                    args.insert(name.clone(), array_of(&name, &prop, fixtures, max_items + 1));
                    battery.push(TestCase::new(
                        format!("boundary: more than maxItems for '{name}'"),
                        TestCategory::ErrorHandling,
                        args,
                        ExpectedOutcome::Error,
                    ));
                }
            }
            _ => {}
        }
    }
}

fn coercion_pass(battery: &mut Battery, input: &Value, fixtures: &TestFixtures) {
    let base = minimal_args(input, fixtures);
    for (name, prop) in schema::properties(input) {
        if battery.full() {
            return;
        }
        let declared = schema::type_of(&prop);
        let mut args = base.clone();
        args.insert(name.clone(), wrong_type_value(declared));
        battery.push(TestCase::new(
            format!("type coercion: wrong type for '{name}' (declared {declared})"),
            TestCategory::ErrorHandling,
            args,
            ExpectedOutcome::Error,
        ));
    }
}

fn enum_pass(battery: &mut Battery, input: &Value, fixtures: &TestFixtures) {
    let base = minimal_args(input, fixtures);
    for (name, prop) in schema::properties(input) {
        if battery.full() {
            return;
        }
        if schema::enum_values(&prop).is_none() {
            continue;
        }
        let mut args = base.clone();
        args.insert(name.clone(), json!("__not_a_member__"));
        battery.push(TestCase::new(
            format!("enum: value outside the allowed set for '{name}'"),
            TestCategory::ErrorHandling,
            args,
            ExpectedOutcome::Error,
        ));
    }
}

fn array_shapes_pass(battery: &mut Battery, input: &Value, fixtures: &TestFixtures) {
    let base = minimal_args(input, fixtures);
    for (name, prop) in schema::properties(input) {
        if battery.full() {
            return;
        }
        if schema::type_of(&prop) != "array" {
            continue;
        }
        let min_items = schema::min_items(&prop).unwrap_or(0);
        let max_items = schema::max_items(&prop);

        let mut lengths: Vec<(u64, String)> = Vec::new();
        if min_items <= 1 && max_items.map(|m| m >= 1).unwrap_or(true) {
            lengths.push((1, "single element".to_string()));
        }
        if min_items > 0 {
            lengths.push((min_items, "exactly minItems elements".to_string()));
        }
        if let Some(max) = max_items {
            lengths.push((max, "exactly maxItems elements".to_string()));
        }
        let many = max_items.unwrap_or(8).min(8);
        if many > 1 {
            lengths.push((many, "many elements".to_string()));
        }

        for (len, label) in lengths {
            let mut args = base.clone();
            args.insert(name.clone(), array_of(&name, &prop, fixtures, len));
            battery.push(TestCase::new(
                format!("array shape: {label} for '{name}'"),
                TestCategory::EdgeCase,
                args,
                ExpectedOutcome::Success,
            ));
        }
    }
}

fn nullability_pass(battery: &mut Battery, input: &Value, fixtures: &TestFixtures) {
    let base = minimal_args(input, fixtures);
    for name in schema::optional(input).iter().take(2) {
        if battery.full() {
            return;
        }
        let mut args = base.clone();
        args.insert(name.clone(), Value::Null);
        battery.push(TestCase::new(
            format!("nullability: null for optional '{name}'"),
            TestCategory::EdgeCase,
            args,
            ExpectedOutcome::Either,
        ));
    }
}

fn error_handling_pass(battery: &mut Battery, input: &Value, fixtures: &TestFixtures) {
    let required = schema::required(input);
    if required.is_empty() {
        return;
    }

    battery.push(TestCase::new(
        "all required parameters missing",
        TestCategory::ErrorHandling,
        Map::new(),
        ExpectedOutcome::Error,
    ));

    let base = minimal_args(input, fixtures);
    for name in &required {
        if battery.full() {
            return;
        }
        let mut args = base.clone();
        args.remove(name);
        battery.push(TestCase::new(
            format!("required parameter '{name}' omitted"),
            TestCategory::ErrorHandling,
            args,
            ExpectedOutcome::Error,
        ));
    }
}

fn semantic_pass(battery: &mut Battery, input: &Value, fixtures: &TestFixtures) {
    let base = minimal_args(input, fixtures);
    for (name, prop) in schema::properties(input) {
        if battery.full() {
            return;
        }
        let kind = match semantic_kind(&name, &prop) {
            Some(k) => k,
            None => continue,
        };
        let mut args = base.clone();
        args.insert(name.clone(), semantic_invalid_value(kind));
        battery.push(TestCase::new(
            format!("semantic: implausible value for '{name}' ({kind:?})"),
            TestCategory::Semantic,
            args,
            ExpectedOutcome::Either,
        ));
    }
}

fn array_of(name: &str, prop: &Value, fixtures: &TestFixtures, len: u64) -> Value {
    let item = schema::items_schema(prop)
        .map(|items| smart_value(name, items, fixtures))
        .unwrap_or_else(|| json!("item"));
    Value::Array((0..len).map(|_| item.clone()).collect())
}
