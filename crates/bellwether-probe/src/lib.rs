//! # Probe Battery Generation
//!
//! Synthesizes a bounded, deduplicated battery of test cases from a tool's
//! input schema: happy paths, boundaries, type coercions, enum violations,
//! array shapes, nullability, missing-required, and semantically implausible
//! values. Values come from a deterministic priority chain (caller fixtures
//! first, then schema evidence, then heuristics), so repeated runs probe a
//! server identically.

mod case;
mod config;
mod error;
mod generator;
pub mod schema;
pub mod values;

pub use case::{ExpectedOutcome, TestCase, TestCategory};
pub use config::{GeneratorConfig, TestFixtures};
pub use error::{ProbeError, Result};
pub use generator::{fallback_cases, generate_cases};
