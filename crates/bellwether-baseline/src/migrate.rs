//! # Baseline Format Migration
//!
//! Older baseline files are upgraded in place at load time by composing the
//! per-version transforms in sequence. A migrated document gets a freshly
//! computed integrity hash; the stored one covered the old shape.
//!
//! Version history:
//!
//! - **v1**: latency metrics stored only `p50`/`p95`; `resourceTemplates`
//!   did not exist yet.
//! - **v2** (current): full percentile set, resource templates.

use crate::error::{BaselineError, Result};
use crate::model::FORMAT_VERSION;
use serde_json::{json, Value};

/// Upgrades a raw baseline document to the current format version.
///
/// Returns the (possibly transformed) document and whether any transform
/// ran. Unknown or ancient versions are rejected.
pub fn migrate_to_current(mut value: Value) -> Result<(Value, bool)> {
    let mut version = value
        .get("schemaVersion")
        .and_then(Value::as_u64)
        .ok_or_else(|| BaselineError::Malformed("missing schemaVersion".to_string()))?;

    if version == FORMAT_VERSION {
        return Ok((value, false));
    }
    if version == 0 || version > FORMAT_VERSION {
        return Err(BaselineError::UnsupportedFormat(version));
    }

    while version < FORMAT_VERSION {
        value = match version {
            1 => migrate_v1_to_v2(value),
            other => return Err(BaselineError::UnsupportedFormat(other)),
        };
        version += 1;
    }

    Ok((value, true))
}

/// v1 → v2: estimate the missing `p99` as `p95 × 1.2` and introduce the
/// `resourceTemplates` list.
///
/// The ×1.2 estimate applies to legacy files only; freshly computed metrics
/// always interpolate p99 from samples.
fn migrate_v1_to_v2(mut value: Value) -> Value {
    if let Some(tools) = value
        .pointer_mut("/capabilities/tools")
        .and_then(Value::as_array_mut)
    {
        for tool in tools {
            if let Some(perf) = tool.get_mut("performance").and_then(Value::as_object_mut) {
                if !perf.contains_key("p99") {
                    let estimate = perf.get("p95").and_then(Value::as_f64).unwrap_or(0.0) * 1.2;
                    perf.insert("p99".to_string(), json!(estimate));
                }
            }
        }
    }

    if let Some(caps) = value.get_mut("capabilities").and_then(Value::as_object_mut) {
        caps.entry("resourceTemplates").or_insert_with(|| json!([]));
    }

    if let Some(root) = value.as_object_mut() {
        root.insert("schemaVersion".to_string(), json!(2));
    }
    value
}
