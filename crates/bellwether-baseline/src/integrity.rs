//! # Integrity Hashing and Persistence
//!
//! A baseline file must round-trip byte-for-byte: saving writes the
//! canonical JSON form, and the integrity hash is SHA-256 over that
//! canonical form with the `integrityHash` member elided. Loading verifies
//! the hash and rejects a tampered or corrupted file unless the caller
//! explicitly forces the load.

use crate::error::{BaselineError, Result};
use crate::migrate;
use crate::model::Baseline;
use bellwether_fingerprint::canonical::{canonicalize, sha256_hex};
use serde_json::Value;
use std::path::Path;
use tracing::{debug, warn};

/// Computes the integrity hash of a baseline document.
///
/// The hash covers the canonical JSON form with the `integrityHash` member
/// removed, so sealing is idempotent: recomputing over a sealed baseline
/// yields the same digest.
pub fn compute_integrity_hash(baseline: &Baseline) -> Result<String> {
    let mut value = serde_json::to_value(baseline)?;
    elide_hash(&mut value);
    Ok(sha256_hex(canonicalize(&value).as_bytes()))
}

/// Fills in the integrity hash and summary of a freshly built baseline.
pub fn seal(mut baseline: Baseline) -> Result<Baseline> {
    baseline.summary = baseline.summarize();
    baseline.integrity_hash = compute_integrity_hash(&baseline)?;
    Ok(baseline)
}

/// Verifies a baseline's stored hash against a recomputation.
pub fn verify(baseline: &Baseline) -> Result<()> {
    let actual = compute_integrity_hash(baseline)?;
    if actual != baseline.integrity_hash {
        return Err(BaselineError::Integrity {
            expected: baseline.integrity_hash.clone(),
            actual,
        });
    }
    Ok(())
}

/// Writes a baseline to disk in canonical form.
pub fn save(baseline: &Baseline, path: impl AsRef<Path>) -> Result<()> {
    let value = serde_json::to_value(baseline)?;
    std::fs::write(path.as_ref(), canonicalize(&value))?;
    debug!(path = %path.as_ref().display(), "baseline written");
    Ok(())
}

/// Reads a baseline from disk, migrating older formats and verifying the
/// integrity hash.
///
/// With `force` set, an integrity mismatch is logged and tolerated; format
/// problems are still fatal.
pub fn load(path: impl AsRef<Path>, force: bool) -> Result<Baseline> {
    let text = std::fs::read_to_string(path.as_ref())?;
    let value: Value = serde_json::from_str(&text)?;
    let (value, migrated) = migrate::migrate_to_current(value)?;

    let baseline: Baseline = serde_json::from_value(value)?;

    if migrated {
        // The transform changed the document; the stored hash no longer
        // applies and must be recomputed.
        debug!(path = %path.as_ref().display(), "baseline migrated to current format");
        return seal(baseline);
    }

    match verify(&baseline) {
        Ok(()) => Ok(baseline),
        Err(err) if force => {
            warn!(path = %path.as_ref().display(), %err, "integrity check failed, loading anyway");
            Ok(baseline)
        }
        Err(err) => Err(err),
    }
}

fn elide_hash(value: &mut Value) {
    if let Some(map) = value.as_object_mut() {
        map.remove("integrityHash");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Baseline, BaselineMetadata, Capabilities, ServerInfo, ToolDescriptor, ToolRecord,
        FORMAT_VERSION,
    };
    use chrono::Utc;
    use serde_json::json;
    use tempfile::TempDir;

    fn sample_baseline() -> Baseline {
        let descriptor = ToolDescriptor::new(
            "get_weather",
            "Current weather for a city",
            json!({
                "type": "object",
                "properties": {"city": {"type": "string"}},
                "required": ["city"]
            }),
        );
        let baseline = Baseline {
            schema_version: FORMAT_VERSION,
            metadata: BaselineMetadata {
                mode: "interview".to_string(),
                generated_at: Utc::now(),
                cli_version: "0.1.0".to_string(),
                server_command: "weather-server --stdio".to_string(),
                duration_ms: 1200,
                personas: vec!["careful".to_string()],
                model: None,
                partial: false,
                warnings: Vec::new(),
            },
            server: ServerInfo {
                name: "weather".to_string(),
                version: "1.0.0".to_string(),
                protocol_version: "2025-06-18".to_string(),
                capabilities: vec!["tools".to_string()],
            },
            capabilities: Capabilities {
                tools: vec![ToolRecord::from_descriptor(descriptor)],
                ..Default::default()
            },
            workflows: None,
            documentation_score: Some(60),
            summary: String::new(),
            integrity_hash: String::new(),
        };
        seal(baseline).unwrap()
    }

    #[test]
    fn seal_then_verify() {
        let baseline = sample_baseline();
        assert_eq!(baseline.integrity_hash.len(), 64);
        verify(&baseline).unwrap();
    }

    #[test]
    fn sealing_is_idempotent() {
        let baseline = sample_baseline();
        let hash = baseline.integrity_hash.clone();
        let resealed = seal(baseline).unwrap();
        assert_eq!(resealed.integrity_hash, hash);
    }

    #[test]
    fn save_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bellwether-baseline.json");

        let baseline = sample_baseline();
        save(&baseline, &path).unwrap();
        let loaded = load(&path, false).unwrap();

        assert_eq!(loaded, baseline);
        assert_eq!(loaded.integrity_hash, baseline.integrity_hash);
    }

    #[test]
    fn save_is_canonical_byte_for_byte() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.json");
        let path2 = dir.path().join("b.json");

        let baseline = sample_baseline();
        save(&baseline, &path).unwrap();
        let loaded = load(&path, false).unwrap();
        save(&loaded, &path2).unwrap();

        let bytes_a = std::fs::read(&path).unwrap();
        let bytes_b = std::fs::read(&path2).unwrap();
        assert_eq!(bytes_a, bytes_b);
    }

    #[test]
    fn tampering_is_detected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("baseline.json");

        let baseline = sample_baseline();
        save(&baseline, &path).unwrap();

        // Flip one byte inside the payload.
        let text = std::fs::read_to_string(&path).unwrap();
        let tampered = text.replace("get_weather", "get_weather2");
        assert_ne!(text, tampered);
        std::fs::write(&path, tampered).unwrap();

        match load(&path, false) {
            Err(BaselineError::Integrity { .. }) => {}
            other => panic!("expected integrity error, got {other:?}"),
        }
    }

    #[test]
    fn force_overrides_integrity_failure() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("baseline.json");

        let baseline = sample_baseline();
        save(&baseline, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::write(&path, text.replace("get_weather", "renamed_tool")).unwrap();

        let loaded = load(&path, true).unwrap();
        assert_eq!(loaded.capabilities.tools[0].descriptor.name, "renamed_tool");
    }

    #[test]
    fn any_payload_mutation_changes_the_hash() {
        let baseline = sample_baseline();
        let mut mutated = baseline.clone();
        mutated.metadata.duration_ms += 1;
        let hash = compute_integrity_hash(&mutated).unwrap();
        assert_ne!(hash, baseline.integrity_hash);
    }
}
