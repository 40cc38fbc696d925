//! # Canonical JSON and Hashing
//!
//! Canonical JSON (in the spirit of RFC 8785) ensures that semantically
//! identical documents produce identical byte sequences, so that a hash of
//! the canonical form can stand in for the document itself.
//!
//! All digests in this workspace flow through this module: tool schema
//! hashes, response structure hashes, error pattern hashes, security
//! findings hashes, and the baseline integrity hash.
//!
//! ## Rules
//!
//! 1. **Object keys**: sorted lexicographically by UTF-16 code units
//! 2. **Arrays**: elements kept in original order
//! 3. **Numbers**: minimal representation (no trailing zeros)
//! 4. **Strings**: minimal escaping (only required escapes)
//! 5. **Whitespace**: none
//!
//! ## Example
//!
//! ```rust
//! use bellwether_fingerprint::canonical::canonicalize;
//! use serde_json::json;
//!
//! let a = json!({"b": 1, "a": 2});
//! let b = json!({"a": 2, "b": 1});
//!
//! assert_eq!(canonicalize(&a), canonicalize(&b));
//! assert_eq!(canonicalize(&a), r#"{"a":2,"b":1}"#);
//! ```

use sha2::{Digest, Sha256};

/// Canonicalizes a JSON value to its deterministic string form.
///
/// Semantically identical inputs always produce bytewise identical output,
/// regardless of object key order or source formatting.
pub fn canonicalize(value: &serde_json::Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

/// SHA-256 of arbitrary bytes, lowercase hex encoded.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(64);
    for byte in digest {
        out.push_str(&format!("{:02x}", byte));
    }
    out
}

/// SHA-256 over the canonical form of a JSON value, lowercase hex encoded.
///
/// This is the primary entry point for content-addressed hashing of schemas
/// and other structured documents.
///
/// ```rust
/// use bellwether_fingerprint::canonical::hash_canonical;
/// use serde_json::json;
///
/// // Key order does not matter
/// assert_eq!(
///     hash_canonical(&json!({"b": 1, "a": 2})),
///     hash_canonical(&json!({"a": 2, "b": 1})),
/// );
/// ```
pub fn hash_canonical(value: &serde_json::Value) -> String {
    sha256_hex(canonicalize(value).as_bytes())
}

fn write_value(out: &mut String, value: &serde_json::Value) {
    match value {
        serde_json::Value::Null => out.push_str("null"),
        serde_json::Value::Bool(true) => out.push_str("true"),
        serde_json::Value::Bool(false) => out.push_str("false"),
        serde_json::Value::Number(n) => write_number(out, n),
        serde_json::Value::String(s) => write_string(out, s),
        serde_json::Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(out, item);
            }
            out.push(']');
        }
        serde_json::Value::Object(map) => {
            // Sort by UTF-16 code units; for ASCII keys this matches byte order.
            let mut entries: Vec<(&String, &serde_json::Value)> = map.iter().collect();
            entries.sort_by(|(a, _), (b, _)| compare_utf16(a, b));

            out.push('{');
            for (i, (key, val)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(out, key);
                out.push(':');
                write_value(out, val);
            }
            out.push('}');
        }
    }
}

/// Minimal number formatting. Whole-valued floats collapse to integers.
fn write_number(out: &mut String, n: &serde_json::Number) {
    if let Some(i) = n.as_i64() {
        out.push_str(&i.to_string());
    } else if let Some(u) = n.as_u64() {
        out.push_str(&u.to_string());
    } else if let Some(f) = n.as_f64() {
        if f.is_nan() || f.is_infinite() {
            // Not representable in JSON; serde_json won't produce these.
            out.push_str("null");
        } else if f.fract() == 0.0 && f.abs() < (i64::MAX as f64) {
            out.push_str(&(f as i64).to_string());
        } else {
            out.push_str(&format!("{}", f));
        }
    } else {
        out.push_str(&n.to_string());
    }
}

/// Minimal string escaping: `"`, `\`, and control characters only.
fn write_string(out: &mut String, s: &str) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\x08' => out.push_str("\\b"),
            '\x0C' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c < '\x20' => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

fn compare_utf16(a: &str, b: &str) -> std::cmp::Ordering {
    a.encode_utf16().cmp(b.encode_utf16())
}
