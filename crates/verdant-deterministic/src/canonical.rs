use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

use crate::round::round_half_to_even;

/// Decimal precision applied to non-integral numbers in the canonical form.
const CANONICAL_FLOAT_PRECISION: u32 = 6;

/// Largest magnitude at which an integral f64 still maps to a unique integer.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0; // 2^53

/// Errors raised while producing or checking a canonical form.
///
/// Every variant is fatal to the calling operation; canonicalization is never
/// silently recovered.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CanonicalError {
    #[error("unsupported value in canonical input: {kind}")]
    Unsupported { kind: String },

    #[error("non-finite number in canonical input: {value}")]
    NonFinite { value: f64 },

    #[error(
        "canonicalization is not idempotent: first pass {first_len} bytes, second pass {second_len} bytes"
    )]
    NotIdempotent { first_len: usize, second_len: usize },

    #[error("canonical form does not reparse as JSON: {reason}")]
    Reparse { reason: String },
}

/// Produces the unique canonical serialization of a JSON value.
///
/// Guarantees `canonicalize(parse(canonicalize(x))) == canonicalize(x)`;
/// callers on the hashing path assert this via [`assert_idempotent`].
pub fn canonicalize(value: &Value) -> Result<String, CanonicalError> {
    let mut out = String::new();
    write_value(value, &mut out)?;
    Ok(out)
}

/// Converts any serializable value into the canonical `Value` model.
pub fn to_canonical_value<T: Serialize>(value: &T) -> Result<Value, CanonicalError> {
    serde_json::to_value(value).map_err(|error| CanonicalError::Unsupported {
        kind: error.to_string(),
    })
}

/// Reparses a canonical string and re-canonicalizes it; a byte difference
/// means determinism is broken and the artifact must not be hashed.
pub fn assert_idempotent(canonical: &str) -> Result<(), CanonicalError> {
    let parsed: Value = serde_json::from_str(canonical).map_err(|error| CanonicalError::Reparse {
        reason: error.to_string(),
    })?;
    let second = canonicalize(&parsed)?;
    if second != canonical {
        return Err(CanonicalError::NotIdempotent {
            first_len: canonical.len(),
            second_len: second.len(),
        });
    }
    Ok(())
}

fn write_value(value: &Value, out: &mut String) -> Result<(), CanonicalError> {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(flag) => out.push_str(if *flag { "true" } else { "false" }),
        Value::Number(number) => write_number(number, out)?,
        Value::String(text) => {
            let normalized: String = text.nfc().collect();
            write_escaped(&normalized, out);
        }
        Value::Array(items) => {
            out.push('[');
            let mut first = true;
            for item in items {
                // Null elements are dropped; the order of the rest is kept.
                if item.is_null() {
                    continue;
                }
                if !first {
                    out.push(',');
                }
                first = false;
                write_value(item, out)?;
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&str> = map.keys().map(String::as_str).collect();
            keys.sort_unstable();
            out.push('{');
            let mut first = true;
            for key in keys {
                let entry = &map[key];
                // Null entries are omitted from maps.
                if entry.is_null() {
                    continue;
                }
                if !first {
                    out.push(',');
                }
                first = false;
                write_escaped(key, out);
                out.push(':');
                write_value(entry, out)?;
            }
            out.push('}');
        }
    }
    Ok(())
}

fn write_number(number: &serde_json::Number, out: &mut String) -> Result<(), CanonicalError> {
    if let Some(int) = number.as_i64() {
        out.push_str(&int.to_string());
        return Ok(());
    }
    if let Some(uint) = number.as_u64() {
        out.push_str(&uint.to_string());
        return Ok(());
    }
    let float = number.as_f64().ok_or_else(|| CanonicalError::Unsupported {
        kind: format!("number {number}"),
    })?;
    if !float.is_finite() {
        return Err(CanonicalError::NonFinite { value: float });
    }
    let rounded = round_half_to_even(float, CANONICAL_FLOAT_PRECISION)
        .map_err(|_| CanonicalError::NonFinite { value: float })?;
    if rounded.fract() == 0.0 && rounded.abs() < MAX_EXACT_INTEGER {
        out.push_str(&(rounded as i64).to_string());
    } else {
        out.push_str(&rounded.to_string());
    }
    Ok(())
}

fn write_escaped(text: &str, out: &mut String) {
    use std::fmt::Write as _;

    out.push('"');
    for ch in text.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            ch if (ch as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", ch as u32);
            }
            ch => out.push(ch),
        }
    }
    out.push('"');
}
