use serde_json::Value;
use thiserror::Error;

/// Precision applied when callers do not specify one.
pub const DEFAULT_PRECISION: u32 = 8;

/// Upper bound on the decimal precision argument.
pub const MAX_PRECISION: u32 = 12;

/// Errors raised by the numeric rounding policy.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RoundingError {
    #[error("cannot round non-finite value {value}")]
    NonFinite { value: f64 },

    #[error("precision {precision} exceeds the supported maximum of {max}")]
    PrecisionOutOfRange { precision: u32, max: u32 },
}

/// Round-half-to-even ("banker's rounding") at the given decimal precision.
///
/// Exact halfway values round to the nearest even digit: 0.5 → 0, 1.5 → 2,
/// 2.5 → 2, sign-symmetric. Negative zero is normalized to positive zero.
pub fn round_half_to_even(value: f64, precision: u32) -> Result<f64, RoundingError> {
    if !value.is_finite() {
        return Err(RoundingError::NonFinite { value });
    }
    if precision > MAX_PRECISION {
        return Err(RoundingError::PrecisionOutOfRange {
            precision,
            max: MAX_PRECISION,
        });
    }

    let scale = 10_f64.powi(precision as i32);
    let scaled = value * scale;
    if !scaled.is_finite() {
        // A magnitude this large has no representable digits at the requested
        // precision; the value is already equal to its rounding.
        return Ok(value);
    }
    let rounded = scaled.round_ties_even() / scale;
    if rounded == 0.0 {
        return Ok(0.0);
    }
    Ok(rounded)
}

/// Round-half-to-even at the default precision of 8 decimals.
pub fn round8(value: f64) -> Result<f64, RoundingError> {
    round_half_to_even(value, DEFAULT_PRECISION)
}

/// Recursively applies [`round_half_to_even`] to every numeric leaf of a
/// structured value. Strings, booleans, and nulls pass through untouched.
pub fn round_all_numbers(value: &Value, precision: u32) -> Result<Value, RoundingError> {
    match value {
        Value::Null | Value::Bool(_) | Value::String(_) => Ok(value.clone()),
        Value::Number(number) => {
            if number.is_i64() || number.is_u64() {
                return Ok(value.clone());
            }
            let float = number.as_f64().unwrap_or(f64::NAN);
            let rounded = round_half_to_even(float, precision)?;
            let encoded = serde_json::Number::from_f64(rounded)
                .ok_or(RoundingError::NonFinite { value: rounded })?;
            Ok(Value::Number(encoded))
        }
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(round_all_numbers(item, precision)?);
            }
            Ok(Value::Array(out))
        }
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (key, entry) in map {
                out.insert(key.clone(), round_all_numbers(entry, precision)?);
            }
            Ok(Value::Object(out))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn halfway_values_round_to_even() {
        assert_eq!(round_half_to_even(0.5, 0).unwrap(), 0.0);
        assert_eq!(round_half_to_even(1.5, 0).unwrap(), 2.0);
        assert_eq!(round_half_to_even(2.5, 0).unwrap(), 2.0);
        assert_eq!(round_half_to_even(3.5, 0).unwrap(), 4.0);
    }

    #[test]
    fn sign_symmetric() {
        assert_eq!(round_half_to_even(-0.5, 0).unwrap(), 0.0);
        assert_eq!(round_half_to_even(-1.5, 0).unwrap(), -2.0);
        assert_eq!(round_half_to_even(-2.5, 0).unwrap(), -2.0);
    }

    #[test]
    fn fractional_precision() {
        assert_eq!(round_half_to_even(1.2345, 2).unwrap(), 1.23);
        assert_eq!(round_half_to_even(1.235, 2).unwrap(), 1.24);
    }

    #[test]
    fn negative_zero_normalized() {
        let rounded = round_half_to_even(-0.0000000001, 2).unwrap();
        assert_eq!(rounded, 0.0);
        assert!(rounded.is_sign_positive());
    }

    #[test]
    fn non_finite_rejected() {
        assert!(matches!(
            round_half_to_even(f64::NAN, 2),
            Err(RoundingError::NonFinite { .. })
        ));
        assert!(matches!(
            round_half_to_even(f64::INFINITY, 2),
            Err(RoundingError::NonFinite { .. })
        ));
    }

    #[test]
    fn large_magnitudes_pass_through_unchanged() {
        assert_eq!(round8(1.5e303).unwrap(), 1.5e303);
        assert_eq!(round8(-1.5e303).unwrap(), -1.5e303);
        assert_eq!(
            round_half_to_even(f64::MAX, MAX_PRECISION).unwrap(),
            f64::MAX
        );
        assert!(round8(1.5e303).unwrap().is_finite());
    }

    #[test]
    fn precision_out_of_range_rejected() {
        assert!(matches!(
            round_half_to_even(1.0, MAX_PRECISION + 1),
            Err(RoundingError::PrecisionOutOfRange { .. })
        ));
    }

    #[test]
    fn rounds_every_numeric_leaf() {
        let value = json!({
            "a": 1.123456789,
            "b": "text",
            "c": [2.5, true, { "d": 0.5 }],
            "e": 7
        });
        let rounded = round_all_numbers(&value, 0).unwrap();
        assert_eq!(
            rounded,
            json!({ "a": 1.0, "b": "text", "c": [2.0, true, { "d": 0.0 }], "e": 7 })
        );
    }

    #[test]
    fn default_precision_is_eight() {
        assert_eq!(round8(0.123456781).unwrap(), 0.12345678);
        assert_eq!(round8(0.123456789).unwrap(), 0.12345679);
    }
}
