//! Field coercion from untyped JSON values
//!
//! Senders are loosely typed: numbers arrive as JSON numbers or as strings
//! (`"1.5"`, `"45.20 MB"`), and keys may be missing or explicitly `null`.
//! These accessors pin down one behavior for each case.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

/// Decoded request body, keyed by field name
pub type RawPayload = Map<String, Value>;

/// Bandwidth wire format sent by existing clients (ASCII digits only)
static BANDWIDTH_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"sent_kb: ([0-9.]+) received_kb: ([0-9.]+)").expect("bandwidth pattern is valid")
});

/// Leading decimal number of a string, unit suffix ignored (ASCII digits only)
static NUMERIC_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:[eE][+-]?[0-9]+)?").expect("numeric pattern is valid")
});

/// Value could not be converted to a float
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoercionError {
    /// Bare value is not numeric
    #[error("{0} is not a decimal number")]
    NotNumeric(String),

    /// Named field is not numeric
    #[error("field '{key}' is not a decimal number: {value}")]
    NotNumericField { key: String, value: String },
}

/// Bandwidth string did not match `sent_kb: <n> received_kb: <n>`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to parse bandwidth data.")]
pub struct BandwidthParseError;

/// True when `key` exists and is not JSON `null`
pub fn is_present(payload: &RawPayload, key: &str) -> bool {
    present(payload, key).is_some()
}

fn present<'a>(payload: &'a RawPayload, key: &str) -> Option<&'a Value> {
    payload.get(key).filter(|value| !value.is_null())
}

/// Convert a JSON number or numeric string to `f64`
///
/// Strings are trimmed and their leading decimal number is used, so a unit
/// suffix such as `" MB"` is tolerated. Booleans, arrays, objects and
/// strings without a leading number are rejected.
///
/// # Examples
///
/// ```
/// use pocketlife_common::telemetry::as_float;
/// use serde_json::json;
///
/// assert_eq!(as_float(&json!(2)).unwrap(), 2.0);
/// assert_eq!(as_float(&json!("1.5")).unwrap(), 1.5);
/// assert_eq!(as_float(&json!("45.20 MB")).unwrap(), 45.2);
/// assert!(as_float(&json!("fast")).is_err());
/// ```
pub fn as_float(value: &Value) -> Result<f64, CoercionError> {
    let not_numeric = || CoercionError::NotNumeric(value.to_string());

    match value {
        Value::Number(number) => number.as_f64().ok_or_else(not_numeric),
        Value::String(text) => NUMERIC_PREFIX
            .find(text.trim())
            .and_then(|prefix| prefix.as_str().parse::<f64>().ok())
            .ok_or_else(not_numeric),
        _ => Err(not_numeric()),
    }
}

/// Absent (or `null`) key → `None`, present key → [`as_float`]
pub fn as_optional_float(payload: &RawPayload, key: &str) -> Result<Option<f64>, CoercionError> {
    match present(payload, key) {
        None => Ok(None),
        Some(value) => as_float(value)
            .map(Some)
            .map_err(|_| CoercionError::NotNumericField {
                key: key.to_string(),
                value: value.to_string(),
            }),
    }
}

/// Absent (or `null`) key → `default`, present key → [`as_text`]
pub fn as_string(payload: &RawPayload, key: &str, default: &str) -> String {
    present(payload, key)
        .map(as_text)
        .unwrap_or_else(|| default.to_string())
}

/// String values verbatim, anything else as compact JSON text
pub fn as_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Parse `sent_kb: <n> received_kb: <n>` into `(sent_kb, received_kb)`
///
/// The pattern is not anchored; surrounding text is ignored. Numbers are runs
/// of digits and dots and must still parse as a float (`1.2.3` fails).
///
/// # Examples
///
/// ```
/// use pocketlife_common::telemetry::extract_bandwidth;
///
/// assert_eq!(extract_bandwidth("sent_kb: 12.5 received_kb: 3"), Ok((12.5, 3.0)));
/// assert!(extract_bandwidth("garbage").is_err());
/// ```
pub fn extract_bandwidth(raw: &str) -> Result<(f64, f64), BandwidthParseError> {
    let captures = BANDWIDTH_PATTERN.captures(raw).ok_or(BandwidthParseError)?;

    let sent_kb = captures[1].parse::<f64>().map_err(|_| BandwidthParseError)?;
    let received_kb = captures[2].parse::<f64>().map_err(|_| BandwidthParseError)?;

    Ok((sent_kb, received_kb))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> RawPayload {
        match value {
            Value::Object(map) => map,
            other => panic!("test payload must be an object, got {}", other),
        }
    }

    #[test]
    fn test_as_float_accepts_numbers_and_numeric_strings() {
        assert_eq!(as_float(&json!(3)).unwrap(), 3.0);
        assert_eq!(as_float(&json!(-0.25)).unwrap(), -0.25);
        assert_eq!(as_float(&json!("1.5")).unwrap(), 1.5);
        assert_eq!(as_float(&json!("  7 ")).unwrap(), 7.0);
        assert_eq!(as_float(&json!("1e3")).unwrap(), 1000.0);
        assert_eq!(as_float(&json!(".5")).unwrap(), 0.5);
    }

    #[test]
    fn test_as_float_ignores_unit_suffix() {
        // Client sends RAM usage as "<mb> MB"
        assert_eq!(as_float(&json!("45.20 MB")).unwrap(), 45.2);
        assert_eq!(as_float(&json!("12%")).unwrap(), 12.0);
    }

    #[test]
    fn test_as_float_rejects_non_numeric() {
        assert_eq!(
            as_float(&json!("fast")),
            Err(CoercionError::NotNumeric("\"fast\"".to_string()))
        );
        assert!(as_float(&json!("")).is_err());
        assert!(as_float(&json!(true)).is_err());
        assert!(as_float(&json!([1])).is_err());
        assert!(as_float(&json!({"v": 1})).is_err());
        // Arabic-Indic digits are not decimal digits here
        assert!(as_float(&json!("\u{0663}")).is_err());
    }

    #[test]
    fn test_as_optional_float() {
        let data = payload(json!({"a": "2.5", "b": null, "c": "n/a"}));

        assert_eq!(as_optional_float(&data, "a"), Ok(Some(2.5)));
        assert_eq!(as_optional_float(&data, "b"), Ok(None));
        assert_eq!(as_optional_float(&data, "missing"), Ok(None));

        let err = as_optional_float(&data, "c").unwrap_err();
        assert_eq!(err.to_string(), "field 'c' is not a decimal number: \"n/a\"");
    }

    #[test]
    fn test_as_string_defaults_and_verbatim() {
        let data = payload(json!({"s": "  padded ", "n": 42, "z": null}));

        assert_eq!(as_string(&data, "s", ""), "  padded ");
        assert_eq!(as_string(&data, "n", ""), "42");
        assert_eq!(as_string(&data, "z", "dflt"), "dflt");
        assert_eq!(as_string(&data, "missing", ""), "");
    }

    #[test]
    fn test_as_text_serializes_structured_values() {
        assert_eq!(as_text(&json!("plain")), "plain");
        assert_eq!(as_text(&json!({"args": [1, 2]})), r#"{"args":[1,2]}"#);
    }

    #[test]
    fn test_is_present_treats_null_as_absent() {
        let data = payload(json!({"here": 0, "null": null}));

        assert!(is_present(&data, "here"));
        assert!(!is_present(&data, "null"));
        assert!(!is_present(&data, "gone"));
    }

    #[test]
    fn test_extract_bandwidth() {
        assert_eq!(extract_bandwidth("sent_kb: 12.5 received_kb: 3"), Ok((12.5, 3.0)));
        assert_eq!(
            extract_bandwidth("net sent_kb: 1024.75 received_kb: 2048.125 (total)"),
            Ok((1024.75, 2048.125))
        );
    }

    #[test]
    fn test_extract_bandwidth_skips_non_ascii_digits() {
        let raw = "sent_kb: \u{0661}\u{0662} received_kb: 3 | sent_kb: 5 received_kb: 6";
        assert_eq!(extract_bandwidth(raw), Ok((5.0, 6.0)));
    }

    #[test]
    fn test_extract_bandwidth_failures() {
        assert_eq!(extract_bandwidth("garbage"), Err(BandwidthParseError));
        assert_eq!(extract_bandwidth(""), Err(BandwidthParseError));
        // Token literals are exact
        assert_eq!(extract_bandwidth("sent_kb:1 received_kb:2"), Err(BandwidthParseError));
        assert_eq!(extract_bandwidth("sent_kb: -1 received_kb: 2"), Err(BandwidthParseError));
        // Captured run must still be a float
        assert_eq!(extract_bandwidth("sent_kb: 1.2.3 received_kb: 4"), Err(BandwidthParseError));
        assert_eq!(
            extract_bandwidth("sent_kb: \u{0661}\u{0662} received_kb: 3"),
            Err(BandwidthParseError)
        );
        assert_eq!(
            BandwidthParseError.to_string(),
            "Failed to parse bandwidth data."
        );
    }
}
