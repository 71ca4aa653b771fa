//! Cell-value coercion policies, one per formula category.
//!
//! Cells are a closed union (`String | Number | Bool | Null | Array |
//! Object`); every coercion into text or numbers goes through this module so
//! each formula category's null/empty handling stays auditable in one place.

use serde_json::Value;
use thiserror::Error;

/// Coercion failure for a single cell. Callers tag the offending cell
/// rather than failing the surrounding step.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoerceError {
    #[error("value '{0}' is not numeric")]
    NotNumeric(String),
}

/// Sentinel written into a cell when a division has a zero divisor and no
/// caller-supplied default. JSON numbers cannot encode NaN, so the sentinel
/// is a string cell.
pub const NAN_SENTINEL: &str = "NaN";

/// Prefix tagging a cell whose per-row computation failed.
pub const ERROR_PREFIX: &str = "ERROR:";

/// Build an error-tagged cell from a per-row failure message.
pub fn error_cell(message: &str) -> Value {
    Value::String(format!("{} {}", ERROR_PREFIX, message))
}

pub fn is_error_cell(value: &Value) -> bool {
    matches!(value, Value::String(s) if s.starts_with(ERROR_PREFIX) || s == NAN_SENTINEL)
}

/// True for cells that count as "empty" operands: null, empty string, and
/// error-tagged cells from an upstream step (which downstream steps must
/// treat as empty input rather than propagate).
pub fn is_empty_value(value: &Value) -> bool {
    if is_error_cell(value) {
        return true;
    }
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Canonical text form of a cell, for text formulas. Null, missing, and
/// error-tagged upstream cells read as the empty string.
pub fn to_text(value: &Value) -> String {
    if is_error_cell(value) {
        return String::new();
    }
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Numeric form of a cell, for arithmetic formulas. Null/empty/error cells
/// read as zero; anything that does not parse as a number is a per-row
/// coercion error.
pub fn to_number(value: &Value) -> Result<f64, CoerceError> {
    if is_empty_value(value) {
        return Ok(0.0);
    }
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| CoerceError::NotNumeric(n.to_string())),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| CoerceError::NotNumeric(s.clone())),
        other => Err(CoerceError::NotNumeric(other.to_string())),
    }
}

/// Lenient numeric view used by aggregate reductions: operands that are not
/// numeric are dropped from the operand set instead of erroring.
pub fn to_number_lenient(value: &Value) -> Option<f64> {
    if is_empty_value(value) {
        return None;
    }
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Wrap an f64 result as a cell, falling back to the sentinel for values
/// JSON cannot represent (NaN, infinities).
pub fn number_value(n: f64) -> Value {
    match serde_json::Number::from_f64(n) {
        Some(number) => Value::Number(number),
        None => Value::String(NAN_SENTINEL.to_string()),
    }
}

/// Parse a raw literal string the way the step editor supplies it: numbers
/// and booleans are recognized, everything else stays text.
pub fn parse_literal(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if let Ok(n) = trimmed.parse::<i64>() {
        return Value::Number(n.into());
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        return number_value(f);
    }
    Value::String(raw.to_string())
}
