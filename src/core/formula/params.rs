#![allow(clippy::result_large_err)]

//! Binding of a step's ordered raw parameter strings onto the named
//! parameter map an executor consumes, driven by the formula's
//! `ParameterSpec` list, plus the typed accessors executors use to read
//! that map.

use crate::core::error::AppError;
use crate::core::formula::config::{ParameterSpec, ParameterType};
use serde_json::Value;
use std::collections::HashMap;

/// Map ordered parameter strings onto named values.
///
/// Specs bind positionally; a trailing multi-select spec absorbs every
/// remaining parameter. Checkbox and number specs parse their text form.
/// Missing optional specs fall back to their default value when one exists.
pub fn bind_parameters(
    specs: &[ParameterSpec],
    ordered: &[String],
) -> Result<HashMap<String, Value>, AppError> {
    let mut params = HashMap::new();
    let mut cursor = 0usize;

    for spec in specs {
        if spec.kind == ParameterType::MultiSelect {
            let rest: Vec<Value> = ordered[cursor.min(ordered.len())..]
                .iter()
                .map(|raw| Value::String(raw.clone()))
                .collect();
            cursor = ordered.len();
            if rest.is_empty() {
                if let Some(default) = &spec.default_value {
                    params.insert(spec.name.clone(), default.clone());
                    continue;
                }
                if spec.required {
                    return Err(missing(spec));
                }
                continue;
            }
            params.insert(spec.name.clone(), Value::Array(rest));
            continue;
        }

        let raw = ordered.get(cursor);
        cursor += raw.map(|_| 1).unwrap_or(0);
        match raw {
            Some(raw) => {
                let value = parse_spec_value(spec, raw)?;
                validate_constraints(spec, &value)?;
                params.insert(spec.name.clone(), value);
            }
            None => {
                if let Some(default) = &spec.default_value {
                    params.insert(spec.name.clone(), default.clone());
                } else if spec.required {
                    return Err(missing(spec));
                }
            }
        }
    }

    if cursor < ordered.len() {
        return Err(AppError::validation(format!(
            "{} parameter(s) supplied but only {} expected",
            ordered.len(),
            specs.len()
        )));
    }

    Ok(params)
}

fn missing(spec: &ParameterSpec) -> AppError {
    AppError::validation(format!("Missing required parameter: {}", spec.name))
}

fn parse_spec_value(spec: &ParameterSpec, raw: &str) -> Result<Value, AppError> {
    match spec.kind {
        ParameterType::Checkbox => {
            let flag = match raw.trim().to_lowercase().as_str() {
                "true" | "1" | "yes" => true,
                "false" | "0" | "no" => false,
                other => {
                    return Err(AppError::validation(format!(
                        "parameter '{}' expects a boolean, got '{}'",
                        spec.name, other
                    )))
                }
            };
            Ok(Value::Bool(flag))
        }
        ParameterType::Number => {
            let number = raw.trim().parse::<f64>().map_err(|_| {
                AppError::validation(format!(
                    "parameter '{}' expects a number, got '{}'",
                    spec.name, raw
                ))
            })?;
            Ok(crate::core::dataset::coerce::number_value(number))
        }
        _ => Ok(Value::String(raw.to_string())),
    }
}

fn validate_constraints(spec: &ParameterSpec, value: &Value) -> Result<(), AppError> {
    let Some(validation) = &spec.validation else {
        return Ok(());
    };
    if let Value::Number(n) = value {
        let n = n.as_f64().unwrap_or(0.0);
        if let Some(min) = validation.min {
            if n < min {
                return Err(AppError::validation(format!(
                    "parameter '{}' must be >= {}",
                    spec.name, min
                )));
            }
        }
        if let Some(max) = validation.max {
            if n > max {
                return Err(AppError::validation(format!(
                    "parameter '{}' must be <= {}",
                    spec.name, max
                )));
            }
        }
    }
    if let (Value::String(s), Some(pattern)) = (value, &validation.pattern) {
        let re = regex::Regex::new(pattern)
            .map_err(|e| AppError::validation(format!("invalid pattern: {}", e)))?;
        if !re.is_match(s) {
            return Err(AppError::validation(format!(
                "parameter '{}' does not match pattern {}",
                spec.name, pattern
            )));
        }
    }
    Ok(())
}

/* ──────────────── typed accessors used inside executors ──────────────── */

pub fn require_str<'a>(
    params: &'a HashMap<String, Value>,
    name: &str,
) -> Result<&'a str, AppError> {
    params
        .get(name)
        .and_then(|v| v.as_str())
        .ok_or_else(|| AppError::validation(format!("Missing required parameter: {}", name)))
}

pub fn optional_str<'a>(params: &'a HashMap<String, Value>, name: &str) -> Option<&'a str> {
    params.get(name).and_then(|v| v.as_str())
}

pub fn optional_bool(params: &HashMap<String, Value>, name: &str, default: bool) -> bool {
    params.get(name).and_then(|v| v.as_bool()).unwrap_or(default)
}

/// A list-of-columns parameter; a lone string is accepted as a one-element
/// list so hand-built parameter maps stay ergonomic.
pub fn require_columns(
    params: &HashMap<String, Value>,
    name: &str,
) -> Result<Vec<String>, AppError> {
    match params.get(name) {
        Some(Value::Array(items)) => {
            let columns: Vec<String> = items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect();
            if columns.is_empty() {
                Err(AppError::validation(format!(
                    "parameter '{}' must name at least one column",
                    name
                )))
            } else {
                Ok(columns)
            }
        }
        Some(Value::String(s)) => Ok(vec![s.clone()]),
        _ => Err(AppError::validation(format!(
            "Missing required parameter: {}",
            name
        ))),
    }
}

pub fn require_present(params: &HashMap<String, Value>, names: &[&str]) -> Result<(), AppError> {
    for name in names {
        if !params.contains_key(*name) {
            return Err(AppError::validation(format!(
                "Missing required parameter: {}",
                name
            )));
        }
    }
    Ok(())
}
