#![allow(clippy::result_large_err)]

//! Text & String executors. All of them operate on the canonical text form
//! of a cell: non-strings are coerced to text first, null/missing/error
//! cells read as the empty string.

use crate::core::dataset::coerce::{is_empty_value, to_text};
use crate::core::dataset::Row;
use crate::core::error::AppError;
use crate::core::formula::executor::FormulaExecutor;
use crate::core::formula::params;
use serde_json::Value;
use std::collections::HashMap;

/// Output naming for the case-conversion family: a single input column keeps
/// the classic `<formula>_result` name, N columns become `<column>_<formula>`
/// each.
fn per_column_outputs(columns: &[String], formula: &str) -> Vec<String> {
    match columns {
        [_] => vec![format!("{}_result", formula)],
        many => many.iter().map(|c| format!("{}_{}", c, formula)).collect(),
    }
}

/// Shared implementation for UPPER/LOWER/TRIM/PROPER_CASE.
fn map_text_columns(
    rows: &[Row],
    columns: &[String],
    formula: &str,
    apply: impl Fn(&str) -> String,
) -> Vec<Row> {
    let outputs = per_column_outputs(columns, formula);
    rows.iter()
        .map(|row| {
            let mut new_row = row.clone();
            for (column, output) in columns.iter().zip(&outputs) {
                let text = row.get(column).map(to_text).unwrap_or_default();
                new_row.insert(output.clone(), Value::String(apply(&text)));
            }
            new_row
        })
        .collect()
}

macro_rules! case_executor {
    ($struct_name:ident, $name:literal, $suffix:literal, $apply:expr) => {
        #[derive(Debug)]
        pub struct $struct_name;

        impl FormulaExecutor for $struct_name {
            fn name(&self) -> &'static str {
                $name
            }

            fn validate_parameters(
                &self,
                params: &HashMap<String, Value>,
            ) -> Result<(), AppError> {
                params::require_columns(params, "text_columns").map(|_| ())
            }

            fn execute(
                &self,
                rows: &[Row],
                parameters: &HashMap<String, Value>,
            ) -> Result<Vec<Row>, AppError> {
                let columns = params::require_columns(parameters, "text_columns")?;
                Ok(map_text_columns(rows, &columns, $suffix, $apply))
            }

            fn output_columns(&self, parameters: &HashMap<String, Value>) -> Vec<String> {
                params::require_columns(parameters, "text_columns")
                    .map(|columns| per_column_outputs(&columns, $suffix))
                    .unwrap_or_default()
            }
        }
    };
}

case_executor!(UpperExecutor, "UPPER", "upper", |s: &str| s.to_uppercase());
case_executor!(LowerExecutor, "LOWER", "lower", |s: &str| s.to_lowercase());
case_executor!(TrimExecutor, "TRIM", "trim", |s: &str| s.trim().to_string());
case_executor!(ProperCaseExecutor, "PROPER_CASE", "proper_case", to_proper_case);

fn to_proper_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug)]
pub struct TextLengthExecutor;

impl FormulaExecutor for TextLengthExecutor {
    fn name(&self) -> &'static str {
        "TEXT_LENGTH"
    }

    fn validate_parameters(&self, params: &HashMap<String, Value>) -> Result<(), AppError> {
        params::require_present(params, &["text_column"])
    }

    fn execute(
        &self,
        rows: &[Row],
        parameters: &HashMap<String, Value>,
    ) -> Result<Vec<Row>, AppError> {
        let column = params::require_str(parameters, "text_column")?;
        Ok(rows
            .iter()
            .map(|row| {
                let mut new_row = row.clone();
                let length = row
                    .get(column)
                    .map(|v| to_text(v).chars().count())
                    .unwrap_or(0);
                new_row.insert(
                    "text_length_result".to_string(),
                    Value::Number(length.into()),
                );
                new_row
            })
            .collect())
    }

    fn output_columns(&self, _parameters: &HashMap<String, Value>) -> Vec<String> {
        vec!["text_length_result".to_string()]
    }
}

#[derive(Debug)]
pub struct TextJoinExecutor;

impl FormulaExecutor for TextJoinExecutor {
    fn name(&self) -> &'static str {
        "TEXT_JOIN"
    }

    fn validate_parameters(&self, params: &HashMap<String, Value>) -> Result<(), AppError> {
        params::require_present(params, &["delimiter", "ignore_empty"])?;
        params::require_columns(params, "text_columns").map(|_| ())
    }

    fn execute(
        &self,
        rows: &[Row],
        parameters: &HashMap<String, Value>,
    ) -> Result<Vec<Row>, AppError> {
        let delimiter = params::optional_str(parameters, "delimiter").unwrap_or(",");
        let ignore_empty = params::optional_bool(parameters, "ignore_empty", true);
        let columns = params::require_columns(parameters, "text_columns")?;

        Ok(rows
            .iter()
            .map(|row| {
                let mut new_row = row.clone();
                let mut values = Vec::new();
                for column in &columns {
                    let cell = row.get(column).cloned().unwrap_or(Value::Null);
                    // With ignore_empty, blanks leave the operand set before
                    // the join runs; without it they join as empty strings.
                    if ignore_empty && is_empty_value(&cell) {
                        continue;
                    }
                    values.push(to_text(&cell));
                }
                new_row.insert(
                    "text_join_result".to_string(),
                    Value::String(values.join(delimiter)),
                );
                new_row
            })
            .collect())
    }

    fn output_columns(&self, _parameters: &HashMap<String, Value>) -> Vec<String> {
        vec!["text_join_result".to_string()]
    }
}
