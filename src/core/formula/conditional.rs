#![allow(clippy::result_large_err)]

//! Conditional executors. All three compare the canonical text form of the
//! condition column against the supplied value, row by row.

use crate::core::dataset::coerce::{number_value, to_number_lenient, to_text};
use crate::core::dataset::Row;
use crate::core::error::AppError;
use crate::core::formula::executor::FormulaExecutor;
use crate::core::formula::params;
use serde_json::Value;
use std::collections::HashMap;

fn condition_matches(row: &Row, column: &str, expected: &str) -> bool {
    row.get(column)
        .map(|cell| to_text(cell) == expected)
        .unwrap_or(false)
}

#[derive(Debug)]
pub struct IfExecutor;

impl FormulaExecutor for IfExecutor {
    fn name(&self) -> &'static str {
        "IF"
    }

    fn validate_parameters(&self, params: &HashMap<String, Value>) -> Result<(), AppError> {
        params::require_present(
            params,
            &["condition_column", "condition_value", "true_value", "false_value"],
        )
    }

    fn execute(
        &self,
        rows: &[Row],
        parameters: &HashMap<String, Value>,
    ) -> Result<Vec<Row>, AppError> {
        let column = params::require_str(parameters, "condition_column")?;
        let expected = params::require_str(parameters, "condition_value")?;
        let true_value = params::optional_str(parameters, "true_value").unwrap_or("TRUE");
        let false_value = params::optional_str(parameters, "false_value").unwrap_or("FALSE");

        Ok(rows
            .iter()
            .map(|row| {
                let mut new_row = row.clone();
                let result = if condition_matches(row, column, expected) {
                    true_value
                } else {
                    false_value
                };
                new_row.insert("if_result".to_string(), Value::String(result.to_string()));
                new_row
            })
            .collect())
    }

    fn output_columns(&self, _parameters: &HashMap<String, Value>) -> Vec<String> {
        vec!["if_result".to_string()]
    }
}

#[derive(Debug)]
pub struct SumIfExecutor;

impl FormulaExecutor for SumIfExecutor {
    fn name(&self) -> &'static str {
        "SUMIF"
    }

    fn validate_parameters(&self, params: &HashMap<String, Value>) -> Result<(), AppError> {
        params::require_present(params, &["sum_column", "condition_column", "condition_value"])
    }

    fn execute(
        &self,
        rows: &[Row],
        parameters: &HashMap<String, Value>,
    ) -> Result<Vec<Row>, AppError> {
        let sum_column = params::require_str(parameters, "sum_column")?;
        let column = params::require_str(parameters, "condition_column")?;
        let expected = params::require_str(parameters, "condition_value")?;

        Ok(rows
            .iter()
            .map(|row| {
                let mut new_row = row.clone();
                let contribution = if condition_matches(row, column, expected) {
                    row.get(sum_column).and_then(to_number_lenient).unwrap_or(0.0)
                } else {
                    0.0
                };
                new_row.insert("sumif_result".to_string(), number_value(contribution));
                new_row
            })
            .collect())
    }

    fn output_columns(&self, _parameters: &HashMap<String, Value>) -> Vec<String> {
        vec!["sumif_result".to_string()]
    }
}

#[derive(Debug)]
pub struct CountIfExecutor;

impl FormulaExecutor for CountIfExecutor {
    fn name(&self) -> &'static str {
        "COUNTIF"
    }

    fn validate_parameters(&self, params: &HashMap<String, Value>) -> Result<(), AppError> {
        params::require_present(params, &["condition_column", "condition_value"])
    }

    fn execute(
        &self,
        rows: &[Row],
        parameters: &HashMap<String, Value>,
    ) -> Result<Vec<Row>, AppError> {
        let column = params::require_str(parameters, "condition_column")?;
        let expected = params::require_str(parameters, "condition_value")?;

        Ok(rows
            .iter()
            .map(|row| {
                let mut new_row = row.clone();
                let count = u64::from(condition_matches(row, column, expected));
                new_row.insert("countif_result".to_string(), Value::Number(count.into()));
                new_row
            })
            .collect())
    }

    fn output_columns(&self, _parameters: &HashMap<String, Value>) -> Vec<String> {
        vec!["countif_result".to_string()]
    }
}
