#![allow(clippy::result_large_err)]

//! Mathematical executors. Operands coerce through the arithmetic policy:
//! null/empty/error cells read as zero, non-numeric text becomes a per-row
//! ERROR-tagged cell rather than a step failure.

use crate::core::dataset::coerce::{error_cell, number_value, parse_literal, to_number};
use crate::core::dataset::Row;
use crate::core::error::AppError;
use crate::core::formula::executor::FormulaExecutor;
use crate::core::formula::params;
use serde_json::Value;
use std::collections::HashMap;

fn binary_map(
    rows: &[Row],
    left: &str,
    right: &str,
    output: &str,
    apply: impl Fn(f64, f64) -> f64,
) -> Vec<Row> {
    rows.iter()
        .map(|row| {
            let mut new_row = row.clone();
            let lhs = to_number(row.get(left).unwrap_or(&Value::Null));
            let rhs = to_number(row.get(right).unwrap_or(&Value::Null));
            let cell = match (lhs, rhs) {
                (Ok(a), Ok(b)) => number_value(apply(a, b)),
                (Err(e), _) | (_, Err(e)) => error_cell(&e.to_string()),
            };
            new_row.insert(output.to_string(), cell);
            new_row
        })
        .collect()
}

#[derive(Debug)]
pub struct AddExecutor;

impl FormulaExecutor for AddExecutor {
    fn name(&self) -> &'static str {
        "ADD"
    }

    fn validate_parameters(&self, params: &HashMap<String, Value>) -> Result<(), AppError> {
        params::require_present(params, &["number1", "number2"])
    }

    fn execute(
        &self,
        rows: &[Row],
        parameters: &HashMap<String, Value>,
    ) -> Result<Vec<Row>, AppError> {
        let left = params::require_str(parameters, "number1")?;
        let right = params::require_str(parameters, "number2")?;
        Ok(binary_map(rows, left, right, "add_result", |a, b| a + b))
    }

    fn output_columns(&self, _parameters: &HashMap<String, Value>) -> Vec<String> {
        vec!["add_result".to_string()]
    }
}

#[derive(Debug)]
pub struct SubtractExecutor;

impl FormulaExecutor for SubtractExecutor {
    fn name(&self) -> &'static str {
        "SUBTRACT"
    }

    fn validate_parameters(&self, params: &HashMap<String, Value>) -> Result<(), AppError> {
        params::require_present(params, &["column1", "column2"])
    }

    fn execute(
        &self,
        rows: &[Row],
        parameters: &HashMap<String, Value>,
    ) -> Result<Vec<Row>, AppError> {
        let left = params::require_str(parameters, "column1")?;
        let right = params::require_str(parameters, "column2")?;
        Ok(binary_map(rows, left, right, "subtract_result", |a, b| {
            a - b
        }))
    }

    fn output_columns(&self, _parameters: &HashMap<String, Value>) -> Vec<String> {
        vec!["subtract_result".to_string()]
    }
}

#[derive(Debug)]
pub struct MultiplyExecutor;

impl FormulaExecutor for MultiplyExecutor {
    fn name(&self) -> &'static str {
        "MULTIPLY"
    }

    fn validate_parameters(&self, params: &HashMap<String, Value>) -> Result<(), AppError> {
        params::require_present(params, &["column1", "column2"])
    }

    fn execute(
        &self,
        rows: &[Row],
        parameters: &HashMap<String, Value>,
    ) -> Result<Vec<Row>, AppError> {
        let left = params::require_str(parameters, "column1")?;
        let right = params::require_str(parameters, "column2")?;
        Ok(binary_map(rows, left, right, "multiply_result", |a, b| {
            a * b
        }))
    }

    fn output_columns(&self, _parameters: &HashMap<String, Value>) -> Vec<String> {
        vec!["multiply_result".to_string()]
    }
}

#[derive(Debug)]
pub struct DivideExecutor;

impl FormulaExecutor for DivideExecutor {
    fn name(&self) -> &'static str {
        "DIVIDE"
    }

    fn validate_parameters(&self, params: &HashMap<String, Value>) -> Result<(), AppError> {
        params::require_present(params, &["column1", "column2"])
    }

    fn execute(
        &self,
        rows: &[Row],
        parameters: &HashMap<String, Value>,
    ) -> Result<Vec<Row>, AppError> {
        let left = params::require_str(parameters, "column1")?;
        let right = params::require_str(parameters, "column2")?;
        let default = params::optional_str(parameters, "default").map(parse_literal);

        Ok(rows
            .iter()
            .map(|row| {
                let mut new_row = row.clone();
                let lhs = to_number(row.get(left).unwrap_or(&Value::Null));
                let rhs = to_number(row.get(right).unwrap_or(&Value::Null));
                let cell = match (lhs, rhs) {
                    // A zero divisor is never an error: the caller-supplied
                    // default wins, otherwise the NaN sentinel.
                    (Ok(_), Ok(divisor)) if divisor == 0.0 => match &default {
                        Some(value) => value.clone(),
                        None => number_value(f64::NAN),
                    },
                    (Ok(a), Ok(b)) => number_value(a / b),
                    (Err(e), _) | (_, Err(e)) => error_cell(&e.to_string()),
                };
                new_row.insert("divide_result".to_string(), cell);
                new_row
            })
            .collect())
    }

    fn output_columns(&self, _parameters: &HashMap<String, Value>) -> Vec<String> {
        vec!["divide_result".to_string()]
    }
}
