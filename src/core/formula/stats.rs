#![allow(clippy::result_large_err)]

//! Statistical executors. These are full-pass reductions over the rows in
//! scope: the reduced value is broadcast into the output column of every
//! row, so the shape of the dataset is preserved and the schema still only
//! grows. Non-numeric operands leave the operand set silently.

use crate::core::dataset::coerce::{is_empty_value, number_value, to_number_lenient, to_text};
use crate::core::dataset::Row;
use crate::core::error::AppError;
use crate::core::formula::executor::FormulaExecutor;
use crate::core::formula::params;
use serde_json::Value;
use std::collections::HashMap;
use std::collections::HashSet;

fn broadcast(rows: &[Row], output: &str, value: Value) -> Vec<Row> {
    rows.iter()
        .map(|row| {
            let mut new_row = row.clone();
            new_row.insert(output.to_string(), value.clone());
            new_row
        })
        .collect()
}

fn numeric_operands(rows: &[Row], columns: &[String]) -> Vec<f64> {
    rows.iter()
        .flat_map(|row| {
            columns
                .iter()
                .filter_map(|column| row.get(column).and_then(to_number_lenient))
        })
        .collect()
}

#[derive(Debug)]
pub struct SumExecutor;

impl FormulaExecutor for SumExecutor {
    fn name(&self) -> &'static str {
        "SUM"
    }

    fn validate_parameters(&self, params: &HashMap<String, Value>) -> Result<(), AppError> {
        params::require_columns(params, "columns").map(|_| ())
    }

    fn execute(
        &self,
        rows: &[Row],
        parameters: &HashMap<String, Value>,
    ) -> Result<Vec<Row>, AppError> {
        let columns = params::require_columns(parameters, "columns")?;
        let sum: f64 = numeric_operands(rows, &columns).iter().sum();
        Ok(broadcast(rows, "sum_result", number_value(sum)))
    }

    fn output_columns(&self, _parameters: &HashMap<String, Value>) -> Vec<String> {
        vec!["sum_result".to_string()]
    }

    fn row_independent(&self) -> bool {
        false
    }
}

#[derive(Debug)]
pub struct CountExecutor;

impl FormulaExecutor for CountExecutor {
    fn name(&self) -> &'static str {
        "COUNT"
    }

    fn validate_parameters(&self, params: &HashMap<String, Value>) -> Result<(), AppError> {
        params::require_present(params, &["column"])
    }

    fn execute(
        &self,
        rows: &[Row],
        parameters: &HashMap<String, Value>,
    ) -> Result<Vec<Row>, AppError> {
        let column = params::require_str(parameters, "column")?;
        let count = rows
            .iter()
            .filter(|row| {
                row.get(column)
                    .map(|cell| !is_empty_value(cell))
                    .unwrap_or(false)
            })
            .count();
        Ok(broadcast(rows, "count_result", Value::Number(count.into())))
    }

    fn output_columns(&self, _parameters: &HashMap<String, Value>) -> Vec<String> {
        vec!["count_result".to_string()]
    }

    fn row_independent(&self) -> bool {
        false
    }
}

#[derive(Debug)]
pub struct UniqueCountExecutor;

impl FormulaExecutor for UniqueCountExecutor {
    fn name(&self) -> &'static str {
        "UNIQUE_COUNT"
    }

    fn validate_parameters(&self, params: &HashMap<String, Value>) -> Result<(), AppError> {
        params::require_present(params, &["column"])
    }

    fn execute(
        &self,
        rows: &[Row],
        parameters: &HashMap<String, Value>,
    ) -> Result<Vec<Row>, AppError> {
        let column = params::require_str(parameters, "column")?;
        let mut seen = HashSet::new();
        for row in rows {
            if let Some(cell) = row.get(column) {
                if !is_empty_value(cell) {
                    seen.insert(to_text(cell));
                }
            }
        }
        Ok(broadcast(
            rows,
            "unique_count_result",
            Value::Number(seen.len().into()),
        ))
    }

    fn output_columns(&self, _parameters: &HashMap<String, Value>) -> Vec<String> {
        vec!["unique_count_result".to_string()]
    }

    fn row_independent(&self) -> bool {
        false
    }
}

#[derive(Debug)]
pub struct AverageExecutor;

impl FormulaExecutor for AverageExecutor {
    fn name(&self) -> &'static str {
        "AVERAGE"
    }

    fn validate_parameters(&self, params: &HashMap<String, Value>) -> Result<(), AppError> {
        params::require_present(params, &["column"])
    }

    fn execute(
        &self,
        rows: &[Row],
        parameters: &HashMap<String, Value>,
    ) -> Result<Vec<Row>, AppError> {
        let column = params::require_str(parameters, "column")?;
        let operands = numeric_operands(rows, &[column.to_string()]);
        let average = if operands.is_empty() {
            f64::NAN
        } else {
            operands.iter().sum::<f64>() / operands.len() as f64
        };
        Ok(broadcast(rows, "average_result", number_value(average)))
    }

    fn output_columns(&self, _parameters: &HashMap<String, Value>) -> Vec<String> {
        vec!["average_result".to_string()]
    }

    fn row_independent(&self) -> bool {
        false
    }
}

#[derive(Debug)]
pub struct CorrelationExecutor;

impl FormulaExecutor for CorrelationExecutor {
    fn name(&self) -> &'static str {
        "CORRELATION"
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

        // Pairwise: only rows where both sides are numeric contribute.
        let pairs: Vec<(f64, f64)> = rows
            .iter()
            .filter_map(|row| {
                let a = row.get(left).and_then(to_number_lenient)?;
                let b = row.get(right).and_then(to_number_lenient)?;
                Some((a, b))
            })
            .collect();

        Ok(broadcast(
            rows,
            "correlation_result",
            number_value(pearson(&pairs)),
        ))
    }

    fn output_columns(&self, _parameters: &HashMap<String, Value>) -> Vec<String> {
        vec!["correlation_result".to_string()]
    }

    fn row_independent(&self) -> bool {
        false
    }
}

/// Pearson coefficient; NaN when undefined (fewer than two pairs, or zero
/// variance on either side), which surfaces as the sentinel cell.
fn pearson(pairs: &[(f64, f64)]) -> f64 {
    let n = pairs.len() as f64;
    if pairs.len() < 2 {
        return f64::NAN;
    }
    let mean_a = pairs.iter().map(|(a, _)| a).sum::<f64>() / n;
    let mean_b = pairs.iter().map(|(_, b)| b).sum::<f64>() / n;
    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (a, b) in pairs {
        let da = a - mean_a;
        let db = b - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }
    if var_a == 0.0 || var_b == 0.0 {
        return f64::NAN;
    }
    cov / (var_a.sqrt() * var_b.sqrt())
}
