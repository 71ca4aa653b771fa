#![allow(clippy::result_large_err)]

//! Transformation executors. PIVOT/DEPIVOT/REMOVE_DUPLICATES reshape the
//! row set and therefore never chunk; FILLNA rewrites cells in place.

use crate::core::dataset::coerce::{is_empty_value, number_value, to_number_lenient, to_text};
use crate::core::dataset::Row;
use crate::core::error::AppError;
use crate::core::formula::executor::FormulaExecutor;
use crate::core::formula::params;
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashMap;
use std::collections::HashSet;

#[derive(Debug)]
pub struct PivotExecutor;

impl FormulaExecutor for PivotExecutor {
    fn name(&self) -> &'static str {
        "PIVOT"
    }

    fn validate_parameters(&self, params: &HashMap<String, Value>) -> Result<(), AppError> {
        params::require_present(params, &["index_column", "value_column"])
    }

    fn execute(
        &self,
        rows: &[Row],
        parameters: &HashMap<String, Value>,
    ) -> Result<Vec<Row>, AppError> {
        let index_column = params::require_str(parameters, "index_column")?;
        let value_column = params::require_str(parameters, "value_column")?;

        // First-seen group order keeps pivot output deterministic.
        let mut grouped: IndexMap<String, Vec<f64>> = IndexMap::new();
        for row in rows {
            let Some(index_cell) = row.get(index_column) else {
                continue;
            };
            if let Some(value) = row.get(value_column).and_then(to_number_lenient) {
                grouped
                    .entry(to_text(index_cell))
                    .or_default()
                    .push(value);
            }
        }

        Ok(grouped
            .into_iter()
            .map(|(index, values)| {
                let sum: f64 = values.iter().sum();
                let mut new_row = Row::new();
                new_row.insert("index".to_string(), Value::String(index));
                new_row.insert("count".to_string(), Value::Number(values.len().into()));
                new_row.insert("sum".to_string(), number_value(sum));
                new_row.insert("avg".to_string(), number_value(sum / values.len() as f64));
                new_row
            })
            .collect())
    }

    fn output_columns(&self, _parameters: &HashMap<String, Value>) -> Vec<String> {
        vec![
            "index".to_string(),
            "count".to_string(),
            "sum".to_string(),
            "avg".to_string(),
        ]
    }

    fn row_independent(&self) -> bool {
        false
    }
}

#[derive(Debug)]
pub struct DepivotExecutor;

impl FormulaExecutor for DepivotExecutor {
    fn name(&self) -> &'static str {
        "DEPIVOT"
    }

    fn validate_parameters(&self, params: &HashMap<String, Value>) -> Result<(), AppError> {
        params::require_columns(params, "id_columns").map(|_| ())
    }

    fn execute(
        &self,
        rows: &[Row],
        parameters: &HashMap<String, Value>,
    ) -> Result<Vec<Row>, AppError> {
        let id_columns = params::require_columns(parameters, "id_columns")?;
        let id_set: HashSet<&str> = id_columns.iter().map(String::as_str).collect();

        let mut result = Vec::new();
        for row in rows {
            let id_values: Row = id_columns
                .iter()
                .filter_map(|column| {
                    row.get(column).map(|value| (column.clone(), value.clone()))
                })
                .collect();

            // Row maps carry no ordering, so variable rows come out sorted.
            let mut variables: Vec<(&String, &Value)> = row
                .iter()
                .filter(|(key, _)| !id_set.contains(key.as_str()))
                .collect();
            variables.sort_by(|a, b| a.0.cmp(b.0));

            for (key, value) in variables {
                let mut new_row = id_values.clone();
                new_row.insert("variable".to_string(), Value::String(key.clone()));
                new_row.insert("value".to_string(), value.clone());
                result.push(new_row);
            }
        }

        Ok(result)
    }

    fn output_columns(&self, _parameters: &HashMap<String, Value>) -> Vec<String> {
        vec!["variable".to_string(), "value".to_string()]
    }

    fn row_independent(&self) -> bool {
        false
    }
}

#[derive(Debug)]
pub struct RemoveDuplicatesExecutor;

impl FormulaExecutor for RemoveDuplicatesExecutor {
    fn name(&self) -> &'static str {
        "REMOVE_DUPLICATES"
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

        let mut seen = HashSet::new();
        let mut result = Vec::new();
        for row in rows {
            let key: Vec<String> = columns
                .iter()
                .map(|column| row.get(column).map(to_text).unwrap_or_default())
                .collect();
            if seen.insert(key) {
                result.push(row.clone());
            }
        }
        Ok(result)
    }

    fn output_columns(&self, _parameters: &HashMap<String, Value>) -> Vec<String> {
        Vec::new() // shape change only, no new columns
    }

    fn row_independent(&self) -> bool {
        false
    }
}

#[derive(Debug)]
pub struct FillNaExecutor;

impl FormulaExecutor for FillNaExecutor {
    fn name(&self) -> &'static str {
        "FILLNA"
    }

    fn validate_parameters(&self, params: &HashMap<String, Value>) -> Result<(), AppError> {
        params::require_present(params, &["column", "value"])
    }

    fn execute(
        &self,
        rows: &[Row],
        parameters: &HashMap<String, Value>,
    ) -> Result<Vec<Row>, AppError> {
        let column = params::require_str(parameters, "column")?;
        let fill_value = parameters
            .get("value")
            .cloned()
            .ok_or_else(|| AppError::validation("Missing required parameter: value"))?;

        Ok(rows
            .iter()
            .map(|row| {
                let mut new_row = row.clone();
                let needs_fill = row
                    .get(column)
                    .map(is_empty_value)
                    .unwrap_or(true);
                if needs_fill {
                    new_row.insert(column.to_string(), fill_value.clone());
                }
                new_row
            })
            .collect())
    }

    fn output_columns(&self, _parameters: &HashMap<String, Value>) -> Vec<String> {
        Vec::new() // rewrites an existing column in place
    }
}
