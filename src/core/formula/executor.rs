#![allow(clippy::result_large_err)]

use crate::core::dataset::Row;
use crate::core::error::AppError;
use serde_json::Value;
use std::collections::HashMap;

/// Contract implemented by every named formula.
///
/// Executors own no dataset state and must be pure functions of `(rows,
/// params)`: identical inputs produce identical outputs, which is what makes
/// preview and full runs comparable and results safely cacheable.
pub trait FormulaExecutor: Send + Sync + std::fmt::Debug {
    /// Formula name used in workflow step definitions.
    fn name(&self) -> &'static str;

    /// Check presence and structure of parameters before any row is touched.
    fn validate_parameters(&self, params: &HashMap<String, Value>) -> Result<(), AppError>;

    /// Transform the input rows, producing the output rows.
    fn execute(&self, rows: &[Row], params: &HashMap<String, Value>)
        -> Result<Vec<Row>, AppError>;

    /// Columns this executor introduces, independent of row data, so the
    /// engine can infer the resulting schema without running the formula.
    fn output_columns(&self, params: &HashMap<String, Value>) -> Vec<String>;

    /// Whether rows can be processed independently. Aggregates and reshapes
    /// return false and always run as a single reduction pass; everything
    /// else may be chunked by the engine with order-preserving reassembly.
    fn row_independent(&self) -> bool {
        true
    }
}
