pub mod coerce;
pub mod resolver;

pub use resolver::{ColumnReference, ColumnResolver, ResolvedColumn};

use crate::core::error::AppError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// A single row: column name to loosely-typed cell value.
pub type Row = HashMap<String, Value>;

/// An ordered set of named columns plus the rows beneath them.
///
/// Column order is display-significant; lookup is always by name. Every
/// row's key set is a subset of the declared column set.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TabularDataset {
    #[serde(default)]
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl TabularDataset {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    /// Build a dataset from bare rows, inferring the column set. Row maps
    /// carry no ordering, so inferred columns are sorted for determinism.
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let mut columns: Vec<String> = rows
            .iter()
            .flat_map(|row| row.keys().cloned())
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect();
        columns.sort();
        Self { columns, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Values of one column in row order; missing cells read as Null.
    pub fn column_values(&self, name: &str) -> Vec<Value> {
        self.rows
            .iter()
            .map(|row| row.get(name).cloned().unwrap_or(Value::Null))
            .collect()
    }

    /// First `n` rows, for preview sampling.
    pub fn sample(&self, n: usize) -> Vec<Row> {
        self.rows.iter().take(n).cloned().collect()
    }
}

/// The named tabular sources handed over by the import collaborator.
///
/// Load order is preserved: it defines which source wins when a bare column
/// name matches more than one file.
#[derive(Debug, Clone, Default)]
pub struct SourceCatalog {
    sources: IndexMap<String, TabularDataset>,
}

impl SourceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, dataset: TabularDataset) {
        self.sources.insert(name.into(), dataset);
    }

    pub fn get(&self, name: &str) -> Option<&TabularDataset> {
        self.sources.get(name)
    }

    pub fn require(&self, name: &str) -> Result<&TabularDataset, AppError> {
        self.sources.get(name).ok_or_else(|| {
            AppError::validation(format!("source '{}' is not loaded", name))
        })
    }

    pub fn names(&self) -> Vec<&str> {
        self.sources.keys().map(String::as_str).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// First loaded source containing the given column, in load order.
    pub fn first_with_column(&self, column: &str) -> Option<(&str, &TabularDataset)> {
        self.sources
            .iter()
            .find(|(_, dataset)| dataset.has_column(column))
            .map(|(name, dataset)| (name.as_str(), dataset))
    }

    /// Every column name reachable from any loaded source.
    pub fn all_columns(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for dataset in self.sources.values() {
            for column in &dataset.columns {
                if seen.insert(column.clone()) {
                    out.push(column.clone());
                }
            }
        }
        out
    }
}
