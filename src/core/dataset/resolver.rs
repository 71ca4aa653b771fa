#![allow(clippy::result_large_err)]

use crate::core::dataset::SourceCatalog;
use crate::core::error::AppError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A pointer to a column within a specific named source.
///
/// `file` is optional: steps created through the visual editor carry the
/// originating file, legacy/simple steps carry only the bare column name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnReference {
    #[serde(default)]
    pub file: Option<String>,
    pub column: String,
}

impl ColumnReference {
    pub fn bare(column: impl Into<String>) -> Self {
        Self {
            file: None,
            column: column.into(),
        }
    }

    pub fn qualified(file: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            file: Some(file.into()),
            column: column.into(),
        }
    }
}

/// The outcome of resolution: which source won and the column's values.
#[derive(Debug, Clone)]
pub struct ResolvedColumn {
    pub source: String,
    pub column: String,
    pub values: Vec<Value>,
}

pub struct ColumnResolver;

impl ColumnResolver {
    /// Resolve a reference against the loaded sources.
    ///
    /// Qualified references (file + column) must match exactly. Bare names
    /// fall back to the *first* loaded source containing the column. With
    /// multiple same-named columns across files only the first source is
    /// used, a known limitation kept for compatibility with existing
    /// workflows, not a considered merge policy.
    pub fn resolve(
        reference: &ColumnReference,
        catalog: &SourceCatalog,
    ) -> Result<ResolvedColumn, AppError> {
        match &reference.file {
            Some(file) => {
                let dataset = catalog.get(file).ok_or_else(|| {
                    AppError::column_not_found(&reference.column)
                        .with_context(format!("source '{}' is not loaded", file))
                })?;
                if !dataset.has_column(&reference.column) {
                    return Err(AppError::column_not_found(&reference.column)
                        .with_context(format!("source '{}' has no such column", file)));
                }
                Ok(ResolvedColumn {
                    source: file.clone(),
                    column: reference.column.clone(),
                    values: dataset.column_values(&reference.column),
                })
            }
            None => Self::resolve_bare(&reference.column, catalog),
        }
    }

    /// Bare-name fallback: first loaded source wins.
    pub fn resolve_bare(column: &str, catalog: &SourceCatalog) -> Result<ResolvedColumn, AppError> {
        let (source, dataset) = catalog
            .first_with_column(column)
            .ok_or_else(|| AppError::column_not_found(column))?;
        Ok(ResolvedColumn {
            source: source.to_string(),
            column: column.to_string(),
            values: dataset.column_values(column),
        })
    }
}
