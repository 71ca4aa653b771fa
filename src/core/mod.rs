pub mod config;
pub mod dataset;
pub mod error;
pub mod formula;
pub mod types;
pub mod workflow;

pub use config::{ConfigLoader, ConfigValidator, RowforgeConfig};
pub use dataset::{ColumnReference, ColumnResolver, Row, SourceCatalog, TabularDataset};
pub use error::AppError;
pub use formula::{register_builtins, FormulaExecutor, FormulaRegistry};
pub use types::*;
pub use workflow::{
    CancellationFlag, ExecutionEngine, ExecutionOverrides, ProcessedData, WorkflowDocument,
    WorkflowRunSummary,
};
