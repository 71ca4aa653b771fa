use serde::{Deserialize, Serialize};

/// Kind of a workflow step, dispatched on by the execution engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// Pull a column out of a loaded source into the working dataset.
    ColumnSelect,
    /// Apply a registered formula executor.
    Formula,
    /// Fill a column with a user-supplied literal value.
    Literal,
    /// Switch the working dataset to a named source.
    SheetSelect,
}

impl StepKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepKind::ColumnSelect => "column_select",
            StepKind::Formula => "formula",
            StepKind::Literal => "literal",
            StepKind::SheetSelect => "sheet_select",
        }
    }
}

/// Per-step execution status. Only the engine moves a step out of Pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Pending => "pending",
            StepStatus::Processing => "processing",
            StepStatus::Completed => "completed",
            StepStatus::Failed => "failed",
        }
    }
}

/// Overall status of a workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RunStatus {
    #[default]
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Running => "Running",
            RunStatus::Completed => "Completed",
            RunStatus::Failed => "Failed",
            RunStatus::Cancelled => "Cancelled",
        }
    }
}

/// Execution mode selected by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    Preview,
    Full,
}

/// Scope used by aggregate formulas when a preview runs over a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AggregateScope {
    /// Aggregates see only the sampled rows (cheap, default).
    #[default]
    Sample,
    /// Aggregates are recomputed over the unsampled derivation of their input.
    Full,
}

/// Error category enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    ValidationError,
    FormulaNotFound,
    ColumnNotFound,
    ExecutionError,
    TimeoutError,
    CancelledError,
    SerializationError,
    IoError,
    InternalError,
    Unknown,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Error severity enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Error,
    Warning,
    Info,
    Debug,
}
