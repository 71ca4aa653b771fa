pub mod engine;
pub mod schema;
pub mod state;

pub use engine::{ExecutionEngine, ExecutionOverrides, PreviewReport};
pub use schema::{load_workflow, WorkflowDocument, WorkflowSettings, WorkflowStep};
pub use state::{CancellationFlag, ProcessedData, StepRunRecord, WorkflowRunSummary};
