use crate::core::dataset::Row;
use crate::core::types::{ExecutionMode, RunStatus, StepStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// The tabular result of one step execution (preview) or of a full run.
/// Created fresh per execution, never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedData {
    pub rows: Vec<Row>,
    pub columns: Vec<String>,
    pub row_count: usize,
    pub execution_time_ms: u64,
    pub memory_estimate_bytes: u64,
    pub sample_size: Option<usize>,
    pub step_index: usize,
}

/// Record describing the completed run of one step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRunRecord {
    pub step_id: String,
    pub operation: String,
    pub status: StepStatus,
    pub output_columns: Vec<String>,
    pub row_count: usize,
    pub duration_ms: u64,
    pub error: Option<String>,
}

/// Summary of a whole workflow run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRunSummary {
    pub execution_id: Uuid,
    pub mode: ExecutionMode,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub step_runs: Vec<StepRunRecord>,
    pub data: ProcessedData,
}

/// Cooperative cancellation handle, polled between steps and at row-chunk
/// boundaries, never mid-row.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    inner: Arc<AtomicBool>,
}

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.load(Ordering::SeqCst)
    }
}

/// Approximate in-memory footprint: mean serialized size of a bounded row
/// sample times the row count.
pub fn estimate_memory_bytes(rows: &[Row]) -> u64 {
    const SAMPLE: usize = 32;
    if rows.is_empty() {
        return 0;
    }
    let sampled = rows.len().min(SAMPLE);
    let sampled_bytes: usize = rows
        .iter()
        .take(sampled)
        .map(|row| serde_json::to_vec(row).map(|b| b.len()).unwrap_or(0))
        .sum();
    let mean = sampled_bytes as f64 / sampled as f64;
    (mean * rows.len() as f64) as u64
}
