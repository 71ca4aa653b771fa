#![allow(clippy::result_large_err)]

//! The execution engine: walks the ordered step list, threading the working
//! dataset through column selection, formula execution, literal generation,
//! and sheet selection.
//!
//! Two modes: bounded-sample preview and full execution over the entire
//! dataset. Preview normally re-derives from the first step, so stale
//! upstream state can never leak into what the user sees; `preview_from`
//! resumes from an edited step against a cached upstream snapshot instead.
//! A failed step never aborts the run: its status flips to Failed and
//! later steps keep going against the last good working set. Only
//! timeouts, cancellation, and internal errors are run-fatal.

use crate::core::config::EngineConfig;
use crate::core::dataset::coerce::parse_literal;
use crate::core::dataset::{ColumnReference, ColumnResolver, Row, SourceCatalog};
use crate::core::error::AppError;
use crate::core::formula::params::bind_parameters;
use crate::core::formula::{FormulaExecutor, FormulaRegistry};
use crate::core::types::{AggregateScope, ExecutionMode, RunStatus, StepKind, StepStatus};
use crate::core::workflow::schema::{WorkflowDocument, WorkflowStep};
use crate::core::workflow::state::{
    estimate_memory_bytes, CancellationFlag, ProcessedData, StepRunRecord, WorkflowRunSummary,
};
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Optional overrides supplied by CLI flags.
#[derive(Clone, Debug, Default)]
pub struct ExecutionOverrides {
    pub sample_size: Option<usize>,
    pub max_time_seconds: Option<u64>,
}

/// Settings resolved per run: CLI override > document settings > engine
/// configuration.
#[derive(Clone, Debug)]
struct EffectiveSettings {
    sample_size: usize,
    chunk_size: usize,
    max_time_seconds: u64,
    aggregate_scope: AggregateScope,
}

/// Per-run execution options threaded through the pipeline.
#[derive(Clone, Copy, Debug)]
struct RunOptions {
    /// Bounded head sample for preview; None runs the whole dataset.
    sample: Option<usize>,
    /// Collect a dataset snapshot per step (preview only).
    collect_steps: bool,
    /// Offset added to reported step indices when resuming mid-workflow.
    index_offset: usize,
    /// Whether full-scope aggregates may re-derive their input. Resumed
    /// previews lack the upstream steps, so they fall back to sample scope.
    allow_full_scope: bool,
}

/// Result of a preview run: one dataset snapshot per step, plus the
/// per-step records carrying status and telemetry.
#[derive(Debug, Clone)]
pub struct PreviewReport {
    pub step_data: Vec<ProcessedData>,
    pub step_runs: Vec<StepRunRecord>,
}

/// The running tabular state threaded from step to step. The column set
/// only ever grows; rows are whatever the latest step produced.
#[derive(Debug, Clone, Default)]
struct WorkingSet {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl WorkingSet {
    fn merge_columns(&mut self, incoming: &[String]) {
        for column in incoming {
            if !self.columns.iter().any(|c| c == column) {
                self.columns.push(column.clone());
            }
        }
    }
}

struct PipelineOutcome {
    per_step: Vec<ProcessedData>,
    records: Vec<StepRunRecord>,
    working: WorkingSet,
}

pub struct ExecutionEngine {
    registry: Arc<FormulaRegistry>,
    config: EngineConfig,
}

impl ExecutionEngine {
    pub fn new(registry: Arc<FormulaRegistry>, config: EngineConfig) -> Self {
        Self { registry, config }
    }

    fn effective_settings(
        &self,
        document: &WorkflowDocument,
        overrides: &ExecutionOverrides,
    ) -> EffectiveSettings {
        let doc = &document.workflow.settings;
        EffectiveSettings {
            sample_size: overrides
                .sample_size
                .or(doc.sample_size)
                .unwrap_or(self.config.preview_sample_size),
            chunk_size: doc.chunk_size.unwrap_or(self.config.chunk_size),
            max_time_seconds: overrides
                .max_time_seconds
                .or(doc.max_time_seconds)
                .unwrap_or(self.config.max_time_seconds),
            aggregate_scope: doc
                .aggregate_scope
                .unwrap_or(self.config.aggregate_scope),
        }
    }

    /// Sampled run for interactive editing. Re-derives from the first step
    /// on every call and returns a dataset snapshot per step.
    pub fn preview(
        &self,
        document: &mut WorkflowDocument,
        catalog: &SourceCatalog,
        overrides: &ExecutionOverrides,
        cancel: &CancellationFlag,
    ) -> Result<PreviewReport, AppError> {
        document.validate(&self.registry, Some(catalog))?;
        let settings = self.effective_settings(document, overrides);
        let sample = settings.sample_size;
        debug!(sample, steps = document.workflow.steps.len(), "previewing workflow");

        let options = RunOptions {
            sample: Some(sample),
            collect_steps: true,
            index_offset: 0,
            allow_full_scope: true,
        };
        let started = Instant::now();
        let budget = Duration::from_secs(settings.max_time_seconds);
        let outcome = self.run_pipeline(
            &mut document.workflow.steps,
            WorkingSet::default(),
            catalog,
            &settings,
            options,
            cancel,
            started,
            budget,
        )?;
        Ok(PreviewReport {
            step_data: outcome.per_step,
            step_runs: outcome.records,
        })
    }

    /// Resume a preview from the step at `start_index`, feeding it the
    /// cached output of the prior step instead of re-deriving the whole
    /// graph. Aggregates configured for full scope fall back to sample
    /// scope here, since the upstream derivation is not available.
    pub fn preview_from(
        &self,
        document: &mut WorkflowDocument,
        catalog: &SourceCatalog,
        overrides: &ExecutionOverrides,
        cancel: &CancellationFlag,
        start_index: usize,
        upstream: &ProcessedData,
    ) -> Result<PreviewReport, AppError> {
        document.validate(&self.registry, Some(catalog))?;
        if start_index >= document.workflow.steps.len() {
            return Err(AppError::validation(format!(
                "cannot resume preview at step {start_index}: workflow has {} steps",
                document.workflow.steps.len()
            )));
        }
        let settings = self.effective_settings(document, overrides);
        debug!(start_index, "resuming preview from cached upstream output");

        let seed = WorkingSet {
            columns: upstream.columns.clone(),
            rows: upstream.rows.clone(),
        };
        let options = RunOptions {
            sample: Some(settings.sample_size),
            collect_steps: true,
            index_offset: start_index,
            allow_full_scope: false,
        };
        let started = Instant::now();
        let budget = Duration::from_secs(settings.max_time_seconds);
        let outcome = self.run_pipeline(
            &mut document.workflow.steps[start_index..],
            seed,
            catalog,
            &settings,
            options,
            cancel,
            started,
            budget,
        )?;
        Ok(PreviewReport {
            step_data: outcome.per_step,
            step_runs: outcome.records,
        })
    }

    /// Unbounded run over the entire dataset.
    pub fn execute(
        &self,
        document: &mut WorkflowDocument,
        catalog: &SourceCatalog,
        overrides: &ExecutionOverrides,
        cancel: &CancellationFlag,
    ) -> Result<WorkflowRunSummary, AppError> {
        document.validate(&self.registry, Some(catalog))?;
        let settings = self.effective_settings(document, overrides);
        let execution_id = Uuid::new_v4();
        let started_at = Utc::now();
        let started = Instant::now();
        let budget = Duration::from_secs(settings.max_time_seconds);
        info!(%execution_id, steps = document.workflow.steps.len(), "executing workflow");

        let options = RunOptions {
            sample: None,
            collect_steps: false,
            index_offset: 0,
            allow_full_scope: true,
        };
        let outcome = self.run_pipeline(
            &mut document.workflow.steps,
            WorkingSet::default(),
            catalog,
            &settings,
            options,
            cancel,
            started,
            budget,
        )?;

        let memory_estimate_bytes = estimate_memory_bytes(&outcome.working.rows);
        let data = ProcessedData {
            row_count: outcome.working.rows.len(),
            rows: outcome.working.rows,
            columns: outcome.working.columns,
            execution_time_ms: started.elapsed().as_millis() as u64,
            memory_estimate_bytes,
            sample_size: None,
            step_index: document.workflow.steps.len().saturating_sub(1),
        };
        Ok(WorkflowRunSummary {
            execution_id,
            mode: ExecutionMode::Full,
            status: RunStatus::Completed,
            started_at,
            completed_at: Some(Utc::now()),
            step_runs: outcome.records,
            data,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn run_pipeline(
        &self,
        steps: &mut [WorkflowStep],
        initial: WorkingSet,
        catalog: &SourceCatalog,
        settings: &EffectiveSettings,
        options: RunOptions,
        cancel: &CancellationFlag,
        started: Instant,
        budget: Duration,
    ) -> Result<PipelineOutcome, AppError> {
        let mut working = initial;
        let mut per_step = Vec::new();
        let mut records = Vec::new();

        for index in 0..steps.len() {
            if cancel.is_cancelled() {
                return Err(AppError::cancelled("workflow cancelled between steps"));
            }
            if started.elapsed() >= budget {
                return Err(AppError::timeout(format!(
                    "workflow exceeded its {}s time budget",
                    budget.as_secs()
                )));
            }

            let (prefix, rest) = steps.split_at_mut(index);
            let step = &mut rest[0];
            step.status = StepStatus::Processing;
            let step_view = step.clone();
            let step_started = Instant::now();

            let result = self.run_step(
                &step_view, prefix, &mut working, catalog, settings, options, cancel, started,
                budget,
            );
            let duration_ms = step_started.elapsed().as_millis() as u64;

            match result {
                Ok(outputs) => {
                    step.status = StepStatus::Completed;
                    records.push(StepRunRecord {
                        step_id: step_view.id.clone(),
                        operation: step_view.source.clone(),
                        status: StepStatus::Completed,
                        output_columns: outputs,
                        row_count: working.rows.len(),
                        duration_ms,
                        error: None,
                    });
                }
                Err(err) if err.is_run_fatal() => {
                    step.status = StepStatus::Failed;
                    records.push(StepRunRecord {
                        step_id: step_view.id.clone(),
                        operation: step_view.source.clone(),
                        status: StepStatus::Failed,
                        output_columns: Vec::new(),
                        row_count: working.rows.len(),
                        duration_ms,
                        error: Some(err.to_string()),
                    });
                    return Err(err);
                }
                Err(err) => {
                    // Step-fatal but workflow-recoverable: prior results
                    // stay intact and later steps keep running.
                    step.status = StepStatus::Failed;
                    warn!(step = %step_view.id, error = %err, "step failed, continuing");
                    records.push(StepRunRecord {
                        step_id: step_view.id.clone(),
                        operation: step_view.source.clone(),
                        status: StepStatus::Failed,
                        output_columns: Vec::new(),
                        row_count: working.rows.len(),
                        duration_ms,
                        error: Some(err.to_string()),
                    });
                }
            }

            if options.collect_steps {
                per_step.push(ProcessedData {
                    rows: working.rows.clone(),
                    columns: working.columns.clone(),
                    row_count: working.rows.len(),
                    execution_time_ms: duration_ms,
                    memory_estimate_bytes: estimate_memory_bytes(&working.rows),
                    sample_size: options.sample,
                    step_index: options.index_offset + index,
                });
            }
        }

        Ok(PipelineOutcome {
            per_step,
            records,
            working,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn run_step(
        &self,
        step: &WorkflowStep,
        prefix: &[WorkflowStep],
        working: &mut WorkingSet,
        catalog: &SourceCatalog,
        settings: &EffectiveSettings,
        options: RunOptions,
        cancel: &CancellationFlag,
        started: Instant,
        budget: Duration,
    ) -> Result<Vec<String>, AppError> {
        match step.kind {
            StepKind::SheetSelect => {
                let dataset = catalog
                    .require(&step.source)
                    .map_err(|e| e.with_step(&step.id, step.kind.as_str()))?;
                working.rows = match options.sample {
                    Some(n) => dataset.sample(n),
                    None => dataset.rows.clone(),
                };
                working.merge_columns(&dataset.columns);
                Ok(dataset.columns.clone())
            }
            StepKind::ColumnSelect => {
                let reference = step
                    .column_reference
                    .clone()
                    .unwrap_or_else(|| ColumnReference::bare(step.source.clone()));
                let resolved = ColumnResolver::resolve(&reference, catalog)
                    .map_err(|e| e.with_step(&step.id, step.kind.as_str()))?;
                let name = step
                    .target
                    .clone()
                    .unwrap_or_else(|| resolved.column.clone());
                let mut values = resolved.values;
                if let Some(n) = options.sample {
                    values.truncate(n);
                }
                if working.rows.is_empty() {
                    working.rows = values
                        .into_iter()
                        .map(|value| {
                            let mut row = Row::new();
                            row.insert(name.clone(), value);
                            row
                        })
                        .collect();
                } else {
                    // Align by row index against the current working set;
                    // shorter columns pad with Null.
                    for (i, row) in working.rows.iter_mut().enumerate() {
                        row.insert(name.clone(), values.get(i).cloned().unwrap_or(Value::Null));
                    }
                }
                working.merge_columns(std::slice::from_ref(&name));
                Ok(vec![name])
            }
            StepKind::Literal => {
                let name = step
                    .target
                    .clone()
                    .unwrap_or_else(|| "custom_value".to_string());
                let value = parse_literal(&step.source);
                for row in &mut working.rows {
                    row.insert(name.clone(), value.clone());
                }
                working.merge_columns(std::slice::from_ref(&name));
                Ok(vec![name])
            }
            StepKind::Formula => self.run_formula_step(
                step, prefix, working, catalog, settings, options, cancel, started, budget,
            ),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn run_formula_step(
        &self,
        step: &WorkflowStep,
        prefix: &[WorkflowStep],
        working: &mut WorkingSet,
        catalog: &SourceCatalog,
        settings: &EffectiveSettings,
        options: RunOptions,
        cancel: &CancellationFlag,
        started: Instant,
        budget: Duration,
    ) -> Result<Vec<String>, AppError> {
        let executor = self
            .registry
            .lookup(&step.source)
            .map_err(|e| e.with_step(&step.id, &step.source))?;
        let config = self
            .registry
            .config_for(&step.source)
            .ok_or_else(|| AppError::formula_not_found(&step.source))?;
        let params = bind_parameters(&config.parameters, &step.parameters)
            .map_err(|e| e.with_step(&step.id, &step.source))?;
        executor
            .validate_parameters(&params)
            .map_err(|e| e.with_step(&step.id, &step.source))?;

        let wants_full_scope = options.sample.is_some()
            && options.allow_full_scope
            && settings.aggregate_scope == AggregateScope::Full;

        let mut out_rows = if executor.row_independent() {
            // Chunked so cancellation and the time budget get polled at
            // chunk boundaries, never mid-row. Chunk outputs concatenate in
            // input order.
            let mut out = Vec::with_capacity(working.rows.len());
            for chunk in working.rows.chunks(settings.chunk_size.max(1)) {
                if cancel.is_cancelled() {
                    return Err(AppError::cancelled(format!(
                        "cancelled during step {}",
                        step.id
                    )));
                }
                if started.elapsed() >= budget {
                    return Err(AppError::timeout(format!(
                        "workflow exceeded its {}s time budget in step {}",
                        budget.as_secs(),
                        step.id
                    )));
                }
                out.extend(
                    executor
                        .execute(chunk, &params)
                        .map_err(|e| e.with_step(&step.id, &step.source))?,
                );
            }
            out
        } else if wants_full_scope {
            self.run_full_scope_aggregate(
                step,
                prefix,
                working,
                catalog,
                settings,
                cancel,
                started,
                budget,
                executor.as_ref(),
                &params,
            )?
        } else {
            executor
                .execute(&working.rows, &params)
                .map_err(|e| e.with_step(&step.id, &step.source))?
        };

        let mut outputs = executor.output_columns(&params);
        if let Some(target) = &step.target {
            // A target only renames single-output formulas; multi-output
            // executors keep their declared names.
            if outputs.len() == 1 && target != &outputs[0] {
                let original = outputs[0].clone();
                for row in &mut out_rows {
                    if let Some(value) = row.remove(&original) {
                        row.insert(target.clone(), value);
                    }
                }
                outputs[0] = target.clone();
            }
        }

        working.rows = out_rows;
        working.merge_columns(&outputs);
        Ok(outputs)
    }

    /// Preview-time aggregate with `aggregate_scope: full`: re-derive the
    /// step's input without sampling, reduce once over it, and broadcast
    /// the reduced cells into the sampled rows. Reductions that change the
    /// row count (reshapes) fall back to sample scope.
    #[allow(clippy::too_many_arguments)]
    fn run_full_scope_aggregate(
        &self,
        step: &WorkflowStep,
        prefix: &[WorkflowStep],
        working: &WorkingSet,
        catalog: &SourceCatalog,
        settings: &EffectiveSettings,
        cancel: &CancellationFlag,
        started: Instant,
        budget: Duration,
        executor: &dyn FormulaExecutor,
        params: &HashMap<String, Value>,
    ) -> Result<Vec<Row>, AppError> {
        let mut prefix_steps = prefix.to_vec();
        let options = RunOptions {
            sample: None,
            collect_steps: false,
            index_offset: 0,
            allow_full_scope: true,
        };
        let derived = self.run_pipeline(
            &mut prefix_steps,
            WorkingSet::default(),
            catalog,
            settings,
            options,
            cancel,
            started,
            budget,
        )?;
        let full_rows = derived.working.rows;
        let full_out = executor
            .execute(&full_rows, params)
            .map_err(|e| e.with_step(&step.id, &step.source))?;

        if full_out.len() != full_rows.len() {
            debug!(step = %step.id, "full-scope aggregate reshaped rows, keeping sample scope");
            return executor
                .execute(&working.rows, params)
                .map_err(|e| e.with_step(&step.id, &step.source));
        }

        let declared = executor.output_columns(params);
        let template: Row = full_out.into_iter().next().unwrap_or_default();
        let mut rows = working.rows.clone();
        for row in &mut rows {
            for column in &declared {
                row.insert(
                    column.clone(),
                    template.get(column).cloned().unwrap_or(Value::Null),
                );
            }
        }
        Ok(rows)
    }
}
