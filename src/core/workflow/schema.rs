#![allow(clippy::result_large_err)]

use crate::core::dataset::{ColumnReference, SourceCatalog};
use crate::core::error::AppError;
use crate::core::formula::params::bind_parameters;
use crate::core::formula::FormulaRegistry;
use crate::core::types::{AggregateScope, StepKind, StepStatus};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

const SUPPORTED_VERSION: &str = "1.0";
const SUPPORTED_MODE: &str = "data_workflow";

/// Root document for a workflow definition.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkflowDocument {
    pub version: String,
    pub mode: String,
    #[serde(default)]
    pub metadata: Option<WorkflowMetadata>,
    pub workflow: WorkflowDefinition,
}

/// Metadata embedded with a workflow document.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkflowMetadata {
    pub name: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkflowDefinition {
    #[serde(default)]
    pub settings: WorkflowSettings,
    pub steps: Vec<WorkflowStep>,
}

/// Execution settings for a workflow. Every field is optional: unset
/// fields fall back to the engine configuration (CLI overrides win over
/// both).
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct WorkflowSettings {
    #[serde(default)]
    pub sample_size: Option<usize>,
    #[serde(default)]
    pub chunk_size: Option<usize>,
    #[serde(default)]
    pub max_time_seconds: Option<u64>,
    #[serde(default)]
    pub aggregate_scope: Option<AggregateScope>,
}

/// One user-authored, ordered unit of transformation.
///
/// Steps carry no dependency pointers: list order *is* the dependency
/// graph, each step consuming the previous step's output. Reordering a
/// step changes its semantics.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkflowStep {
    pub id: String,
    pub kind: StepKind,
    /// Formula name, literal value, or sheet/source name, per `kind`.
    pub source: String,
    /// Output column override.
    #[serde(default)]
    pub target: Option<String>,
    /// Ordered raw parameter strings; semantics depend on the formula.
    #[serde(default)]
    pub parameters: Vec<String>,
    /// Originating file + column, when the step editor recorded one.
    #[serde(default)]
    pub column_reference: Option<ColumnReference>,
    /// Runtime status, owned by the execution engine.
    #[serde(default)]
    pub status: StepStatus,
}

impl WorkflowDocument {
    /// Load a workflow document from a YAML file. Structural validation
    /// runs on load; registry-aware validation (`validate`) needs the
    /// formula registry and is run by callers that have one.
    pub fn load_from_file(path: &Path) -> Result<Self, AppError> {
        let text = fs::read_to_string(path).map_err(|err| {
            AppError::new(
                crate::core::types::ErrorCategory::IoError,
                format!("failed to read {}: {}", path.display(), err),
            )
        })?;
        let doc: WorkflowDocument = serde_yaml::from_str(&text).map_err(|err| {
            AppError::validation(format!("failed to parse {}: {}", path.display(), err))
        })?;
        doc.validate_structure()?;
        Ok(doc)
    }

    /// Schema-level checks that need no registry or data.
    pub fn validate_structure(&self) -> Result<(), AppError> {
        if self.version != SUPPORTED_VERSION {
            return Err(AppError::validation(format!(
                "unsupported workflow version {}, expected {}",
                self.version, SUPPORTED_VERSION
            )));
        }
        if self.mode != SUPPORTED_MODE {
            return Err(AppError::validation(format!(
                "workflow mode must be {}, got {}",
                SUPPORTED_MODE, self.mode
            )));
        }
        if self.workflow.steps.is_empty() {
            return Err(AppError::validation(
                "workflow must define at least one step",
            ));
        }

        let mut ids = HashSet::new();
        for step in &self.workflow.steps {
            if step.id.trim().is_empty() {
                return Err(AppError::validation("step id cannot be empty"));
            }
            if !ids.insert(step.id.clone()) {
                return Err(AppError::validation(format!(
                    "duplicate step id: {}",
                    step.id
                )));
            }
            if step.source.trim().is_empty() {
                return Err(AppError::validation(format!(
                    "step {} has an empty source",
                    step.id
                )));
            }
            if step.kind == StepKind::Literal && step.target.is_none() {
                return Err(AppError::validation(format!(
                    "literal step {} needs a target column name",
                    step.id
                )));
            }
        }

        if self.workflow.settings.sample_size == Some(0) {
            return Err(AppError::validation("settings.sample_size must be >= 1"));
        }
        if self.workflow.settings.chunk_size == Some(0) {
            return Err(AppError::validation("settings.chunk_size must be >= 1"));
        }
        if self.workflow.settings.max_time_seconds == Some(0) {
            return Err(AppError::validation(
                "settings.max_time_seconds must be >= 1",
            ));
        }

        Ok(())
    }

    /// Registry-aware validation: bind every formula step's parameters and
    /// reject references to columns a step cannot see yet. A step may only
    /// reference raw input columns or columns produced by *earlier* steps;
    /// forward and self references are rejected here, at validation time,
    /// not at execution time.
    pub fn validate(
        &self,
        registry: &FormulaRegistry,
        catalog: Option<&SourceCatalog>,
    ) -> Result<(), AppError> {
        self.validate_structure()?;

        let step_outputs: Vec<Vec<String>> = self
            .workflow
            .steps
            .iter()
            .map(|step| self.outputs_of(step, registry))
            .collect();

        let mut available: HashSet<String> = catalog
            .map(|c| c.all_columns().into_iter().collect())
            .unwrap_or_default();

        for (index, step) in self.workflow.steps.iter().enumerate() {
            match step.kind {
                StepKind::SheetSelect => {
                    if let Some(catalog) = catalog {
                        let dataset = catalog.require(&step.source).map_err(|e| {
                            e.with_step(&step.id, step.kind.as_str())
                        })?;
                        available.extend(dataset.columns.iter().cloned());
                    }
                }
                StepKind::ColumnSelect => {
                    // Column selects resolve against raw sources, never
                    // against step outputs.
                    let column = step
                        .column_reference
                        .as_ref()
                        .map(|r| r.column.clone())
                        .unwrap_or_else(|| step.source.clone());
                    if let Some(catalog) = catalog {
                        if catalog.first_with_column(&column).is_none() {
                            return Err(AppError::column_not_found(&column)
                                .with_step(&step.id, step.kind.as_str()));
                        }
                    }
                }
                StepKind::Literal => {}
                StepKind::Formula => {
                    let Some(config) = registry.config_for(&step.source) else {
                        // Unknown formulas fail the step at run time, not
                        // the whole document here.
                        continue;
                    };
                    // Likewise malformed parameters: validation only
                    // polices cross-step references.
                    let Ok(params) = bind_parameters(&config.parameters, &step.parameters)
                    else {
                        continue;
                    };
                    for spec in &config.parameters {
                        if !spec.kind.is_column() {
                            continue;
                        }
                        let referenced: Vec<String> = match params.get(&spec.name) {
                            Some(serde_json::Value::String(s)) => vec![s.clone()],
                            Some(serde_json::Value::Array(items)) => items
                                .iter()
                                .filter_map(|v| v.as_str().map(str::to_string))
                                .collect(),
                            _ => Vec::new(),
                        };
                        for column in referenced {
                            // Missing columns read as empty cells at run
                            // time; only later/self references are rejected
                            // here.
                            self.check_column_visibility(
                                &column,
                                index,
                                step,
                                &available,
                                &step_outputs,
                            )?;
                        }
                    }
                }
            }
            available.extend(step_outputs[index].iter().cloned());
        }

        Ok(())
    }

    fn check_column_visibility(
        &self,
        column: &str,
        index: usize,
        step: &WorkflowStep,
        available: &HashSet<String>,
        step_outputs: &[Vec<String>],
    ) -> Result<(), AppError> {
        if available.contains(column) {
            return Ok(());
        }
        if step_outputs[index].iter().any(|c| c == column) {
            return Err(AppError::validation(format!(
                "step {} references its own output column '{}'",
                step.id, column
            ))
            .with_step(&step.id, step.kind.as_str()));
        }
        for (later, outputs) in step_outputs.iter().enumerate().skip(index + 1) {
            if outputs.iter().any(|c| c == column) {
                return Err(AppError::validation(format!(
                    "step {} references column '{}' first produced by later step {}",
                    step.id, column, self.workflow.steps[later].id
                ))
                .with_step(&step.id, step.kind.as_str()));
            }
        }
        // Anything else reads as empty input at run time rather than
        // failing the document.
        Ok(())
    }

    /// Columns a step will introduce, for schema inference without running
    /// the formula.
    fn outputs_of(&self, step: &WorkflowStep, registry: &FormulaRegistry) -> Vec<String> {
        let mut outputs = match step.kind {
            StepKind::ColumnSelect => {
                let column = step
                    .column_reference
                    .as_ref()
                    .map(|r| r.column.clone())
                    .unwrap_or_else(|| step.source.clone());
                vec![column]
            }
            StepKind::Literal => step.target.clone().into_iter().collect(),
            StepKind::SheetSelect => Vec::new(),
            StepKind::Formula => {
                let Some(config) = registry.config_for(&step.source) else {
                    return Vec::new();
                };
                let Ok(executor) = registry.lookup(&step.source) else {
                    return Vec::new();
                };
                match bind_parameters(&config.parameters, &step.parameters) {
                    Ok(params) => executor.output_columns(&params),
                    Err(_) => Vec::new(),
                }
            }
        };
        if let Some(target) = &step.target {
            if outputs.len() == 1 {
                outputs[0] = target.clone();
            }
        }
        outputs
    }
}

pub fn load_workflow(path: &Path) -> Result<WorkflowDocument, AppError> {
    WorkflowDocument::load_from_file(path)
}
