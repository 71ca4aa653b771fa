use rowforge::core::dataset::{SourceCatalog, TabularDataset};
use rowforge::core::formula::{register_builtins, FormulaRegistry};
use rowforge::core::types::ErrorCategory;
use rowforge::core::workflow::{load_workflow, WorkflowDocument};
use std::fs;
use tempfile::NamedTempFile;

const VALID_WORKFLOW: &str = r#"
version: "1.0"
mode: data_workflow
metadata:
  name: clean names
workflow:
  settings:
    sample_size: 10
  steps:
    - id: pick
      kind: sheet_select
      source: people
    - id: shout
      kind: formula
      source: UPPER
      parameters: ["name"]
"#;

const WRONG_MODE: &str = r#"
version: "1.0"
mode: optimization_loop
workflow:
  steps:
    - id: pick
      kind: sheet_select
      source: people
"#;

const DUPLICATE_IDS: &str = r#"
version: "1.0"
mode: data_workflow
workflow:
  steps:
    - id: pick
      kind: sheet_select
      source: people
    - id: pick
      kind: sheet_select
      source: people
"#;

const FORWARD_REFERENCE: &str = r#"
version: "1.0"
mode: data_workflow
workflow:
  steps:
    - id: pick
      kind: sheet_select
      source: people
    - id: early
      kind: formula
      source: ADD
      parameters: ["age", "late_column"]
    - id: late
      kind: literal
      source: "42"
      target: late_column
"#;

const SELF_REFERENCE: &str = r#"
version: "1.0"
mode: data_workflow
workflow:
  steps:
    - id: pick
      kind: sheet_select
      source: people
    - id: loopy
      kind: formula
      source: UPPER
      parameters: ["upper_result"]
"#;

const LITERAL_WITHOUT_TARGET: &str = r#"
version: "1.0"
mode: data_workflow
workflow:
  steps:
    - id: lit
      kind: literal
      source: "x"
"#;

fn registry() -> FormulaRegistry {
    let registry = FormulaRegistry::new();
    register_builtins(&registry);
    registry
}

fn people_catalog() -> SourceCatalog {
    let mut catalog = SourceCatalog::new();
    catalog.insert(
        "people",
        TabularDataset::new(vec!["name".into(), "age".into()], vec![]),
    );
    catalog
}

fn parse(yaml: &str) -> Result<WorkflowDocument, rowforge::core::error::AppError> {
    let file = NamedTempFile::new().expect("temp file");
    let path = file.path().to_owned();
    drop(file);
    fs::write(&path, yaml).unwrap();
    load_workflow(&path)
}

#[test]
fn valid_workflow_parses_and_validates() {
    let doc = parse(VALID_WORKFLOW).unwrap();
    assert_eq!(doc.workflow.steps.len(), 2);
    assert_eq!(doc.workflow.settings.sample_size, Some(10));
    doc.validate(&registry(), Some(&people_catalog())).unwrap();
}

#[test]
fn wrong_mode_is_rejected() {
    let err = parse(WRONG_MODE).unwrap_err();
    assert!(err.message.contains("data_workflow"));
}

#[test]
fn duplicate_step_ids_are_rejected() {
    let err = parse(DUPLICATE_IDS).unwrap_err();
    assert!(err.message.contains("duplicate step id"));
}

#[test]
fn forward_reference_is_rejected_at_validation_time() {
    let doc = parse(FORWARD_REFERENCE).unwrap();
    let err = doc
        .validate(&registry(), Some(&people_catalog()))
        .unwrap_err();
    assert_eq!(err.category, ErrorCategory::ValidationError);
    assert!(err.message.contains("later step"));
    assert!(err.message.contains("late_column"));
}

#[test]
fn self_reference_is_rejected_at_validation_time() {
    let doc = parse(SELF_REFERENCE).unwrap();
    let err = doc
        .validate(&registry(), Some(&people_catalog()))
        .unwrap_err();
    assert!(err.message.contains("own output column"));
}

#[test]
fn literal_step_needs_a_target() {
    let err = parse(LITERAL_WITHOUT_TARGET).unwrap_err();
    assert!(err.message.contains("target column"));
}

#[test]
fn unknown_formula_passes_validation_and_fails_at_run_time() {
    let doc = parse(
        r#"
version: "1.0"
mode: data_workflow
workflow:
  steps:
    - id: pick
      kind: sheet_select
      source: people
    - id: mystery
      kind: formula
      source: FROBNICATE
"#,
    )
    .unwrap();
    doc.validate(&registry(), Some(&people_catalog())).unwrap();
}

#[test]
fn column_select_against_unknown_column_is_flagged() {
    let doc = parse(
        r#"
version: "1.0"
mode: data_workflow
workflow:
  steps:
    - id: pick
      kind: column_select
      source: nonexistent
"#,
    )
    .unwrap();
    let err = doc
        .validate(&registry(), Some(&people_catalog()))
        .unwrap_err();
    assert_eq!(err.category, ErrorCategory::ColumnNotFound);
}
