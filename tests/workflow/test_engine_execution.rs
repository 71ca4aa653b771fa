use rowforge::core::config::EngineConfig;
use rowforge::core::dataset::coerce::NAN_SENTINEL;
use rowforge::core::dataset::{Row, SourceCatalog, TabularDataset};
use rowforge::core::formula::{register_builtins, FormulaRegistry};
use rowforge::core::types::{ErrorCategory, RunStatus, StepStatus};
use rowforge::core::workflow::{
    CancellationFlag, ExecutionEngine, ExecutionOverrides, WorkflowDocument,
};
use serde_json::{json, Value};
use std::sync::Arc;

fn engine() -> ExecutionEngine {
    let registry = Arc::new(FormulaRegistry::new());
    register_builtins(&registry);
    ExecutionEngine::new(registry, EngineConfig::default())
}

fn row(pairs: &[(&str, Value)]) -> Row {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn people_catalog() -> SourceCatalog {
    let mut catalog = SourceCatalog::new();
    catalog.insert(
        "people",
        TabularDataset::new(
            vec!["name".into()],
            vec![
                row(&[("name", json!("john"))]),
                row(&[("name", json!("JANE"))]),
            ],
        ),
    );
    catalog
}

fn doc(yaml: &str) -> WorkflowDocument {
    serde_yaml::from_str(yaml).unwrap()
}

#[test]
fn upper_round_trip() {
    let mut document = doc(
        r#"
version: "1.0"
mode: data_workflow
workflow:
  steps:
    - id: pick
      kind: sheet_select
      source: people
    - id: shout
      kind: formula
      source: UPPER
      parameters: ["name"]
"#,
    );
    let summary = engine()
        .execute(
            &mut document,
            &people_catalog(),
            &ExecutionOverrides::default(),
            &CancellationFlag::new(),
        )
        .unwrap();

    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(summary.data.row_count, 2);
    assert_eq!(summary.data.rows[0].get("name"), Some(&json!("john")));
    assert_eq!(
        summary.data.rows[0].get("upper_result"),
        Some(&json!("JOHN"))
    );
    assert_eq!(
        summary.data.rows[1].get("upper_result"),
        Some(&json!("JANE"))
    );
    for step in &document.workflow.steps {
        assert_eq!(step.status, StepStatus::Completed);
    }
}

#[test]
fn failure_isolation_divide_by_zero_row() {
    let mut catalog = SourceCatalog::new();
    catalog.insert(
        "sheet",
        TabularDataset::new(
            vec!["name".into(), "a".into(), "b".into()],
            vec![
                row(&[("name", json!(" x ")), ("a", json!(10)), ("b", json!(2))]),
                row(&[("name", json!(" y ")), ("a", json!(10)), ("b", json!(0))]),
            ],
        ),
    );
    let mut document = doc(
        r#"
version: "1.0"
mode: data_workflow
workflow:
  steps:
    - id: pick
      kind: sheet_select
      source: sheet
    - id: tidy
      kind: formula
      source: TRIM
      parameters: ["name"]
    - id: ratio
      kind: formula
      source: DIVIDE
      parameters: ["a", "b"]
"#,
    );
    let summary = engine()
        .execute(
            &mut document,
            &catalog,
            &ExecutionOverrides::default(),
            &CancellationFlag::new(),
        )
        .unwrap();

    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(summary.data.rows[0].get("divide_result"), Some(&json!(5.0)));
    assert_eq!(
        summary.data.rows[1].get("divide_result"),
        Some(&json!(NAN_SENTINEL))
    );
    assert_eq!(summary.data.rows[1].get("trim_result"), Some(&json!("y")));
    for step in &document.workflow.steps {
        assert_eq!(step.status, StepStatus::Completed);
    }
}

#[test]
fn unknown_formula_fails_step_but_not_workflow() {
    let mut document = doc(
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
    - id: shout
      kind: formula
      source: UPPER
      parameters: ["name"]
"#,
    );
    let summary = engine()
        .execute(
            &mut document,
            &people_catalog(),
            &ExecutionOverrides::default(),
            &CancellationFlag::new(),
        )
        .unwrap();

    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(document.workflow.steps[1].status, StepStatus::Failed);
    assert_eq!(document.workflow.steps[2].status, StepStatus::Completed);
    assert_eq!(
        summary.data.rows[0].get("upper_result"),
        Some(&json!("JOHN"))
    );
    let failed = &summary.step_runs[1];
    assert_eq!(failed.status, StepStatus::Failed);
    assert!(failed.error.as_deref().unwrap().contains("FROBNICATE"));
}

#[test]
fn target_renames_single_output_column() {
    let mut document = doc(
        r#"
version: "1.0"
mode: data_workflow
workflow:
  steps:
    - id: pick
      kind: sheet_select
      source: people
    - id: shout
      kind: formula
      source: UPPER
      target: loud_name
      parameters: ["name"]
"#,
    );
    let summary = engine()
        .execute(
            &mut document,
            &people_catalog(),
            &ExecutionOverrides::default(),
            &CancellationFlag::new(),
        )
        .unwrap();
    assert_eq!(summary.data.rows[0].get("loud_name"), Some(&json!("JOHN")));
    assert!(!summary.data.rows[0].contains_key("upper_result"));
    assert!(summary.data.columns.contains(&"loud_name".to_string()));
}

#[test]
fn literal_step_fills_every_row() {
    let mut document = doc(
        r#"
version: "1.0"
mode: data_workflow
workflow:
  steps:
    - id: pick
      kind: sheet_select
      source: people
    - id: tag
      kind: literal
      source: "42"
      target: batch
"#,
    );
    let summary = engine()
        .execute(
            &mut document,
            &people_catalog(),
            &ExecutionOverrides::default(),
            &CancellationFlag::new(),
        )
        .unwrap();
    for row in &summary.data.rows {
        assert_eq!(row.get("batch"), Some(&json!(42)));
    }
}

#[test]
fn column_select_merges_from_second_source() {
    let mut catalog = people_catalog();
    catalog.insert(
        "extra",
        TabularDataset::new(
            vec!["city".into()],
            vec![
                row(&[("city", json!("Oslo"))]),
                row(&[("city", json!("Bergen"))]),
            ],
        ),
    );
    let mut document = doc(
        r#"
version: "1.0"
mode: data_workflow
workflow:
  steps:
    - id: pick
      kind: sheet_select
      source: people
    - id: add_city
      kind: column_select
      source: city
      column_reference:
        file: extra
        column: city
"#,
    );
    let summary = engine()
        .execute(
            &mut document,
            &catalog,
            &ExecutionOverrides::default(),
            &CancellationFlag::new(),
        )
        .unwrap();
    assert_eq!(summary.data.rows[0].get("city"), Some(&json!("Oslo")));
    assert_eq!(summary.data.rows[1].get("city"), Some(&json!("Bergen")));
    assert_eq!(summary.data.columns, vec!["name", "city"]);
}

#[test]
fn cancelled_flag_aborts_the_run() {
    let mut document = doc(
        r#"
version: "1.0"
mode: data_workflow
workflow:
  steps:
    - id: pick
      kind: sheet_select
      source: people
"#,
    );
    let cancel = CancellationFlag::new();
    cancel.cancel();
    let err = engine()
        .execute(
            &mut document,
            &people_catalog(),
            &ExecutionOverrides::default(),
            &cancel,
        )
        .unwrap_err();
    assert_eq!(err.category, ErrorCategory::CancelledError);
}

#[test]
fn execution_is_deterministic() {
    let yaml = r#"
version: "1.0"
mode: data_workflow
workflow:
  steps:
    - id: pick
      kind: sheet_select
      source: people
    - id: shout
      kind: formula
      source: UPPER
      parameters: ["name"]
    - id: len
      kind: formula
      source: TEXT_LENGTH
      parameters: ["name"]
"#;
    let run = |yaml: &str| {
        let mut document = doc(yaml);
        engine()
            .execute(
                &mut document,
                &people_catalog(),
                &ExecutionOverrides::default(),
                &CancellationFlag::new(),
            )
            .unwrap()
    };
    let first = run(yaml);
    let second = run(yaml);
    assert_eq!(first.data.rows, second.data.rows);
    assert_eq!(first.data.columns, second.data.columns);
}
