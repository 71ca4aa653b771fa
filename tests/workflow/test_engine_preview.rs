use rowforge::core::config::EngineConfig;
use rowforge::core::dataset::{Row, SourceCatalog, TabularDataset};
use rowforge::core::formula::{register_builtins, FormulaRegistry};
use rowforge::core::types::StepStatus;
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

fn sales_rows(n: usize) -> Vec<Row> {
    (0..n)
        .map(|i| {
            row(&[
                ("name", json!(format!("customer-{}", i))),
                ("sales", json!((i as i64 + 1) * 10)),
            ])
        })
        .collect()
}

fn catalog_of(rows: Vec<Row>) -> SourceCatalog {
    let mut catalog = SourceCatalog::new();
    catalog.insert(
        "orders",
        TabularDataset::new(vec!["name".into(), "sales".into()], rows),
    );
    catalog
}

const PIPELINE: &str = r#"
version: "1.0"
mode: data_workflow
workflow:
  steps:
    - id: pick
      kind: sheet_select
      source: orders
    - id: shout
      kind: formula
      source: UPPER
      parameters: ["name"]
    - id: total
      kind: formula
      source: SUM
      parameters: ["sales"]
"#;

fn doc(yaml: &str) -> WorkflowDocument {
    serde_yaml::from_str(yaml).unwrap()
}

#[test]
fn preview_is_bounded_by_the_sample_size() {
    let mut document = doc(PIPELINE);
    let overrides = ExecutionOverrides {
        sample_size: Some(3),
        max_time_seconds: None,
    };
    let report = engine()
        .preview(
            &mut document,
            &catalog_of(sales_rows(50)),
            &overrides,
            &CancellationFlag::new(),
        )
        .unwrap();

    assert_eq!(report.step_data.len(), 3);
    for data in &report.step_data {
        assert!(data.row_count <= 3);
        assert_eq!(data.sample_size, Some(3));
    }
    for record in &report.step_runs {
        assert_eq!(record.status, StepStatus::Completed);
    }
}

#[test]
fn preview_matches_full_run_over_the_same_rows() {
    let n = 4;
    let mut preview_doc = doc(PIPELINE);
    let overrides = ExecutionOverrides {
        sample_size: Some(n),
        max_time_seconds: None,
    };
    let report = engine()
        .preview(
            &mut preview_doc,
            &catalog_of(sales_rows(10)),
            &overrides,
            &CancellationFlag::new(),
        )
        .unwrap();
    let preview_rows = &report.step_data.last().unwrap().rows;

    // Full execution restricted to the same first-N rows.
    let mut full_doc = doc(PIPELINE);
    let summary = engine()
        .execute(
            &mut full_doc,
            &catalog_of(sales_rows(10).into_iter().take(n).collect()),
            &ExecutionOverrides::default(),
            &CancellationFlag::new(),
        )
        .unwrap();

    assert_eq!(preview_rows, &summary.data.rows);
    assert_eq!(
        report.step_data.last().unwrap().columns,
        summary.data.columns
    );
}

#[test]
fn schema_growth_is_monotonic_across_steps() {
    let mut document = doc(PIPELINE);
    let report = engine()
        .preview(
            &mut document,
            &catalog_of(sales_rows(10)),
            &ExecutionOverrides::default(),
            &CancellationFlag::new(),
        )
        .unwrap();

    let mut previous: Vec<String> = Vec::new();
    for data in &report.step_data {
        for column in &previous {
            assert!(
                data.columns.contains(column),
                "column {} disappeared at step {}",
                column,
                data.step_index
            );
        }
        previous = data.columns.clone();
    }
}

#[test]
fn sample_scope_aggregates_see_only_the_sample() {
    let mut document = doc(PIPELINE);
    let overrides = ExecutionOverrides {
        sample_size: Some(2),
        max_time_seconds: None,
    };
    let report = engine()
        .preview(
            &mut document,
            &catalog_of(sales_rows(5)), // sales 10..50, sample sees 10+20
            &overrides,
            &CancellationFlag::new(),
        )
        .unwrap();
    let last = report.step_data.last().unwrap();
    assert_eq!(last.rows[0].get("sum_result"), Some(&json!(30.0)));
}

#[test]
fn full_scope_aggregates_see_the_whole_dataset() {
    let mut document = doc(
        r#"
version: "1.0"
mode: data_workflow
workflow:
  settings:
    aggregate_scope: full
  steps:
    - id: pick
      kind: sheet_select
      source: orders
    - id: total
      kind: formula
      source: SUM
      parameters: ["sales"]
"#,
    );
    let overrides = ExecutionOverrides {
        sample_size: Some(2),
        max_time_seconds: None,
    };
    let report = engine()
        .preview(
            &mut document,
            &catalog_of(sales_rows(5)), // full sum = 10+20+30+40+50
            &overrides,
            &CancellationFlag::new(),
        )
        .unwrap();
    let last = report.step_data.last().unwrap();
    assert_eq!(last.row_count, 2);
    assert_eq!(last.rows[0].get("sum_result"), Some(&json!(150.0)));
}

#[test]
fn preview_from_resumes_against_cached_upstream_output() {
    let engine = engine();
    let catalog = catalog_of(sales_rows(8));
    let overrides = ExecutionOverrides {
        sample_size: Some(5),
        max_time_seconds: None,
    };

    let mut document = doc(PIPELINE);
    let full = engine
        .preview(&mut document, &catalog, &overrides, &CancellationFlag::new())
        .unwrap();

    // Resume from the SUM step, seeding it with the UPPER step's snapshot.
    let mut resumed_doc = doc(PIPELINE);
    let resumed = engine
        .preview_from(
            &mut resumed_doc,
            &catalog,
            &overrides,
            &CancellationFlag::new(),
            2,
            &full.step_data[1],
        )
        .unwrap();

    assert_eq!(resumed.step_data.len(), 1);
    assert_eq!(resumed.step_data[0].step_index, 2);
    assert_eq!(resumed.step_data[0].rows, full.step_data[2].rows);
    assert_eq!(resumed.step_runs[0].step_id, "total");
}

#[test]
fn preview_from_rejects_out_of_range_steps() {
    let mut document = doc(PIPELINE);
    let upstream = rowforge::core::workflow::ProcessedData {
        rows: Vec::new(),
        columns: Vec::new(),
        row_count: 0,
        execution_time_ms: 0,
        memory_estimate_bytes: 0,
        sample_size: None,
        step_index: 0,
    };
    let err = engine()
        .preview_from(
            &mut document,
            &catalog_of(sales_rows(3)),
            &ExecutionOverrides::default(),
            &CancellationFlag::new(),
            9,
            &upstream,
        )
        .unwrap_err();
    assert!(err.message.contains("cannot resume"));
}

#[test]
fn failed_step_keeps_prior_preview_data_intact() {
    let mut document = doc(
        r#"
version: "1.0"
mode: data_workflow
workflow:
  steps:
    - id: pick
      kind: sheet_select
      source: orders
    - id: mystery
      kind: formula
      source: FROBNICATE
"#,
    );
    let report = engine()
        .preview(
            &mut document,
            &catalog_of(sales_rows(3)),
            &ExecutionOverrides::default(),
            &CancellationFlag::new(),
        )
        .unwrap();
    assert_eq!(report.step_runs[0].status, StepStatus::Completed);
    assert_eq!(report.step_runs[1].status, StepStatus::Failed);
    // The failed step's snapshot is the last good working set.
    assert_eq!(report.step_data[1].rows, report.step_data[0].rows);
}
