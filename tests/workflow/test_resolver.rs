use rowforge::core::dataset::{
    ColumnReference, ColumnResolver, Row, SourceCatalog, TabularDataset,
};
use rowforge::core::types::ErrorCategory;
use serde_json::{json, Value};

fn row(pairs: &[(&str, Value)]) -> Row {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn catalog() -> SourceCatalog {
    let mut catalog = SourceCatalog::new();
    catalog.insert(
        "orders.csv",
        TabularDataset::new(
            vec!["id".into(), "amount".into()],
            vec![
                row(&[("id", json!(1)), ("amount", json!(100))]),
                row(&[("id", json!(2)), ("amount", json!(200))]),
            ],
        ),
    );
    catalog.insert(
        "refunds.csv",
        TabularDataset::new(
            vec!["id".into(), "reason".into()],
            vec![row(&[("id", json!(9)), ("reason", json!("damaged"))])],
        ),
    );
    catalog
}

#[test]
fn qualified_reference_targets_the_named_file() {
    let resolved = ColumnResolver::resolve(
        &ColumnReference::qualified("refunds.csv", "id"),
        &catalog(),
    )
    .unwrap();
    assert_eq!(resolved.source, "refunds.csv");
    assert_eq!(resolved.values, vec![json!(9)]);
}

#[test]
fn bare_name_falls_back_to_first_loaded_source() {
    // "id" exists in both files; load order decides.
    let resolved = ColumnResolver::resolve(&ColumnReference::bare("id"), &catalog()).unwrap();
    assert_eq!(resolved.source, "orders.csv");
    assert_eq!(resolved.values, vec![json!(1), json!(2)]);
}

#[test]
fn bare_name_finds_later_sources_when_needed() {
    let resolved =
        ColumnResolver::resolve(&ColumnReference::bare("reason"), &catalog()).unwrap();
    assert_eq!(resolved.source, "refunds.csv");
}

#[test]
fn qualified_reference_to_missing_file_is_column_not_found() {
    let err = ColumnResolver::resolve(
        &ColumnReference::qualified("missing.csv", "id"),
        &catalog(),
    )
    .unwrap_err();
    assert_eq!(err.category, ErrorCategory::ColumnNotFound);
}

#[test]
fn qualified_reference_to_missing_column_is_column_not_found() {
    let err = ColumnResolver::resolve(
        &ColumnReference::qualified("orders.csv", "reason"),
        &catalog(),
    )
    .unwrap_err();
    assert_eq!(err.category, ErrorCategory::ColumnNotFound);
    assert!(err.message.contains("reason"));
}

#[test]
fn missing_cells_resolve_as_null() {
    let mut catalog = SourceCatalog::new();
    catalog.insert(
        "sparse",
        TabularDataset::new(
            vec!["a".into(), "b".into()],
            vec![row(&[("a", json!(1))]), row(&[("b", json!(2))])],
        ),
    );
    let resolved = ColumnResolver::resolve(&ColumnReference::bare("a"), &catalog).unwrap();
    assert_eq!(resolved.values, vec![json!(1), Value::Null]);
}
