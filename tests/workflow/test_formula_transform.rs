use rowforge::core::dataset::Row;
use rowforge::core::formula::params::bind_parameters;
use rowforge::core::formula::{register_builtins, FormulaRegistry};
use serde_json::{json, Value};

fn registry() -> FormulaRegistry {
    let registry = FormulaRegistry::new();
    register_builtins(&registry);
    registry
}

fn run(registry: &FormulaRegistry, name: &str, ordered: &[&str], rows: &[Row]) -> Vec<Row> {
    let executor = registry.lookup(name).unwrap();
    let config = registry.config_for(name).unwrap();
    let ordered: Vec<String> = ordered.iter().map(|s| s.to_string()).collect();
    let params = bind_parameters(&config.parameters, &ordered).unwrap();
    executor.execute(rows, &params).unwrap()
}

fn region_rows() -> Vec<Row> {
    [("west", 10), ("east", 5), ("west", 30), ("east", 15)]
        .iter()
        .map(|(region, sales)| {
            [
                ("region".to_string(), json!(region)),
                ("sales".to_string(), json!(sales)),
            ]
            .into_iter()
            .collect()
        })
        .collect()
}

#[test]
fn pivot_groups_in_first_seen_order() {
    let out = run(&registry(), "PIVOT", &["region", "sales"], &region_rows());
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].get("index"), Some(&json!("west")));
    assert_eq!(out[0].get("count"), Some(&json!(2)));
    assert_eq!(out[0].get("sum"), Some(&json!(40.0)));
    assert_eq!(out[0].get("avg"), Some(&json!(20.0)));
    assert_eq!(out[1].get("index"), Some(&json!("east")));
    assert_eq!(out[1].get("sum"), Some(&json!(20.0)));
}

#[test]
fn depivot_unpivots_non_id_columns() {
    let rows: Vec<Row> = vec![[
        ("id".to_string(), json!("r1")),
        ("q1".to_string(), json!(1)),
        ("q2".to_string(), json!(2)),
    ]
    .into_iter()
    .collect()];
    let out = run(&registry(), "DEPIVOT", &["id"], &rows);
    assert_eq!(out.len(), 2);
    // Variable rows come out sorted by column name.
    assert_eq!(out[0].get("variable"), Some(&json!("q1")));
    assert_eq!(out[0].get("value"), Some(&json!(1)));
    assert_eq!(out[0].get("id"), Some(&json!("r1")));
    assert_eq!(out[1].get("variable"), Some(&json!("q2")));
}

#[test]
fn remove_duplicates_keeps_first_occurrence() {
    let out = run(
        &registry(),
        "REMOVE_DUPLICATES",
        &["region"],
        &region_rows(),
    );
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].get("sales"), Some(&json!(10)));
    assert_eq!(out[1].get("sales"), Some(&json!(5)));
}

#[test]
fn remove_duplicates_with_two_key_columns() {
    let out = run(
        &registry(),
        "REMOVE_DUPLICATES",
        &["region", "sales"],
        &region_rows(),
    );
    assert_eq!(out.len(), 4);
}

#[test]
fn fillna_replaces_null_empty_and_missing_cells() {
    let rows: Vec<Row> = vec![
        [("city".to_string(), Value::Null)].into_iter().collect(),
        [("city".to_string(), json!(""))].into_iter().collect(),
        Row::new(),
        [("city".to_string(), json!("Oslo"))].into_iter().collect(),
    ];
    let out = run(&registry(), "FILLNA", &["city", "unknown"], &rows);
    assert_eq!(out[0].get("city"), Some(&json!("unknown")));
    assert_eq!(out[1].get("city"), Some(&json!("unknown")));
    assert_eq!(out[2].get("city"), Some(&json!("unknown")));
    assert_eq!(out[3].get("city"), Some(&json!("Oslo")));
}
