use rowforge::core::dataset::coerce::NAN_SENTINEL;
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
    executor.validate_parameters(&params).unwrap();
    executor.execute(rows, &params).unwrap()
}

fn row(pairs: &[(&str, Value)]) -> Row {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

#[test]
fn add_subtract_multiply_basics() {
    let rows = vec![row(&[("a", json!(6)), ("b", json!(2))])];
    let registry = registry();

    let out = run(&registry, "ADD", &["a", "b"], &rows);
    assert_eq!(out[0].get("add_result"), Some(&json!(8.0)));

    let out = run(&registry, "SUBTRACT", &["a", "b"], &rows);
    assert_eq!(out[0].get("subtract_result"), Some(&json!(4.0)));

    let out = run(&registry, "MULTIPLY", &["a", "b"], &rows);
    assert_eq!(out[0].get("multiply_result"), Some(&json!(12.0)));
}

#[test]
fn divide_by_zero_returns_default_when_supplied() {
    let rows = vec![
        row(&[("a", json!(10)), ("b", json!(0))]),
        row(&[("a", json!(9)), ("b", json!(3))]),
    ];
    let out = run(&registry(), "DIVIDE", &["a", "b", "0"], &rows);
    assert_eq!(out[0].get("divide_result"), Some(&json!(0)));
    assert_eq!(out[1].get("divide_result"), Some(&json!(3.0)));
}

#[test]
fn divide_by_zero_returns_sentinel_without_default() {
    let rows = vec![row(&[("a", json!(10)), ("b", json!(0))])];
    let out = run(&registry(), "DIVIDE", &["a", "b"], &rows);
    assert_eq!(out[0].get("divide_result"), Some(&json!(NAN_SENTINEL)));
}

#[test]
fn divide_never_panics_for_any_dividend() {
    for dividend in [json!(0), json!(-5), json!(1e308), json!("7"), Value::Null] {
        let rows = vec![row(&[("a", dividend), ("b", json!(0))])];
        let out = run(&registry(), "DIVIDE", &["a", "b", "fallback"], &rows);
        assert_eq!(out[0].get("divide_result"), Some(&json!("fallback")));
    }
}

#[test]
fn null_operands_count_as_zero() {
    let rows = vec![row(&[("a", Value::Null), ("b", json!(4))])];
    let out = run(&registry(), "ADD", &["a", "b"], &rows);
    assert_eq!(out[0].get("add_result"), Some(&json!(4.0)));
}

#[test]
fn numeric_strings_are_coerced() {
    let rows = vec![row(&[("a", json!("2.5")), ("b", json!("1.5"))])];
    let out = run(&registry(), "ADD", &["a", "b"], &rows);
    assert_eq!(out[0].get("add_result"), Some(&json!(4.0)));
}

#[test]
fn missing_parameter_is_rejected_before_rows_are_touched() {
    let registry = registry();
    let config = registry.config_for("ADD").unwrap();
    let err = bind_parameters(&config.parameters, &["a".to_string()]).unwrap_err();
    assert!(err.message.contains("number2"));
}
