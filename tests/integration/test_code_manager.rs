use rowforge::core::formula::codegen::ExecutorTemplateGenerator;
use rowforge::core::formula::CodeManager;
use rowforge::core::types::ErrorCategory;
use tempfile::tempdir;

#[test]
fn save_get_and_list_round_trip() {
    let dir = tempdir().unwrap();
    let manager = CodeManager::new(dir.path(), 30_000);

    let code = "impl FormulaExecutor for ReverseExecutor { /* body */ }";
    let report = manager.save_code("REVERSE", code).unwrap();
    assert_eq!(report.formula_name, "REVERSE");
    assert!(report.path.exists());

    assert_eq!(manager.get_code("REVERSE").unwrap(), code);
    assert_eq!(manager.list_codes().unwrap(), vec!["REVERSE".to_string()]);
}

#[test]
fn save_rejects_non_executor_source() {
    let dir = tempdir().unwrap();
    let manager = CodeManager::new(dir.path(), 30_000);
    let err = manager.save_code("REVERSE", "fn main() {}").unwrap_err();
    assert_eq!(err.category, ErrorCategory::ValidationError);
}

#[test]
fn get_code_for_unsaved_formula_is_an_io_error() {
    let dir = tempdir().unwrap();
    let manager = CodeManager::new(dir.path(), 30_000);
    let err = manager.get_code("MISSING").unwrap_err();
    assert_eq!(err.category, ErrorCategory::IoError);
}

#[tokio::test]
async fn test_compile_accepts_valid_source() {
    let dir = tempdir().unwrap();
    let manager = CodeManager::new(dir.path(), 60_000);
    let report = manager
        .test_code("TRIVIAL", "pub fn nothing() {}")
        .await
        .unwrap();
    assert!(report.success, "errors: {:?}", report.errors);
    assert!(report.errors.is_empty());
}

#[tokio::test]
async fn test_compile_reports_errors_for_broken_source() {
    let dir = tempdir().unwrap();
    let manager = CodeManager::new(dir.path(), 60_000);
    let report = manager
        .test_code("BROKEN", "pub fn broken( {")
        .await
        .unwrap();
    assert!(!report.success);
    assert!(!report.errors.is_empty());
}

#[tokio::test]
async fn test_compile_times_out_on_a_tiny_budget() {
    let dir = tempdir().unwrap();
    let manager = CodeManager::new(dir.path(), 1);
    let err = manager
        .test_code("SLOW", "pub fn nothing() {}")
        .await
        .unwrap_err();
    assert_eq!(err.category, ErrorCategory::TimeoutError);
}

#[test]
fn templates_target_the_executor_trait() {
    let code = ExecutorTemplateGenerator::generate("MY_CUSTOM").unwrap();
    assert!(code.contains("impl FormulaExecutor for MyCustomExecutor"));
    assert!(code.contains("fn validate_parameters"));
    assert!(code.contains("fn output_columns"));
    assert!(code.contains("my_custom_result"));
}
