use rowforge::core::error::AppError;
use rowforge::core::types::{ErrorCategory, ErrorSeverity};

#[test]
fn test_validation_error_defaults() {
    let error = AppError::validation("Missing required parameter: delimiter");
    assert_eq!(error.category, ErrorCategory::ValidationError);
    assert_eq!(error.severity(), ErrorSeverity::Error);
    assert_eq!(error.code, "RF-VAL-001");
    assert!(!error.is_run_fatal());
}

#[test]
fn test_formula_not_found_message_names_the_formula() {
    let error = AppError::formula_not_found("FROBNICATE");
    assert_eq!(error.category, ErrorCategory::FormulaNotFound);
    assert!(error.message.contains("FROBNICATE"));
}

#[test]
fn test_column_not_found_message_names_the_column() {
    let error = AppError::column_not_found("revenue");
    assert_eq!(error.category, ErrorCategory::ColumnNotFound);
    assert!(error.message.contains("revenue"));
}

#[test]
fn test_step_context_appears_in_display() {
    let error = AppError::execution("divide by zero with no default supplied")
        .with_step("step-3", "DIVIDE");
    let rendered = error.to_string();
    assert!(rendered.contains("step step-3"));
    assert!(rendered.contains("operation DIVIDE"));
    assert!(rendered.contains("divide by zero"));
}

#[test]
fn test_fatal_classification() {
    assert!(AppError::timeout("over budget").is_run_fatal());
    assert!(AppError::cancelled("stop requested").is_run_fatal());
    assert!(!AppError::validation("bad").is_run_fatal());
    assert!(!AppError::execution("bad cell").is_run_fatal());
    assert!(!AppError::column_not_found("x").is_run_fatal());
}

#[test]
fn test_custom_code_override() {
    let error = AppError::validation("bad").with_code("RF-TEST-042");
    assert_eq!(error.code, "RF-TEST-042");
    assert!(error.to_string().contains("RF-TEST-042"));
}

#[test]
fn test_io_error_conversion() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let error: AppError = io.into();
    assert_eq!(error.category, ErrorCategory::IoError);
    assert!(error.source.is_some());
}

#[test]
fn test_context_mutation() {
    let mut error = AppError::execution("boom");
    error.add_context("row", "17");
    assert_eq!(error.context.get("row"), Some(&"17".to_string()));
}
