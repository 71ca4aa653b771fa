use crate::core::types::{ErrorCategory, ErrorSeverity};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

#[derive(Debug)]
pub struct AppError {
    pub category: ErrorCategory,
    pub severity: ErrorSeverity,
    pub code: String,
    pub message: String,
    pub context: HashMap<String, String>,
    pub occurred_at: DateTime<Utc>,
    pub source: Option<anyhow::Error>,
}

impl AppError {
    pub fn new<T: Into<String>>(category: ErrorCategory, message: T) -> Self {
        let severity = match category {
            ErrorCategory::Unknown => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        };
        AppError {
            category,
            severity,
            code: default_code(category).to_string(),
            message: message.into(),
            context: HashMap::new(),
            occurred_at: Utc::now(),
            source: None,
        }
    }

    /// Step validation failure: missing or malformed parameter, bad document.
    pub fn validation<T: Into<String>>(message: T) -> Self {
        AppError::new(ErrorCategory::ValidationError, message)
    }

    /// Lookup of an unregistered or disabled formula name.
    pub fn formula_not_found(name: &str) -> Self {
        AppError::new(
            ErrorCategory::FormulaNotFound,
            format!("formula '{}' is not registered or is disabled", name),
        )
    }

    /// Resolver failed to locate a referenced column in any loaded source.
    pub fn column_not_found(column: &str) -> Self {
        AppError::new(
            ErrorCategory::ColumnNotFound,
            format!("column '{}' was not found in any loaded source", column),
        )
    }

    /// Formula-internal failure, e.g. a per-row coercion that cannot proceed.
    pub fn execution<T: Into<String>>(message: T) -> Self {
        AppError::new(ErrorCategory::ExecutionError, message)
    }

    pub fn timeout<T: Into<String>>(message: T) -> Self {
        AppError::new(ErrorCategory::TimeoutError, message)
    }

    pub fn cancelled<T: Into<String>>(message: T) -> Self {
        AppError::new(ErrorCategory::CancelledError, message)
    }

    pub fn with_source<T: Into<String>>(
        category: ErrorCategory,
        message: T,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        let mut error = AppError::new(category, message);
        error.source = Some(anyhow::anyhow!(source));
        error
    }

    pub fn with_context<T: Into<String>>(mut self, context: T) -> Self {
        self.context.insert("context".to_string(), context.into());
        self
    }

    /// Attach the step this error surfaced from, so user-visible messages
    /// always identify the failing step and operation.
    pub fn with_step(mut self, step_id: &str, operation: &str) -> Self {
        self.context.insert("step".to_string(), step_id.to_string());
        self.context
            .insert("operation".to_string(), operation.to_string());
        self
    }

    pub fn with_code<T: Into<String>>(mut self, code: T) -> Self {
        self.code = code.into();
        self
    }

    pub fn add_context(&mut self, key: &str, value: &str) {
        self.context.insert(key.to_string(), value.to_string());
    }

    pub fn severity(&self) -> ErrorSeverity {
        self.severity
    }

    /// Failures that abort a whole run rather than a single step.
    pub fn is_run_fatal(&self) -> bool {
        matches!(
            self.category,
            ErrorCategory::TimeoutError
                | ErrorCategory::CancelledError
                | ErrorCategory::InternalError
        )
    }
}

fn default_code(category: ErrorCategory) -> &'static str {
    match category {
        ErrorCategory::ValidationError => "RF-VAL-001",
        ErrorCategory::FormulaNotFound => "RF-FORM-001",
        ErrorCategory::ColumnNotFound => "RF-COL-001",
        ErrorCategory::ExecutionError => "RF-EXEC-001",
        ErrorCategory::TimeoutError => "RF-TIME-001",
        ErrorCategory::CancelledError => "RF-CANCEL-001",
        ErrorCategory::SerializationError => "RF-SER-001",
        ErrorCategory::IoError => "RF-IO-001",
        ErrorCategory::InternalError => "RF-INT-001",
        ErrorCategory::Unknown => "RF-UNK-001",
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.code, self.category, self.message)?;
        if let (Some(step), Some(operation)) =
            (self.context.get("step"), self.context.get("operation"))
        {
            write!(f, " (step {}, operation {})", step, operation)?;
        } else if !self.context.is_empty() {
            write!(f, " (Context: {:?})", self.context)?;
        }
        if let Some(ref source) = self.source {
            write!(f, "\nCaused by: {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        AppError {
            category: ErrorCategory::InternalError,
            severity: ErrorSeverity::Error,
            code: "RF-INT-001".to_string(),
            message: e.to_string(),
            context: HashMap::new(),
            occurred_at: Utc::now(),
            source: Some(e),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError {
            category: ErrorCategory::IoError,
            severity: ErrorSeverity::Error,
            code: "RF-IO-001".to_string(),
            message: e.to_string(),
            context: HashMap::new(),
            occurred_at: Utc::now(),
            source: Some(anyhow::anyhow!(e)),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError {
            category: ErrorCategory::SerializationError,
            severity: ErrorSeverity::Error,
            code: "RF-SER-001".to_string(),
            message: e.to_string(),
            context: HashMap::new(),
            occurred_at: Utc::now(),
            source: Some(anyhow::anyhow!(e)),
        }
    }
}
