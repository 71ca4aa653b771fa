#![allow(clippy::result_large_err)]

//! Storage and test-compilation of user-edited executor source. The
//! registry never consumes source from here directly: the configuration
//! flow compiles and registers executors, this module only manages the
//! files and the bounded compile check.

use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, warn};

#[derive(Debug, Serialize, Deserialize)]
pub struct CodeSaveReport {
    pub formula_name: String,
    pub path: PathBuf,
    pub saved_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CodeTestReport {
    pub success: bool,
    pub message: String,
    pub compilation_time_ms: u64,
    pub errors: Vec<String>,
}

pub struct CodeManager {
    directory: PathBuf,
    compile_timeout: Duration,
}

impl CodeManager {
    pub fn new(directory: impl Into<PathBuf>, compile_timeout_ms: u64) -> Self {
        Self {
            directory: directory.into(),
            compile_timeout: Duration::from_millis(compile_timeout_ms),
        }
    }

    fn code_path(&self, formula_name: &str) -> PathBuf {
        self.directory
            .join(format!("{}.rs", formula_name.to_lowercase()))
    }

    /// Persist executor source for a formula. Source must at least shape up
    /// as an executor impl before it is accepted.
    pub fn save_code(&self, formula_name: &str, code: &str) -> Result<CodeSaveReport, AppError> {
        if code.trim().is_empty() {
            return Err(AppError::validation("executor source cannot be empty"));
        }
        if !code.contains("impl FormulaExecutor") {
            return Err(AppError::validation(
                "executor source must implement FormulaExecutor",
            ));
        }

        std::fs::create_dir_all(&self.directory)?;
        let path = self.code_path(formula_name);
        std::fs::write(&path, code)?;
        info!(formula = %formula_name, path = %path.display(), "saved formula code");

        Ok(CodeSaveReport {
            formula_name: formula_name.to_string(),
            path,
            saved_at: chrono::Utc::now().to_rfc3339(),
        })
    }

    pub fn get_code(&self, formula_name: &str) -> Result<String, AppError> {
        let path = self.code_path(formula_name);
        std::fs::read_to_string(&path).map_err(|e| {
            AppError::new(
                ErrorCategory::IoError,
                format!("no saved code for formula '{}': {}", formula_name, e),
            )
        })
    }

    pub fn list_codes(&self) -> Result<Vec<String>, AppError> {
        if !self.directory.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.directory)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("rs") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_uppercase());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Test-compile executor source in a scratch directory. The external
    /// rustc call is bounded by the configured timeout and reported as a
    /// step failure on expiry, never left pending.
    pub async fn test_code(
        &self,
        formula_name: &str,
        code: &str,
    ) -> Result<CodeTestReport, AppError> {
        let scratch = tempfile::tempdir()?;
        let source_path = scratch
            .path()
            .join(format!("test_{}.rs", formula_name.to_lowercase()));
        std::fs::write(&source_path, code)?;

        let started = std::time::Instant::now();
        let compile = tokio::process::Command::new("rustc")
            .args(["--edition", "2021", "--crate-type", "lib", "--emit", "metadata"])
            .arg(&source_path)
            .current_dir(scratch.path())
            .output();

        let output = match timeout(self.compile_timeout, compile).await {
            Ok(result) => result.map_err(|e| {
                AppError::new(
                    ErrorCategory::ExecutionError,
                    format!("failed to invoke rustc: {}", e),
                )
            })?,
            Err(_) => {
                warn!(formula = %formula_name, "test compilation timed out");
                return Err(AppError::timeout(format!(
                    "test compilation of '{}' exceeded {}ms",
                    formula_name,
                    self.compile_timeout.as_millis()
                )));
            }
        };

        let compilation_time_ms = started.elapsed().as_millis() as u64;
        if output.status.success() {
            Ok(CodeTestReport {
                success: true,
                message: "Code compiled successfully".to_string(),
                compilation_time_ms,
                errors: Vec::new(),
            })
        } else {
            let errors: Vec<String> = String::from_utf8_lossy(&output.stderr)
                .lines()
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect();
            Ok(CodeTestReport {
                success: false,
                message: "Compilation failed".to_string(),
                compilation_time_ms,
                errors,
            })
        }
    }
}
