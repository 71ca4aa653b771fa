pub mod loader;
pub mod validation;

pub use loader::ConfigLoader;
pub use validation::ConfigValidator;

use crate::core::types::AggregateScope;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main rowforge configuration loaded from rowforge.toml
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RowforgeConfig {
    /// Execution engine configuration
    #[serde(default)]
    pub engine: EngineConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingSettings,

    /// Formula code manager configuration
    #[serde(default)]
    pub code: CodeConfig,
}

/// Execution engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Rows per preview sample
    #[serde(default = "default_sample_size")]
    pub preview_sample_size: usize,

    /// Rows per chunk for row-independent formulas
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Wall-clock budget for a full run, in seconds
    #[serde(default = "default_max_time_seconds")]
    pub max_time_seconds: u64,

    /// Scope for aggregate formulas during preview
    #[serde(default)]
    pub aggregate_scope: AggregateScope,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            preview_sample_size: default_sample_size(),
            chunk_size: default_chunk_size(),
            max_time_seconds: default_max_time_seconds(),
            aggregate_scope: AggregateScope::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Filter directive, e.g. "info" or "rowforge=debug"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Write a rolling log file alongside console output
    #[serde(default)]
    pub file_enabled: bool,

    /// Directory for log files
    #[serde(default = "default_log_directory")]
    pub directory: PathBuf,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_enabled: false,
            directory: default_log_directory(),
        }
    }
}

/// Formula code manager configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeConfig {
    /// Directory holding user-edited executor source files
    #[serde(default = "default_code_directory")]
    pub directory: PathBuf,

    /// Budget for a test compilation, in milliseconds
    #[serde(default = "default_compile_timeout_ms")]
    pub compile_timeout_ms: u64,
}

impl Default for CodeConfig {
    fn default() -> Self {
        Self {
            directory: default_code_directory(),
            compile_timeout_ms: default_compile_timeout_ms(),
        }
    }
}

fn default_sample_size() -> usize {
    100
}

fn default_chunk_size() -> usize {
    1024
}

fn default_max_time_seconds() -> u64 {
    300
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_directory() -> PathBuf {
    PathBuf::from(".rowforge/logs")
}

fn default_code_directory() -> PathBuf {
    PathBuf::from(".rowforge/formula_code")
}

fn default_compile_timeout_ms() -> u64 {
    30_000
}
