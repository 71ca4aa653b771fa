#![allow(clippy::result_large_err)]

use super::RowforgeConfig;
use crate::core::error::AppError;
use crate::core::types::{AggregateScope, ErrorCategory};
use std::env;
use std::path::{Path, PathBuf};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config from a workspace root (workspace/rowforge.toml).
    /// Environment variables override config file values; a missing file
    /// falls back to defaults + env vars.
    pub fn load_from_workspace(workspace_path: &Path) -> Result<RowforgeConfig, AppError> {
        let config_path = workspace_path.join("rowforge.toml");
        let config_file = Self::load_from_file(&config_path)?;

        let mut config = config_file.unwrap_or_default();
        Self::apply_env_overrides(&mut config);

        Ok(config)
    }

    /// Load config from a specific file path. Returns Ok(None) if the file
    /// doesn't exist.
    pub fn load_from_file(path: &Path) -> Result<Option<RowforgeConfig>, AppError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::new(
                ErrorCategory::IoError,
                format!("Failed to read config file {}: {}", path.display(), e),
            )
        })?;

        let config: RowforgeConfig = toml::from_str(&content).map_err(|e| {
            AppError::new(
                ErrorCategory::ValidationError,
                format!("Failed to parse config file {}: {}", path.display(), e),
            )
        })?;

        Ok(Some(config))
    }

    /// Environment variables take precedence over config file values.
    fn apply_env_overrides(config: &mut RowforgeConfig) {
        if let Ok(sample) = env::var("ROWFORGE_PREVIEW_SAMPLE_SIZE") {
            if let Ok(sample) = sample.parse::<usize>() {
                config.engine.preview_sample_size = sample;
            }
        }

        if let Ok(chunk) = env::var("ROWFORGE_CHUNK_SIZE") {
            if let Ok(chunk) = chunk.parse::<usize>() {
                config.engine.chunk_size = chunk;
            }
        }

        if let Ok(max_time) = env::var("ROWFORGE_MAX_TIME_SECONDS") {
            if let Ok(max_time) = max_time.parse::<u64>() {
                config.engine.max_time_seconds = max_time;
            }
        }

        if let Ok(scope) = env::var("ROWFORGE_AGGREGATE_SCOPE") {
            match scope.to_lowercase().as_str() {
                "sample" => config.engine.aggregate_scope = AggregateScope::Sample,
                "full" => config.engine.aggregate_scope = AggregateScope::Full,
                _ => {}
            }
        }

        if let Ok(level) = env::var("ROWFORGE_LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Ok(file_enabled) = env::var("ROWFORGE_LOG_FILE") {
            if let Ok(file_enabled) = file_enabled.parse::<bool>() {
                config.logging.file_enabled = file_enabled;
            }
        }

        if let Ok(dir) = env::var("ROWFORGE_CODE_DIRECTORY") {
            config.code.directory = PathBuf::from(dir);
        }

        if let Ok(timeout) = env::var("ROWFORGE_COMPILE_TIMEOUT_MS") {
            if let Ok(timeout) = timeout.parse::<u64>() {
                config.code.compile_timeout_ms = timeout;
            }
        }
    }
}
