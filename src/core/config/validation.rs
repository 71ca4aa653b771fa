#![allow(clippy::result_large_err)]

use super::RowforgeConfig;
use crate::core::error::AppError;

pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate configuration rules
    pub fn validate(config: &RowforgeConfig) -> Result<(), AppError> {
        if config.engine.preview_sample_size == 0 {
            return Err(AppError::validation(
                "engine.preview_sample_size must be >= 1",
            ));
        }

        if config.engine.chunk_size == 0 {
            return Err(AppError::validation("engine.chunk_size must be >= 1"));
        }

        if config.engine.max_time_seconds == 0 {
            return Err(AppError::validation("engine.max_time_seconds must be >= 1"));
        }

        if config.logging.level.trim().is_empty() {
            return Err(AppError::validation("logging.level cannot be empty"));
        }

        if config.code.compile_timeout_ms == 0 {
            return Err(AppError::validation("code.compile_timeout_ms must be >= 1"));
        }

        Ok(())
    }
}
