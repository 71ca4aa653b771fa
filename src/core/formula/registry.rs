#![allow(clippy::result_large_err)]

use crate::core::error::AppError;
use crate::core::formula::config::{validate_config, FormulaConfig};
use crate::core::formula::executor::FormulaExecutor;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::info;

struct RegisteredFormula {
    config: FormulaConfig,
    executor: Arc<dyn FormulaExecutor>,
}

/// Process-wide formula registry.
///
/// Constructor-injected (never a language-level singleton). Reads during
/// workflow execution are safe concurrently with registration changes made
/// by a configuration flow: all state sits behind one reader-writer lock.
/// Registration is idempotent by name: re-registering replaces the prior
/// executor, which is how live code updates land.
#[derive(Default)]
pub struct FormulaRegistry {
    inner: RwLock<HashMap<String, RegisteredFormula>>,
}

impl FormulaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &self,
        config: FormulaConfig,
        executor: Arc<dyn FormulaExecutor>,
    ) -> Result<(), AppError> {
        validate_config(&config)?;
        let name = config.name.clone();
        let mut inner = self.inner.write().expect("formula registry lock poisoned");
        let replaced = inner
            .insert(name.clone(), RegisteredFormula { config, executor })
            .is_some();
        if replaced {
            info!(formula = %name, "replaced formula executor");
        } else {
            info!(formula = %name, "registered formula");
        }
        Ok(())
    }

    /// Look up an executor by name. Unknown and disabled formulas both fail
    /// with `FormulaNotFound`; the engine surfaces that as a per-step
    /// failure, never a fatal abort.
    pub fn lookup(&self, name: &str) -> Result<Arc<dyn FormulaExecutor>, AppError> {
        let inner = self.inner.read().expect("formula registry lock poisoned");
        match inner.get(name) {
            Some(entry) if entry.config.is_active => Ok(Arc::clone(&entry.executor)),
            _ => Err(AppError::formula_not_found(name)),
        }
    }

    pub fn config_for(&self, name: &str) -> Option<FormulaConfig> {
        let inner = self.inner.read().expect("formula registry lock poisoned");
        inner.get(name).map(|entry| entry.config.clone())
    }

    /// All registered configs, sorted by name for stable listings.
    pub fn configs(&self) -> Vec<FormulaConfig> {
        let inner = self.inner.read().expect("formula registry lock poisoned");
        let mut configs: Vec<FormulaConfig> =
            inner.values().map(|entry| entry.config.clone()).collect();
        configs.sort_by(|a, b| a.name.cmp(&b.name));
        configs
    }

    pub fn active_configs(&self) -> Vec<FormulaConfig> {
        self.configs()
            .into_iter()
            .filter(|config| config.is_active)
            .collect()
    }

    pub fn set_active(&self, name: &str, is_active: bool) -> Result<(), AppError> {
        let mut inner = self.inner.write().expect("formula registry lock poisoned");
        match inner.get_mut(name) {
            Some(entry) => {
                entry.config.is_active = is_active;
                entry.config.updated_at = Some(chrono::Utc::now().to_rfc3339());
                info!(formula = %name, is_active, "set formula status");
                Ok(())
            }
            None => Err(AppError::formula_not_found(name)),
        }
    }

    /// Replace the stored config without touching the executor.
    pub fn update_config(&self, config: FormulaConfig) -> Result<(), AppError> {
        validate_config(&config)?;
        let mut inner = self.inner.write().expect("formula registry lock poisoned");
        match inner.get_mut(&config.name) {
            Some(entry) => {
                entry.config = config;
                Ok(())
            }
            None => Err(AppError::formula_not_found(&config.name)),
        }
    }

    pub fn remove(&self, name: &str) -> Result<(), AppError> {
        let mut inner = self.inner.write().expect("formula registry lock poisoned");
        match inner.remove(name) {
            Some(_) => {
                info!(formula = %name, "removed formula");
                Ok(())
            }
            None => Err(AppError::formula_not_found(name)),
        }
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .expect("formula registry lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
