pub mod code_manager;
pub mod codegen;
pub mod conditional;
pub mod config;
pub mod executor;
pub mod math;
pub mod params;
pub mod registry;
pub mod stats;
pub mod text;
pub mod transform;

pub use code_manager::{CodeManager, CodeTestReport};
pub use codegen::ExecutorTemplateGenerator;
pub use config::{default_configs, FormulaConfig, ParameterSpec, ParameterType};
pub use executor::FormulaExecutor;
pub use registry::FormulaRegistry;

use crate::core::error::AppError;
use std::sync::Arc;
use tracing::error;

/// Register the builtin executors with their default configs. Called once
/// at startup; the configuration flow may re-register over these later.
pub fn register_builtins(registry: &FormulaRegistry) {
    let executors: Vec<Arc<dyn FormulaExecutor>> = vec![
        Arc::new(text::UpperExecutor),
        Arc::new(text::LowerExecutor),
        Arc::new(text::TrimExecutor),
        Arc::new(text::ProperCaseExecutor),
        Arc::new(text::TextLengthExecutor),
        Arc::new(text::TextJoinExecutor),
        Arc::new(math::AddExecutor),
        Arc::new(math::SubtractExecutor),
        Arc::new(math::MultiplyExecutor),
        Arc::new(math::DivideExecutor),
        Arc::new(stats::SumExecutor),
        Arc::new(stats::CountExecutor),
        Arc::new(stats::UniqueCountExecutor),
        Arc::new(stats::AverageExecutor),
        Arc::new(stats::CorrelationExecutor),
        Arc::new(conditional::IfExecutor),
        Arc::new(conditional::SumIfExecutor),
        Arc::new(conditional::CountIfExecutor),
        Arc::new(transform::PivotExecutor),
        Arc::new(transform::DepivotExecutor),
        Arc::new(transform::RemoveDuplicatesExecutor),
        Arc::new(transform::FillNaExecutor),
    ];

    let mut configs = default_configs();
    for executor in executors {
        let Some(position) = configs.iter().position(|c| c.name == executor.name()) else {
            error!(formula = executor.name(), "builtin has no default config");
            continue;
        };
        let config = configs.swap_remove(position);
        if let Err(e) = register_one(registry, config, executor) {
            error!("failed to register builtin formula: {}", e);
        }
    }
}

fn register_one(
    registry: &FormulaRegistry,
    config: FormulaConfig,
    executor: Arc<dyn FormulaExecutor>,
) -> Result<(), AppError> {
    registry.register(config, executor)
}
