use crate::{
    cli::args::{CodeArgs, FormulasArgs, PreviewArgs, RunArgs, ValidateArgs},
    core::{
        config::RowforgeConfig,
        dataset::{SourceCatalog, TabularDataset},
        formula::{register_builtins, CodeManager, ExecutorTemplateGenerator, FormulaRegistry},
        workflow::{
            load_workflow, CancellationFlag, ExecutionEngine, ExecutionOverrides, ProcessedData,
        },
    },
    utils::serialization::{FileSerializer, FileUtils, JsonSerializer},
    Result,
};
use anyhow::{anyhow, Context};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Serde view of a source file: either `{columns, rows}` or a bare row array.
#[derive(Deserialize)]
#[serde(untagged)]
enum SourceFile {
    Dataset(TabularDataset),
    Rows(Vec<crate::core::dataset::Row>),
}

/// Parse `name=path` source specs and load each JSON file. A spec without
/// `=` uses the file stem as the source name.
fn load_catalog(specs: &[String]) -> Result<SourceCatalog> {
    let mut catalog = SourceCatalog::new();
    for spec in specs {
        let (name, path) = match spec.split_once('=') {
            Some((name, path)) => (name.to_string(), PathBuf::from(path)),
            None => {
                let path = PathBuf::from(spec);
                let stem = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .ok_or_else(|| anyhow!("cannot derive a source name from '{}'", spec))?
                    .to_string();
                (stem, path)
            }
        };
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read source file {}", path.display()))?;
        let parsed: SourceFile = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse source file {}", path.display()))?;
        let dataset = match parsed {
            SourceFile::Dataset(dataset) if !dataset.columns.is_empty() => dataset,
            SourceFile::Dataset(dataset) => TabularDataset::from_rows(dataset.rows),
            SourceFile::Rows(rows) => TabularDataset::from_rows(rows),
        };
        info!(source = %name, rows = dataset.row_count(), "loaded source");
        catalog.insert(name, dataset);
    }
    Ok(catalog)
}

fn builtin_registry() -> Arc<FormulaRegistry> {
    let registry = Arc::new(FormulaRegistry::new());
    register_builtins(&registry);
    registry
}

pub fn handle_run(args: &RunArgs, config: &RowforgeConfig) -> Result<()> {
    let catalog = load_catalog(&args.sources)?;
    let mut document = load_workflow(&args.workflow)?;
    let registry = builtin_registry();
    let engine = ExecutionEngine::new(registry, config.engine.clone());
    let overrides = ExecutionOverrides {
        sample_size: None,
        max_time_seconds: args.max_time,
    };

    let summary = engine.execute(&mut document, &catalog, &overrides, &CancellationFlag::new())?;

    println!("Execution {}: {}", summary.execution_id, summary.status.as_str());
    println!(
        "  {} rows x {} columns in {}ms (~{} bytes)",
        summary.data.row_count,
        summary.data.columns.len(),
        summary.data.execution_time_ms,
        summary.data.memory_estimate_bytes
    );
    for record in &summary.step_runs {
        print_step_record(record);
    }
    if let Some(output) = &args.output {
        FileUtils.save_to_file(output, &summary.data, &JsonSerializer)?;
        println!("Result written to {}", output.display());
    }
    Ok(())
}

pub fn handle_preview(args: &PreviewArgs, config: &RowforgeConfig) -> Result<()> {
    let catalog = load_catalog(&args.sources)?;
    let mut document = load_workflow(&args.workflow)?;
    let registry = builtin_registry();
    let engine = ExecutionEngine::new(registry, config.engine.clone());
    let overrides = ExecutionOverrides {
        sample_size: args.sample_size,
        max_time_seconds: None,
    };

    let report = engine.preview(&mut document, &catalog, &overrides, &CancellationFlag::new())?;

    for (record, data) in report.step_runs.iter().zip(&report.step_data) {
        print_step_record(record);
        print_step_data(data);
    }
    if let Some(output) = &args.output {
        FileUtils.save_to_file(output, &report.step_data, &JsonSerializer)?;
        println!("Preview data written to {}", output.display());
    }
    Ok(())
}

pub fn handle_validate(args: &ValidateArgs) -> Result<()> {
    let document = load_workflow(&args.workflow)?;
    let registry = builtin_registry();
    if args.sources.is_empty() {
        document.validate(&registry, None)?;
        println!(
            "{}: structure ok ({} steps; no sources loaded, column references unchecked)",
            args.workflow.display(),
            document.workflow.steps.len()
        );
    } else {
        let catalog = load_catalog(&args.sources)?;
        document.validate(&registry, Some(&catalog))?;
        println!(
            "{}: ok ({} steps against {} sources)",
            args.workflow.display(),
            document.workflow.steps.len(),
            catalog.len()
        );
    }
    Ok(())
}

pub fn handle_formulas(args: &FormulasArgs) -> Result<()> {
    if let Some(formula) = &args.template {
        let code = ExecutorTemplateGenerator::generate(formula)?;
        println!("{}", code);
        return Ok(());
    }

    let registry = builtin_registry();
    let configs = if args.all {
        registry.configs()
    } else {
        registry.active_configs()
    };
    println!("{} formulas:", configs.len());
    for config in configs {
        let marker = if config.is_active { " " } else { "-" };
        println!("{} {:<18} {:<15} {}", marker, config.name, config.category, config.syntax);
    }
    Ok(())
}

pub async fn handle_code(args: &CodeArgs, config: &RowforgeConfig) -> Result<()> {
    let manager = CodeManager::new(&config.code.directory, config.code.compile_timeout_ms);

    if let Some(path) = &args.save {
        let code = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let report = manager.save_code(&args.formula, &code)?;
        println!("Saved code for {} at {}", report.formula_name, report.path.display());
    }

    if args.test {
        let code = manager.get_code(&args.formula)?;
        let report = manager.test_code(&args.formula, &code).await?;
        if report.success {
            println!(
                "{}: compiled in {}ms",
                args.formula, report.compilation_time_ms
            );
        } else {
            println!("{}: compilation failed", args.formula);
            for error in &report.errors {
                println!("  {}", error);
            }
            return Err(anyhow!("test compilation failed"));
        }
    }

    if args.show {
        println!("{}", manager.get_code(&args.formula)?);
    }

    if args.save.is_none() && !args.test && !args.show {
        let names = manager.list_codes()?;
        if names.is_empty() {
            println!("No saved executor code.");
        } else {
            for name in names {
                println!("{}", name);
            }
        }
    }
    Ok(())
}

fn print_step_record(record: &crate::core::workflow::StepRunRecord) {
    match &record.error {
        Some(error) => println!(
            "  [{}] {} ({}ms) FAILED: {}",
            record.step_id, record.operation, record.duration_ms, error
        ),
        None => println!(
            "  [{}] {} -> {:?} ({} rows, {}ms)",
            record.step_id,
            record.operation,
            record.output_columns,
            record.row_count,
            record.duration_ms
        ),
    }
}

fn print_step_data(data: &ProcessedData) {
    println!(
        "      step {}: {} rows, {} columns, ~{} bytes (sample {:?})",
        data.step_index,
        data.row_count,
        data.columns.len(),
        data.memory_estimate_bytes,
        data.sample_size
    );
}

/// Locate the workspace root for config loading: the directory holding
/// rowforge.toml, walking up from the current directory, else the current
/// directory itself.
pub fn find_workspace_root() -> PathBuf {
    let mut current = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    loop {
        if current.join("rowforge.toml").exists() {
            return current;
        }
        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => return std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }
}
