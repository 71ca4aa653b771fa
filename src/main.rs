use anyhow::Result;
use clap::Parser;
use rowforge::cli::{commands, Args, Command};
use rowforge::core::config::{ConfigLoader, ConfigValidator};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let workspace = commands::find_workspace_root();
    let config = ConfigLoader::load_from_workspace(&workspace)?;
    ConfigValidator::validate(&config)?;
    let _logging_guard = rowforge::logging::init(&config.logging)?;

    match &args.command {
        Command::Run(run_args) => commands::handle_run(run_args, &config),
        Command::Preview(preview_args) => commands::handle_preview(preview_args, &config),
        Command::Validate(validate_args) => commands::handle_validate(validate_args),
        Command::Formulas(formulas_args) => commands::handle_formulas(formulas_args),
        Command::Code(code_args) => commands::handle_code(code_args, &config).await,
    }
}
