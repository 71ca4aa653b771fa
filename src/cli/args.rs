use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct RunArgs {
    /// Workflow document (YAML)
    #[arg(value_name = "WORKFLOW")]
    pub workflow: PathBuf,

    /// Tabular source file (JSON), repeatable; `name=path` overrides the
    /// source name, which otherwise defaults to the file stem
    #[arg(long = "source", value_name = "NAME=PATH")]
    pub sources: Vec<String>,

    /// Write the full result as JSON to this path instead of a summary only
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Abort the run after this wall-clock budget in seconds
    #[arg(long, value_name = "SECONDS")]
    pub max_time: Option<u64>,
}

#[derive(Args)]
pub struct PreviewArgs {
    /// Workflow document (YAML)
    #[arg(value_name = "WORKFLOW")]
    pub workflow: PathBuf,

    /// Tabular source file (JSON), repeatable; `name=path` overrides the
    /// source name, which otherwise defaults to the file stem
    #[arg(long = "source", value_name = "NAME=PATH")]
    pub sources: Vec<String>,

    /// Rows per preview sample (overrides config and document settings)
    #[arg(long, value_name = "ROWS")]
    pub sample_size: Option<usize>,

    /// Write every step's preview data as JSON to this path
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Workflow document (YAML)
    #[arg(value_name = "WORKFLOW")]
    pub workflow: PathBuf,

    /// Tabular source file (JSON), repeatable. With sources loaded,
    /// column references are checked against the real schema
    #[arg(long = "source", value_name = "NAME=PATH")]
    pub sources: Vec<String>,
}

#[derive(Args)]
pub struct FormulasArgs {
    /// Include disabled formulas in the listing
    #[arg(long)]
    pub all: bool,

    /// Print an executor source template for the named formula
    #[arg(long, value_name = "FORMULA")]
    pub template: Option<String>,
}

#[derive(Args)]
pub struct CodeArgs {
    /// Formula the executor source belongs to
    #[arg(value_name = "FORMULA")]
    pub formula: String,

    /// Save this source file as the formula's executor code
    #[arg(long, value_name = "FILE")]
    pub save: Option<PathBuf>,

    /// Test-compile this source file (or the saved code when omitted)
    #[arg(long)]
    pub test: bool,

    /// Print the saved executor code
    #[arg(long)]
    pub show: bool,
}
