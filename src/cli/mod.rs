pub mod args;
pub mod commands;

pub use args::{CodeArgs, FormulasArgs, PreviewArgs, RunArgs, ValidateArgs};
use clap::{Parser, Subcommand};

const HELP_TEMPLATE: &str = "\
{name} {version}\n\
{about-with-newline}\n\
USAGE:\n    {usage}\n\
\nOPTIONS:\n{options}\n\
WORKFLOW COMMANDS:\n{subcommands}\n";

#[derive(Parser)]
#[command(name = "rowforge")]
#[command(version = crate::VERSION)]
#[command(about = "Declarative tabular workflow and formula engine")]
#[command(help_template = HELP_TEMPLATE)]
#[command(
    after_long_help = "Typical flow: validate a workflow, preview it over a sample, then run it over the full dataset."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    #[command(
        about = "Execute a workflow over the entire dataset",
        after_help = "Example:\n    rowforge run workflow.yaml --source customers=data/customers.json"
    )]
    Run(RunArgs),
    #[command(
        about = "Preview a workflow over a bounded sample",
        long_about = "Preview re-derives every step from the first one over a bounded head sample and reports per-step rows, timing, and memory estimates.",
        after_help = "Example:\n    rowforge preview workflow.yaml --source data/customers.json --sample-size 50"
    )]
    Preview(PreviewArgs),
    #[command(
        about = "Validate a workflow document without executing it",
        long_about = "Validation checks document structure, binds every formula step's parameters, and rejects forward and self column references."
    )]
    Validate(ValidateArgs),
    #[command(
        about = "List registered formulas or print an executor template",
        after_help = "Examples:\n    rowforge formulas\n    rowforge formulas --template TEXT_JOIN"
    )]
    Formulas(FormulasArgs),
    #[command(
        about = "Manage user-edited executor source for a formula",
        after_help = "Examples:\n    rowforge code UPPER --save my_upper.rs\n    rowforge code UPPER --test"
    )]
    Code(CodeArgs),
}
