//! MACE CLI - Multi-Annotator Competence Estimation
//!
//! This CLI provides:
//! - Inference of true labels and annotator competence from a crowd
//!   annotation table
//! - Scoring of predictions against gold labels

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "mace")]
#[command(version, about = "Multi-Annotator Competence Estimation", long_about = None)]
struct Cli {
    /// Log filter (e.g. `debug`, `mace=trace`); overrides RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate true labels and annotator competence
    Run(Box<mace::cli::commands::run::RunArgs>),

    /// Score predictions against gold labels
    Evaluate(mace::cli::commands::evaluate::EvaluateArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    mace::cli::logging::init(cli.log_level.as_deref());

    match cli.command {
        Commands::Run(args) => mace::cli::commands::run::execute(*args),
        Commands::Evaluate(args) => mace::cli::commands::evaluate::execute(args),
    }
}
