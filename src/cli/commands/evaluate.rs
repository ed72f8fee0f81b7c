//! Evaluate command - Score a prediction file against gold labels

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::{
    cli::output::{format_number, format_percent, print_kv, print_section},
    evaluation::evaluate,
    io::read_token_lines,
};

#[derive(Parser, Debug)]
#[command(about = "Score predictions against gold labels")]
pub struct EvaluateArgs {
    /// Predictions, one label per line (blank lines are abstentions)
    pub predictions: PathBuf,

    /// Gold labels, one label per line (blank lines are not scored)
    pub gold: PathBuf,
}

pub fn execute(args: EvaluateArgs) -> Result<()> {
    let predictions = read_token_lines(&args.predictions)
        .with_context(|| format!("failed to read {}", args.predictions.display()))?;
    let gold = read_token_lines(&args.gold)
        .with_context(|| format!("failed to read {}", args.gold.display()))?;

    let scores = evaluate(&predictions, &gold)?;

    print_section("Evaluation");
    print_kv("Items", &format_number(predictions.len()));
    print_kv("Gold items", &format_number(scores.gold_items));
    print_kv("Predicted", &format_number(scores.predicted));
    print_kv("Correct", &format_number(scores.correct));
    print_kv("Accuracy", &format_percent(scores.accuracy()));
    print_kv("Coverage", &format_percent(scores.coverage()));

    Ok(())
}
