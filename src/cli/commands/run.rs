//! Run command - Estimate true labels and annotator competence

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use crate::{
    cli::output::{format_number, format_percent, print_kv, print_section, print_subsection},
    config::InferenceConfig,
    controls::Controls,
    decode::{Decoder, Prediction, coverage_count},
    evaluation::{Evaluation, evaluate},
    io::{self, RunSummary},
    matrix::{LabelAlphabet, LabelMatrix},
    pipeline::{JsonlObserver, ProgressObserver},
    restarts::{InferenceOutcome, RestartController},
};

#[derive(Parser, Debug)]
#[command(about = "Estimate true labels and annotator competence")]
pub struct RunArgs {
    /// Comma-separated annotations: one row per item, one column per annotator
    pub input: PathBuf,

    /// Prefix for output files (`<prefix>.prediction`, `<prefix>.competence`, ...)
    #[arg(long)]
    pub prefix: Option<PathBuf>,

    /// Maximum EM iterations per restart
    #[arg(long, default_value_t = 50)]
    pub iterations: usize,

    /// Number of random restarts
    #[arg(long, default_value_t = 10)]
    pub restarts: usize,

    /// Smoothing pseudo-count (defaults to 0.01 / number of labels)
    #[arg(long)]
    pub smoothing: Option<f64>,

    /// Beta prior on spamming (variational mode)
    #[arg(long, default_value_t = 0.5)]
    pub alpha: f64,

    /// Beta prior on trustworthy answers (variational mode)
    #[arg(long, default_value_t = 0.5)]
    pub beta: f64,

    /// Use variational Bayes instead of EM
    #[arg(long)]
    pub variational: bool,

    /// Minimum posterior mass to commit to a label; 1.0 always commits
    #[arg(long, default_value_t = 1.0)]
    pub threshold: f64,

    /// Known labels, one line per item (blank lines for unknown items)
    #[arg(long)]
    pub controls: Option<PathBuf>,

    /// Gold labels to score the predictions against, one line per item
    #[arg(long)]
    pub test: Option<PathBuf>,

    /// The input's first row is a header
    #[arg(long)]
    pub headers: bool,

    /// Random seed for reproducibility
    #[arg(long)]
    pub seed: Option<u64>,

    /// Stop after this many restarts without a better score
    #[arg(long)]
    pub patience: Option<usize>,

    /// Also write the per-item label distribution
    #[arg(long)]
    pub distribution: bool,

    /// Also write per-item posterior entropies
    #[arg(long)]
    pub entropies: bool,

    /// Write one JSON line per finished restart to this file
    #[arg(long)]
    pub restart_log: Option<PathBuf>,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

impl RunArgs {
    /// Inference configuration for an alphabet of `num_labels` labels.
    pub fn inference_config(&self, num_labels: usize) -> InferenceConfig {
        let mut config = InferenceConfig::for_labels(num_labels)
            .with_iterations(self.iterations)
            .with_restarts(self.restarts)
            .with_prior(self.alpha, self.beta)
            .with_variational(self.variational)
            .with_threshold(self.threshold);
        if let Some(smoothing) = self.smoothing {
            config = config.with_smoothing(smoothing);
        }
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        if let Some(patience) = self.patience {
            config = config.with_patience(patience);
        }
        config
    }

    /// Path of one output file: `<prefix>.<name>`, or just `<name>` without a
    /// prefix.
    pub fn output_path(&self, name: &str) -> PathBuf {
        match &self.prefix {
            Some(prefix) => PathBuf::from(format!("{}.{name}", prefix.display())),
            None => PathBuf::from(name),
        }
    }
}

pub fn execute(args: RunArgs) -> Result<()> {
    info!(input = %args.input.display(), "reading annotations");
    let (matrix, alphabet) = io::read_label_matrix(&args.input, args.headers)
        .with_context(|| format!("failed to read annotations from {}", args.input.display()))?;

    let controls = load_controls(args.controls.as_deref(), &matrix, &alphabet)?;
    let config = args.inference_config(alphabet.len());

    print_section("MACE Inference");
    print_kv("Items", &format_number(matrix.num_instances()));
    print_kv("Annotators", &format_number(matrix.num_annotators()));
    print_kv("Annotations", &format_number(matrix.num_annotations()));
    print_kv("Labels", &alphabet.tokens().join(", "));
    print_kv("Mode", &format!("{:?}", config.mode));
    print_kv("Restarts", &config.restarts.to_string());
    print_kv("Iterations", &config.iterations.to_string());
    print_kv("Smoothing", &format!("{}", config.smoothing));
    if controls.num_controlled() > 0 {
        print_kv("Controlled items", &format_number(controls.num_controlled()));
    }

    let mut controller = RestartController::new(&config)?;
    if !args.no_progress {
        controller = controller.with_observer(Box::new(ProgressObserver::new()));
    }
    if let Some(path) = &args.restart_log {
        controller = controller.with_observer(Box::new(JsonlObserver::new(path)?));
    }

    info!(restarts = config.restarts, "running inference");
    let outcome = controller.run(&matrix, &controls)?;

    let decoder = Decoder::new(config.threshold)?;
    let predictions = decoder.decode(&outcome.best.posteriors);

    let evaluation = match &args.test {
        Some(path) => Some(score_against_gold(path, &predictions, &alphabet)?),
        None => None,
    };

    info!("writing outputs");
    write_outputs(&args, &config, &outcome, &alphabet, &predictions, evaluation)?;
    print_results(&matrix, &outcome, &predictions, evaluation);

    Ok(())
}

fn load_controls(
    path: Option<&Path>,
    matrix: &LabelMatrix,
    alphabet: &LabelAlphabet,
) -> Result<Controls> {
    let Some(path) = path else {
        return Ok(Controls::none(matrix.num_instances()));
    };
    info!(controls = %path.display(), "reading control labels");
    let tokens = io::read_token_lines(path)?;
    Controls::from_tokens(&tokens, alphabet, matrix)
        .with_context(|| format!("invalid control labels in {}", path.display()))
}

fn score_against_gold(
    path: &Path,
    predictions: &[Prediction],
    alphabet: &LabelAlphabet,
) -> Result<Evaluation> {
    let gold = io::read_token_lines(path)?;
    let rendered: Vec<&str> = predictions.iter().map(|p| p.render(alphabet)).collect();
    evaluate(&rendered, &gold).with_context(|| format!("cannot score against {}", path.display()))
}

fn write_outputs(
    args: &RunArgs,
    config: &InferenceConfig,
    outcome: &InferenceOutcome,
    alphabet: &LabelAlphabet,
    predictions: &[Prediction],
    evaluation: Option<Evaluation>,
) -> Result<()> {
    let best = &outcome.best;
    let mut written = Vec::new();

    let path = args.output_path("prediction");
    io::write_predictions(&path, predictions, alphabet)?;
    written.push(path);

    let path = args.output_path("competence");
    io::write_competence(&path, &best.competences())?;
    written.push(path);

    if args.distribution {
        let path = args.output_path("distribution");
        io::write_distribution(&path, &best.posteriors, alphabet)?;
        written.push(path);
    }

    if args.entropies {
        let path = args.output_path("entropies");
        io::write_entropies(&path, &best.posteriors.entropies())?;
        written.push(path);
    }

    let mut summary = RunSummary::new(config, outcome, alphabet, predictions);
    if let Some(evaluation) = evaluation {
        summary = summary.with_evaluation(evaluation);
    }
    let path = args.output_path("summary.json");
    io::write_summary(&path, &summary)?;
    written.push(path);

    for path in &written {
        info!(path = %path.display(), "wrote output");
    }
    Ok(())
}

fn print_results(
    matrix: &LabelMatrix,
    outcome: &InferenceOutcome,
    predictions: &[Prediction],
    evaluation: Option<Evaluation>,
) {
    let best = &outcome.best;

    print_section("Results");
    print_kv("Base seed", &outcome.base_seed.to_string());
    print_kv(
        "Restarts run",
        &format!(
            "{}{}",
            outcome.summaries.len(),
            if outcome.stopped_early {
                " (stopped early)"
            } else {
                ""
            }
        ),
    );
    print_kv("Best restart", &best.restart.to_string());
    print_kv("Score", &format!("{:.4}", best.score));
    print_kv("Log-likelihood", &format!("{:.4}", best.log_likelihood));
    print_kv(
        "Iterations",
        &format!(
            "{}{}",
            best.iterations,
            if best.converged { "" } else { " (not converged)" }
        ),
    );
    let covered = coverage_count(predictions);
    print_kv(
        "Coverage",
        &format_percent(covered as f64 / matrix.num_instances() as f64),
    );

    let competences = best.competences();
    if !competences.is_empty() {
        let mean = competences.iter().sum::<f64>() / competences.len() as f64;
        let min = competences.iter().copied().fold(f64::INFINITY, f64::min);
        let max = competences.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        print_subsection("Competence");
        print_kv("Mean", &format!("{mean:.3}"));
        print_kv("Min", &format!("{min:.3}"));
        print_kv("Max", &format!("{max:.3}"));
    }

    if let Some(evaluation) = evaluation {
        print_subsection("Evaluation");
        print_kv("Gold items", &format_number(evaluation.gold_items));
        print_kv("Accuracy", &format_percent(evaluation.accuracy()));
        print_kv("Coverage", &format_percent(evaluation.coverage()));
    }
}
