//! Writers for inference outputs.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    config::{InferenceConfig, InferenceMode},
    decode::Prediction,
    evaluation::Evaluation,
    matrix::LabelAlphabet,
    model::{AnnotatorModel, PosteriorTable},
    restarts::{InferenceOutcome, RestartSummary},
};

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).map_err(|source| Error::Io {
        operation: format!("create file {path:?}"),
        source,
    })?;
    Ok(BufWriter::new(file))
}

fn write_lines<I, D>(path: &Path, lines: I) -> Result<()>
where
    I: IntoIterator<Item = D>,
    D: std::fmt::Display,
{
    let mut writer = create(path)?;
    for line in lines {
        writeln!(writer, "{line}")?;
    }
    writer.flush()?;
    Ok(())
}

/// One predicted token per line; abstentions are empty lines.
pub fn write_predictions(
    path: &Path,
    predictions: &[Prediction],
    alphabet: &LabelAlphabet,
) -> Result<()> {
    write_lines(path, predictions.iter().map(|p| p.render(alphabet)))
}

/// One competence value per line, in annotator order.
pub fn write_competence(path: &Path, competences: &[f64]) -> Result<()> {
    write_lines(path, competences)
}

/// One entropy value per line, in item order.
pub fn write_entropies(path: &Path, entropies: &[f64]) -> Result<()> {
    write_lines(path, entropies)
}

/// Posterior table as CSV with the label tokens as header.
pub fn write_distribution(
    path: &Path,
    posteriors: &PosteriorTable,
    alphabet: &LabelAlphabet,
) -> Result<()> {
    let mut writer = csv::Writer::from_writer(create(path)?);
    writer.write_record(alphabet.tokens())?;
    for posterior in posteriors.iter() {
        writer.write_record(posterior.probabilities().iter().map(|p| format!("{p:.6}")))?;
    }
    writer.flush()?;
    Ok(())
}

/// Machine-readable record of one inference session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub mode: InferenceMode,
    pub config: InferenceConfig,
    pub base_seed: u64,
    pub num_instances: usize,
    pub num_annotators: usize,
    pub labels: Vec<String>,
    pub best: RestartSummary,
    pub restarts: Vec<RestartSummary>,
    pub stopped_early: bool,
    pub annotators: Vec<AnnotatorModel>,
    /// Items with a committed prediction
    pub predicted: usize,
    pub evaluation: Option<Evaluation>,
}

impl RunSummary {
    pub fn new(
        config: &InferenceConfig,
        outcome: &InferenceOutcome,
        alphabet: &LabelAlphabet,
        predictions: &[Prediction],
    ) -> Self {
        Self {
            mode: config.mode,
            config: config.clone(),
            base_seed: outcome.base_seed,
            num_instances: outcome.best.posteriors.num_instances(),
            num_annotators: outcome.best.annotators.len(),
            labels: alphabet.tokens().to_vec(),
            best: RestartSummary::from(&outcome.best),
            restarts: outcome.summaries.clone(),
            stopped_early: outcome.stopped_early,
            annotators: outcome.best.annotators.clone(),
            predicted: crate::decode::coverage_count(predictions),
            evaluation: None,
        }
    }

    pub fn with_evaluation(mut self, evaluation: Evaluation) -> Self {
        self.evaluation = Some(evaluation);
        self
    }
}

/// Pretty-printed JSON summary.
pub fn write_summary(path: &Path, summary: &RunSummary) -> Result<()> {
    let mut writer = create(path)?;
    serde_json::to_writer_pretty(&mut writer, summary)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
