//! Inference over the annotation model
//!
//! Two estimators share one contract ([`Estimator`]): the smoothed
//! maximum-likelihood [`EmEngine`] and the mean-field
//! [`VariationalEstimator`]. Both reuse the same expectation step
//! ([`estep`]) and differ only in how annotator parameters are represented,
//! re-estimated and penalized. [`Strategy`] selects one of them from an
//! [`InferenceConfig`].
//!
//! ## Module Structure
//!
//! - [`estep`]: item posteriors, log-evidence and expected counts
//! - [`em`]: point-estimate M-step with additive smoothing
//! - [`variational`]: Beta/Dirichlet variational updates and KL terms

pub mod em;
pub mod estep;
pub mod variational;

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use tracing::trace;

pub use em::EmEngine;
pub use estep::{AnnotatorCounts, Expectation, ResponseWeights, expectation, log_likelihood};
pub use variational::{VariationalAnnotator, VariationalEstimator};

use crate::{
    config::{InferenceConfig, InferenceMode},
    controls::Controls,
    matrix::LabelMatrix,
    model::{AnnotatorModel, PosteriorTable},
};

/// Runs stop once the score moves by less than this between iterations.
pub const CONVERGENCE_EPSILON: f64 = 1e-6;

/// E-step/M-step contract shared by both estimators.
pub trait Estimator: Sync {
    /// Annotator parameters carried between iterations
    type State: Clone + Send;

    /// Maximum number of M-steps per run.
    fn iterations(&self) -> usize;

    /// Random starting parameters for one run.
    fn initialize<R: Rng>(&self, matrix: &LabelMatrix, rng: &mut R) -> Self::State;

    /// Log-domain response weights fed to the E-step.
    fn response_weights(&self, state: &Self::State) -> Vec<ResponseWeights>;

    /// Re-estimate the parameters from expected counts.
    fn maximize(&self, state: &mut Self::State, counts: &[AnnotatorCounts]);

    /// Parameter term added to the log-evidence to form the run's score.
    fn log_prior(&self, state: &Self::State) -> f64;

    /// Point summaries of the parameters.
    fn annotator_models(&self, state: &Self::State) -> Vec<AnnotatorModel>;

    /// Run to convergence (or the iteration cap) from the given seed.
    fn run(&self, matrix: &LabelMatrix, controls: &Controls, seed: u64) -> InferenceRun
    where
        Self: Sized,
    {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut run = run_estimator(self, matrix, controls, &mut rng);
        run.seed = seed;
        run
    }
}

/// Result of one restart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceRun {
    /// Restart index within the controller
    pub restart: usize,
    /// Seed the run was initialized from
    pub seed: u64,
    pub annotators: Vec<AnnotatorModel>,
    pub posteriors: PosteriorTable,
    /// Data log-likelihood under the final point estimates
    pub log_likelihood: f64,
    /// Final objective: penalized log-likelihood (EM) or ELBO (variational)
    pub score: f64,
    /// Score after the initial E-step and after every iteration
    pub score_history: Vec<f64>,
    /// Number of M-steps performed
    pub iterations: usize,
    pub converged: bool,
}

impl InferenceRun {
    /// Competence (`1 - spamming probability`) of every annotator.
    pub fn competences(&self) -> Vec<f64> {
        self.annotators.iter().map(AnnotatorModel::competence).collect()
    }

    pub fn spamming_probabilities(&self) -> Vec<f64> {
        self.annotators
            .iter()
            .map(|a| a.spamming_probability)
            .collect()
    }
}

/// Alternate E- and M-steps until the score stops moving.
///
/// An initial E-step scores the random starting point; each iteration then
/// performs one M-step followed by one E-step, so the stored posteriors always
/// belong to the stored parameters.
pub fn run_estimator<E: Estimator, R: Rng>(
    estimator: &E,
    matrix: &LabelMatrix,
    controls: &Controls,
    rng: &mut R,
) -> InferenceRun {
    let mut state = estimator.initialize(matrix, rng);
    let mut posteriors = PosteriorTable::uniform(matrix.num_instances(), matrix.num_labels());

    let weights = estimator.response_weights(&state);
    let mut current = expectation(matrix, controls, &weights, &mut posteriors);
    let mut score = current.log_evidence + estimator.log_prior(&state);
    let mut score_history = vec![score];
    let mut converged = false;
    let mut iterations = 0;

    while iterations < estimator.iterations() {
        estimator.maximize(&mut state, &current.counts);
        let weights = estimator.response_weights(&state);
        current = expectation(matrix, controls, &weights, &mut posteriors);
        iterations += 1;

        let previous = score;
        score = current.log_evidence + estimator.log_prior(&state);
        score_history.push(score);
        trace!(iteration = iterations, score, "iteration complete");

        if (score - previous).abs() < CONVERGENCE_EPSILON {
            converged = true;
            break;
        }
    }

    let annotators = estimator.annotator_models(&state);
    let log_likelihood = log_likelihood(matrix, controls, &annotators);

    InferenceRun {
        restart: 0,
        seed: 0,
        annotators,
        posteriors,
        log_likelihood,
        score,
        score_history,
        iterations,
        converged,
    }
}

/// Estimator selected by configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    Em(EmEngine),
    Variational(VariationalEstimator),
}

impl Strategy {
    pub fn from_config(config: &InferenceConfig) -> Self {
        match config.mode {
            InferenceMode::Em => Strategy::Em(EmEngine::new(config.smoothing, config.iterations)),
            InferenceMode::Variational => Strategy::Variational(VariationalEstimator::new(
                config.alpha,
                config.beta,
                config.smoothing,
                config.iterations,
            )),
        }
    }

    pub fn mode(&self) -> InferenceMode {
        match self {
            Strategy::Em(_) => InferenceMode::Em,
            Strategy::Variational(_) => InferenceMode::Variational,
        }
    }

    /// Run the selected estimator once from `seed`.
    pub fn run(&self, matrix: &LabelMatrix, controls: &Controls, seed: u64) -> InferenceRun {
        match self {
            Strategy::Em(engine) => engine.run(matrix, controls, seed),
            Strategy::Variational(estimator) => estimator.run(matrix, controls, seed),
        }
    }
}
