//! Multiple random restarts with best-score selection.
//!
//! Restarts share nothing but the read-only label matrix. Without early
//! stopping they run as a rayon parallel map and are reduced afterwards in
//! restart order; with a patience limit they run one after another so the
//! controller can stop once the best score stagnates.

use std::sync::{Mutex, PoisonError};

use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    Result,
    config::InferenceConfig,
    controls::Controls,
    inference::{InferenceRun, Strategy},
    matrix::LabelMatrix,
    ports::Observer,
};

/// Compact record of one finished restart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestartSummary {
    pub restart: usize,
    pub seed: u64,
    pub score: f64,
    pub log_likelihood: f64,
    pub iterations: usize,
    pub converged: bool,
}

impl From<&InferenceRun> for RestartSummary {
    fn from(run: &InferenceRun) -> Self {
        Self {
            restart: run.restart,
            seed: run.seed,
            score: run.score,
            log_likelihood: run.log_likelihood,
            iterations: run.iterations,
            converged: run.converged,
        }
    }
}

/// Everything a controller invocation produced.
#[derive(Debug, Clone)]
pub struct InferenceOutcome {
    /// Highest-scoring run; ties go to the lowest restart index
    pub best: InferenceRun,
    /// Every completed restart, in restart order
    pub summaries: Vec<RestartSummary>,
    /// Seed restart 0 used; restart `r` used `base_seed + r`
    pub base_seed: u64,
    /// Whether patience ended the session before all restarts ran
    pub stopped_early: bool,
}

/// Seed of restart `restart` given the session's base seed.
pub fn restart_seed(base_seed: u64, restart: usize) -> u64 {
    base_seed.wrapping_add(restart as u64)
}

/// Runs the configured estimator from several random starting points and
/// keeps the best.
pub struct RestartController {
    strategy: Strategy,
    restarts: usize,
    seed: Option<u64>,
    patience: Option<usize>,
    observers: Vec<Box<dyn Observer>>,
}

impl RestartController {
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidConfiguration`] if any hyperparameter
    /// is out of range.
    pub fn new(config: &InferenceConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            strategy: Strategy::from_config(config),
            restarts: config.restarts,
            seed: config.seed,
            patience: config.patience,
            observers: Vec::new(),
        })
    }

    /// Add an observer to the controller
    pub fn with_observer(mut self, observer: Box<dyn Observer>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    /// Run every restart and return the best one.
    pub fn run(&mut self, matrix: &LabelMatrix, controls: &Controls) -> Result<InferenceOutcome> {
        let base_seed = self.seed.unwrap_or_else(|| rand::rng().random());
        debug!(
            restarts = self.restarts,
            base_seed,
            mode = ?self.strategy.mode(),
            "starting inference"
        );

        for observer in &mut self.observers {
            observer.on_inference_start(self.restarts)?;
        }

        let (runs, stopped_early) = match self.patience {
            Some(patience) => self.run_sequential(matrix, controls, base_seed, patience)?,
            None => (self.run_parallel(matrix, controls, base_seed)?, false),
        };

        let summaries: Vec<RestartSummary> = runs.iter().map(RestartSummary::from).collect();
        let completed = runs.len();
        let best = runs
            .into_iter()
            .reduce(|best, run| if is_better(&run, &best) { run } else { best })
            // Unreachable: `new` rejects zero restarts, so every session yields a run.
            .ok_or_else(|| crate::Error::invalid_config("restarts must be at least 1"))?;

        debug!(
            restart = best.restart,
            score = best.score,
            log_likelihood = best.log_likelihood,
            "selected best restart"
        );

        let best_summary = RestartSummary::from(&best);
        for observer in &mut self.observers {
            observer.on_inference_end(&best_summary, completed)?;
        }

        Ok(InferenceOutcome {
            best,
            summaries,
            base_seed,
            stopped_early,
        })
    }

    fn run_parallel(
        &mut self,
        matrix: &LabelMatrix,
        controls: &Controls,
        base_seed: u64,
    ) -> Result<Vec<InferenceRun>> {
        let strategy = &self.strategy;
        let observers = Mutex::new(&mut self.observers);

        (0..self.restarts)
            .into_par_iter()
            .map(|restart| -> Result<InferenceRun> {
                let run = run_restart(strategy, matrix, controls, base_seed, restart);
                let summary = RestartSummary::from(&run);
                let mut guard = observers.lock().unwrap_or_else(PoisonError::into_inner);
                for observer in guard.iter_mut() {
                    observer.on_restart_complete(&summary)?;
                }
                Ok(run)
            })
            .collect()
    }

    fn run_sequential(
        &mut self,
        matrix: &LabelMatrix,
        controls: &Controls,
        base_seed: u64,
        patience: usize,
    ) -> Result<(Vec<InferenceRun>, bool)> {
        let mut runs: Vec<InferenceRun> = Vec::with_capacity(self.restarts);
        let mut stagnation = Stagnation::new(patience);

        for restart in 0..self.restarts {
            let run = run_restart(&self.strategy, matrix, controls, base_seed, restart);
            let summary = RestartSummary::from(&run);
            for observer in &mut self.observers {
                observer.on_restart_complete(&summary)?;
            }

            let exhausted = stagnation.record(run.score);
            runs.push(run);

            if exhausted {
                let stopped_early = restart + 1 < self.restarts;
                if stopped_early {
                    debug!(
                        restart,
                        patience, "no improvement within patience, stopping early"
                    );
                }
                return Ok((runs, stopped_early));
            }
        }

        Ok((runs, false))
    }
}

/// Counts consecutive restarts that failed to beat the best score so far.
#[derive(Debug, Clone)]
struct Stagnation {
    patience: usize,
    best: f64,
    stale: usize,
}

impl Stagnation {
    fn new(patience: usize) -> Self {
        Self {
            patience,
            best: f64::NEG_INFINITY,
            stale: 0,
        }
    }

    /// Record one restart's score. Returns true once `patience` restarts in a
    /// row have not strictly improved on the best; NaN never improves.
    fn record(&mut self, score: f64) -> bool {
        if score > self.best {
            self.best = score;
            self.stale = 0;
        } else {
            self.stale += 1;
        }
        self.stale >= self.patience
    }
}

fn run_restart(
    strategy: &Strategy,
    matrix: &LabelMatrix,
    controls: &Controls,
    base_seed: u64,
    restart: usize,
) -> InferenceRun {
    let seed = restart_seed(base_seed, restart);
    let mut run = strategy.run(matrix, controls, seed);
    run.restart = restart;
    debug!(
        restart,
        seed,
        score = run.score,
        iterations = run.iterations,
        converged = run.converged,
        "restart complete"
    );
    if !run.converged {
        warn!(
            restart,
            iterations = run.iterations,
            "restart hit the iteration cap before converging"
        );
    }
    run
}

/// Strictly higher score wins; a NaN incumbent loses to any number.
fn is_better(candidate: &InferenceRun, incumbent: &InferenceRun) -> bool {
    candidate.score > incumbent.score || (incumbent.score.is_nan() && !candidate.score.is_nan())
}
