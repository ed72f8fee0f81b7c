//! Hyperparameters for an inference run.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Which estimator the restarts run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InferenceMode {
    /// Smoothed maximum-likelihood expectation-maximization
    #[default]
    Em,
    /// Mean-field variational Bayes with Beta/Dirichlet priors
    Variational,
}

/// Configuration for an inference run.
///
/// Every field is explicit; [`InferenceConfig::for_labels`] provides the
/// conventional starting values and the `with_*` methods adjust them.
///
/// # Examples
///
/// ```
/// use mace::config::{InferenceConfig, InferenceMode};
///
/// let config = InferenceConfig::for_labels(3)
///     .with_restarts(5)
///     .with_mode(InferenceMode::Variational)
///     .with_seed(42);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Maximum number of EM steps per restart
    pub iterations: usize,
    /// Pseudo-count added to every expected count
    pub smoothing: f64,
    /// Number of independent random restarts
    pub restarts: usize,
    /// Beta prior pseudo-count on spamming (variational mode)
    pub alpha: f64,
    /// Beta prior pseudo-count on trustworthy answers (variational mode)
    pub beta: f64,
    /// Estimator to run
    pub mode: InferenceMode,
    /// Minimum posterior mass needed to commit to a label
    pub threshold: f64,
    /// Base random seed; restart `r` uses `seed + r`
    pub seed: Option<u64>,
    /// Stop after this many consecutive restarts without improvement
    pub patience: Option<usize>,
}

impl InferenceConfig {
    /// Conventional defaults for an alphabet of `num_labels` labels:
    /// 50 iterations, 10 restarts, smoothing `0.01 / num_labels`,
    /// `alpha = beta = 0.5`, threshold 1.0, EM.
    pub fn for_labels(num_labels: usize) -> Self {
        Self {
            iterations: 50,
            smoothing: 0.01 / num_labels.max(1) as f64,
            restarts: 10,
            alpha: 0.5,
            beta: 0.5,
            mode: InferenceMode::Em,
            threshold: 1.0,
            seed: None,
            patience: None,
        }
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_smoothing(mut self, smoothing: f64) -> Self {
        self.smoothing = smoothing;
        self
    }

    pub fn with_restarts(mut self, restarts: usize) -> Self {
        self.restarts = restarts;
        self
    }

    /// Set the Beta prior used in variational mode.
    pub fn with_prior(mut self, alpha: f64, beta: f64) -> Self {
        self.alpha = alpha;
        self.beta = beta;
        self
    }

    pub fn with_mode(mut self, mode: InferenceMode) -> Self {
        self.mode = mode;
        self
    }

    /// Shorthand for switching between EM and variational mode.
    pub fn with_variational(self, variational: bool) -> Self {
        self.with_mode(if variational {
            InferenceMode::Variational
        } else {
            InferenceMode::Em
        })
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the random seed for deterministic behavior.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_patience(mut self, patience: usize) -> Self {
        self.patience = Some(patience);
        self
    }

    pub fn is_variational(&self) -> bool {
        self.mode == InferenceMode::Variational
    }

    /// Check every hyperparameter range.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(Error::invalid_config("iterations must be at least 1"));
        }
        if self.restarts == 0 {
            return Err(Error::invalid_config("restarts must be at least 1"));
        }
        check_positive("smoothing", self.smoothing)?;
        check_positive("alpha", self.alpha)?;
        check_positive("beta", self.beta)?;
        validate_threshold(self.threshold)?;
        if self.patience == Some(0) {
            return Err(Error::invalid_config("patience must be at least 1"));
        }
        Ok(())
    }
}

/// Decoding thresholds must lie in `(0, 1]`.
pub(crate) fn validate_threshold(threshold: f64) -> Result<()> {
    if threshold.is_finite() && threshold > 0.0 && threshold <= 1.0 {
        Ok(())
    } else {
        Err(Error::invalid_config(format!(
            "threshold must lie in (0, 1], got {threshold}"
        )))
    }
}

fn check_positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::invalid_config(format!(
            "{name} must be positive and finite, got {value}"
        )))
    }
}
