//! Per-annotator behavior parameters.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::utils::{NormalizationFallback, normalize_weights};

/// Initial spamming probabilities are drawn from this open interior range.
const INITIAL_SPAMMING_RANGE: std::ops::Range<f64> = 0.05..0.95;

/// Point estimate of one annotator's behavior.
///
/// With probability `spamming_probability` the annotator ignores the item and
/// answers from `strategy`; otherwise it reports the true label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatorModel {
    pub spamming_probability: f64,
    pub strategy: Vec<f64>,
}

impl AnnotatorModel {
    pub fn new(spamming_probability: f64, strategy: Vec<f64>) -> Self {
        Self {
            spamming_probability,
            strategy,
        }
    }

    /// Random starting point for one restart.
    pub fn random<R: Rng>(num_labels: usize, rng: &mut R) -> Self {
        let spamming_probability = rng.random_range(INITIAL_SPAMMING_RANGE);
        let draws: Vec<f64> = (0..num_labels)
            .map(|_| rng.random_range(0.0..1.0) + f64::EPSILON)
            .collect();
        let strategy = normalize_weights(draws, NormalizationFallback::Uniform).unwrap_or_default();
        Self {
            spamming_probability,
            strategy,
        }
    }

    /// Probability of reporting the true label, `1 - spamming_probability`.
    pub fn competence(&self) -> f64 {
        1.0 - self.spamming_probability
    }

    /// `[spamming, trustworthy]` pair.
    pub fn theta(&self) -> [f64; 2] {
        [self.spamming_probability, self.competence()]
    }

    /// Probability of emitting `label` given the true label `truth`.
    pub fn response_probability(&self, label: usize, truth: usize) -> f64 {
        let spam = self.spamming_probability * self.strategy[label];
        if label == truth {
            self.competence() + spam
        } else {
            spam
        }
    }
}
