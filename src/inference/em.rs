//! Smoothed maximum-likelihood EM.
//!
//! The additive smoothing `c` is equivalent to a Beta(1 + c, 1 + c) prior on
//! each spamming probability and a symmetric Dirichlet(1 + c) prior on each
//! strategy, so the quantity EM climbs is the penalized log-likelihood
//! `LL + Σ_j c·[ln s_j + ln(1 − s_j) + Σ_l ln strategy_j[l]]`.

use rand::Rng;

use super::{
    Estimator,
    estep::{AnnotatorCounts, ResponseWeights},
};
use crate::{matrix::LabelMatrix, model::AnnotatorModel};

/// Expectation-maximization over point estimates of the annotator models.
#[derive(Debug, Clone, PartialEq)]
pub struct EmEngine {
    smoothing: f64,
    iterations: usize,
}

impl EmEngine {
    pub fn new(smoothing: f64, iterations: usize) -> Self {
        Self {
            smoothing,
            iterations,
        }
    }

    pub fn smoothing(&self) -> f64 {
        self.smoothing
    }

    /// Re-estimate one annotator from its expected counts.
    fn reestimate(&self, counts: &AnnotatorCounts) -> AnnotatorModel {
        let c = self.smoothing;
        let num_labels = counts.strategy.len() as f64;
        let spamming_probability = (counts.spamming + c) / (counts.total() + 2.0 * c);
        let strategy_total = counts.spamming + num_labels * c;
        let strategy = counts
            .strategy
            .iter()
            .map(|&n| (n + c) / strategy_total)
            .collect();
        AnnotatorModel::new(spamming_probability, strategy)
    }
}

impl Estimator for EmEngine {
    type State = Vec<AnnotatorModel>;

    fn iterations(&self) -> usize {
        self.iterations
    }

    fn initialize<R: Rng>(&self, matrix: &LabelMatrix, rng: &mut R) -> Self::State {
        (0..matrix.num_annotators())
            .map(|_| AnnotatorModel::random(matrix.num_labels(), rng))
            .collect()
    }

    fn response_weights(&self, state: &Self::State) -> Vec<ResponseWeights> {
        state.iter().map(ResponseWeights::from_model).collect()
    }

    fn maximize(&self, state: &mut Self::State, counts: &[AnnotatorCounts]) {
        for (model, counts) in state.iter_mut().zip(counts) {
            *model = self.reestimate(counts);
        }
    }

    fn log_prior(&self, state: &Self::State) -> f64 {
        let c = self.smoothing;
        state
            .iter()
            .map(|model| {
                let s = model.spamming_probability;
                let strategy: f64 = model.strategy.iter().map(|p| p.ln()).sum();
                c * (s.ln() + (1.0 - s).ln() + strategy)
            })
            .sum()
    }

    fn annotator_models(&self, state: &Self::State) -> Vec<AnnotatorModel> {
        state.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reestimate_adds_smoothing_to_every_count() {
        let engine = EmEngine::new(0.5, 10);
        let counts = AnnotatorCounts {
            spamming: 2.0,
            trustworthy: 6.0,
            strategy: vec![2.0, 0.0],
        };
        let model = engine.reestimate(&counts);
        assert!((model.spamming_probability - 2.5 / 9.0).abs() < 1e-12);
        assert!((model.strategy[0] - 2.5 / 3.0).abs() < 1e-12);
        assert!((model.strategy[1] - 0.5 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn zero_evidence_never_collapses_to_zero() {
        let engine = EmEngine::new(1e-3, 10);
        let counts = AnnotatorCounts {
            spamming: 0.0,
            trustworthy: 4.0,
            strategy: vec![0.0, 0.0, 0.0],
        };
        let model = engine.reestimate(&counts);
        assert!(model.spamming_probability > 0.0);
        assert!(model.strategy.iter().all(|&p| p > 0.0));
        let total: f64 = model.strategy.iter().sum();
        assert!((total - 1.0).abs() < 1e-12);
    }
}
