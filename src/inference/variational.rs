//! Mean-field variational Bayes.
//!
//! Each annotator carries a Beta(α', β') posterior over its spamming
//! probability and a Dirichlet(d) posterior over its strategy. The E-step is
//! driven by expected log-parameters, and the score is the evidence lower
//! bound: summed log-normalizers minus the KL divergence of every variational
//! factor from its prior.

use rand::Rng;
use serde::{Deserialize, Serialize};
use statrs::function::gamma::{digamma, ln_gamma};

use super::{
    Estimator,
    estep::{AnnotatorCounts, ResponseWeights},
};
use crate::{matrix::LabelMatrix, model::AnnotatorModel};

/// Variational posterior of one annotator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariationalAnnotator {
    /// Beta shape on the spamming side
    pub spamming: f64,
    /// Beta shape on the trustworthy side
    pub trustworthy: f64,
    /// Dirichlet concentration over spam responses
    pub strategy: Vec<f64>,
}

impl VariationalAnnotator {
    /// Posterior-mean point summary.
    pub fn mean(&self) -> AnnotatorModel {
        let total: f64 = self.strategy.iter().sum();
        AnnotatorModel::new(
            self.spamming / (self.spamming + self.trustworthy),
            self.strategy.iter().map(|&d| d / total).collect(),
        )
    }

    fn expected_log_weights(&self) -> ResponseWeights {
        let psi_total = digamma(self.spamming + self.trustworthy);
        let ln_s = digamma(self.spamming) - psi_total;
        let psi_strategy = digamma(self.strategy.iter().sum());
        ResponseWeights {
            ln_trust: digamma(self.trustworthy) - psi_total,
            ln_spam: self
                .strategy
                .iter()
                .map(|&d| ln_s + digamma(d) - psi_strategy)
                .collect(),
        }
    }
}

/// Variational estimator with a Beta(`alpha`, `beta`) prior on spamming and
/// a symmetric Dirichlet(`smoothing`) prior on strategies.
#[derive(Debug, Clone, PartialEq)]
pub struct VariationalEstimator {
    alpha: f64,
    beta: f64,
    smoothing: f64,
    iterations: usize,
}

impl VariationalEstimator {
    pub fn new(alpha: f64, beta: f64, smoothing: f64, iterations: usize) -> Self {
        Self {
            alpha,
            beta,
            smoothing,
            iterations,
        }
    }

    fn kl_from_prior(&self, annotator: &VariationalAnnotator) -> f64 {
        kl_beta(
            annotator.spamming,
            annotator.trustworthy,
            self.alpha,
            self.beta,
        ) + kl_symmetric_dirichlet(&annotator.strategy, self.smoothing)
    }
}

impl Estimator for VariationalEstimator {
    type State = Vec<VariationalAnnotator>;

    fn iterations(&self) -> usize {
        self.iterations
    }

    /// Start from a random point model, expressed as pseudo-counts over as
    /// many annotations as the annotator actually made.
    fn initialize<R: Rng>(&self, matrix: &LabelMatrix, rng: &mut R) -> Self::State {
        (0..matrix.num_annotators())
            .map(|annotator| {
                let n = matrix.items_labeled_by(annotator).len() as f64;
                let model = AnnotatorModel::random(matrix.num_labels(), rng);
                let spam = model.spamming_probability * n;
                VariationalAnnotator {
                    spamming: self.alpha + spam,
                    trustworthy: self.beta + (n - spam),
                    strategy: model
                        .strategy
                        .iter()
                        .map(|&p| self.smoothing + p * spam)
                        .collect(),
                }
            })
            .collect()
    }

    fn response_weights(&self, state: &Self::State) -> Vec<ResponseWeights> {
        state
            .iter()
            .map(VariationalAnnotator::expected_log_weights)
            .collect()
    }

    fn maximize(&self, state: &mut Self::State, counts: &[AnnotatorCounts]) {
        for (annotator, counts) in state.iter_mut().zip(counts) {
            annotator.spamming = self.alpha + counts.spamming;
            annotator.trustworthy = self.beta + counts.trustworthy;
            for (d, &n) in annotator.strategy.iter_mut().zip(&counts.strategy) {
                *d = self.smoothing + n;
            }
        }
    }

    fn log_prior(&self, state: &Self::State) -> f64 {
        -state.iter().map(|a| self.kl_from_prior(a)).sum::<f64>()
    }

    fn annotator_models(&self, state: &Self::State) -> Vec<AnnotatorModel> {
        state.iter().map(VariationalAnnotator::mean).collect()
    }
}

fn ln_beta(a: f64, b: f64) -> f64 {
    ln_gamma(a) + ln_gamma(b) - ln_gamma(a + b)
}

/// KL(Beta(a1, b1) ‖ Beta(a2, b2)).
pub fn kl_beta(a1: f64, b1: f64, a2: f64, b2: f64) -> f64 {
    ln_beta(a2, b2) - ln_beta(a1, b1) + (a1 - a2) * digamma(a1) + (b1 - b2) * digamma(b1)
        - (a1 - a2 + b1 - b2) * digamma(a1 + b1)
}

/// KL(Dir(d) ‖ Dir(c, …, c)).
pub fn kl_symmetric_dirichlet(d: &[f64], c: f64) -> f64 {
    let k = d.len() as f64;
    let d0: f64 = d.iter().sum();
    let psi_d0 = digamma(d0);
    let cross: f64 = d
        .iter()
        .map(|&di| (di - c) * (digamma(di) - psi_d0) - ln_gamma(di))
        .sum();
    ln_gamma(d0) - ln_gamma(k * c) + k * ln_gamma(c) + cross
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kl_vanishes_at_the_prior() {
        assert!(kl_beta(0.5, 0.5, 0.5, 0.5).abs() < 1e-12);
        assert!(kl_symmetric_dirichlet(&[0.3, 0.3, 0.3], 0.3).abs() < 1e-10);
    }

    #[test]
    fn kl_is_positive_away_from_the_prior() {
        assert!(kl_beta(5.0, 1.0, 1.0, 1.0) > 0.0);
        assert!(kl_symmetric_dirichlet(&[4.0, 1.0], 1.0) > 0.0);
    }

    #[test]
    fn kl_beta_matches_dirichlet_with_two_categories() {
        let via_beta = kl_beta(3.0, 2.0, 1.5, 1.5);
        let via_dirichlet = kl_symmetric_dirichlet(&[3.0, 2.0], 1.5);
        assert!((via_beta - via_dirichlet).abs() < 1e-10);
    }

    #[test]
    fn update_adds_prior_pseudo_counts() {
        let estimator = VariationalEstimator::new(0.5, 0.7, 0.1, 10);
        let mut state = vec![VariationalAnnotator {
            spamming: 1.0,
            trustworthy: 1.0,
            strategy: vec![1.0, 1.0],
        }];
        let counts = [AnnotatorCounts {
            spamming: 1.5,
            trustworthy: 2.5,
            strategy: vec![1.0, 0.5],
        }];
        estimator.maximize(&mut state, &counts);
        assert!((state[0].spamming - 2.0).abs() < 1e-12);
        assert!((state[0].trustworthy - 3.2).abs() < 1e-12);
        assert!((state[0].strategy[0] - 1.1).abs() < 1e-12);
        assert!((state[0].strategy[1] - 0.6).abs() < 1e-12);

        let mean = state[0].mean();
        assert!((mean.spamming_probability - 2.0 / 5.2).abs() < 1e-12);
    }

    #[test]
    fn expected_log_weights_sit_below_log_means() {
        let annotator = VariationalAnnotator {
            spamming: 2.0,
            trustworthy: 6.0,
            strategy: vec![1.0, 3.0],
        };
        let weights = annotator.expected_log_weights();
        let mean = annotator.mean();
        // Jensen: E[ln x] <= ln E[x]
        assert!(weights.ln_trust < mean.competence().ln());
        for (l, &w) in weights.ln_spam.iter().enumerate() {
            assert!(w < (mean.spamming_probability * mean.strategy[l]).ln());
        }
    }
}
