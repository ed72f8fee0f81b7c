//! Shared expectation step.
//!
//! Both estimators describe each annotator by log-domain response weights:
//! `ln_trust` for reporting the truth and `ln_spam[l]` for emitting label `l`
//! while spamming. For EM these are log point estimates; for variational
//! inference they are expected log-parameters. Given the weights, the item
//! posteriors, the log-evidence and the expected behavior counts all follow
//! from one pass over the annotations.

use crate::{
    controls::Controls,
    matrix::LabelMatrix,
    model::{AnnotatorModel, PosteriorTable},
    utils::{log_add_exp, normalize_log_weights},
};

/// Log-domain response weights for one annotator.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseWeights {
    pub ln_trust: f64,
    pub ln_spam: Vec<f64>,
}

impl ResponseWeights {
    /// Weights of a point-estimate model.
    pub fn from_model(model: &AnnotatorModel) -> Self {
        let ln_s = model.spamming_probability.ln();
        Self {
            ln_trust: model.competence().ln(),
            ln_spam: model.strategy.iter().map(|p| ln_s + p.ln()).collect(),
        }
    }

    /// Log weight of emitting `label` when the truth is also `label`.
    fn ln_match(&self, label: usize) -> f64 {
        log_add_exp(self.ln_trust, self.ln_spam[label])
    }

    /// Probability that an annotation matching the truth was nevertheless spam.
    fn spam_given_match(&self, label: usize) -> f64 {
        let ln_match = self.ln_match(label);
        if ln_match == f64::NEG_INFINITY {
            return 0.0;
        }
        (self.ln_spam[label] - ln_match).exp()
    }
}

/// Expected behavior counts of one annotator over all its annotations.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatorCounts {
    pub spamming: f64,
    pub trustworthy: f64,
    /// Expected spam mass on each emitted label; sums to `spamming`.
    pub strategy: Vec<f64>,
}

impl AnnotatorCounts {
    fn zeros(num_labels: usize) -> Self {
        Self {
            spamming: 0.0,
            trustworthy: 0.0,
            strategy: vec![0.0; num_labels],
        }
    }

    pub fn total(&self) -> f64 {
        self.spamming + self.trustworthy
    }
}

/// Result of one expectation pass.
#[derive(Debug, Clone)]
pub struct Expectation {
    /// Sum over items of the log normalizer of each item's posterior
    pub log_evidence: f64,
    pub counts: Vec<AnnotatorCounts>,
}

/// Recompute every item posterior in `posteriors` and accumulate the
/// expected counts the maximization step needs.
pub fn expectation(
    matrix: &LabelMatrix,
    controls: &Controls,
    weights: &[ResponseWeights],
    posteriors: &mut PosteriorTable,
) -> Expectation {
    let num_labels = matrix.num_labels();
    let ln_prior = -(num_labels as f64).ln();
    let mut counts = vec![AnnotatorCounts::zeros(num_labels); matrix.num_annotators()];
    let mut log_evidence = 0.0;
    let mut scores = vec![0.0; num_labels];

    for item in 0..matrix.num_instances() {
        let annotations = matrix.annotations(item);

        for (truth, score) in scores.iter_mut().enumerate() {
            *score = ln_prior
                + annotations
                    .iter()
                    .map(|a| {
                        let w = &weights[a.annotator];
                        if a.label == truth {
                            w.ln_match(a.label)
                        } else {
                            w.ln_spam[a.label]
                        }
                    })
                    .sum::<f64>();
        }

        let posterior = posteriors.item_mut(item);
        match controls.label(item) {
            Some(gold) => {
                log_evidence += scores[gold];
                posterior.fill(0.0);
                posterior[gold] = 1.0;
            }
            None => {
                log_evidence += normalize_log_weights(&mut scores);
                posterior.copy_from_slice(&scores);
            }
        }

        for annotation in annotations {
            let w = &weights[annotation.annotator];
            let q_match = posterior[annotation.label];
            let spam = (1.0 - q_match) + q_match * w.spam_given_match(annotation.label);
            let entry = &mut counts[annotation.annotator];
            entry.spamming += spam;
            entry.trustworthy += 1.0 - spam;
            entry.strategy[annotation.label] += spam;
        }
    }

    Expectation {
        log_evidence,
        counts,
    }
}

/// Data log-likelihood of the matrix under point-estimate annotator models.
pub fn log_likelihood(matrix: &LabelMatrix, controls: &Controls, models: &[AnnotatorModel]) -> f64 {
    let weights: Vec<ResponseWeights> = models.iter().map(ResponseWeights::from_model).collect();
    let mut scratch = PosteriorTable::uniform(matrix.num_instances(), matrix.num_labels());
    expectation(matrix, controls, &weights, &mut scratch).log_evidence
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brute_force_evidence(matrix: &LabelMatrix, models: &[AnnotatorModel]) -> f64 {
        let l = matrix.num_labels();
        (0..matrix.num_instances())
            .map(|item| {
                let total: f64 = (0..l)
                    .map(|truth| {
                        matrix
                            .annotations(item)
                            .iter()
                            .map(|a| models[a.annotator].response_probability(a.label, truth))
                            .product::<f64>()
                            / l as f64
                    })
                    .sum();
                total.ln()
            })
            .sum()
    }

    fn fixture() -> (LabelMatrix, Vec<AnnotatorModel>) {
        let rows = vec![
            vec![Some(0), Some(0), Some(1)],
            vec![Some(2), None, Some(2)],
            vec![None, Some(1), Some(1)],
        ];
        let matrix = LabelMatrix::from_rows(&rows, 3).unwrap();
        let models = vec![
            AnnotatorModel::new(0.2, vec![0.5, 0.3, 0.2]),
            AnnotatorModel::new(0.6, vec![0.1, 0.8, 0.1]),
            AnnotatorModel::new(0.4, vec![0.3, 0.3, 0.4]),
        ];
        (matrix, models)
    }

    #[test]
    fn evidence_matches_direct_enumeration() {
        let (matrix, models) = fixture();
        let controls = Controls::none(matrix.num_instances());
        let expected = brute_force_evidence(&matrix, &models);
        let actual = log_likelihood(&matrix, &controls, &models);
        assert!(
            (expected - actual).abs() < 1e-12,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn posteriors_are_normalized_and_counts_conserved() {
        let (matrix, models) = fixture();
        let controls = Controls::none(matrix.num_instances());
        let weights: Vec<_> = models.iter().map(ResponseWeights::from_model).collect();
        let mut posteriors = PosteriorTable::uniform(3, 3);
        let e = expectation(&matrix, &controls, &weights, &mut posteriors);

        for posterior in posteriors.iter() {
            assert!((posterior.total() - 1.0).abs() < 1e-12);
        }
        for (annotator, counts) in e.counts.iter().enumerate() {
            let n = matrix.items_labeled_by(annotator).len() as f64;
            assert!((counts.total() - n).abs() < 1e-12);
            let strategy_total: f64 = counts.strategy.iter().sum();
            assert!((strategy_total - counts.spamming).abs() < 1e-12);
            assert!(counts.spamming >= 0.0 && counts.trustworthy >= 0.0);
        }
    }

    #[test]
    fn controlled_items_get_point_mass() {
        let (matrix, models) = fixture();
        let controls = Controls::new(vec![None, Some(0), None], &matrix).unwrap();
        let weights: Vec<_> = models.iter().map(ResponseWeights::from_model).collect();
        let mut posteriors = PosteriorTable::uniform(3, 3);
        expectation(&matrix, &controls, &weights, &mut posteriors);

        assert_eq!(posteriors.item(1).probabilities(), &[1.0, 0.0, 0.0]);
        // Both annotators said 2 while the truth is 0, so both were spamming.
        let e = expectation(&matrix, &controls, &weights, &mut posteriors);
        assert!(e.counts[0].spamming >= 1.0 - 1e-12);
    }
}
