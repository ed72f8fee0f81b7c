//! Scoring decoded labels against a gold standard.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Counts behind accuracy and coverage.
///
/// Items whose gold token is empty are not scored. Among the rest, an empty
/// prediction counts as an abstention.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Items with a gold label
    pub gold_items: usize,
    /// Gold items the decoder committed on
    pub predicted: usize,
    /// Committed predictions matching gold
    pub correct: usize,
}

impl Evaluation {
    /// Fraction of committed predictions that match gold.
    pub fn accuracy(&self) -> f64 {
        if self.predicted == 0 {
            0.0
        } else {
            self.correct as f64 / self.predicted as f64
        }
    }

    /// Fraction of gold items that received a prediction.
    pub fn coverage(&self) -> f64 {
        if self.gold_items == 0 {
            0.0
        } else {
            self.predicted as f64 / self.gold_items as f64
        }
    }
}

/// Compare prediction tokens with gold tokens line by line.
///
/// # Errors
///
/// Returns [`Error::GoldLength`] when the lists differ in length.
///
/// # Examples
///
/// ```
/// use mace::evaluation::evaluate;
///
/// let scores = evaluate(&["a", "", "b", "b"], &["a", "b", "a", ""]).unwrap();
/// assert_eq!(scores.gold_items, 3);
/// assert_eq!(scores.predicted, 2);
/// assert_eq!(scores.correct, 1);
/// assert_eq!(scores.accuracy(), 0.5);
/// ```
pub fn evaluate<P, G>(predictions: &[P], gold: &[G]) -> Result<Evaluation>
where
    P: AsRef<str>,
    G: AsRef<str>,
{
    if predictions.len() != gold.len() {
        return Err(Error::GoldLength {
            expected: predictions.len(),
            got: gold.len(),
        });
    }

    let mut evaluation = Evaluation::default();
    for (prediction, truth) in predictions.iter().zip(gold) {
        let truth = truth.as_ref().trim();
        if truth.is_empty() {
            continue;
        }
        evaluation.gold_items += 1;

        let prediction = prediction.as_ref().trim();
        if prediction.is_empty() {
            continue;
        }
        evaluation.predicted += 1;
        if prediction == truth {
            evaluation.correct += 1;
        }
    }
    Ok(evaluation)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_predictions() {
        let scores = evaluate(&["x", "y"], &["x", "y"]).unwrap();
        assert_eq!(scores.accuracy(), 1.0);
        assert_eq!(scores.coverage(), 1.0);
    }

    #[test]
    fn abstentions_lower_coverage_only() {
        let scores = evaluate(&["x", "", ""], &["x", "y", "y"]).unwrap();
        assert_eq!(scores.accuracy(), 1.0);
        assert!((scores.coverage() - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn length_mismatch_is_malformed_input() {
        let err = evaluate(&["x"], &["x", "y"]).unwrap_err();
        assert!(matches!(err, Error::GoldLength { expected: 1, got: 2 }));
        assert!(err.is_malformed_input());
    }

    #[test]
    fn empty_gold_scores_zero() {
        let scores = evaluate(&["x"], &[""]).unwrap();
        assert_eq!(scores, Evaluation::default());
        assert_eq!(scores.accuracy(), 0.0);
        assert_eq!(scores.coverage(), 0.0);
    }
}
