//! Turning item posteriors into committed labels.

use serde::{Deserialize, Serialize};

use crate::{
    Result,
    config::validate_threshold,
    matrix::LabelAlphabet,
    model::{ItemPosterior, PosteriorTable},
};

/// Decoded answer for one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Prediction {
    Label(usize),
    /// Not enough posterior mass on any label
    Abstain,
}

impl Prediction {
    pub fn label(&self) -> Option<usize> {
        match self {
            Prediction::Label(label) => Some(*label),
            Prediction::Abstain => None,
        }
    }

    pub fn is_abstain(&self) -> bool {
        matches!(self, Prediction::Abstain)
    }

    /// Token for this prediction; abstentions render as the empty string.
    pub fn render<'a>(&self, alphabet: &'a LabelAlphabet) -> &'a str {
        self.label()
            .and_then(|label| alphabet.token(label))
            .unwrap_or("")
    }
}

/// Threshold decoder.
///
/// A threshold of exactly 1.0 means "always answer": the most probable label
/// is emitted for every item. Any lower threshold makes the decoder abstain on
/// items whose best label has less posterior mass than the threshold.
///
/// # Examples
///
/// ```
/// use mace::decode::{Decoder, Prediction};
/// use mace::model::PosteriorTable;
///
/// let table = PosteriorTable::from_rows(&[vec![0.9, 0.1], vec![0.55, 0.45]], 2).unwrap();
/// let decoder = Decoder::new(0.8).unwrap();
/// assert_eq!(
///     decoder.decode(&table),
///     vec![Prediction::Label(0), Prediction::Abstain]
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decoder {
    threshold: f64,
}

impl Default for Decoder {
    fn default() -> Self {
        Self { threshold: 1.0 }
    }
}

impl Decoder {
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidConfiguration`] unless
    /// `0 < threshold <= 1`.
    pub fn new(threshold: f64) -> Result<Self> {
        validate_threshold(threshold)?;
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn decode_item(&self, posterior: ItemPosterior<'_>) -> Prediction {
        let label = posterior.argmax();
        if self.threshold >= 1.0 || posterior.probabilities()[label] >= self.threshold {
            Prediction::Label(label)
        } else {
            Prediction::Abstain
        }
    }

    pub fn decode(&self, posteriors: &PosteriorTable) -> Vec<Prediction> {
        posteriors.iter().map(|p| self.decode_item(p)).collect()
    }
}

/// Number of predictions that committed to a label.
pub fn coverage_count(predictions: &[Prediction]) -> usize {
    predictions.iter().filter(|p| !p.is_abstain()).count()
}
