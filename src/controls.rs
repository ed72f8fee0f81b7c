//! Known gold labels for a subset of items.
//!
//! A controlled item's true label is treated as observed: its posterior is a
//! point mass and it contributes evidence conditioned on that label.

use crate::{
    Error, Result,
    matrix::{LabelAlphabet, LabelMatrix},
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Controls {
    labels: Vec<Option<usize>>,
}

impl Controls {
    /// No controlled items.
    pub fn none(num_instances: usize) -> Self {
        Self {
            labels: vec![None; num_instances],
        }
    }

    /// Build from per-item optional label indices.
    ///
    /// # Errors
    ///
    /// Fails if the length differs from the matrix or a label is outside its
    /// alphabet.
    pub fn new(labels: Vec<Option<usize>>, matrix: &LabelMatrix) -> Result<Self> {
        if labels.len() != matrix.num_instances() {
            return Err(Error::ControlsLength {
                expected: matrix.num_instances(),
                got: labels.len(),
            });
        }
        for (item, label) in labels.iter().enumerate() {
            if let Some(label) = *label
                && label >= matrix.num_labels()
            {
                return Err(Error::ControlOutOfRange {
                    item,
                    label,
                    num_labels: matrix.num_labels(),
                });
            }
        }
        Ok(Self { labels })
    }

    /// Build from one token per item; blank tokens leave the item uncontrolled.
    pub fn from_tokens<S: AsRef<str>>(
        tokens: &[S],
        alphabet: &LabelAlphabet,
        matrix: &LabelMatrix,
    ) -> Result<Self> {
        let labels = tokens
            .iter()
            .enumerate()
            .map(|(line, token)| {
                let token = token.as_ref().trim();
                if token.is_empty() {
                    return Ok(None);
                }
                alphabet
                    .index_of(token)
                    .map(Some)
                    .ok_or_else(|| Error::UnknownLabel {
                        token: token.to_string(),
                        line: line + 1,
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(labels, matrix)
    }

    pub fn label(&self, item: usize) -> Option<usize> {
        self.labels.get(item).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Number of items with a known label.
    pub fn num_controlled(&self) -> usize {
        self.labels.iter().filter(|l| l.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix() -> (LabelMatrix, LabelAlphabet) {
        LabelMatrix::from_tokens(&[vec!["a", "b"], vec!["b", "b"], vec!["a", ""]]).unwrap()
    }

    #[test]
    fn tokens_map_through_alphabet() {
        let (matrix, alphabet) = matrix();
        let controls = Controls::from_tokens(&["b", "", " a "], &alphabet, &matrix).unwrap();
        assert_eq!(controls.label(0), Some(1));
        assert_eq!(controls.label(1), None);
        assert_eq!(controls.label(2), Some(0));
        assert_eq!(controls.num_controlled(), 2);
    }

    #[test]
    fn unknown_tokens_and_wrong_length_fail() {
        let (matrix, alphabet) = matrix();
        let err = Controls::from_tokens(&["c", "", ""], &alphabet, &matrix).unwrap_err();
        assert!(matches!(err, Error::UnknownLabel { ref token, line: 1 } if token == "c"));

        let err = Controls::from_tokens(&["a"], &alphabet, &matrix).unwrap_err();
        assert!(matches!(
            err,
            Error::ControlsLength {
                expected: 3,
                got: 1
            }
        ));
    }

    #[test]
    fn empty_controls_pin_nothing() {
        let controls = Controls::none(3);
        assert_eq!(controls.num_controlled(), 0);
        assert_eq!(controls.label(5), None);
    }
}
