//! Sparse item × annotator label matrix.
//!
//! Annotations are stored CSR-style: one flat vector of `(annotator, label)`
//! pairs ordered by item, plus per-item offsets. Every item is guaranteed to
//! carry at least one annotation, and every label is a dense index into a
//! shared alphabet. The matrix is immutable once built.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A single observed annotation on an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub annotator: usize,
    pub label: usize,
}

/// Immutable sparse label matrix.
#[derive(Debug, Clone)]
pub struct LabelMatrix {
    num_annotators: usize,
    num_labels: usize,
    offsets: Vec<usize>,
    annotations: Vec<Annotation>,
    items_by_annotator: Vec<Vec<usize>>,
}

impl LabelMatrix {
    /// Build a matrix from dense rows of optional label indices.
    ///
    /// # Errors
    ///
    /// Returns a malformed-input error when there are no rows, rows have
    /// different lengths, a row has no annotations, or a label is not below
    /// `num_labels`.
    pub fn from_rows(rows: &[Vec<Option<usize>>], num_labels: usize) -> Result<Self> {
        let Some(first) = rows.first() else {
            return Err(Error::EmptyMatrix);
        };
        let num_annotators = first.len();

        let mut offsets = Vec::with_capacity(rows.len() + 1);
        let mut annotations = Vec::new();
        let mut items_by_annotator = vec![Vec::new(); num_annotators];
        offsets.push(0);

        for (item, row) in rows.iter().enumerate() {
            if row.len() != num_annotators {
                return Err(Error::RaggedRow {
                    item,
                    expected: num_annotators,
                    got: row.len(),
                });
            }
            let before = annotations.len();
            for (annotator, cell) in row.iter().enumerate() {
                let Some(label) = *cell else { continue };
                if label >= num_labels {
                    return Err(Error::LabelOutOfRange {
                        item,
                        annotator,
                        label,
                        num_labels,
                    });
                }
                annotations.push(Annotation { annotator, label });
                items_by_annotator[annotator].push(item);
            }
            if annotations.len() == before {
                return Err(Error::EmptyItem { item });
            }
            offsets.push(annotations.len());
        }

        Ok(Self {
            num_annotators,
            num_labels,
            offsets,
            annotations,
            items_by_annotator,
        })
    }

    /// Build a matrix from string cells, deriving the alphabet from the
    /// distinct non-empty tokens. Blank cells are treated as missing.
    pub fn from_tokens<S: AsRef<str>>(rows: &[Vec<S>]) -> Result<(Self, LabelAlphabet)> {
        let alphabet = LabelAlphabet::from_tokens(
            rows.iter()
                .flat_map(|row| row.iter())
                .map(|cell| cell.as_ref()),
        );
        let indexed: Vec<Vec<Option<usize>>> = rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| alphabet.index_of(cell.as_ref().trim()))
                    .collect()
            })
            .collect();
        let matrix = Self::from_rows(&indexed, alphabet.len())?;
        Ok((matrix, alphabet))
    }

    pub fn num_instances(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn num_annotators(&self) -> usize {
        self.num_annotators
    }

    pub fn num_labels(&self) -> usize {
        self.num_labels
    }

    /// Total number of observed (non-missing) cells.
    pub fn num_annotations(&self) -> usize {
        self.annotations.len()
    }

    /// Annotations present on `item`, in ascending annotator order.
    pub fn annotations(&self, item: usize) -> &[Annotation] {
        &self.annotations[self.offsets[item]..self.offsets[item + 1]]
    }

    /// Items labeled by `annotator`, in ascending item order.
    pub fn items_labeled_by(&self, annotator: usize) -> &[usize] {
        &self.items_by_annotator[annotator]
    }

    /// Label `annotator` gave to `item`, if any.
    pub fn label(&self, item: usize, annotator: usize) -> Option<usize> {
        self.annotations(item)
            .iter()
            .find(|a| a.annotator == annotator)
            .map(|a| a.label)
    }

    /// Return the matrix as dense rows of optional labels.
    pub fn to_rows(&self) -> Vec<Vec<Option<usize>>> {
        (0..self.num_instances())
            .map(|item| {
                let mut row = vec![None; self.num_annotators];
                for annotation in self.annotations(item) {
                    row[annotation.annotator] = Some(annotation.label);
                }
                row
            })
            .collect()
    }

    /// Copy of this matrix with one extra annotator column appended.
    ///
    /// # Errors
    ///
    /// Fails if `column` has the wrong length or contains out-of-range labels.
    pub fn with_annotator(&self, column: &[Option<usize>]) -> Result<Self> {
        if column.len() != self.num_instances() {
            return Err(Error::ColumnLength {
                expected: self.num_instances(),
                got: column.len(),
            });
        }
        let rows: Vec<Vec<Option<usize>>> = self
            .to_rows()
            .into_iter()
            .zip(column)
            .map(|(mut row, &cell)| {
                row.push(cell);
                row
            })
            .collect();
        Self::from_rows(&rows, self.num_labels)
    }
}

/// Mapping between label tokens and dense label indices.
///
/// Tokens are kept sorted so the same annotations always produce the same
/// indices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LabelAlphabet {
    tokens: Vec<String>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl LabelAlphabet {
    pub fn from_tokens<'a, I>(tokens: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let unique: BTreeSet<&str> = tokens
            .into_iter()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect();
        let tokens: Vec<String> = unique.into_iter().map(str::to_string).collect();
        Self::from_sorted(tokens)
    }

    fn from_sorted(tokens: Vec<String>) -> Self {
        let index = tokens
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();
        Self { tokens, index }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn index_of(&self, token: &str) -> Option<usize> {
        self.index.get(token).copied()
    }

    pub fn token(&self, index: usize) -> Option<&str> {
        self.tokens.get(index).map(String::as_str)
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_expose_annotations_per_item_and_annotator() {
        let rows = vec![
            vec![Some(0), None, Some(1)],
            vec![None, Some(1), None],
            vec![Some(1), Some(1), Some(0)],
        ];
        let matrix = LabelMatrix::from_rows(&rows, 2).unwrap();

        assert_eq!(matrix.num_instances(), 3);
        assert_eq!(matrix.num_annotators(), 3);
        assert_eq!(matrix.num_annotations(), 6);
        assert_eq!(
            matrix.annotations(0),
            &[
                Annotation {
                    annotator: 0,
                    label: 0
                },
                Annotation {
                    annotator: 2,
                    label: 1
                }
            ]
        );
        assert_eq!(matrix.items_labeled_by(1), &[1, 2]);
        assert_eq!(matrix.label(1, 0), None);
        assert_eq!(matrix.to_rows(), rows);
    }

    #[test]
    fn empty_item_is_rejected() {
        let rows = vec![vec![Some(0), Some(0)], vec![None, None]];
        let err = LabelMatrix::from_rows(&rows, 2).unwrap_err();
        assert!(matches!(err, Error::EmptyItem { item: 1 }));
        assert!(err.is_malformed_input());
    }

    #[test]
    fn out_of_range_label_is_rejected() {
        let rows = vec![vec![Some(0), Some(3)]];
        let err = LabelMatrix::from_rows(&rows, 2).unwrap_err();
        assert!(matches!(
            err,
            Error::LabelOutOfRange {
                item: 0,
                annotator: 1,
                label: 3,
                num_labels: 2
            }
        ));
    }

    #[test]
    fn ragged_and_empty_inputs_are_rejected() {
        let ragged = vec![vec![Some(0), Some(1)], vec![Some(0)]];
        assert!(matches!(
            LabelMatrix::from_rows(&ragged, 2),
            Err(Error::RaggedRow {
                item: 1,
                expected: 2,
                got: 1
            })
        ));
        assert!(matches!(
            LabelMatrix::from_rows(&[], 2),
            Err(Error::EmptyMatrix)
        ));
    }

    #[test]
    fn tokens_build_sorted_alphabet() {
        let rows = vec![vec!["pos", "", "neg"], vec![" neu ", "pos", ""]];
        let (matrix, alphabet) = LabelMatrix::from_tokens(&rows).unwrap();

        assert_eq!(alphabet.tokens(), &["neg", "neu", "pos"]);
        assert_eq!(matrix.num_labels(), 3);
        assert_eq!(matrix.label(0, 0), Some(2));
        assert_eq!(matrix.label(0, 1), None);
        assert_eq!(matrix.label(1, 0), Some(1));
    }

    #[test]
    fn appended_annotator_column() {
        let rows = vec![vec![Some(0)], vec![Some(1)]];
        let matrix = LabelMatrix::from_rows(&rows, 2).unwrap();
        let extended = matrix.with_annotator(&[Some(1), None]).unwrap();

        assert_eq!(extended.num_annotators(), 2);
        assert_eq!(extended.label(0, 1), Some(1));
        assert_eq!(extended.items_labeled_by(1), &[0]);
    }

    #[test]
    fn appended_column_must_cover_every_item() {
        let rows = vec![vec![Some(0)], vec![Some(1)]];
        let matrix = LabelMatrix::from_rows(&rows, 2).unwrap();
        for column in [vec![Some(0)], vec![Some(0), None, Some(1)]] {
            let err = matrix.with_annotator(&column).unwrap_err();
            assert!(matches!(
                err,
                Error::ColumnLength { expected: 2, got } if got == column.len()
            ));
            assert!(err.is_malformed_input());
        }
    }
}
