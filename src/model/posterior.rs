//! Dense storage for per-item label posteriors.

use serde::{Deserialize, Serialize};

use crate::{Error, Result, utils::shannon_entropy};

/// Posterior distributions for every item, stored row-major in one buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosteriorTable {
    num_labels: usize,
    values: Vec<f64>,
}

impl PosteriorTable {
    /// Uniform posteriors for `num_instances` items.
    pub fn uniform(num_instances: usize, num_labels: usize) -> Self {
        let p = 1.0 / num_labels as f64;
        Self {
            num_labels,
            values: vec![p; num_instances * num_labels],
        }
    }

    /// Build from explicit rows.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RaggedRow`] if a row does not have `num_labels`
    /// entries.
    pub fn from_rows(rows: &[Vec<f64>], num_labels: usize) -> Result<Self> {
        let mut values = Vec::with_capacity(rows.len() * num_labels);
        for (item, row) in rows.iter().enumerate() {
            if row.len() != num_labels {
                return Err(Error::RaggedRow {
                    item,
                    expected: num_labels,
                    got: row.len(),
                });
            }
            values.extend_from_slice(row);
        }
        Ok(Self { num_labels, values })
    }

    pub fn num_instances(&self) -> usize {
        self.values.len().checked_div(self.num_labels).unwrap_or(0)
    }

    pub fn num_labels(&self) -> usize {
        self.num_labels
    }

    pub fn item(&self, item: usize) -> ItemPosterior<'_> {
        let start = item * self.num_labels;
        ItemPosterior(&self.values[start..start + self.num_labels])
    }

    pub(crate) fn item_mut(&mut self, item: usize) -> &mut [f64] {
        let start = item * self.num_labels;
        &mut self.values[start..start + self.num_labels]
    }

    pub fn iter(&self) -> impl Iterator<Item = ItemPosterior<'_>> {
        self.values.chunks_exact(self.num_labels).map(ItemPosterior)
    }

    /// Copy of the table as nested rows.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.iter().map(|p| p.probabilities().to_vec()).collect()
    }

    /// Shannon entropy (nats) of each item's posterior.
    pub fn entropies(&self) -> Vec<f64> {
        self.iter().map(|p| p.entropy()).collect()
    }
}

/// Borrowed view of one item's distribution over candidate labels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemPosterior<'a>(&'a [f64]);

impl<'a> ItemPosterior<'a> {
    pub fn probabilities(&self) -> &'a [f64] {
        self.0
    }

    /// Most probable label; ties go to the lowest label index.
    pub fn argmax(&self) -> usize {
        let mut best = 0;
        for (label, &p) in self.0.iter().enumerate().skip(1) {
            if p > self.0[best] {
                best = label;
            }
        }
        best
    }

    pub fn max_probability(&self) -> f64 {
        self.0[self.argmax()]
    }

    pub fn entropy(&self) -> f64 {
        shannon_entropy(self.0.iter().copied())
    }

    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argmax_prefers_lowest_index_on_ties() {
        let table = PosteriorTable::from_rows(&[vec![0.4, 0.4, 0.2], vec![0.1, 0.3, 0.6]], 3)
            .unwrap();
        assert_eq!(table.item(0).argmax(), 0);
        assert_eq!(table.item(1).argmax(), 2);
        assert_eq!(table.item(1).max_probability(), 0.6);
    }

    #[test]
    fn uniform_table_has_maximal_entropy() {
        let table = PosteriorTable::uniform(2, 4);
        assert_eq!(table.num_instances(), 2);
        for entropy in table.entropies() {
            assert!((entropy - 4f64.ln()).abs() < 1e-12);
        }
        assert!(table.iter().all(|p| (p.total() - 1.0).abs() < 1e-12));
    }

    #[test]
    fn rows_round_trip_through_flat_storage() {
        let rows = vec![vec![1.0, 0.0], vec![0.25, 0.75]];
        let table = PosteriorTable::from_rows(&rows, 2).unwrap();
        assert_eq!(table.to_rows(), rows);
        assert_eq!(table.item(1).probabilities(), &[0.25, 0.75]);
    }

    #[test]
    fn rows_of_the_wrong_width_are_rejected() {
        let err = PosteriorTable::from_rows(&[vec![0.5, 0.5], vec![1.0]], 2).unwrap_err();
        assert!(matches!(
            err,
            Error::RaggedRow {
                item: 1,
                expected: 2,
                got: 1
            }
        ));
        assert!(err.is_malformed_input());
    }
}
