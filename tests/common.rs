//! Common test utilities for the mace test suite.
//!
//! Fixture builders for annotation tables plus simulation of annotators that
//! follow the spamming/trustworthy model.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use mace::matrix::LabelMatrix;
use rand::{Rng, SeedableRng, rngs::StdRng};

/// Sample from a categorical distribution given a probability vector.
///
/// # Arguments
///
/// * `weights` - Probability weights (need not sum to 1, will be normalized)
/// * `rng` - Random number generator
///
/// # Returns
///
/// An index sampled according to the categorical distribution
pub fn sample_categorical(weights: &[f64], rng: &mut StdRng) -> usize {
    debug_assert!(!weights.is_empty());
    let total: f64 = weights.iter().sum();
    let ticket = rng.random::<f64>() * total;
    let mut cumulative = 0.0;
    for (idx, weight) in weights.iter().enumerate() {
        cumulative += weight;
        if ticket <= cumulative {
            return idx;
        }
    }
    weights.len() - 1
}

/// Simulated annotator following the two-strategy model.
#[derive(Debug, Clone)]
pub struct SimulatedAnnotator {
    pub spamming_probability: f64,
    pub strategy: Vec<f64>,
    /// Probability of leaving an item unlabeled
    pub missing_rate: f64,
}

impl SimulatedAnnotator {
    pub fn perfect(num_labels: usize) -> Self {
        Self {
            spamming_probability: 0.0,
            strategy: vec![1.0 / num_labels as f64; num_labels],
            missing_rate: 0.0,
        }
    }

    pub fn spammer(spamming_probability: f64, strategy: Vec<f64>, missing_rate: f64) -> Self {
        Self {
            spamming_probability,
            strategy,
            missing_rate,
        }
    }
}

/// Simulated annotation table and the truth it was generated from.
#[derive(Debug, Clone)]
pub struct Simulation {
    pub rows: Vec<Vec<Option<usize>>>,
    pub truth: Vec<usize>,
}

impl Simulation {
    pub fn matrix(&self, num_labels: usize) -> LabelMatrix {
        LabelMatrix::from_rows(&self.rows, num_labels).expect("simulated matrix is valid")
    }
}

/// Generate `num_items` items with uniformly drawn truths. Items that end up
/// with no annotation get one from the first annotator, answering truthfully.
pub fn simulate(
    num_items: usize,
    num_labels: usize,
    annotators: &[SimulatedAnnotator],
    seed: u64,
) -> Simulation {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut rows = Vec::with_capacity(num_items);
    let mut truth = Vec::with_capacity(num_items);

    for _ in 0..num_items {
        let t = rng.random_range(0..num_labels);
        let mut row: Vec<Option<usize>> = annotators
            .iter()
            .map(|annotator| {
                if rng.random::<f64>() < annotator.missing_rate {
                    None
                } else if rng.random::<f64>() < annotator.spamming_probability {
                    Some(sample_categorical(&annotator.strategy, &mut rng))
                } else {
                    Some(t)
                }
            })
            .collect();
        if row.iter().all(Option::is_none) {
            row[0] = Some(t);
        }
        rows.push(row);
        truth.push(t);
    }

    Simulation { rows, truth }
}

/// Turn rows of tokens into CSV text (empty string = missing cell).
pub fn to_csv(rows: &[Vec<&str>]) -> String {
    rows.iter()
        .map(|row| row.join(","))
        .collect::<Vec<_>>()
        .join("\n")
        + "\n"
}

pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("failed to write fixture");
    path
}

/// Assert two floats are within `tolerance` of each other.
pub fn assert_close(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {expected} ± {tolerance}, got {actual}"
    );
}
