//! Numeric helpers shared by the inference code

/// Calculate Shannon entropy (in nats) of a probability distribution.
///
/// Zero entries contribute nothing.
///
/// # Examples
///
/// ```
/// use mace::utils::shannon_entropy;
///
/// let entropy = shannon_entropy(vec![0.5, 0.5]);
/// assert!((entropy - std::f64::consts::LN_2).abs() < 0.001);
///
/// let entropy = shannon_entropy(vec![1.0, 0.0, 0.0]);
/// assert!(entropy.abs() < 0.001);
/// ```
pub fn shannon_entropy<I>(probabilities: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    probabilities
        .into_iter()
        .filter(|&p| p > 0.0)
        .map(|p| -p * p.ln())
        .sum()
}

/// Fallback behavior when weight normalization fails (zero or negative total).
#[derive(Debug, Clone, Copy)]
pub enum NormalizationFallback {
    /// Return None if normalization fails
    None,
    /// Fall back to uniform distribution
    Uniform,
}

/// Normalize weights to probabilities that sum to 1.0 with configurable fallback.
///
/// # Examples
///
/// ```
/// use mace::utils::{NormalizationFallback, normalize_weights};
///
/// let normalized = normalize_weights(vec![1.0, 2.0, 1.0], NormalizationFallback::None).unwrap();
/// assert_eq!(normalized, vec![0.25, 0.5, 0.25]);
///
/// assert_eq!(normalize_weights(vec![0.0, 0.0], NormalizationFallback::None), None);
/// assert_eq!(
///     normalize_weights(vec![0.0, 0.0], NormalizationFallback::Uniform),
///     Some(vec![0.5, 0.5])
/// );
/// ```
pub fn normalize_weights<I>(weights: I, fallback: NormalizationFallback) -> Option<Vec<f64>>
where
    I: IntoIterator<Item = f64>,
{
    let weights: Vec<f64> = weights.into_iter().collect();
    let sum: f64 = weights.iter().sum();

    if weights.is_empty() || !sum.is_finite() || sum <= 0.0 {
        return match fallback {
            NormalizationFallback::None => None,
            NormalizationFallback::Uniform => {
                let uniform = 1.0 / weights.len().max(1) as f64;
                Some(vec![uniform; weights.len()])
            }
        };
    }

    Some(weights.iter().map(|&w| w / sum).collect())
}

/// `ln(exp(a) + exp(b))` without overflow.
pub fn log_add_exp(a: f64, b: f64) -> f64 {
    let (hi, lo) = if a >= b { (a, b) } else { (b, a) };
    if hi == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    hi + (lo - hi).exp().ln_1p()
}

/// `ln Σ exp(x_i)` computed around the maximum term.
///
/// Returns negative infinity for an empty slice.
pub fn log_sum_exp(values: &[f64]) -> f64 {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    let sum: f64 = values.iter().map(|&v| (v - max).exp()).sum();
    max + sum.ln()
}

/// Turn log-weights into probabilities in place; returns the log normalizer.
pub fn normalize_log_weights(log_weights: &mut [f64]) -> f64 {
    let log_total = log_sum_exp(log_weights);
    for value in log_weights.iter_mut() {
        *value = (*value - log_total).exp();
    }
    log_total
}
