//! Regret matching: accumulated regret → current strategy, reach-weighted
//! strategy sums → average strategy.
//!
//! All functions clamp negative entries to zero before normalising and fall
//! back to the uniform distribution when nothing positive is left, so every
//! returned vector is a probability distribution.

use crate::store::InfoSetNode;

/// Uniform distribution over `n` actions.
pub fn uniform(n: usize) -> Vec<f64> {
    vec![1.0 / n as f64; n]
}

/// Normalise the positive part of `weights`; uniform if that part sums to 0.
pub fn normalized_positive(weights: &[f64]) -> Vec<f64> {
    let positive_sum: f64 = weights.iter().map(|&w| w.max(0.0)).sum();

    if positive_sum > 0.0 {
        weights.iter().map(|&w| w.max(0.0) / positive_sum).collect()
    } else {
        uniform(weights.len())
    }
}

/// Current strategy via regret matching: proportional to positive regret.
pub fn current_strategy(node: &InfoSetNode) -> Vec<f64> {
    normalized_positive(node.regret_sum())
}

/// Average strategy over all iterations; this is the trained policy.
pub fn average_strategy(node: &InfoSetNode) -> Vec<f64> {
    normalized_positive(node.strategy_sum())
}

/// `sums[a] += reach_weight * strategy[a]`.
pub fn accumulate(sums: &mut [f64], strategy: &[f64], reach_weight: f64) {
    for (sum, &p) in sums.iter_mut().zip(strategy) {
        *sum += reach_weight * p;
    }
}

/// Index of the first action whose cumulative probability exceeds `r`.
/// The last action absorbs whatever mass floating-point drift leaves over.
pub fn sample(distribution: &[f64], r: f64) -> usize {
    let mut cumulative = 0.0;
    for (a, &p) in distribution.iter().enumerate() {
        cumulative += p;
        if r < cumulative {
            return a;
        }
    }
    distribution.len().saturating_sub(1)
}
