//! Utility functions for the MCTS algorithm
//!
//! This module contains various helper functions and utilities used
//! throughout the MCTS implementation.

use rand::Rng;

/// Perturbs a value by a small random amount to break exact ties
///
/// The result stays within a factor `epsilon` of `value + epsilon`, so it
/// never reorders values that genuinely differ by more than that.
pub fn noise<R: Rng + ?Sized>(value: f64, epsilon: f64, rng: &mut R) -> f64 {
    (value + epsilon) * (1.0 + epsilon * (rng.gen::<f64>() - 0.5))
}

/// Rescales `value` into `[0, 1]` given the bounds observed so far
///
/// Returns `value` unchanged until two distinct bounds have been seen.
pub fn normalise(value: f64, low: f64, high: f64) -> f64 {
    if high > low {
        (value - low) / (high - low)
    } else {
        value
    }
}

/// Calculates the exploration term for UCB1
///
/// `epsilon` keeps the term finite for a child that was never visited.
pub fn exploration_term(parent_visits: u64, child_visits: u64, epsilon: f64) -> f64 {
    (((parent_visits + 1) as f64).ln() / (child_visits as f64 + epsilon)).sqrt()
}

/// Softmax of `values / temperature`, shifted by the maximum for stability
pub fn boltzmann(values: &[f64], temperature: f64) -> Vec<f64> {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let weights: Vec<f64> = values
        .iter()
        .map(|v| ((v - max) / temperature).exp())
        .collect();
    let total: f64 = weights.iter().sum();
    weights.into_iter().map(|w| w / total).collect()
}

/// Samples an index from an (unnormalised) weight vector
///
/// Falls back to a uniform choice when all weights are zero or invalid.
pub fn sample_index<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> usize {
    let total: f64 = weights.iter().filter(|w| w.is_finite() && **w > 0.0).sum();
    if total <= 0.0 {
        return rng.gen_range(0..weights.len());
    }
    let mut r = rng.gen::<f64>() * total;
    for (i, w) in weights.iter().enumerate() {
        if !w.is_finite() || *w <= 0.0 {
            continue;
        }
        if r < *w {
            return i;
        }
        r -= w;
    }
    // Rounding left a remainder; take the last positive weight.
    weights
        .iter()
        .rposition(|w| w.is_finite() && *w > 0.0)
        .unwrap_or(0)
}

/// Index of the largest value, `None` for an empty slice
pub fn argmax(values: &[f64]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, &v)| match best {
            Some((_, b)) if b >= v => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn noise_preserves_order_of_distinct_values() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        for _ in 0..1000 {
            let a = noise(0.5, 1e-6, &mut rng);
            let b = noise(0.6, 1e-6, &mut rng);
            assert!(a < b);
        }
    }

    #[test]
    fn normalise_handles_degenerate_bounds() {
        assert_eq!(normalise(3.0, 1.0, 5.0), 0.5);
        assert_eq!(normalise(3.0, 3.0, 3.0), 3.0);
    }

    #[test]
    fn boltzmann_sums_to_one() {
        let p = boltzmann(&[1.0, 2.0, 3.0], 0.5);
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(p[2] > p[1] && p[1] > p[0]);
    }

    #[test]
    fn sample_index_skips_zero_weights() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        for _ in 0..200 {
            assert_eq!(sample_index(&[0.0, 2.0, 0.0], &mut rng), 1);
        }
    }

    #[test]
    fn argmax_prefers_first_of_equal_values() {
        assert_eq!(argmax(&[1.0, 3.0, 3.0]), Some(1));
        assert_eq!(argmax(&[]), None);
    }
}
