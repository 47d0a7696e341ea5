use num_traits::Float;

use crate::fabric::Parallelism;
use crate::preference::Preference;

/// Damping applied when none is configured; favors the previous value.
pub const DEFAULT_DAMPING: f64 = 0.75;

/// Fixed parameters of one clustering session.
#[derive(Debug, Clone)]
pub struct Config<F>
where
    F: Float + Send + Sync,
{
    /// Blend factor in `[0, 1)` retaining part of the previous iteration's value
    pub damping: F,
    /// How per-cell matrix work is scheduled
    pub parallelism: Parallelism,
    /// Diagonal of the similarity matrix
    pub preference: Preference<F>,
}

impl<F> Default for Config<F>
where
    F: Float + Send + Sync,
{
    fn default() -> Self {
        Self {
            damping: F::from(DEFAULT_DAMPING).unwrap_or_else(F::zero),
            parallelism: Parallelism::default(),
            preference: Preference::Median,
        }
    }
}

/// Bounds for [`AffinityPropagation::run`](crate::AffinityPropagation::run).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Hard cap on total iterations of the session
    pub max_iterations: usize,
    /// Consecutive unchanged assignments after which the run halts
    pub stability_threshold: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            stability_threshold: 10,
        }
    }
}

/// Outcome of a bounded run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub iterations: usize,
    pub stable_iterations: usize,
    pub converged: bool,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::<f64>::default();
        assert_eq!(config.damping, 0.75);
        assert_eq!(config.parallelism, Parallelism::Threads(4));
        assert_eq!(config.preference, Preference::Median);

        let options = RunOptions::default();
        assert_eq!(options.max_iterations, 100);
        assert_eq!(options.stability_threshold, 10);
    }
}
