//! OneMax fitness evaluation.
//!
//! The fitness of a genome is the fraction of its bits that are set, so it always
//! lies in `[0, 1]` and the optimum ([`TARGET_FITNESS`]) is reached by the all-ones
//! genome. Population-level statistics are derived from a fitness vector that is
//! index-aligned with the population it was computed from.

use crate::genome::{Genome, Population};

/// Fitness of the all-ones genome.
pub const TARGET_FITNESS: f64 = 1.0;

/// Returns the fraction of set bits in `genome`.
///
/// For a genome of length `L` with `k` ones this is exactly `k / L`.
///
/// # Panics
///
/// Panics if `genome` is empty; fitness is undefined for a zero-length genome.
///
/// # Examples
///
/// ```
/// use onemax_ga::{fitness, genome::Genome};
///
/// let genome = Genome::from([0, 1, 1, 0, 0, 0, 1, 0]);
/// assert_eq!(fitness::genome_fitness(&genome), 0.375);
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn genome_fitness(genome: &Genome) -> f64 {
    assert!(!genome.is_empty(), "fitness of an empty genome is undefined");
    genome.count_ones() as f64 / genome.len() as f64
}

/// Computes the fitness of every genome, preserving order.
#[must_use]
pub fn population_fitnesses(population: &Population) -> Vec<f64> {
    population.genomes().iter().map(genome_fitness).collect()
}

/// Returns the largest fitness value, or `0.0` for an empty vector.
#[must_use]
pub fn best_fitness(fitnesses: &[f64]) -> f64 {
    fitnesses.iter().copied().reduce(f64::max).unwrap_or(0.0)
}

/// Mean fitness of a generation, relative to the intended population size.
///
/// The sum is divided by `population_size`, not by `fitnesses.len()`. Returns
/// `0.0` when `population_size` is zero.
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn generation_fitness(fitnesses: &[f64], population_size: usize) -> f64 {
    if population_size == 0 {
        return 0.0;
    }
    fitnesses.iter().sum::<f64>() / population_size as f64
}

/// Index of the first genome holding the best fitness, if any.
#[must_use]
pub fn best_index(fitnesses: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, f) in fitnesses.iter().copied().enumerate() {
        if best.is_none_or(|(_, b)| f > b) {
            best = Some((i, f));
        }
    }
    best.map(|(i, _)| i)
}

/// Fitness statistics of one generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationStats {
    /// Mean fitness relative to the intended population size.
    pub mean: f64,
    /// Best individual fitness.
    pub best: f64,
}

impl GenerationStats {
    #[must_use]
    pub fn from_fitnesses(fitnesses: &[f64], population_size: usize) -> Self {
        Self {
            mean: generation_fitness(fitnesses, population_size),
            best: best_fitness(fitnesses),
        }
    }

    /// Returns `true` when the generation satisfies the convergence condition.
    ///
    /// The best individual must be optimal and the mean must reach
    /// `target_generation_fitness`.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn is_converged(&self, target_generation_fitness: f64) -> bool {
        self.best == TARGET_FITNESS && self.mean >= target_generation_fitness
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genome_fitness() {
        assert_eq!(genome_fitness(&Genome::zeros(10)), 0.0);
        assert_eq!(genome_fitness(&Genome::ones(10)), 1.0);
        assert_eq!(genome_fitness(&Genome::from([0, 1, 0, 1, 0, 1, 1, 0])), 0.5);
        assert_eq!(genome_fitness(&Genome::from([1, 1, 1, 0, 0, 0, 0, 0])), 0.375);
    }

    #[test]
    #[should_panic(expected = "undefined")]
    fn test_genome_fitness_empty_panics() {
        let _ = genome_fitness(&Genome::zeros(0));
    }

    #[test]
    fn test_population_fitnesses() {
        assert!(population_fitnesses(&Population::default()).is_empty());

        let population: Population = [
            Genome::from([0, 0, 0, 0, 0, 0, 0, 0, 0, 0]),
            Genome::from([1, 1, 1, 1, 1, 1, 0, 0, 0, 0]),
            Genome::from([0, 1, 0, 1, 0, 1, 0, 1, 0, 0]),
        ]
        .into_iter()
        .collect();
        assert_eq!(population_fitnesses(&population), vec![0.0, 0.6, 0.4]);
    }

    #[test]
    fn test_best_fitness() {
        assert_eq!(best_fitness(&[]), 0.0);
        assert_eq!(best_fitness(&[0.2, 0.9, 0.4]), 0.9);
    }

    #[test]
    fn test_generation_fitness() {
        assert_eq!(generation_fitness(&[], 0), 0.0);
        assert_eq!(generation_fitness(&[0.8], 1), 0.8);
        assert!((generation_fitness(&[0.5, 0.7, 0.9], 3) - 0.7).abs() < 1e-12);
        // divides by the intended size, not the vector length
        assert!((generation_fitness(&[0.5, 0.5], 4) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_best_index_first_max() {
        assert_eq!(best_index(&[]), None);
        assert_eq!(best_index(&[0.1, 0.7, 0.7, 0.3]), Some(1));
    }

    #[test]
    fn test_convergence_condition() {
        let stats = GenerationStats {
            mean: 0.95,
            best: 1.0,
        };
        assert!(stats.is_converged(0.9));
        assert!(!stats.is_converged(0.99));

        let stats = GenerationStats {
            mean: 0.99,
            best: 0.98,
        };
        assert!(!stats.is_converged(0.9));
    }
}
