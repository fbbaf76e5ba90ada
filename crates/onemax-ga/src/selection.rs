//! Parent selection strategies.
//!
//! Two strategies are provided behind the [`ParentSelector`] trait:
//!
//! - [`Tournament`] samples 60–80% of the population without replacement and picks
//!   the fittest sampled genome.
//! - [`Roulette`] picks a genome with probability proportional to its fitness.
//!
//! [`SelectionMode`] is the tagged form used in configuration. It parses
//! case-insensitively; [`SelectionMode::from_name_or_default`] maps any
//! unrecognized name to [`SelectionMode::DEFAULT`] (tournament) and logs a warning.
//!
//! Selecting never mutates the population: selectors return a reference into it and
//! the caller decides whether to clone.

use std::str::FromStr;

use rand::{Rng, seq::index};
use serde::{Deserialize, Deserializer, Serialize};

use crate::genome::{Genome, Population};

/// Chooses one parent from a population given its fitness vector.
pub trait ParentSelector {
    /// Selects a parent.
    ///
    /// `fitnesses` must be index-aligned with `population`.
    ///
    /// # Panics
    ///
    /// Panics if `population` is empty or the lengths do not match.
    fn select<'a, R>(&self, population: &'a Population, fitnesses: &[f64], rng: &mut R) -> &'a Genome
    where
        R: Rng + ?Sized;
}

/// Lower bound of the tournament size, as a fraction of the population size.
pub const TOURNAMENT_MIN_FRACTION: f64 = 0.6;
/// Upper bound of the tournament size, as a fraction of the population size.
pub const TOURNAMENT_MAX_FRACTION: f64 = 0.8;

/// Tournament selection with a per-call random tournament size.
#[derive(Debug, Clone, Copy, Default)]
pub struct Tournament;

impl Tournament {
    /// Draws a tournament size uniformly from
    /// `[floor(0.6 * n), floor(0.8 * n)]`, clamped to at least 1.
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn tournament_size<R>(population_size: usize, rng: &mut R) -> usize
    where
        R: Rng + ?Sized,
    {
        let n = population_size as f64;
        let low = (n * TOURNAMENT_MIN_FRACTION) as usize;
        let high = (n * TOURNAMENT_MAX_FRACTION) as usize;
        rng.random_range(low..=high).clamp(1, population_size.max(1))
    }

    /// Runs one tournament of exactly `size` distinct contestants.
    ///
    /// Returns the contestant with the highest fitness; ties go to the contestant
    /// drawn first.
    pub fn select_with_size<'a, R>(
        population: &'a Population,
        fitnesses: &[f64],
        size: usize,
        rng: &mut R,
    ) -> &'a Genome
    where
        R: Rng + ?Sized,
    {
        assert_selectable(population, fitnesses);
        assert!(
            (1..=population.len()).contains(&size),
            "tournament size {size} out of range for population of {}",
            population.len()
        );

        let mut winner: Option<usize> = None;
        for i in index::sample(rng, population.len(), size) {
            if winner.is_none_or(|w| fitnesses[i] > fitnesses[w]) {
                winner = Some(i);
            }
        }
        &population.genomes()[winner.expect("tournament has at least one contestant")]
    }
}

impl ParentSelector for Tournament {
    fn select<'a, R>(&self, population: &'a Population, fitnesses: &[f64], rng: &mut R) -> &'a Genome
    where
        R: Rng + ?Sized,
    {
        let size = Self::tournament_size(population.len(), rng);
        Self::select_with_size(population, fitnesses, size, rng)
    }
}

/// Fitness-proportionate (roulette wheel) selection.
#[derive(Debug, Clone, Copy, Default)]
pub struct Roulette;

impl ParentSelector for Roulette {
    /// Spins the wheel once.
    ///
    /// Draws `pick` uniformly from `[0, total)` and returns the first genome at which
    /// the running fitness sum exceeds `pick`. When the total fitness is zero, or
    /// rounding leaves the wheel unresolved, the first genome is returned.
    fn select<'a, R>(&self, population: &'a Population, fitnesses: &[f64], rng: &mut R) -> &'a Genome
    where
        R: Rng + ?Sized,
    {
        assert_selectable(population, fitnesses);

        let genomes = population.genomes();
        let total: f64 = fitnesses.iter().sum();
        if total <= 0.0 {
            return &genomes[0];
        }

        let pick = rng.random_range(0.0..total);
        let mut current = 0.0;
        for (genome, fitness) in genomes.iter().zip(fitnesses) {
            current += fitness;
            if current > pick {
                return genome;
            }
        }
        &genomes[0]
    }
}

fn assert_selectable(population: &Population, fitnesses: &[f64]) {
    assert!(
        !population.is_empty(),
        "cannot select from an empty population"
    );
    assert_eq!(
        population.len(),
        fitnesses.len(),
        "fitness vector must be index-aligned with the population"
    );
}

/// Parent selection strategy used by the GA engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, derive_more::Display, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    #[default]
    #[display("tournament")]
    Tournament,
    #[display("roulette")]
    Roulette,
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("unknown selection mode '{name}' (expected 'tournament' or 'roulette')")]
pub struct UnknownSelectionMode {
    pub name: String,
}

impl SelectionMode {
    /// Strategy used when a mode name is not recognized.
    pub const DEFAULT: Self = Self::Tournament;

    /// Parses a mode name, falling back to [`Self::DEFAULT`] for unknown names.
    ///
    /// # Examples
    ///
    /// ```
    /// use onemax_ga::selection::SelectionMode;
    ///
    /// assert_eq!(SelectionMode::from_name_or_default("Roulette"), SelectionMode::Roulette);
    /// assert_eq!(SelectionMode::from_name_or_default("rank"), SelectionMode::Tournament);
    /// ```
    #[must_use]
    pub fn from_name_or_default(name: &str) -> Self {
        name.parse().unwrap_or_else(|e: UnknownSelectionMode| {
            log::warn!("{e}; falling back to {}", Self::DEFAULT);
            Self::DEFAULT
        })
    }
}

impl FromStr for SelectionMode {
    type Err = UnknownSelectionMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tournament" => Ok(Self::Tournament),
            "roulette" => Ok(Self::Roulette),
            _ => Err(UnknownSelectionMode { name: s.to_owned() }),
        }
    }
}

impl<'de> Deserialize<'de> for SelectionMode {
    /// Deserializes leniently: unknown names become [`SelectionMode::DEFAULT`].
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        Ok(Self::from_name_or_default(&name))
    }
}

impl ParentSelector for SelectionMode {
    fn select<'a, R>(&self, population: &'a Population, fitnesses: &[f64], rng: &mut R) -> &'a Genome
    where
        R: Rng + ?Sized,
    {
        match self {
            Self::Tournament => Tournament.select(population, fitnesses, rng),
            Self::Roulette => Roulette.select(population, fitnesses, rng),
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg64;

    use super::*;
    use crate::fitness::population_fitnesses;

    fn sample_population() -> Population {
        [
            Genome::from([0, 0, 0, 0]),
            Genome::from([1, 0, 0, 0]),
            Genome::from([1, 1, 0, 0]),
            Genome::from([1, 1, 1, 0]),
            Genome::from([1, 1, 1, 1]),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_tournament_returns_member() {
        let mut rng = Pcg64::seed_from_u64(11);
        let population = sample_population();
        let fitnesses = population_fitnesses(&population);
        for _ in 0..200 {
            let parent = Tournament.select(&population, &fitnesses, &mut rng);
            assert!(population.contains(parent));
        }
    }

    #[test]
    fn test_roulette_returns_member() {
        let mut rng = Pcg64::seed_from_u64(12);
        let population = sample_population();
        let fitnesses = population_fitnesses(&population);
        for _ in 0..200 {
            let parent = Roulette.select(&population, &fitnesses, &mut rng);
            assert!(population.contains(parent));
        }
    }

    #[test]
    fn test_roulette_never_picks_zero_fitness_when_others_exist() {
        let mut rng = Pcg64::seed_from_u64(13);
        let population = sample_population();
        let fitnesses = population_fitnesses(&population);
        for _ in 0..200 {
            let parent = Roulette.select(&population, &fitnesses, &mut rng);
            assert_ne!(parent, &Genome::from([0, 0, 0, 0]));
        }
    }

    #[test]
    fn test_roulette_zero_total_returns_first() {
        let mut rng = Pcg64::seed_from_u64(14);
        let population: Population = [Genome::from([0, 0]), Genome::from([0, 0])]
            .into_iter()
            .collect();
        let parent = Roulette.select(&population, &[0.0, 0.0], &mut rng);
        assert!(std::ptr::eq(parent, &population.genomes()[0]));
    }

    #[test]
    fn test_full_tournament_picks_first_best() {
        let mut rng = Pcg64::seed_from_u64(15);
        let population: Population = [
            Genome::from([1, 1, 0]),
            Genome::from([0, 1, 1]),
            Genome::from([0, 0, 1]),
        ]
        .into_iter()
        .collect();
        let fitnesses = population_fitnesses(&population);
        // with every genome in the tournament the fittest one always wins
        for _ in 0..50 {
            let parent = Tournament::select_with_size(&population, &fitnesses, 3, &mut rng);
            assert!(population.genomes()[..2].contains(parent));
            assert_eq!(crate::fitness::genome_fitness(parent), 2.0 / 3.0);
        }
    }

    #[test]
    fn test_tournament_size_bounds() {
        let mut rng = Pcg64::seed_from_u64(16);
        for _ in 0..200 {
            let size = Tournament::tournament_size(50, &mut rng);
            assert!((30..=40).contains(&size));
        }
        assert_eq!(Tournament::tournament_size(1, &mut rng), 1);
        assert_eq!(Tournament::tournament_size(2, &mut rng), 1);
    }

    #[test]
    fn test_single_genome_population() {
        let mut rng = Pcg64::seed_from_u64(17);
        let population: Population = [Genome::from([1, 0])].into_iter().collect();
        let fitnesses = population_fitnesses(&population);
        assert_eq!(
            SelectionMode::Tournament.select(&population, &fitnesses, &mut rng),
            &population.genomes()[0]
        );
        assert_eq!(
            SelectionMode::Roulette.select(&population, &fitnesses, &mut rng),
            &population.genomes()[0]
        );
    }

    #[test]
    fn test_selection_does_not_modify_population() {
        let mut rng = Pcg64::seed_from_u64(18);
        let population = sample_population();
        let before = population.clone();
        let fitnesses = population_fitnesses(&population);
        for mode in [SelectionMode::Tournament, SelectionMode::Roulette] {
            let _ = mode.select(&population, &fitnesses, &mut rng);
        }
        assert_eq!(population, before);
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("tournament".parse(), Ok(SelectionMode::Tournament));
        assert_eq!("ROULETTE".parse(), Ok(SelectionMode::Roulette));
        assert!("rank".parse::<SelectionMode>().is_err());
        assert_eq!(
            SelectionMode::from_name_or_default("rank"),
            SelectionMode::DEFAULT
        );
    }

    #[test]
    fn test_mode_serde() {
        assert_eq!(
            serde_json::to_string(&SelectionMode::Roulette).unwrap(),
            "\"roulette\""
        );
        let mode: SelectionMode = serde_json::from_str("\"Roulette\"").unwrap();
        assert_eq!(mode, SelectionMode::Roulette);
        let mode: SelectionMode = serde_json::from_str("\"steady-state\"").unwrap();
        assert_eq!(mode, SelectionMode::Tournament);
    }
}
