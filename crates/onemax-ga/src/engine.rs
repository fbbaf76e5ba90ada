//! The generational loop.
//!
//! A trial starts from a uniformly random population and repeats, for up to
//! `max_generations` generations:
//!
//! 1. **Breed** - build a population of the same size from selected parent pairs:
//!    crossover, then mutation of both children. An odd population gets one extra
//!    selected-and-mutated individual that never goes through crossover.
//! 2. **Replace** - the new population replaces the old one entirely (no elitism).
//! 3. **Evaluate** - recompute the fitness vector, generation mean and best fitness.
//! 4. **Track** - remember this generation when its mean is `>=` the best mean seen
//!    so far. Ties favour the later generation.
//! 5. **Check** - stop early when the best genome is optimal and the mean reaches
//!    the target generation fitness.
//!
//! A trial that converges reports the converging generation. A trial that runs out
//! of generations reports `max_generations` together with the mean and best fitness
//! of the tracked generation, which may be earlier than the last one.
//!
//! # Randomness
//!
//! The engine never touches a global generator. [`GeneticAlgorithm::run_seeded`]
//! builds a [`Pcg64`] from a [`TrialSeed`], so the same seed and parameters always
//! reproduce the same trajectory.

use rand::{Rng, SeedableRng as _};
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};

use crate::{
    fitness::{self, GenerationStats},
    genome::{Genome, Population},
    selection::{ParentSelector as _, SelectionMode},
    variation,
};

/// Seed of the random stream owned by one trial.
pub type TrialSeed = u64;

/// Parameters of a single GA trial.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GaParams {
    pub population_size: usize,
    pub genome_length: usize,
    pub max_generations: usize,
    pub mutation_rate: f64,
    pub crossover_rate: f64,
    pub selection: SelectionMode,
    /// Minimum generation mean required (with an optimal genome) to stop early.
    pub target_generation_fitness: f64,
}

impl Default for GaParams {
    fn default() -> Self {
        Self {
            population_size: 100,
            genome_length: 50,
            max_generations: 1000,
            mutation_rate: 0.02,
            crossover_rate: 0.7,
            selection: SelectionMode::DEFAULT,
            target_generation_fitness: 0.9,
        }
    }
}

/// How a trial ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Termination {
    /// Stopped early at the reported generation.
    #[display("converged")]
    Converged,
    /// Ran every generation; the statistics come from `best_generation`.
    #[display("exhausted (best generation {best_generation})")]
    Exhausted { best_generation: usize },
}

/// Result of one trial.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrialOutcome {
    /// Generation at which the trial stopped (`max_generations` when exhausted).
    pub generation: usize,
    /// Generation mean fitness at that point.
    pub generation_fitness: f64,
    /// Best individual fitness at that point.
    pub best_fitness: f64,
    pub termination: Termination,
}

impl TrialOutcome {
    #[must_use]
    pub fn is_converged(&self) -> bool {
        matches!(self.termination, Termination::Converged)
    }
}

/// A trial outcome together with the genome it reports.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialRecord {
    pub outcome: TrialOutcome,
    /// First genome holding `outcome.best_fitness` in the reported generation:
    /// the converging generation, or the tracked one when the budget ran out.
    /// `None` when no generation was bred.
    pub best_genome: Option<Genome>,
}

/// Per-generation snapshot passed to [`GeneticAlgorithm::run_with_callback`].
#[derive(Debug, Clone, Copy)]
pub struct GenerationReport<'a> {
    pub generation: usize,
    pub stats: GenerationStats,
    /// First genome holding the best fitness of this generation.
    pub best_genome: &'a Genome,
}

/// Best non-regressing generation seen during a trial.
#[derive(Debug, Clone)]
struct TrackedBest {
    best_genome: Genome,
    generation: usize,
    stats: GenerationStats,
}

/// Runs GA trials with fixed parameters.
#[derive(Debug, Clone, Copy)]
pub struct GeneticAlgorithm {
    params: GaParams,
}

impl GeneticAlgorithm {
    /// # Panics
    ///
    /// Panics if the population size or genome length is zero.
    #[must_use]
    pub fn new(params: GaParams) -> Self {
        assert!(params.population_size > 0, "population size must be positive");
        assert!(params.genome_length > 0, "genome length must be positive");
        Self { params }
    }

    #[must_use]
    pub fn params(&self) -> &GaParams {
        &self.params
    }

    /// Runs one trial with its own generator seeded from `seed`.
    #[must_use]
    pub fn run_seeded(&self, seed: TrialSeed) -> TrialOutcome {
        let mut rng = Pcg64::seed_from_u64(seed);
        self.run(&mut rng)
    }

    /// Runs one trial.
    pub fn run<R>(&self, rng: &mut R) -> TrialOutcome
    where
        R: Rng + ?Sized,
    {
        self.run_with_callback(rng, |_| {}).outcome
    }

    /// Runs one trial, calling `on_generation` after every evaluated generation.
    ///
    /// # Examples
    ///
    /// ```
    /// use onemax_ga::engine::{GaParams, GeneticAlgorithm};
    /// use rand::SeedableRng as _;
    /// use rand_pcg::Pcg64;
    ///
    /// let ga = GeneticAlgorithm::new(GaParams {
    ///     population_size: 20,
    ///     genome_length: 10,
    ///     max_generations: 50,
    ///     ..GaParams::default()
    /// });
    /// let mut generations = 0;
    /// let record = ga.run_with_callback(&mut Pcg64::seed_from_u64(1), |_| generations += 1);
    /// assert!(generations <= 50);
    /// assert!((0.0..=1.0).contains(&record.outcome.best_fitness));
    /// ```
    pub fn run_with_callback<R, F>(&self, rng: &mut R, mut on_generation: F) -> TrialRecord
    where
        R: Rng + ?Sized,
        F: FnMut(&GenerationReport<'_>),
    {
        let params = &self.params;
        let mut population = Population::random(rng, params.population_size, params.genome_length);
        let mut fitnesses = fitness::population_fitnesses(&population);
        let mut tracked: Option<TrackedBest> = None;

        for generation in 0..params.max_generations {
            population = self.breed(&population, &fitnesses, rng);
            fitnesses = fitness::population_fitnesses(&population);
            let stats = GenerationStats::from_fitnesses(&fitnesses, params.population_size);

            let best_index = fitness::best_index(&fitnesses).expect("population is never empty");
            let best_genome = &population.genomes()[best_index];
            on_generation(&GenerationReport {
                generation,
                stats,
                best_genome,
            });
            log::trace!(
                "generation {generation}: best = {:.4}, mean = {:.4}",
                stats.best,
                stats.mean
            );

            let best_mean = tracked.as_ref().map_or(0.0, |t| t.stats.mean);
            if stats.mean >= best_mean {
                tracked = Some(TrackedBest {
                    best_genome: best_genome.clone(),
                    generation,
                    stats,
                });
            }

            if stats.is_converged(params.target_generation_fitness) {
                log::debug!("converged at generation {generation} (mean {:.4})", stats.mean);
                return TrialRecord {
                    outcome: TrialOutcome {
                        generation,
                        generation_fitness: stats.mean,
                        best_fitness: stats.best,
                        termination: Termination::Converged,
                    },
                    best_genome: Some(best_genome.clone()),
                };
            }
        }

        match tracked {
            Some(best) => {
                log::debug!(
                    "exhausted {} generations; best generation {} (mean {:.4}, best {})",
                    params.max_generations,
                    best.generation,
                    best.stats.mean,
                    best.best_genome
                );
                TrialRecord {
                    outcome: TrialOutcome {
                        generation: params.max_generations,
                        generation_fitness: best.stats.mean,
                        best_fitness: best.stats.best,
                        termination: Termination::Exhausted {
                            best_generation: best.generation,
                        },
                    },
                    best_genome: Some(best.best_genome),
                }
            }
            // max_generations == 0
            None => TrialRecord {
                outcome: TrialOutcome {
                    generation: params.max_generations,
                    generation_fitness: 0.0,
                    best_fitness: 0.0,
                    termination: Termination::Exhausted { best_generation: 0 },
                },
                best_genome: None,
            },
        }
    }

    /// Builds the next population from the current one.
    fn breed<R>(&self, population: &Population, fitnesses: &[f64], rng: &mut R) -> Population
    where
        R: Rng + ?Sized,
    {
        let GaParams {
            population_size,
            mutation_rate,
            crossover_rate,
            selection,
            ..
        } = self.params;

        let mut next = Population::with_capacity(population_size);
        for _ in 0..population_size / 2 {
            let parent1 = selection.select(population, fitnesses, rng);
            let parent2 = selection.select(population, fitnesses, rng);
            let (mut child1, mut child2) =
                variation::crossover(parent1, parent2, crossover_rate, rng);
            variation::mutate(&mut child1, mutation_rate, rng);
            variation::mutate(&mut child2, mutation_rate, rng);
            next.push(child1);
            next.push(child2);
        }

        if population_size % 2 != 0 {
            let mut lone = selection.select(population, fitnesses, rng).clone();
            variation::mutate(&mut lone, mutation_rate, rng);
            next.push(lone);
        }

        next
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;

    use super::*;

    fn params(mutation_rate: f64, crossover_rate: f64) -> GaParams {
        GaParams {
            population_size: 90,
            genome_length: 25,
            max_generations: 500,
            mutation_rate,
            crossover_rate,
            selection: SelectionMode::Tournament,
            target_generation_fitness: 0.9,
        }
    }

    #[test]
    fn test_tournament_converges() {
        let ga = GeneticAlgorithm::new(params(0.01, 0.4));
        let converged = (0..5)
            .map(|seed| ga.run_seeded(seed))
            .filter(|outcome| outcome.best_fitness == 1.0)
            .count();
        assert!(converged >= 4, "only {converged}/5 trials reached the optimum");
    }

    #[test]
    fn test_converged_outcome_shape() {
        let ga = GeneticAlgorithm::new(params(0.01, 0.4));
        let outcome = ga.run_seeded(42);
        if outcome.is_converged() {
            assert!(outcome.generation < 500);
            assert_eq!(outcome.best_fitness, 1.0);
            assert!(outcome.generation_fitness >= 0.9);
        } else {
            assert_eq!(outcome.generation, 500);
        }
    }

    #[test]
    fn test_no_variation_does_not_error() {
        let ga = GeneticAlgorithm::new(GaParams {
            max_generations: 50,
            target_generation_fitness: 1.0,
            ..params(0.0, 0.0)
        });
        let outcome = ga.run_seeded(7);
        assert!((0.0..=1.0).contains(&outcome.generation_fitness));
        assert!((0.0..=1.0).contains(&outcome.best_fitness));
        if !outcome.is_converged() {
            assert_eq!(outcome.generation, 50);
        }
    }

    #[test]
    fn test_same_seed_reproduces_trial() {
        let ga = GeneticAlgorithm::new(GaParams {
            population_size: 31,
            genome_length: 20,
            max_generations: 60,
            mutation_rate: 0.05,
            crossover_rate: 0.6,
            selection: SelectionMode::Roulette,
            target_generation_fitness: 0.95,
        });
        assert_eq!(ga.run_seeded(1234), ga.run_seeded(1234));
    }

    #[test]
    fn test_odd_population_keeps_size() {
        let ga = GeneticAlgorithm::new(GaParams {
            population_size: 7,
            genome_length: 6,
            max_generations: 5,
            target_generation_fitness: 1.1,
            ..GaParams::default()
        });
        let mut rng = Pcg64::seed_from_u64(3);
        let population = Population::random(&mut rng, 7, 6);
        let fitnesses = fitness::population_fitnesses(&population);
        let next = ga.breed(&population, &fitnesses, &mut rng);
        assert_eq!(next.len(), 7);
        assert!(next.genomes().iter().all(|g| g.len() == 6));
    }

    #[test]
    fn test_exhausted_reports_tracked_generation() {
        let ga = GeneticAlgorithm::new(GaParams {
            population_size: 10,
            genome_length: 30,
            max_generations: 40,
            mutation_rate: 0.2,
            crossover_rate: 0.5,
            selection: SelectionMode::Roulette,
            // unreachable, so the trial always exhausts its budget
            target_generation_fitness: 1.1,
        });

        let mut means = Vec::new();
        let mut rng = Pcg64::seed_from_u64(99);
        let outcome = ga
            .run_with_callback(&mut rng, |report| means.push(report.stats))
            .outcome;

        assert_eq!(means.len(), 40);
        assert_eq!(outcome.generation, 40);
        let Termination::Exhausted { best_generation } = outcome.termination else {
            panic!("expected exhaustion, got {:?}", outcome.termination);
        };

        // replay the tracking rule over the observed generations
        let mut expected = 0;
        let mut best_mean = 0.0;
        for (g, stats) in means.iter().enumerate() {
            if stats.mean >= best_mean {
                best_mean = stats.mean;
                expected = g;
            }
        }
        assert_eq!(best_generation, expected);
        assert_eq!(outcome.generation_fitness, means[expected].mean);
        assert_eq!(outcome.best_fitness, means[expected].best);
    }

    #[test]
    fn test_callback_sees_best_genome() {
        let ga = GeneticAlgorithm::new(GaParams {
            population_size: 12,
            genome_length: 8,
            max_generations: 10,
            target_generation_fitness: 1.1,
            ..GaParams::default()
        });
        let mut rng = Pcg64::seed_from_u64(5);
        let _ = ga.run_with_callback(&mut rng, |report| {
            assert_eq!(fitness::genome_fitness(report.best_genome), report.stats.best);
        });
    }

    #[test]
    fn test_record_genome_matches_reported_fitness() {
        let exhausting = GeneticAlgorithm::new(GaParams {
            population_size: 10,
            genome_length: 30,
            max_generations: 40,
            mutation_rate: 0.2,
            crossover_rate: 0.5,
            selection: SelectionMode::Roulette,
            target_generation_fitness: 1.1,
        });
        for seed in 0..50 {
            let record = exhausting.run_with_callback(&mut Pcg64::seed_from_u64(seed), |_| {});
            assert!(!record.outcome.is_converged());
            let genome = record.best_genome.unwrap();
            assert_eq!(fitness::genome_fitness(&genome), record.outcome.best_fitness);
        }

        let converging = GeneticAlgorithm::new(params(0.01, 0.4));
        for seed in 0..5 {
            let record = converging.run_with_callback(&mut Pcg64::seed_from_u64(seed), |_| {});
            let genome = record.best_genome.unwrap();
            assert_eq!(fitness::genome_fitness(&genome), record.outcome.best_fitness);
            if record.outcome.is_converged() {
                assert_eq!(genome, Genome::ones(25));
            }
        }
    }

    #[test]
    fn test_zero_generations_has_no_genome() {
        let ga = GeneticAlgorithm::new(GaParams {
            max_generations: 0,
            ..GaParams::default()
        });
        let record = ga.run_with_callback(&mut Pcg64::seed_from_u64(1), |_| {});
        assert_eq!(record.outcome.generation, 0);
        assert_eq!(record.best_genome, None);
    }

    #[test]
    #[should_panic(expected = "population size")]
    fn test_zero_population_rejected() {
        let _ = GeneticAlgorithm::new(GaParams {
            population_size: 0,
            ..GaParams::default()
        });
    }
}
