//! Genetic algorithm for the OneMax problem.
//!
//! OneMax asks for a bit vector with as many set bits as possible. Fitness is the
//! fraction of set bits, so the optimum is the all-ones genome with fitness `1.0`.
//! The problem is trivial to state, which makes it a good benchmark for the GA
//! machinery itself: selection pressure, recombination and mutation rates.
//!
//! # How a Trial Works
//!
//! 1. **Population** - Sample `population_size` random genomes of `genome_length` bits
//! 2. **Selection** - Pick parents by tournament or roulette ([`selection`])
//! 3. **Crossover** - Swap tails of parent pairs at a random cut point ([`variation`])
//! 4. **Mutation** - Flip each bit with a small probability ([`variation`])
//! 5. **Replacement** - The offspring replace the whole population (no elitism)
//! 6. **Repeat** - Until convergence or until the generation budget is spent ([`engine`])
//!
//! # Architecture
//!
//! ```text
//! GeneticAlgorithm (engine)
//!     ↓ breeds
//! Population of Genomes (genome)
//!     ↓ scored by
//! Fitness evaluator (fitness)
//!     ↓ guides
//! Selection & Variation (selection, variation)
//!     ↓ produces
//! TrialOutcome
//! ```
//!
//! # Example
//!
//! ```
//! use onemax_ga::{
//!     engine::{GaParams, GeneticAlgorithm},
//!     selection::SelectionMode,
//! };
//!
//! let ga = GeneticAlgorithm::new(GaParams {
//!     population_size: 40,
//!     genome_length: 16,
//!     max_generations: 200,
//!     mutation_rate: 0.01,
//!     crossover_rate: 0.5,
//!     selection: SelectionMode::Tournament,
//!     target_generation_fitness: 0.9,
//! });
//!
//! let outcome = ga.run_seeded(2024);
//! println!(
//!     "stopped at generation {} (mean {:.3}, best {:.3})",
//!     outcome.generation, outcome.generation_fitness, outcome.best_fitness
//! );
//! ```
//!
//! # Current Limitations
//!
//! - **Single objective**: only the OneMax landscape is supported
//! - **Static rates**: mutation and crossover rates are fixed for the whole trial;
//!   tuning them is the job of the sweep built on top of this crate

pub mod engine;
pub mod fitness;
pub mod genome;
pub mod selection;
pub mod variation;
