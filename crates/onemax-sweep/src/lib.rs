//! Hyperparameter sweep for the OneMax genetic algorithm.
//!
//! This crate searches a grid of (mutation rate, crossover rate) pairs for the pair
//! that gives the best average convergence behaviour of the GA in [`onemax_ga`].
//!
//! # How a Sweep Works
//!
//! 1. **Configure** - Build and validate a [`config::SweepConfig`]
//! 2. **Expand** - Turn the rate ranges into evenly spaced axes ([`grid`])
//! 3. **Dispatch** - Run many independent trials per cell in parallel ([`pool`])
//! 4. **Aggregate** - Fold the trial outcomes into a weighted score ([`results`])
//! 5. **Compare** - Keep the best cell, prune rows, stop early at the target ([`sweep`])
//!
//! # Architecture
//!
//! ```text
//! Sweep (row-major over the grid)
//!     ↓ per cell
//! TrialPool ── N × GeneticAlgorithm trials, each with its own seed
//!     ↓ outcomes in trial order
//! Results (weighted score)
//!     ↓
//! best-so-far tracker, row pruning, early stop
//! ```
//!
//! # Reproducibility
//!
//! A sweep owns a master seed. Trial seeds are drawn from it in dispatch order, so
//! a sweep with the same seed and configuration produces the same report no matter
//! how the worker threads are scheduled.
//!
//! # Example
//!
//! ```no_run
//! use onemax_sweep::{config::SweepConfig, sweep::Sweep};
//!
//! let sweep = Sweep::new(SweepConfig::default())?;
//! let report = sweep.run()?;
//! match &report.best {
//!     Some(best) => println!(
//!         "mutation {} / crossover {}\n{}",
//!         best.mutation_rate, best.crossover_rate, best.results
//!     ),
//!     None => println!("no viable hyperparameter pair was found"),
//! }
//! # Ok::<(), onemax_sweep::sweep::SweepError>(())
//! ```
//!
//! # Current Limitations
//!
//! - **Heuristic pruning**: row pruning assumes the score is unimodal along the
//!   crossover axis; a row with several peaks may be cut before its best cell
//! - **No mid-trial cancellation**: a timed-out trial keeps running on its thread
//!   until it finishes on its own

pub mod config;
pub mod grid;
pub mod pool;
pub mod results;
pub mod sweep;
