//! Grid search over mutation and crossover rates.
//!
//! The sweep walks the grid row-major: mutation rates in the outer loop, crossover
//! rates in the inner loop, both in the order given. For every cell it runs
//! `trials_per_cell` independent trials on the [`TrialPool`], feeds the successful
//! outcomes (in trial order) into a fresh [`Results`], and compares the score with
//! the best cell so far. A cell whose score is `>=` the best score replaces it,
//! unless none of its trials succeeded.
//!
//! Two shortcuts keep the sweep short:
//!
//! - **Row pruning** - after the first cell of a row, if the previous cell scored
//!   less than `prune_ratio` times the current cell, the rest of the row is skipped.
//!   This assumes the score is unimodal along the crossover axis and trades
//!   completeness for speed.
//! - **Early stop** - as soon as the best score reaches `target_problem_fitness`,
//!   the remaining cells are skipped.
//!
//! Cells are evaluated strictly one after another, because both shortcuts depend on
//! the score of the cell before.

use std::sync::Arc;

use onemax_ga::{
    engine::{GaParams, GeneticAlgorithm, TrialSeed},
    fitness::TARGET_FITNESS,
};
use rand::{Rng as _, SeedableRng as _};
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};

use crate::{
    config::{ConfigError, SweepConfig},
    pool::{self, TrialError, TrialPool, TrialReport, TrialRunner},
    results::{Results, ResultsSummary},
};

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum SweepError {
    #[display("invalid configuration: {_0}")]
    Config(ConfigError),
    #[display("the rate grid has no cells")]
    EmptyGrid,
}

impl From<ConfigError> for SweepError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

/// Position and rates of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub row: usize,
    pub column: usize,
    pub mutation_rate: f64,
    pub crossover_rate: f64,
}

/// Outcome of evaluating one grid cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellSummary {
    pub cell: Cell,
    pub requested_trials: usize,
    pub successful_trials: usize,
    pub summary: ResultsSummary,
}

impl CellSummary {
    /// Fewer trials than requested contributed to the score.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.successful_trials < self.requested_trials
    }

    #[must_use]
    pub fn score(&self) -> f64 {
        self.summary.score
    }
}

/// Best cell found by a sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestCell {
    pub mutation_rate: f64,
    pub crossover_rate: f64,
    pub results: Results,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Every row ran to its end or was pruned.
    #[display("grid exhausted")]
    GridExhausted,
    /// The best score reached the target problem fitness.
    #[display("target problem fitness reached")]
    TargetReached,
}

/// Progress notifications emitted while a sweep runs.
#[derive(Debug, Clone, PartialEq)]
pub enum SweepEvent<'a> {
    CellStarted(Cell),
    CellFinished {
        summary: &'a CellSummary,
        is_new_best: bool,
    },
    /// The rest of `row` was skipped; `skipped` cells were not evaluated.
    RowPruned { row: usize, skipped: usize },
    /// The sweep stopped early; `skipped` cells were not evaluated.
    TargetReached { best_score: f64, skipped: usize },
}

/// Everything a finished sweep knows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepReport {
    pub seed: u64,
    pub total_cells: usize,
    pub cells: Vec<CellSummary>,
    pub skipped_cells: usize,
    pub failed_trials: usize,
    pub stop_reason: StopReason,
    /// `None` when no cell produced a single successful trial.
    pub best: Option<BestCell>,
}

impl SweepReport {
    #[must_use]
    pub fn evaluated_cells(&self) -> usize {
        self.cells.len()
    }
}

/// Runs the grid search described by a [`SweepConfig`].
#[derive(Debug, Clone)]
pub struct Sweep {
    config: SweepConfig,
    pool: TrialPool,
}

impl Sweep {
    /// Validates `config` and prepares the worker pool.
    pub fn new(config: SweepConfig) -> Result<Self, SweepError> {
        config.validate()?;
        let pool = TrialPool::new(config.workers, config.trial_timeout);
        Ok(Self { config, pool })
    }

    #[must_use]
    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// Sweeps the rate axes described by the configuration.
    pub fn run(&self) -> Result<SweepReport, SweepError> {
        self.run_with_callback(|_| {})
    }

    /// Like [`Self::run`], reporting progress to `on_event`.
    pub fn run_with_callback<F>(&self, on_event: F) -> Result<SweepReport, SweepError>
    where
        F: FnMut(&SweepEvent<'_>),
    {
        let mutation_rates = self.config.mutation.values();
        let crossover_rates = self.config.crossover.values();
        self.run_grid(&mutation_rates, &crossover_rates, on_event)
    }

    /// Sweeps explicit rate lists.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use onemax_sweep::{config::SweepConfig, sweep::Sweep};
    ///
    /// let sweep = Sweep::new(SweepConfig {
    ///     trials_per_cell: 4,
    ///     seed: Some(1),
    ///     ..SweepConfig::default()
    /// })?;
    /// let report = sweep.run_grid(&[0.01, 0.005], &[0.2, 0.4, 0.6], |_| {})?;
    /// if let Some(best) = &report.best {
    ///     println!("{} / {} -> {:.3}", best.mutation_rate, best.crossover_rate, best.results.score());
    /// }
    /// # Ok::<(), onemax_sweep::sweep::SweepError>(())
    /// ```
    pub fn run_grid<F>(
        &self,
        mutation_rates: &[f64],
        crossover_rates: &[f64],
        on_event: F,
    ) -> Result<SweepReport, SweepError>
    where
        F: FnMut(&SweepEvent<'_>),
    {
        self.run_grid_with(
            mutation_rates,
            crossover_rates,
            |params| Arc::new(GeneticAlgorithm::new(params)),
            on_event,
        )
    }

    /// Like [`Self::run_grid`], running the trials of each cell on the runner
    /// that `runner_for` builds from the cell's GA parameters.
    pub fn run_grid_with<T, N, F>(
        &self,
        mutation_rates: &[f64],
        crossover_rates: &[f64],
        mut runner_for: N,
        mut on_event: F,
    ) -> Result<SweepReport, SweepError>
    where
        T: TrialRunner,
        N: FnMut(GaParams) -> Arc<T>,
        F: FnMut(&SweepEvent<'_>),
    {
        for &rate in mutation_rates {
            crate::config::check_rate("mutation rate", rate)?;
        }
        for &rate in crossover_rates {
            crate::config::check_rate("crossover rate", rate)?;
        }
        let total_cells = mutation_rates.len() * crossover_rates.len();
        if total_cells == 0 {
            return Err(SweepError::EmptyGrid);
        }

        let seed = self.config.seed.unwrap_or_else(|| rand::rng().random());
        let mut seeder = Pcg64::seed_from_u64(seed);
        log::info!(
            "sweeping {} x {} cells, {} trials each, {} workers (seed {seed})",
            mutation_rates.len(),
            crossover_rates.len(),
            self.config.trials_per_cell,
            self.pool.workers()
        );

        let mut cells = Vec::with_capacity(total_cells);
        let mut best: Option<BestCell> = None;
        let mut best_score = 0.0;
        let mut failed_trials = 0;
        let mut stop_reason = StopReason::GridExhausted;

        'rows: for (row, &mutation_rate) in mutation_rates.iter().enumerate() {
            let mut prev_local_score = 0.0;

            for (column, &crossover_rate) in crossover_rates.iter().enumerate() {
                let cell = Cell {
                    row,
                    column,
                    mutation_rate,
                    crossover_rate,
                };
                on_event(&SweepEvent::CellStarted(cell));

                let seeds: Vec<TrialSeed> = (0..self.config.trials_per_cell)
                    .map(|_| seeder.random())
                    .collect();
                let params = self.config.ga_params(mutation_rate, crossover_rate);
                let reports = self.pool.run_with(runner_for(params), &seeds, |outcome| {
                    pool::validate_outcome(outcome, params.max_generations)
                });
                let (results, failures) = self.aggregate(cell, reports);
                failed_trials += failures;

                let summary = CellSummary {
                    cell,
                    requested_trials: self.config.trials_per_cell,
                    successful_trials: results.summary().trial_count,
                    summary: *results.summary(),
                };
                let score = summary.score();
                if summary.is_degraded() {
                    log::warn!(
                        "cell (mutation {mutation_rate}, crossover {crossover_rate}) degraded: \
                         {}/{} trials succeeded",
                        summary.successful_trials,
                        summary.requested_trials
                    );
                }

                let is_new_best = !results.is_empty() && score >= best_score;
                if is_new_best {
                    log::info!(
                        "new best cell: mutation {mutation_rate}, crossover {crossover_rate}, \
                         score {score:.4}"
                    );
                    best_score = score;
                    best = Some(BestCell {
                        mutation_rate,
                        crossover_rate,
                        results,
                    });
                }
                on_event(&SweepEvent::CellFinished {
                    summary: &summary,
                    is_new_best,
                });
                cells.push(summary);

                if best.is_some() && best_score >= self.config.target_problem_fitness {
                    let skipped = total_cells - cells.len();
                    log::info!("best score {best_score:.4} reached the target; skipping {skipped} cell(s)");
                    on_event(&SweepEvent::TargetReached {
                        best_score,
                        skipped,
                    });
                    stop_reason = StopReason::TargetReached;
                    break 'rows;
                }

                if column != 0 && prev_local_score < score * self.config.prune_ratio {
                    let skipped = crossover_rates.len() - column - 1;
                    if skipped > 0 {
                        log::debug!("pruning row {row} after column {column}");
                        on_event(&SweepEvent::RowPruned { row, skipped });
                    }
                    break;
                }
                prev_local_score = score;
            }
        }

        let skipped_cells = total_cells - cells.len();
        if best.is_none() {
            log::warn!("no viable hyperparameter pair was found");
        }
        Ok(SweepReport {
            seed,
            total_cells,
            cells,
            skipped_cells,
            failed_trials,
            stop_reason,
            best,
        })
    }

    /// Feeds the successful outcomes of a cell into a fresh aggregate.
    fn aggregate(&self, cell: Cell, reports: Vec<TrialReport>) -> (Results, usize) {
        let mut results = Results::new(self.config.max_generations, TARGET_FITNESS);
        let mut failures = 0;
        for report in reports {
            match report.result {
                Ok(outcome) => results.add(outcome),
                Err(err) => {
                    failures += 1;
                    log_trial_failure(cell, report.index, report.seed, &err);
                }
            }
        }
        (results, failures)
    }
}

fn log_trial_failure(cell: Cell, index: usize, seed: TrialSeed, err: &TrialError) {
    log::warn!(
        "trial {index} (seed {seed}) of cell (mutation {}, crossover {}) failed: {err}",
        cell.mutation_rate,
        cell.crossover_rate
    );
}
