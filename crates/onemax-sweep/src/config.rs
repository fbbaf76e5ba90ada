//! Sweep configuration.
//!
//! [`SweepConfig`] is fixed when the sweep starts. [`SweepConfig::validate`] runs
//! before any trial is dispatched and rejects values the GA cannot run with.
//! The defaults are a moderately sized sweep: 8 trials per cell over an
//! 8 × 5 grid of mutation and crossover rates.

use std::{num::NonZeroUsize, thread, time::Duration};

use onemax_ga::{engine::GaParams, selection::SelectionMode};
use serde::{Deserialize, Serialize};

use crate::grid::evenly_spaced;

/// Cores left free for the rest of the system when sizing the worker pool.
pub const RESERVED_CORES: usize = 2;
/// Smallest worker pool used when the host parallelism is unknown or tiny.
pub const MIN_WORKERS: usize = 2;

/// One axis of the rate grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateRange {
    pub min: f64,
    pub max: f64,
    pub steps: usize,
    /// Walk the axis from `max` down to `min`.
    #[serde(default)]
    pub invert: bool,
}

impl RateRange {
    /// Expands the range into its evenly spaced values.
    #[must_use]
    pub fn values(&self) -> Vec<f64> {
        evenly_spaced(self.min, self.max, self.steps, self.invert)
    }
}

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("population size must be at least 1")]
    InvalidPopulationSize,
    #[display("genome length must be at least 1")]
    InvalidGenomeLength,
    #[display("max generations must be at least 1")]
    InvalidMaxGenerations,
    #[display("trials per cell must be at least 1")]
    InvalidTrialCount,
    #[display("{name} must be within [0, 1], got {value}")]
    RateOutOfRange { name: &'static str, value: f64 },
    #[display("{name} range is empty or reversed: min {min}, max {max}, {steps} steps")]
    InvalidRange {
        name: &'static str,
        min: f64,
        max: f64,
        steps: usize,
    },
    #[display("{name} must be a finite number within [0, 1], got {value}")]
    ThresholdOutOfRange { name: &'static str, value: f64 },
    #[display("worker count must be at least 1")]
    InvalidWorkerCount,
    #[display("trial timeout must be positive")]
    InvalidTrialTimeout,
}

/// Everything a sweep needs to run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Independent trials run for every grid cell.
    pub trials_per_cell: usize,
    pub max_generations: usize,
    pub population_size: usize,
    pub genome_length: usize,
    pub selection: SelectionMode,
    /// Generation mean needed (together with an optimal genome) to end a trial early.
    pub target_generation_fitness: f64,
    /// Best score at which the whole sweep stops.
    pub target_problem_fitness: f64,
    pub mutation: RateRange,
    pub crossover: RateRange,
    /// A row is abandoned once the previous cell scored below `prune_ratio` times
    /// the current cell.
    pub prune_ratio: f64,
    /// Longest wait for the next trial of a cell to finish.
    #[serde(with = "duration_secs")]
    pub trial_timeout: Duration,
    pub workers: usize,
    /// Master seed; drawn from the OS when absent.
    pub seed: Option<u64>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            trials_per_cell: 8,
            max_generations: 400,
            population_size: 50,
            genome_length: 35,
            selection: SelectionMode::Tournament,
            target_generation_fitness: 0.998,
            target_problem_fitness: 0.999,
            mutation: RateRange {
                min: 0.001,
                max: 0.01,
                steps: 8,
                invert: true,
            },
            crossover: RateRange {
                min: 0.1,
                max: 0.6,
                steps: 5,
                invert: false,
            },
            prune_ratio: 0.9,
            trial_timeout: Duration::from_secs(300),
            workers: default_workers(),
            seed: None,
        }
    }
}

/// Available parallelism minus [`RESERVED_CORES`], but never below [`MIN_WORKERS`].
#[must_use]
pub fn default_workers() -> usize {
    thread::available_parallelism()
        .map_or(MIN_WORKERS, NonZeroUsize::get)
        .saturating_sub(RESERVED_CORES)
        .max(MIN_WORKERS)
}

impl SweepConfig {
    /// Checks every field, returning the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size == 0 {
            return Err(ConfigError::InvalidPopulationSize);
        }
        if self.genome_length == 0 {
            return Err(ConfigError::InvalidGenomeLength);
        }
        if self.max_generations == 0 {
            return Err(ConfigError::InvalidMaxGenerations);
        }
        if self.trials_per_cell == 0 {
            return Err(ConfigError::InvalidTrialCount);
        }
        if self.workers == 0 {
            return Err(ConfigError::InvalidWorkerCount);
        }
        if self.trial_timeout.is_zero() {
            return Err(ConfigError::InvalidTrialTimeout);
        }
        check_range("mutation rate", &self.mutation)?;
        check_range("crossover rate", &self.crossover)?;
        check_threshold("target generation fitness", self.target_generation_fitness)?;
        check_threshold("target problem fitness", self.target_problem_fitness)?;
        check_threshold("prune ratio", self.prune_ratio)?;
        Ok(())
    }

    /// GA parameters for one grid cell.
    #[must_use]
    pub fn ga_params(&self, mutation_rate: f64, crossover_rate: f64) -> GaParams {
        GaParams {
            population_size: self.population_size,
            genome_length: self.genome_length,
            max_generations: self.max_generations,
            mutation_rate,
            crossover_rate,
            selection: self.selection,
            target_generation_fitness: self.target_generation_fitness,
        }
    }
}

/// Rejects a rate outside `[0, 1]`.
pub fn check_rate(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::RateOutOfRange { name, value })
    }
}

fn check_range(name: &'static str, range: &RateRange) -> Result<(), ConfigError> {
    check_rate(name, range.min)?;
    check_rate(name, range.max)?;
    if range.steps == 0 || range.min > range.max {
        return Err(ConfigError::InvalidRange {
            name,
            min: range.min,
            max: range.max,
            steps: range.steps,
        });
    }
    Ok(())
}

fn check_threshold(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::ThresholdOutOfRange { name, value })
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize as _, Deserializer, Serializer};

    pub(super) fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert_eq!(SweepConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_default_axes() {
        let config = SweepConfig::default();
        let mutation = config.mutation.values();
        assert_eq!(mutation.len(), 8);
        assert_eq!(mutation[0], 0.01);
        assert_eq!(config.crossover.values(), vec![0.1, 0.225, 0.35, 0.475, 0.6]);
    }

    #[test]
    fn test_rejects_bad_sizes() {
        let config = SweepConfig {
            population_size: 0,
            ..SweepConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidPopulationSize));

        let config = SweepConfig {
            genome_length: 0,
            ..SweepConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidGenomeLength));

        let config = SweepConfig {
            trials_per_cell: 0,
            ..SweepConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidTrialCount));
    }

    #[test]
    fn test_rejects_rate_out_of_range() {
        let mut config = SweepConfig::default();
        config.crossover.max = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::RateOutOfRange {
                name: "crossover rate",
                ..
            })
        ));

        let mut config = SweepConfig::default();
        config.mutation.min = -0.1;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::RateOutOfRange { .. })
        ));
    }

    #[test]
    fn test_rejects_reversed_range() {
        let mut config = SweepConfig::default();
        config.mutation.min = 0.5;
        config.mutation.max = 0.1;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_rejects_nan_threshold() {
        let config = SweepConfig {
            prune_ratio: f64::NAN,
            ..SweepConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ThresholdOutOfRange { .. })
        ));
    }

    #[test]
    fn test_default_workers_floor() {
        assert!(default_workers() >= MIN_WORKERS);
    }

    #[test]
    fn test_json_overlay_keeps_defaults() {
        let config: SweepConfig =
            serde_json::from_str(r#"{ "trials_per_cell": 3, "selection": "Roulette", "trial_timeout": 1.5 }"#)
                .unwrap();
        assert_eq!(config.trials_per_cell, 3);
        assert_eq!(config.selection, SelectionMode::Roulette);
        assert_eq!(config.trial_timeout, Duration::from_millis(1500));
        assert_eq!(config.population_size, SweepConfig::default().population_size);
    }
}
