//! Aggregation of trial outcomes into a single score.
//!
//! Every grid cell owns one [`Results`]. Each trial outcome is appended to three
//! parallel histories and the derived summaries are recomputed from scratch, so
//! recomputing twice without new outcomes always gives the same values.
//!
//! # Score
//!
//! ```text
//! score = 0.4 * best_fitness / max_fitness
//!       + 0.3 * avg_generation_fitness
//!       + 0.2 * avg_best_fitness / max_fitness
//!       + 0.1 * (1 - (avg_generation - 1) / max_generations)
//! ```
//!
//! The last term rewards trials that stop early. An aggregate with no outcomes has
//! all summaries and the score at `0.0`.

use std::fmt;

use onemax_ga::engine::TrialOutcome;
use serde::{Deserialize, Serialize};

/// Weight of the best fitness observed in any trial.
pub const WEIGHT_BEST_FITNESS: f64 = 0.4;
/// Weight of the average generation mean fitness.
pub const WEIGHT_AVG_GENERATION_FITNESS: f64 = 0.3;
/// Weight of the average best fitness.
pub const WEIGHT_AVG_BEST_FITNESS: f64 = 0.2;
/// Weight of the early-stopping reward.
pub const WEIGHT_AVG_GENERATION: f64 = 0.1;

/// Summaries derived from the stored outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ResultsSummary {
    pub trial_count: usize,
    pub avg_generation: f64,
    pub avg_generation_fitness: f64,
    pub avg_best_fitness: f64,
    pub best_fitness: f64,
    pub score: f64,
}

/// Outcomes of all trials run for one hyperparameter pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Results {
    max_generations: usize,
    max_fitness: f64,
    generations: Vec<usize>,
    generation_fitnesses: Vec<f64>,
    best_fitnesses: Vec<f64>,
    summary: ResultsSummary,
}

impl Results {
    /// Creates an empty aggregate.
    ///
    /// # Panics
    ///
    /// Panics if `max_generations` is zero or `max_fitness` is not positive.
    #[must_use]
    pub fn new(max_generations: usize, max_fitness: f64) -> Self {
        assert!(max_generations > 0, "max_generations must be positive");
        assert!(max_fitness > 0.0, "max_fitness must be positive");
        Self {
            max_generations,
            max_fitness,
            generations: vec![],
            generation_fitnesses: vec![],
            best_fitnesses: vec![],
            summary: ResultsSummary::default(),
        }
    }

    /// Appends one trial outcome and refreshes the summaries.
    ///
    /// # Examples
    ///
    /// ```
    /// use onemax_ga::engine::{Termination, TrialOutcome};
    /// use onemax_sweep::results::Results;
    ///
    /// let mut results = Results::new(100, 1.0);
    /// assert_eq!(results.score(), 0.0);
    ///
    /// results.add(TrialOutcome {
    ///     generation: 12,
    ///     generation_fitness: 0.95,
    ///     best_fitness: 1.0,
    ///     termination: Termination::Converged,
    /// });
    /// assert_eq!(results.summary().trial_count, 1);
    /// assert!(results.score() > 0.9);
    /// ```
    pub fn add(&mut self, outcome: TrialOutcome) {
        self.add_result(
            outcome.generation,
            outcome.generation_fitness,
            outcome.best_fitness,
        );
    }

    /// Appends one `(generation, generation_fitness, best_fitness)` triple.
    pub fn add_result(&mut self, generation: usize, generation_fitness: f64, best_fitness: f64) {
        self.generations.push(generation);
        self.generation_fitnesses.push(generation_fitness);
        self.best_fitnesses.push(best_fitness);
        self.recompute();
    }

    /// Recomputes every summary from the stored histories.
    #[expect(clippy::cast_precision_loss)]
    pub fn recompute(&mut self) {
        let n = self.generations.len();
        if n == 0 {
            self.summary = ResultsSummary::default();
            return;
        }

        let count = n as f64;
        let avg_generation = self.generations.iter().sum::<usize>() as f64 / count;
        let avg_generation_fitness = self.generation_fitnesses.iter().sum::<f64>() / count;
        let avg_best_fitness = self.best_fitnesses.iter().sum::<f64>() / count;
        let best_fitness = self
            .best_fitnesses
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);

        let score_best_fitness = best_fitness / self.max_fitness;
        let score_avg_generation_fitness = avg_generation_fitness;
        let score_avg_best_fitness = avg_best_fitness / self.max_fitness;
        let score_avg_generation = 1.0 - (avg_generation - 1.0) / self.max_generations as f64;

        let score = WEIGHT_BEST_FITNESS * score_best_fitness
            + WEIGHT_AVG_GENERATION * score_avg_generation
            + WEIGHT_AVG_GENERATION_FITNESS * score_avg_generation_fitness
            + WEIGHT_AVG_BEST_FITNESS * score_avg_best_fitness;

        self.summary = ResultsSummary {
            trial_count: n,
            avg_generation,
            avg_generation_fitness,
            avg_best_fitness,
            best_fitness,
            score,
        };
    }

    #[must_use]
    pub fn score(&self) -> f64 {
        self.summary.score
    }

    #[must_use]
    pub fn summary(&self) -> &ResultsSummary {
        &self.summary
    }

    #[must_use]
    pub fn generations(&self) -> &[usize] {
        &self.generations
    }

    #[must_use]
    pub fn generation_fitnesses(&self) -> &[f64] {
        &self.generation_fitnesses
    }

    #[must_use]
    pub fn best_fitnesses(&self) -> &[f64] {
        &self.best_fitnesses
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.generations.is_empty()
    }
}

impl fmt::Display for Results {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.summary;
        writeln!(f, "Overall score: {:.3}", s.score)?;
        writeln!(f, "Best fitness: {}", s.best_fitness)?;
        writeln!(f, "Average Generation Fitness: {:.3}", s.avg_generation_fitness)?;
        writeln!(f, "Average Best Fitness: {:.3}", s.avg_best_fitness)?;
        write!(
            f,
            "Average Generations Run: {:.3} of {} max generations ({} trials).",
            s.avg_generation, self.max_generations, s.trial_count
        )
    }
}
