//! Parallel execution of the trials of one grid cell.
//!
//! [`TrialPool::run_with`] spawns up to `workers` threads. Workers claim trial
//! indices from a shared atomic counter, run the trial with its own seed, and send
//! the result back over a channel. Trials share nothing but the read-only runner.
//!
//! Failures stay local to the trial that caused them:
//!
//! - a panicking trial is caught and reported as [`TrialError::Panicked`]
//! - an outcome with non-finite or out-of-range values is [`TrialError::Malformed`]
//! - if no trial finishes within `trial_timeout`, every trial still outstanding is
//!   reported as [`TrialError::TimedOut`]; workers stop claiming new trials and any
//!   trial still running is left to finish on its own thread
//!
//! Reports are returned in trial-index order, regardless of completion order.

use std::{
    panic::{self, AssertUnwindSafe},
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
        mpsc::{self, RecvTimeoutError},
    },
    thread,
    time::Duration,
};

use onemax_ga::engine::{GeneticAlgorithm, TrialOutcome, TrialSeed};

/// Why a trial did not contribute an outcome.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum TrialError {
    #[display("trial panicked: {_0}")]
    Panicked(#[error(not(source))] String),
    #[display("trial did not finish in time")]
    TimedOut,
    #[display("trial returned a malformed outcome: {_0}")]
    Malformed(#[error(not(source))] String),
}

/// Result of one dispatched trial.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialReport {
    pub index: usize,
    pub seed: TrialSeed,
    pub result: Result<TrialOutcome, TrialError>,
}

/// Something that runs one trial from a seed.
///
/// Implemented for [`GeneticAlgorithm`]; tests plug in runners that panic or hang.
pub trait TrialRunner: Send + Sync + 'static {
    fn run_trial(&self, seed: TrialSeed) -> TrialOutcome;
}

impl TrialRunner for GeneticAlgorithm {
    fn run_trial(&self, seed: TrialSeed) -> TrialOutcome {
        self.run_seeded(seed)
    }
}

/// Fixed-size pool that runs the trials of one cell and waits for all of them.
#[derive(Debug, Clone, Copy)]
pub struct TrialPool {
    workers: usize,
    trial_timeout: Duration,
}

impl TrialPool {
    /// # Panics
    ///
    /// Panics if `workers` is zero.
    #[must_use]
    pub fn new(workers: usize, trial_timeout: Duration) -> Self {
        assert!(workers > 0, "a trial pool needs at least one worker");
        Self {
            workers,
            trial_timeout,
        }
    }

    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Runs one trial per seed on `runner`.
    ///
    /// `validate` checks each outcome; a rejected outcome becomes
    /// [`TrialError::Malformed`].
    pub fn run_with<T, V>(&self, runner: Arc<T>, seeds: &[TrialSeed], validate: V) -> Vec<TrialReport>
    where
        T: TrialRunner,
        V: Fn(&TrialOutcome) -> Result<(), String>,
    {
        let total = seeds.len();
        if total == 0 {
            return vec![];
        }

        let seeds: Arc<[TrialSeed]> = seeds.into();
        let next = Arc::new(AtomicUsize::new(0));
        let cancelled = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::channel();

        for _ in 0..self.workers.min(total) {
            let runner = Arc::clone(&runner);
            let seeds = Arc::clone(&seeds);
            let next = Arc::clone(&next);
            let cancelled = Arc::clone(&cancelled);
            let tx = tx.clone();
            thread::spawn(move || {
                while !cancelled.load(Ordering::Relaxed) {
                    let index = next.fetch_add(1, Ordering::Relaxed);
                    let Some(&seed) = seeds.get(index) else {
                        break;
                    };
                    let result = panic::catch_unwind(AssertUnwindSafe(|| runner.run_trial(seed)))
                        .map_err(|payload| TrialError::Panicked(panic_message(payload.as_ref())));
                    if tx.send((index, result)).is_err() {
                        // the cell gave up waiting
                        break;
                    }
                }
            });
        }
        drop(tx);

        let mut slots: Vec<Option<Result<TrialOutcome, TrialError>>> = vec![None; total];
        let mut received = 0;
        while received < total {
            match rx.recv_timeout(self.trial_timeout) {
                Ok((index, result)) => {
                    slots[index] = Some(result.and_then(|outcome| {
                        validate(&outcome).map_err(TrialError::Malformed)?;
                        Ok(outcome)
                    }));
                    received += 1;
                }
                Err(RecvTimeoutError::Timeout) => {
                    log::warn!(
                        "no trial finished within {:?}; abandoning {} outstanding trial(s)",
                        self.trial_timeout,
                        total - received
                    );
                    cancelled.store(true, Ordering::Relaxed);
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        slots
            .into_iter()
            .zip(seeds.iter())
            .enumerate()
            .map(|(index, (slot, &seed))| TrialReport {
                index,
                seed,
                result: slot.unwrap_or(Err(TrialError::TimedOut)),
            })
            .collect()
    }
}

/// Checks that an outcome is within the ranges the GA can produce.
pub fn validate_outcome(outcome: &TrialOutcome, max_generations: usize) -> Result<(), String> {
    if outcome.generation > max_generations {
        return Err(format!(
            "generation {} exceeds the budget of {max_generations}",
            outcome.generation
        ));
    }
    for (name, value) in [
        ("generation fitness", outcome.generation_fitness),
        ("best fitness", outcome.best_fitness),
    ] {
        if !(0.0..=1.0).contains(&value) {
            return Err(format!("{name} {value} is outside [0, 1]"));
        }
    }
    Ok(())
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use onemax_ga::{
        engine::{GaParams, Termination},
        selection::SelectionMode,
    };

    use super::*;

    fn run_ga(pool: &TrialPool, seeds: &[TrialSeed]) -> Vec<TrialReport> {
        let params = small_params();
        pool.run_with(Arc::new(GeneticAlgorithm::new(params)), seeds, |o| {
            validate_outcome(o, params.max_generations)
        })
    }

    fn small_params() -> GaParams {
        GaParams {
            population_size: 20,
            genome_length: 10,
            max_generations: 100,
            mutation_rate: 0.01,
            crossover_rate: 0.5,
            selection: SelectionMode::Tournament,
            target_generation_fitness: 0.9,
        }
    }

    fn outcome(seed: TrialSeed) -> TrialOutcome {
        TrialOutcome {
            generation: usize::try_from(seed).unwrap(),
            generation_fitness: 0.5,
            best_fitness: 1.0,
            termination: Termination::Converged,
        }
    }

    struct EchoRunner;

    impl TrialRunner for EchoRunner {
        fn run_trial(&self, seed: TrialSeed) -> TrialOutcome {
            outcome(seed)
        }
    }

    struct FlakyRunner;

    impl TrialRunner for FlakyRunner {
        fn run_trial(&self, seed: TrialSeed) -> TrialOutcome {
            assert!(seed % 2 == 0, "odd seed {seed}");
            outcome(seed)
        }
    }

    struct SlowRunner;

    impl TrialRunner for SlowRunner {
        fn run_trial(&self, seed: TrialSeed) -> TrialOutcome {
            if seed == 0 {
                outcome(seed)
            } else {
                thread::sleep(Duration::from_secs(5));
                outcome(seed)
            }
        }
    }

    #[test]
    fn test_reports_in_index_order() {
        let pool = TrialPool::new(3, Duration::from_secs(10));
        let seeds: Vec<TrialSeed> = (0..10).collect();
        let reports = pool.run_with(Arc::new(EchoRunner), &seeds, |_| Ok(()));
        assert_eq!(reports.len(), 10);
        for (i, report) in reports.iter().enumerate() {
            assert_eq!(report.index, i);
            assert_eq!(report.seed, seeds[i]);
            assert_eq!(report.result, Ok(outcome(seeds[i])));
        }
    }

    #[test]
    fn test_panics_become_trial_failures() {
        let pool = TrialPool::new(2, Duration::from_secs(10));
        let seeds: Vec<TrialSeed> = (0..6).collect();
        let reports = pool.run_with(Arc::new(FlakyRunner), &seeds, |_| Ok(()));
        for report in &reports {
            if report.seed % 2 == 0 {
                assert!(report.result.is_ok());
            } else {
                let Err(TrialError::Panicked(message)) = &report.result else {
                    panic!("expected a panic report, got {:?}", report.result);
                };
                assert!(message.contains("odd seed"));
            }
        }
    }

    #[test]
    fn test_timeout_marks_outstanding_trials() {
        let pool = TrialPool::new(2, Duration::from_millis(200));
        let reports = pool.run_with(Arc::new(SlowRunner), &[0, 1, 2], |_| Ok(()));
        assert!(reports[0].result.is_ok());
        assert!(reports[1..].iter().all(|r| r.result == Err(TrialError::TimedOut)));
    }

    #[test]
    fn test_malformed_outcome_rejected() {
        let pool = TrialPool::new(1, Duration::from_secs(10));
        let reports = pool.run_with(Arc::new(EchoRunner), &[5, 500], |o| {
            validate_outcome(o, 100)
        });
        assert!(reports[0].result.is_ok());
        assert!(matches!(reports[1].result, Err(TrialError::Malformed(_))));
    }

    #[test]
    fn test_validate_outcome_ranges() {
        let mut o = outcome(3);
        assert_eq!(validate_outcome(&o, 10), Ok(()));
        o.best_fitness = f64::NAN;
        assert!(validate_outcome(&o, 10).is_err());
        o.best_fitness = 1.0;
        o.generation_fitness = 1.2;
        assert!(validate_outcome(&o, 10).is_err());
    }

    #[test]
    fn test_real_trials() {
        let pool = TrialPool::new(4, Duration::from_secs(60));
        let reports = run_ga(&pool, &[1, 2, 3, 4, 5]);
        assert_eq!(reports.len(), 5);
        assert!(reports.iter().all(|r| r.result.is_ok()));
    }

    #[test]
    fn test_real_trials_are_reproducible() {
        let pool = TrialPool::new(3, Duration::from_secs(60));
        let first = run_ga(&pool, &[7, 8, 9]);
        let second = run_ga(&pool, &[7, 8, 9]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_seed_list() {
        let pool = TrialPool::new(2, Duration::from_secs(1));
        assert!(run_ga(&pool, &[]).is_empty());
    }
}
