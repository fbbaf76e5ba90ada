use std::{path::PathBuf, time::Duration, time::Instant};

use chrono::Utc;
use onemax_ga::selection::SelectionMode;
use onemax_sweep::{
    config::SweepConfig,
    sweep::{Sweep, SweepEvent, SweepReport},
};

use crate::{
    report::SweepReportFile,
    util::{self, JsonTarget},
};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct SweepArg {
    /// JSON file with sweep settings (missing fields keep their defaults)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Independent trials per grid cell
    #[arg(long)]
    trials: Option<usize>,
    /// Maximum generations per trial
    #[arg(long)]
    generations: Option<usize>,
    /// Number of genomes in each population
    #[arg(long)]
    population_size: Option<usize>,
    /// Number of bits in each genome
    #[arg(long)]
    genome_length: Option<usize>,
    /// Parent selection mode: tournament or roulette (unknown names use tournament)
    #[arg(long)]
    selection: Option<String>,
    /// Generation mean fitness at which a trial stops early
    #[arg(long)]
    target_generation_fitness: Option<f64>,
    /// Best score at which the whole sweep stops
    #[arg(long)]
    target_problem_fitness: Option<f64>,
    #[arg(long)]
    mutation_min: Option<f64>,
    #[arg(long)]
    mutation_max: Option<f64>,
    #[arg(long)]
    mutation_steps: Option<usize>,
    /// Walk mutation rates from high to low
    #[arg(long)]
    mutation_invert: Option<bool>,
    #[arg(long)]
    crossover_min: Option<f64>,
    #[arg(long)]
    crossover_max: Option<f64>,
    #[arg(long)]
    crossover_steps: Option<usize>,
    /// Walk crossover rates from high to low
    #[arg(long)]
    crossover_invert: Option<bool>,
    /// Skip the rest of a row once the previous cell scored below this fraction of the current one
    #[arg(long)]
    prune_ratio: Option<f64>,
    /// Seconds to wait for the next trial of a cell before giving up on it
    #[arg(long)]
    trial_timeout: Option<f64>,
    /// Worker threads (default: available cores minus 2, at least 2)
    #[arg(long)]
    workers: Option<usize>,
    /// Master seed for reproducible sweeps
    #[arg(long)]
    seed: Option<u64>,
    /// Also write the report as JSON (to stdout when no path is given)
    #[arg(long, num_args = 0..=1, value_name = "PATH")]
    json: Option<Option<PathBuf>>,
}

impl SweepArg {
    fn build_config(&self) -> anyhow::Result<SweepConfig> {
        let mut config = match &self.config {
            Some(path) => util::read_sweep_config_file(path)?,
            None => SweepConfig::default(),
        };

        macro_rules! overlay {
            ($($arg:ident => $($field:ident).+),* $(,)?) => {
                $(if let Some(value) = self.$arg {
                    config.$($field).+ = value;
                })*
            };
        }
        overlay!(
            trials => trials_per_cell,
            generations => max_generations,
            population_size => population_size,
            genome_length => genome_length,
            target_generation_fitness => target_generation_fitness,
            target_problem_fitness => target_problem_fitness,
            mutation_min => mutation.min,
            mutation_max => mutation.max,
            mutation_steps => mutation.steps,
            mutation_invert => mutation.invert,
            crossover_min => crossover.min,
            crossover_max => crossover.max,
            crossover_steps => crossover.steps,
            crossover_invert => crossover.invert,
            prune_ratio => prune_ratio,
            workers => workers,
        );
        if let Some(name) = &self.selection {
            config.selection = SelectionMode::from_name_or_default(name);
        }
        if let Some(secs) = self.trial_timeout {
            config.trial_timeout = Duration::try_from_secs_f64(secs)
                .map_err(|e| anyhow::anyhow!("invalid trial timeout {secs}: {e}"))?;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        log::debug!("sweep configuration: {config:?}");
        Ok(config)
    }
}

pub(crate) fn run(arg: &SweepArg) -> anyhow::Result<()> {
    let config = arg.build_config()?;
    let sweep = Sweep::new(config.clone())?;
    let mutation_rates = config.mutation.values();
    let crossover_rates = config.crossover.values();

    print_banner(&config, &mutation_rates, &crossover_rates);

    let total = mutation_rates.len() * crossover_rates.len();
    let mut done = 0;
    let mut best_score = 0.0;
    let start = Instant::now();
    let report = sweep.run_grid(&mutation_rates, &crossover_rates, |event| match event {
        SweepEvent::CellStarted(cell) => {
            eprint!(
                "[{:>3}/{total}] Score: {best_score:.3}  mutation {:<8} crossover {:<8}",
                done + 1,
                cell.mutation_rate,
                cell.crossover_rate
            );
        }
        SweepEvent::CellFinished {
            summary,
            is_new_best,
        } => {
            done += 1;
            if *is_new_best {
                best_score = summary.score();
            }
            eprintln!(
                " => {:.3}{}{}",
                summary.score(),
                if *is_new_best { " (best)" } else { "" },
                if summary.is_degraded() {
                    format!(
                        " [degraded: {}/{} trials]",
                        summary.successful_trials, summary.requested_trials
                    )
                } else {
                    String::new()
                }
            );
        }
        SweepEvent::RowPruned { row, skipped } => {
            done += skipped;
            eprintln!("  row {row}: skipping {skipped} remaining crossover rate(s)");
        }
        SweepEvent::TargetReached {
            best_score,
            skipped,
        } => {
            done += skipped;
            eprintln!("  target reached with score {best_score:.3}; skipping {skipped} cell(s)");
        }
    })?;
    let elapsed = start.elapsed();

    print_summary(&report, elapsed);

    if let Some(json) = &arg.json {
        let file = SweepReportFile {
            finished_at: Utc::now(),
            elapsed_secs: elapsed.as_secs_f64(),
            config,
            report,
        };
        let target = JsonTarget::from_output_path(json.clone());
        target.write_json(&file)?;
        eprintln!("Report written to {}", target.display_path());
    }

    Ok(())
}

fn print_banner(config: &SweepConfig, mutation_rates: &[f64], crossover_rates: &[f64]) {
    let first_last = |values: &[f64]| {
        (
            values.first().copied().unwrap_or_default(),
            values.last().copied().unwrap_or_default(),
        )
    };
    let (mutation_first, mutation_last) = first_last(mutation_rates);
    let (crossover_first, crossover_last) = first_last(crossover_rates);

    eprintln!(
        "Running {} times the one max problem with genetic algorithms for:",
        config.trials_per_cell
    );
    eprintln!("  Generations:           {:>8}", config.max_generations);
    eprintln!("  Population Size:       {:>8}", config.population_size);
    eprintln!("  Genome Length:         {:>8}", config.genome_length);
    eprintln!("  Parent selection mode: {:>8}", config.selection);
    eprintln!(
        "  Mutation Rate:  {mutation_first:>9} to {mutation_last} with {} steps",
        mutation_rates.len()
    );
    eprintln!(
        "  Crossover Rate: {crossover_first:>9} to {crossover_last} with {} steps",
        crossover_rates.len()
    );
    eprintln!("  Workers:               {:>8}", config.workers);
    eprintln!("{}", "-".repeat(50));
}

fn print_summary(report: &SweepReport, elapsed: Duration) {
    eprintln!(
        "Evaluated {} of {} cells ({} skipped, {} failed trials) in {:.2?}; {}",
        report.evaluated_cells(),
        report.total_cells,
        report.skipped_cells,
        report.failed_trials,
        elapsed,
        report.stop_reason
    );
    eprintln!("Seed: {}", report.seed);

    println!("{}", "-".repeat(50));
    println!("\tBest results");
    println!("{}", "-".repeat(50));
    match &report.best {
        Some(best) => {
            println!("Best Mutation Rate: {}", best.mutation_rate);
            println!("Best Crossover Rate: {}", best.crossover_rate);
            println!("{}", best.results);
        }
        None => println!("No viable hyperparameter pair was found."),
    }
}
