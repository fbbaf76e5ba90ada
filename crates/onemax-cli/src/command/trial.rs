use onemax_ga::{
    engine::{GaParams, GeneticAlgorithm, Termination, TrialRecord},
    fitness,
    selection::SelectionMode,
};
use onemax_sweep::config;
use rand::{Rng as _, SeedableRng as _};
use rand_pcg::Pcg64;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct TrialArg {
    /// Number of genomes in the population
    #[arg(long, default_value_t = 50)]
    population_size: usize,
    /// Number of bits in each genome
    #[arg(long, default_value_t = 35)]
    genome_length: usize,
    /// Maximum number of generations
    #[arg(long, default_value_t = 400)]
    generations: usize,
    /// Per-bit mutation probability
    #[arg(long, default_value_t = 0.01)]
    mutation_rate: f64,
    /// Per-pair crossover probability
    #[arg(long, default_value_t = 0.4)]
    crossover_rate: f64,
    /// Parent selection mode: tournament or roulette (unknown names use tournament)
    #[arg(long, default_value = "tournament")]
    selection: String,
    /// Generation mean fitness at which the trial stops early
    #[arg(long, default_value_t = 0.998)]
    target_generation_fitness: f64,
    /// Seed for a reproducible trial
    #[arg(long)]
    seed: Option<u64>,
    /// Print every generation instead of only improvements
    #[arg(long)]
    verbose: bool,
}

pub(crate) fn run(arg: &TrialArg) -> anyhow::Result<()> {
    anyhow::ensure!(arg.population_size > 0, "population size must be positive");
    anyhow::ensure!(arg.genome_length > 0, "genome length must be positive");
    config::check_rate("mutation rate", arg.mutation_rate)?;
    config::check_rate("crossover rate", arg.crossover_rate)?;
    config::check_rate("target generation fitness", arg.target_generation_fitness)?;

    let params = GaParams {
        population_size: arg.population_size,
        genome_length: arg.genome_length,
        max_generations: arg.generations,
        mutation_rate: arg.mutation_rate,
        crossover_rate: arg.crossover_rate,
        selection: SelectionMode::from_name_or_default(&arg.selection),
        target_generation_fitness: arg.target_generation_fitness,
    };
    let seed = arg.seed.unwrap_or_else(|| rand::rng().random());
    let ga = GeneticAlgorithm::new(params);

    eprintln!(
        "Trial: population {}, genome {} bits, {} generations, mutation {}, crossover {}, {} selection (seed {seed})",
        params.population_size,
        params.genome_length,
        params.max_generations,
        params.mutation_rate,
        params.crossover_rate,
        params.selection,
    );

    let mut best_mean = f64::NEG_INFINITY;
    let record = ga.run_with_callback(&mut Pcg64::seed_from_u64(seed), |report| {
        let improved = report.stats.mean > best_mean;
        if improved {
            best_mean = report.stats.mean;
        }
        if arg.verbose || improved {
            eprintln!(
                "gen {:>5}: mean {:.4}  best {:.4}  {}",
                report.generation, report.stats.mean, report.stats.best, report.best_genome
            );
        }
    });
    let outcome = &record.outcome;

    println!("Stopped at generation: {}", outcome.generation);
    println!("Generation fitness:    {:.4}", outcome.generation_fitness);
    println!("Best fitness:          {:.4}", outcome.best_fitness);
    match outcome.termination {
        Termination::Converged => println!("Termination:           converged"),
        Termination::Exhausted { best_generation } => {
            println!("Termination:           exhausted (best generation {best_generation})");
        }
    }
    if let Some(line) = best_solution_line(&record) {
        println!("{line}");
    }

    Ok(())
}

/// Best genome of the reported generation, with its own fitness.
fn best_solution_line(record: &TrialRecord) -> Option<String> {
    let genome = record.best_genome.as_ref()?;
    Some(format!(
        "Best final solution:   {genome} (fitness {:.4})",
        fitness::genome_fitness(genome)
    ))
}
