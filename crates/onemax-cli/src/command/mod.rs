use clap::{Parser, Subcommand};

use self::{sweep::SweepArg, trial::TrialArg};

mod sweep;
mod trial;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Search mutation and crossover rates for the best convergence
    Sweep(#[clap(flatten)] SweepArg),
    /// Run a single verbose GA trial with explicit rates
    Trial(#[clap(flatten)] TrialArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode.unwrap_or(Mode::Sweep(SweepArg::default())) {
        Mode::Sweep(arg) => sweep::run(&arg)?,
        Mode::Trial(arg) => trial::run(&arg)?,
    }
    Ok(())
}
