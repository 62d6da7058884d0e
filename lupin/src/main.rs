mod run_correlation;
mod run_sample;
mod run_simulate;

use run_correlation::*;
use run_sample::*;
use run_simulate::*;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Linear-regression Updates by Posterior INference
#[derive(Parser)]
#[command(name = "lupin", version, about, long_about, term_width = 80)]
struct Cli {
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    commands: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate y = b0 + b1 x1 + ... + e with Normal covariates and noise
    #[command(alias = "sim")]
    Simulate(SimulateArgs),

    /// Sample the posterior of a Bayesian linear regression
    Sample(SampleArgs),

    /// Sample the posterior of a correlation coefficient
    #[command(alias = "cor")]
    Correlation(CorrelationArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    match &cli.commands {
        Commands::Simulate(args) => {
            simulate(args)?;
        }
        Commands::Sample(args) => {
            sample(args)?;
        }
        Commands::Correlation(args) => {
            correlation(args)?;
        }
    }

    Ok(())
}
