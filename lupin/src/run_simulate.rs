use anyhow::Result;
use clap::Args;
use log::info;
use lupin::io::write_table;
use lupin::simulate::simulate_regression;
use nalgebra::DMatrix;

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Number of observations
    #[arg(short = 'n', long, default_value = "500")]
    pub nobs: usize,

    /// Intercept
    #[arg(long, default_value = "4.2", allow_hyphen_values = true)]
    pub intercept: f64,

    /// Slopes, one per covariate (comma separated)
    #[arg(long, value_delimiter = ',', default_value = "1.87", allow_hyphen_values = true)]
    pub slopes: Vec<f64>,

    /// Standard deviation of each covariate
    #[arg(long, default_value = "3.0")]
    pub x_sd: f64,

    /// Standard deviation of the noise
    #[arg(long, default_value = "2.1")]
    pub noise_sd: f64,

    /// Random seed
    #[arg(long, default_value = "42")]
    pub seed: u64,

    /// Output file (`.gz` for gzip, "stdout" to print)
    #[arg(short, long)]
    pub output: String,
}

/// Writes `y, x1, ..., xK` (no intercept column)
pub fn simulate(args: &SimulateArgs) -> Result<()> {
    let sim = simulate_regression(
        args.nobs,
        args.intercept,
        &args.slopes,
        args.x_sd,
        args.noise_sd,
        args.seed,
    )?;

    let k = args.slopes.len();
    let mut table = DMatrix::zeros(args.nobs, 1 + k);
    table.set_column(0, &sim.y);
    for j in 1..=k {
        table.set_column(j, &sim.x.column(j));
    }

    let columns: Vec<Box<str>> = std::iter::once("y".into())
        .chain((1..=k).map(|j| format!("x{}", j).into()))
        .collect();

    write_table(&args.output, &columns, &table)?;
    info!("Wrote {} x {} table to {}", args.nobs, 1 + k, args.output);
    Ok(())
}
