use anyhow::Result;
use clap::Args;
use log::info;
use lupin::correlation::{CorrelationModel, CorrelationSampler};
use lupin::io::{open_buf_writer, read_table};
use std::io::Write;

#[derive(Args, Debug)]
pub struct CorrelationArgs {
    /// Data table with a header line (`.gz` ok)
    #[arg(short, long)]
    pub data: String,

    /// First variable (default: first column)
    #[arg(long)]
    pub x: Option<String>,

    /// Second variable (default: second column)
    #[arg(long)]
    pub y: Option<String>,

    /// Proposal standard deviation
    #[arg(long, default_value = "0.1")]
    pub scale: f64,

    /// Initial correlation, strictly inside (-1, 1)
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    pub init: f64,

    /// Number of iterations (the first one is the initial value)
    #[arg(short = 'k', long, default_value = "20000")]
    pub iterations: usize,

    /// Iterations discarded before summarizing
    #[arg(long, default_value = "2000")]
    pub burn_in: usize,

    /// Random seed
    #[arg(long, default_value = "42")]
    pub seed: u64,

    /// Output file prefix: `{out}.chain.tsv.gz`, `{out}.summary.tsv`
    #[arg(short, long)]
    pub output: String,
}

fn column_index(columns: &[Box<str>], name: Option<&String>, default: usize) -> Result<usize> {
    match name {
        Some(name) => columns
            .iter()
            .position(|c| c.as_ref() == name)
            .ok_or(anyhow::anyhow!("no column named {}", name)),
        None if default < columns.len() => Ok(default),
        None => anyhow::bail!("need at least {} columns", default + 1),
    }
}

pub fn correlation(args: &CorrelationArgs) -> Result<()> {
    if args.iterations < args.burn_in.saturating_add(2) {
        anyhow::bail!(
            "need at least two iterations after burn-in (burn-in {}, iterations {})",
            args.burn_in,
            args.iterations
        );
    }

    let table = read_table(&args.data, true)?;
    let ix = column_index(&table.columns, args.x.as_ref(), 0)?;
    let iy = column_index(&table.columns, args.y.as_ref(), 1)?;

    let xx: Vec<f64> = table.data.column(ix).iter().copied().collect();
    let yy: Vec<f64> = table.data.column(iy).iter().copied().collect();

    let model = CorrelationModel::new(&xx, &yy)?;
    info!(
        "{} pairs, sample correlation {:.4}",
        model.nobs(),
        model.sample_correlation()
    );

    let sampler = CorrelationSampler::new(args.scale, args.init)?;
    let posterior = sampler.sample(&model, args.iterations, args.seed)?;

    let chain = posterior.chain();
    let chain_file = format!("{}.chain.tsv.gz", args.output);
    {
        let mut buf = open_buf_writer(&chain_file)?;
        writeln!(buf, "iter\trho\tlogpost")?;
        for (i, (rho, lp)) in chain
            .samples()
            .iter()
            .zip(chain.log_likelihoods())
            .enumerate()
        {
            writeln!(buf, "{}\t{}\t{}", i + 1, rho, lp)?;
        }
        buf.flush()?;
    }

    let kept = chain.discard(args.burn_in);
    let mean = kept.posterior_mean()[0];
    let sd = kept.posterior_variance()[0].sqrt();
    let lb = kept.quantile(0.025)[0];
    let ub = kept.quantile(0.975)[0];
    let rate = posterior.acceptance().rate().unwrap_or(f64::NAN);

    let summary_file = format!("{}.summary.tsv", args.output);
    let mut buf = open_buf_writer(&summary_file)?;
    writeln!(buf, "parameter\tmean\tsd\tq2.5\tq97.5\tpearson\taccept")?;
    writeln!(
        buf,
        "rho\t{:.6}\t{:.6}\t{:.6}\t{:.6}\t{:.6}\t{:.6}",
        mean,
        sd,
        lb,
        ub,
        model.sample_correlation(),
        rate
    )?;
    buf.flush()?;

    info!(
        "rho: mean {:.4}, 95% interval [{:.4}, {:.4}], acceptance {:.3}",
        mean, lb, ub, rate
    );
    Ok(())
}
