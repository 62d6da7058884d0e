use anyhow::Result;
use clap::Args;
use indicatif::{ProgressBar, ProgressDrawTarget};
use log::info;
use lupin::io::{open_buf_writer, read_table, write_chain};
use lupin::ols::fit_ols;
use lupin::{
    run_chains, InverseGammaPrior, NormalPrior, Posterior, Priors, RegressionData, RegressionState,
    SamplerKind, SamplingPlan,
};
use mcmc_util::{AcceptanceCounter, McmcChain};
use nalgebra::{DMatrix, DVector};
use std::io::Write;

#[derive(Args, Debug)]
pub struct SampleArgs {
    /// Data table with a header line (`.gz` ok); one response column,
    /// all other columns are covariates
    #[arg(short, long)]
    pub data: String,

    /// Name of the response column
    #[arg(short = 'r', long, default_value = "y")]
    pub response: String,

    /// Do not add an intercept column
    #[arg(long, default_value_t = false)]
    pub no_intercept: bool,

    /// Sampler per coefficient, intercept first: `gibbs` or `mh:<scale>`
    /// (comma separated; a single value applies to all)
    #[arg(long, value_delimiter = ',', default_value = "gibbs")]
    pub samplers: Vec<String>,

    /// Prior mean of each coefficient (comma separated; a single value applies to all)
    #[arg(long, value_delimiter = ',', default_value = "0", allow_hyphen_values = true)]
    pub prior_mean: Vec<f64>,

    /// Prior variance of each coefficient (comma separated; a single value applies to all)
    #[arg(long, value_delimiter = ',', default_value = "1000")]
    pub prior_var: Vec<f64>,

    /// Shape of the inverse-gamma prior on the residual variance
    #[arg(long, default_value = "0.001")]
    pub ig_shape: f64,

    /// Scale of the inverse-gamma prior on the residual variance
    #[arg(long, default_value = "0.001")]
    pub ig_scale: f64,

    /// Initial coefficients (comma separated; a single value applies to all)
    #[arg(long, value_delimiter = ',', default_value = "0", allow_hyphen_values = true)]
    pub init_coef: Vec<f64>,

    /// Initial residual variance
    #[arg(long, default_value = "1")]
    pub init_var: f64,

    /// Number of iterations per chain (the first one is the initial state)
    #[arg(short = 'k', long, default_value = "20000")]
    pub iterations: usize,

    /// Iterations discarded before summarizing
    #[arg(long, default_value = "2000")]
    pub burn_in: usize,

    /// Number of independent chains (seed, seed + 1, ...)
    #[arg(long, default_value = "1")]
    pub chains: usize,

    /// Random seed
    #[arg(long, default_value = "42")]
    pub seed: u64,

    /// Number of threads for parallel chains (default: all CPUs)
    #[arg(long)]
    pub threads: Option<usize>,

    /// Show progress bar
    #[arg(long, default_value_t = false)]
    pub show_progress: bool,

    /// Output file prefix: `{out}.chain.tsv.gz`, `{out}.summary.tsv`
    #[arg(short, long)]
    pub output: String,
}

/// Repeat a single value `p` times, or check the length
fn broadcast<T: Clone>(what: &str, values: &[T], p: usize) -> Result<Vec<T>> {
    match values.len() {
        1 => Ok(vec![values[0].clone(); p]),
        n if n == p => Ok(values.to_vec()),
        n => anyhow::bail!("{}: expected 1 or {} values, found {}", what, p, n),
    }
}

pub fn sample(args: &SampleArgs) -> Result<()> {
    if args.iterations < args.burn_in.saturating_add(2) {
        anyhow::bail!(
            "need at least two iterations after burn-in (burn-in {}, iterations {})",
            args.burn_in,
            args.iterations
        );
    }
    if args.chains == 0 {
        anyhow::bail!("need at least one chain");
    }

    let table = read_table(&args.data, true)?;
    let y_col = table
        .columns
        .iter()
        .position(|c| c.as_ref() == args.response)
        .ok_or(anyhow::anyhow!(
            "no response column {} in {}",
            args.response,
            args.data
        ))?;

    let nobs = table.data.nrows();
    let y = DVector::from_iterator(nobs, table.data.column(y_col).iter().copied());

    let mut coef_names: Vec<Box<str>> = vec![];
    let mut x_cols: Vec<DVector<f64>> = vec![];
    if !args.no_intercept {
        coef_names.push("intercept".into());
        x_cols.push(DVector::from_element(nobs, 1.0));
    }
    for (j, name) in table.columns.iter().enumerate() {
        if j != y_col {
            coef_names.push(name.clone());
            x_cols.push(table.data.column(j).into_owned());
        }
    }
    if x_cols.is_empty() {
        anyhow::bail!("no covariates");
    }
    let x = DMatrix::from_columns(&x_cols);
    let p = x.ncols();

    info!("Read {} observations, {} coefficients", nobs, p);

    let kinds = broadcast("samplers", &args.samplers, p)?
        .iter()
        .map(|s| s.parse::<SamplerKind>())
        .collect::<Result<Vec<_>, _>>()?;

    let means = broadcast("prior-mean", &args.prior_mean, p)?;
    let vars = broadcast("prior-var", &args.prior_var, p)?;
    let priors = Priors {
        coefficients: means
            .iter()
            .zip(vars.iter())
            .map(|(&m, &v)| NormalPrior::new(m, v))
            .collect::<Result<Vec<_>, _>>()?,
        variance: InverseGammaPrior::new(args.ig_shape, args.ig_scale)?,
    };
    let init = DVector::from_vec(broadcast("init-coef", &args.init_coef, p)?);

    let data = RegressionData::new(&x, &y)?;
    let plan = SamplingPlan::new(data)
        .with_priors(priors)
        .with_samplers(kinds)
        .with_initial(init, args.init_var);
    plan.check()?;

    let (chains, acceptance) = if args.chains == 1 {
        let posterior = sample_single(plan, args)?;
        let acceptance = collect_acceptance(&[&posterior]);
        (vec![posterior.into_chain()], acceptance)
    } else {
        let num_threads = args.threads.unwrap_or_else(num_cpus::get).max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()?;
        info!("Running {} chains on {} threads", args.chains, num_threads);
        let posteriors = pool.install(|| run_chains(&plan, args.iterations, args.chains, args.seed))?;
        let acceptance = collect_acceptance(&posteriors.iter().collect::<Vec<_>>());
        (
            posteriors.into_iter().map(|p| p.into_chain()).collect(),
            acceptance,
        )
    };

    let chain_file = format!("{}.chain.tsv.gz", args.output);
    {
        let mut buf = open_buf_writer(&chain_file)?;
        let multi = chains.len() > 1;
        for (c, chain) in chains.iter().enumerate() {
            write_chain(
                &mut buf,
                &coef_names,
                chain,
                if multi { Some(c) } else { None },
                c == 0,
            )?;
        }
        buf.flush()?;
    }
    info!("Wrote chain(s) to {}", chain_file);

    let summary_file = format!("{}.summary.tsv", args.output);
    write_summary(&summary_file, &coef_names, &chains, &acceptance, &x, &y, args.burn_in)?;
    info!("Wrote summary to {}", summary_file);

    Ok(())
}

fn sample_single<'a>(
    plan: SamplingPlan<'a>,
    args: &SampleArgs,
) -> Result<Posterior<'a, rand::rngs::SmallRng>> {
    let pb = ProgressBar::new(args.iterations as u64);
    if !args.show_progress {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    }

    let mut posterior = plan.sample(1, args.seed)?;
    posterior.update_while(args.iterations - 1, |_| {
        pb.inc(1);
        true
    })?;
    pb.finish_and_clear();
    Ok(posterior)
}

fn collect_acceptance<S: mcmc_util::VariateSource>(
    posteriors: &[&Posterior<'_, S>],
) -> Vec<Option<AcceptanceCounter>> {
    let p = posteriors
        .first()
        .map(|post| post.samplers().len())
        .unwrap_or(0);
    (0..p)
        .map(|j| {
            let mut tot: Option<AcceptanceCounter> = None;
            for post in posteriors {
                if let Some(c) = post.acceptance(j) {
                    tot.get_or_insert_with(AcceptanceCounter::default).merge(c);
                }
            }
            tot
        })
        .collect()
}

/// Posterior mean, sd and 95% interval per parameter after burn-in,
/// pooled over chains, next to the least-squares fit
fn write_summary(
    file: &str,
    coef_names: &[Box<str>],
    chains: &[McmcChain<RegressionState>],
    acceptance: &[Option<AcceptanceCounter>],
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    burn_in: usize,
) -> Result<()> {
    let mut pooled = McmcChain::new();
    for chain in chains {
        let kept = chain.discard(burn_in);
        for (s, l) in kept.samples().iter().zip(kept.log_likelihoods()) {
            pooled.push(s.clone(), *l);
        }
    }

    let p = coef_names.len();
    let mean = pooled.posterior_mean();
    let var = pooled.posterior_variance();
    let lb = pooled.quantile(0.025);
    let med = pooled.quantile(0.5);
    let ub = pooled.quantile(0.975);

    let ols = fit_ols(x, y).ok();
    if ols.is_none() {
        log::warn!("least-squares fit failed; leaving it out of the summary");
    }

    let columns: Vec<Box<str>> = [
        "mean", "sd", "q2.5", "q50", "q97.5", "ols", "ols_se", "accept",
    ]
    .iter()
    .map(|&s| s.into())
    .collect();

    // rows: coefficients, then sigma2
    let mut out = DMatrix::from_element(p + 1, columns.len(), f64::NAN);
    for i in 0..=p {
        out[(i, 0)] = mean[i];
        out[(i, 1)] = var[i].sqrt();
        out[(i, 2)] = lb[i];
        out[(i, 3)] = med[i];
        out[(i, 4)] = ub[i];
        if let Some(fit) = ols.as_ref() {
            if i < p {
                out[(i, 5)] = fit.coefficients[i];
                out[(i, 6)] = fit.standard_errors[i];
            } else {
                out[(i, 5)] = fit.residual_sd.powi(2);
            }
        }
        if let Some(Some(c)) = acceptance.get(i) {
            out[(i, 7)] = c.rate().unwrap_or(f64::NAN);
        }
    }

    let mut buf = open_buf_writer(file)?;
    writeln!(buf, "parameter\t{}", columns.join("\t"))?;
    for i in 0..=p {
        let name = if i < p { coef_names[i].as_ref() } else { "sigma2" };
        let vals: Vec<String> = out.row(i).iter().map(|v| format!("{:.6}", v)).collect();
        writeln!(buf, "{}\t{}", name, vals.join("\t"))?;
    }
    buf.flush()?;

    Ok(())
}
