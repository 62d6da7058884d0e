//! End-to-end checks on simulated data:
//! y = 4.2 + 1.87 x + e, x ~ N(0, 3²), e ~ N(0, 2.1²), N = 500.
//!
//! Run: cargo test -p lupin --test regression_tests -- --nocapture

use lupin::ols::{fit_ols, OlsFit};
use lupin::simulate::{simulate_regression, SimulatedRegression};
use lupin::{Posterior, RegressionData, RegressionState, SamplerKind, SamplingPlan};
use mcmc_util::McmcChain;
use rand::rngs::SmallRng;

const NOBS: usize = 500;
const ITERATIONS: usize = 20_000;
const BURN_IN: usize = 2_000;

fn simulated() -> SimulatedRegression {
    simulate_regression(NOBS, 4.2, &[1.87], 3.0, 2.1, 42).unwrap()
}

fn run<'a>(plan: SamplingPlan<'a>, iterations: usize, seed: u64) -> Posterior<'a, SmallRng> {
    plan.sample(iterations, seed).unwrap()
}

fn lag1_autocorrelation(xs: &[f64]) -> f64 {
    let n = xs.len() as f64;
    let mean = xs.iter().sum::<f64>() / n;
    let var = xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>();
    let cov = xs
        .windows(2)
        .map(|w| (w[0] - mean) * (w[1] - mean))
        .sum::<f64>();
    cov / var
}

/// Monte Carlo standard error of the chain mean by non-overlapping batch
/// means, which absorbs the autocorrelation of the draws
fn batch_means_se(xs: &[f64], num_batches: usize) -> f64 {
    let size = xs.len() / num_batches;
    let means: Vec<f64> = xs
        .chunks_exact(size)
        .take(num_batches)
        .map(|b| b.iter().sum::<f64>() / size as f64)
        .collect();
    let k = means.len() as f64;
    let grand = means.iter().sum::<f64>() / k;
    let var = means.iter().map(|m| (m - grand).powi(2)).sum::<f64>() / (k - 1.0);
    (var / k).sqrt()
}

fn residual_sd_mean(chain: &McmcChain<RegressionState>) -> f64 {
    let n = chain.n_samples() as f64;
    chain.samples().iter().map(|s| s.residual_sd()).sum::<f64>() / n
}

fn within(value: f64, reference: f64, se: f64, k: f64) -> bool {
    (value - reference).abs() <= k * se
}

#[test]
fn gibbs_matches_least_squares() {
    let sim = simulated();
    let ols: OlsFit = fit_ols(&sim.x, &sim.y).unwrap();

    let data = RegressionData::new(&sim.x, &sim.y).unwrap();
    let posterior = run(SamplingPlan::new(data), ITERATIONS, 1);
    let full = posterior.chain();
    assert_eq!(full.n_samples(), ITERATIONS);
    assert!(full.samples().iter().all(|s| s.residual_variance > 0.0));

    let chain = full.discard(BURN_IN);
    let mean = chain.posterior_mean();

    for j in 0..2 {
        assert!(
            within(mean[j], ols.coefficients[j], ols.standard_errors[j], 3.0),
            "coefficient {}: posterior {} vs OLS {} (se {})",
            j,
            mean[j],
            ols.coefficients[j],
            ols.standard_errors[j]
        );
    }

    let sd = residual_sd_mean(&chain);
    assert!(
        within(sd, ols.residual_sd, ols.residual_sd_se, 3.0),
        "sigma: posterior {} vs OLS {} (se {})",
        sd,
        ols.residual_sd,
        ols.residual_sd_se
    );

    // and the truth is not far either
    assert!((mean[1] - 1.87).abs() < 0.15);
    assert!((sd - 2.1).abs() < 0.3);
}

#[test]
fn metropolis_intercept_agrees_with_gibbs() {
    let sim = simulated();

    let gibbs = run(
        SamplingPlan::new(RegressionData::new(&sim.x, &sim.y).unwrap()),
        ITERATIONS,
        7,
    );
    let mixed = run(
        SamplingPlan::new(RegressionData::new(&sim.x, &sim.y).unwrap())
            .with_sampler(0, SamplerKind::MetropolisHastings { scale: 0.25 }),
        ITERATIONS,
        8,
    );

    assert!(mixed
        .chain()
        .samples()
        .iter()
        .all(|s| s.residual_variance > 0.0));

    let g = gibbs.chain().discard(BURN_IN);
    let m = mixed.chain().discard(BURN_IN);
    let g0 = g.column(0);
    let m0 = m.column(0);

    let g_mean = g.posterior_mean()[0];
    let g_sd = g.posterior_variance()[0].sqrt();
    let m_mean = m.posterior_mean()[0];

    // independent chains: the difference of means has both MC errors
    let g_se = batch_means_se(&g0, 50);
    let m_se = batch_means_se(&m0, 50);
    let se = (g_se * g_se + m_se * m_se).sqrt();
    assert!(se < g_sd / 10.0, "mc se {} vs posterior sd {}", se, g_sd);
    assert!(m_se > g_se, "mc se: MH {} vs Gibbs {}", m_se, g_se);
    assert!(
        within(m_mean, g_mean, se, 3.0),
        "intercept: MH {} vs Gibbs {} (mc se {})",
        m_mean,
        g_mean,
        se
    );

    let g_ac = lag1_autocorrelation(&g0);
    let m_ac = lag1_autocorrelation(&m0);
    assert!(m_ac > g_ac, "lag-1: MH {} vs Gibbs {}", m_ac, g_ac);

    let rate = mixed.acceptance(0).unwrap().rate().unwrap();
    assert!(rate > 0.15 && rate < 0.6, "rate: {}", rate);
    assert!(mixed.acceptance(1).is_none());
}

#[test]
fn acceptance_falls_with_proposal_scale() {
    let sim = simulated();
    let scales = [0.01, 0.2, 1.0, 5.0];

    let rates: Vec<f64> = scales
        .iter()
        .map(|&scale| {
            let data = RegressionData::new(&sim.x, &sim.y).unwrap();
            let plan = SamplingPlan::new(data)
                .with_sampler(0, SamplerKind::MetropolisHastings { scale });
            let posterior = run(plan, 10_000, 3);
            posterior.acceptance(0).unwrap().rate().unwrap()
        })
        .collect();

    for w in rates.windows(2) {
        assert!(w[0] > w[1], "rates {:?} for scales {:?}", rates, scales);
    }
    assert!(rates[1] > 0.15 && rates[1] < 0.6, "rates: {:?}", rates);
}

#[test]
fn continued_chain_equals_single_run() {
    let sim = simulated();
    let plan = SamplingPlan::new(RegressionData::new(&sim.x, &sim.y).unwrap())
        .with_sampler(1, SamplerKind::MetropolisHastings { scale: 0.05 });

    let whole = run(plan.clone(), 600, 99);
    let mut pieces = run(plan, 250, 99);
    pieces.update(350).unwrap();

    assert_eq!(whole.chain().samples(), pieces.chain().samples());
    assert_eq!(whole.acceptance(1), pieces.acceptance(1));
}

#[test]
fn table_to_posterior() {
    use lupin::io::{read_table, write_table};
    use nalgebra::{DMatrix, DVector};

    let sim = simulated();
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("sim.tsv.gz");
    let file = file.to_str().unwrap();

    let mut table = DMatrix::zeros(NOBS, 2);
    table.set_column(0, &sim.y);
    table.set_column(1, &sim.x.column(1));
    let columns: Vec<Box<str>> = vec!["y".into(), "x1".into()];
    write_table(file, &columns, &table).unwrap();

    let read = read_table(file, true).unwrap();
    assert_eq!(read.columns, columns);

    let y = DVector::from_iterator(NOBS, read.data.column(0).iter().copied());
    let x = DMatrix::from_columns(&[
        DVector::from_element(NOBS, 1.0),
        read.data.column(1).into_owned(),
    ]);
    approx::assert_abs_diff_eq!(x, sim.x, epsilon = 1e-12);

    let data = RegressionData::new(&x, &y).unwrap();
    let posterior = run(SamplingPlan::new(data), 2_000, 5);
    let mean = posterior.chain().discard(500).posterior_mean();
    assert!((mean[0] - 4.2).abs() < 0.5);
    assert!((mean[1] - 1.87).abs() < 0.15);
}
