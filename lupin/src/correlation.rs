//! Correlation coefficient of paired observations, sampled by random-walk
//! Metropolis-Hastings on the bounded support `[-1, 1]`.
//!
//! Both variables are standardised by their sample mean and standard
//! deviation, leaving ρ as the only unknown of the bivariate Normal
//! likelihood
//!
//! $$\log L(\rho) = -\frac{n}{2}\log(1-\rho^2) - \frac{\sum z_x^2 - 2\rho\sum z_x z_y + \sum z_y^2}{2(1-\rho^2)}$$
//!
//! A flat prior on `[-1, 1]` is assumed.

use log::info;
use mcmc_util::{
    AcceptanceCounter, McmcChain, McmcError, McmcResult, RandomWalk, ScalarTarget, Support,
    VariateSource,
};
use rand::rngs::SmallRng;
use rand::SeedableRng;

/// Sufficient statistics of standardised pairs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrelationModel {
    nobs: usize,
    sxx: f64,
    syy: f64,
    sxy: f64,
}

fn standardize(v: &[f64]) -> McmcResult<Vec<f64>> {
    let n = v.len() as f64;
    let mean = v.iter().sum::<f64>() / n;
    let var = v.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
    if !(var > 0.0) {
        return Err(McmcError::DegenerateColumn { column: 0 });
    }
    let sd = var.sqrt();
    Ok(v.iter().map(|x| (x - mean) / sd).collect())
}

impl CorrelationModel {
    pub fn new(x: &[f64], y: &[f64]) -> McmcResult<Self> {
        if x.len() != y.len() {
            return Err(McmcError::DimensionMismatch {
                what: "paired observations",
                expected: x.len(),
                found: y.len(),
            });
        }
        if x.len() < 2 {
            return Err(McmcError::EmptyData);
        }
        if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return Err(McmcError::NonFiniteData {
                what: "paired observations",
            });
        }

        let zx = standardize(x)?;
        let zy = standardize(y).map_err(|_| McmcError::DegenerateColumn { column: 1 })?;

        Ok(CorrelationModel {
            nobs: x.len(),
            sxx: zx.iter().map(|v| v * v).sum(),
            syy: zy.iter().map(|v| v * v).sum(),
            sxy: zx.iter().zip(zy.iter()).map(|(a, b)| a * b).sum(),
        })
    }

    pub fn nobs(&self) -> usize {
        self.nobs
    }

    /// Pearson correlation of the data
    pub fn sample_correlation(&self) -> f64 {
        self.sxy / (self.sxx * self.syy).sqrt()
    }
}

impl ScalarTarget for CorrelationModel {
    fn log_density(&self, rho: f64) -> f64 {
        if !(rho > -1.0 && rho < 1.0) {
            return f64::NEG_INFINITY;
        }
        let one_m_r2 = 1.0 - rho * rho;
        -0.5 * self.nobs as f64 * one_m_r2.ln()
            - (self.sxx - 2.0 * rho * self.sxy + self.syy) / (2.0 * one_m_r2)
    }

    fn support(&self) -> Option<Support> {
        Some(Support::new(-1.0, 1.0))
    }
}

/// Random-walk sampler for one bounded scalar parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrelationSampler {
    scale: f64,
    initial: f64,
}

impl CorrelationSampler {
    /// * `scale` - proposal standard deviation ζ
    /// * `initial` - starting value, strictly inside the support
    pub fn new(scale: f64, initial: f64) -> McmcResult<Self> {
        RandomWalk::new(scale)?;
        Ok(CorrelationSampler { scale, initial })
    }

    pub fn sample<'t, T: ScalarTarget>(
        &self,
        target: &'t T,
        iterations: usize,
        seed: u64,
    ) -> McmcResult<ScalarPosterior<'t, T, SmallRng>> {
        self.sample_with(target, iterations, SmallRng::seed_from_u64(seed))
    }

    /// The first chain entry is `initial`; `iterations - 1` MH steps follow.
    pub fn sample_with<'t, T: ScalarTarget, S: VariateSource>(
        &self,
        target: &'t T,
        iterations: usize,
        src: S,
    ) -> McmcResult<ScalarPosterior<'t, T, S>> {
        if iterations == 0 {
            return Err(McmcError::InvalidIterations);
        }

        let mut walk = RandomWalk::new(self.scale)?;
        if let Some(support) = target.support() {
            walk = walk.with_support(support);
        }

        let cur_lnpdf = target.log_density(self.initial);
        if !cur_lnpdf.is_finite() {
            return Err(McmcError::NonFiniteDensity {
                what: "initial value",
            });
        }

        info!(
            "Sampling {} iterations of a scalar parameter (scale {})",
            iterations, self.scale
        );

        let mut chain = McmcChain::with_capacity(iterations);
        chain.push(self.initial, cur_lnpdf);

        let mut posterior = ScalarPosterior {
            target,
            walk,
            chain,
            acceptance: AcceptanceCounter::default(),
            current: self.initial,
            cur_lnpdf,
            src,
        };
        posterior.update(iterations - 1)?;
        Ok(posterior)
    }
}

/// A started scalar MH run.
///
/// The per-entry log density of the chain is the target's log posterior
/// (up to a constant), not a data log-likelihood.
#[derive(Debug)]
pub struct ScalarPosterior<'t, T: ScalarTarget, S: VariateSource> {
    target: &'t T,
    walk: RandomWalk,
    chain: McmcChain<f64>,
    acceptance: AcceptanceCounter,
    current: f64,
    cur_lnpdf: f64,
    src: S,
}

impl<T: ScalarTarget, S: VariateSource> ScalarPosterior<'_, T, S> {
    /// Append `iterations` MH steps.
    pub fn update(&mut self, iterations: usize) -> McmcResult<()> {
        self.chain.reserve(iterations);
        for _ in 0..iterations {
            let target = self.target;
            let (outcome, lnpdf) = self.walk.step(
                self.current,
                self.cur_lnpdf,
                |x| target.log_density(x),
                "correlation",
                &mut self.src,
            )?;
            self.acceptance.record(&outcome);
            self.current = outcome.value();
            self.cur_lnpdf = lnpdf;
            self.chain.push(self.current, lnpdf);
        }
        Ok(())
    }

    pub fn chain(&self) -> &McmcChain<f64> {
        &self.chain
    }

    pub fn acceptance(&self) -> &AcceptanceCounter {
        &self.acceptance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulate::simulate_bivariate;
    use std::cell::Cell;

    /// Counts log-density evaluations of the wrapped model
    #[derive(Debug)]
    struct Counting {
        model: CorrelationModel,
        calls: Cell<usize>,
    }

    impl ScalarTarget for Counting {
        fn log_density(&self, x: f64) -> f64 {
            self.calls.set(self.calls.get() + 1);
            self.model.log_density(x)
        }
        fn support(&self) -> Option<Support> {
            self.model.support()
        }
    }

    #[derive(Debug)]
    struct Scripted {
        normals: Vec<f64>,
    }

    impl VariateSource for Scripted {
        fn uniform(&mut self) -> f64 {
            0.5
        }
        fn std_normal(&mut self) -> f64 {
            self.normals.remove(0)
        }
        fn gamma(&mut self, _shape: f64, _scale: f64) -> McmcResult<f64> {
            unreachable!()
        }
    }

    #[test]
    fn test_out_of_support_proposal_is_rejected_without_evaluation() {
        let (x, y) = simulate_bivariate(50, 0.6, 3).unwrap();
        let target = Counting {
            model: CorrelationModel::new(&x, &y).unwrap(),
            calls: Cell::new(0),
        };

        // 0.8 + 0.25 * 2.0 = 1.3
        let sampler = CorrelationSampler::new(0.25, 0.8).unwrap();
        let mut posterior = sampler
            .sample_with(&target, 1, Scripted { normals: vec![2.0] })
            .unwrap();
        let calls_before = target.calls.get();

        posterior.update(1).unwrap();

        assert_eq!(target.calls.get(), calls_before);
        let chain = posterior.chain().samples();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[1].to_bits(), chain[0].to_bits());
        assert_eq!(posterior.acceptance().out_of_support, 1);
        assert_eq!(posterior.acceptance().proposed, 1);
        assert_eq!(posterior.acceptance().accepted, 0);
    }

    #[test]
    fn test_chain_records_log_posterior() {
        let (x, y) = simulate_bivariate(80, 0.3, 4).unwrap();
        let model = CorrelationModel::new(&x, &y).unwrap();
        let posterior = CorrelationSampler::new(0.2, 0.1)
            .unwrap()
            .sample(&model, 200, 6)
            .unwrap();
        let chain = posterior.chain();
        for (rho, lp) in chain.samples().iter().zip(chain.log_likelihoods()) {
            assert_eq!(lp.to_bits(), model.log_density(*rho).to_bits());
        }
    }

    #[test]
    fn test_log_density_outside_open_interval() {
        let model = CorrelationModel::new(&[1.0, 2.0, 3.0], &[2.0, 1.0, 4.0]).unwrap();
        assert_eq!(model.log_density(1.0), f64::NEG_INFINITY);
        assert_eq!(model.log_density(-1.3), f64::NEG_INFINITY);
        assert!(model.log_density(0.2).is_finite());
    }

    #[test]
    fn test_invalid_initial_value() {
        let model = CorrelationModel::new(&[1.0, 2.0, 3.0], &[2.0, 1.0, 4.0]).unwrap();
        let sampler = CorrelationSampler::new(0.1, 1.0).unwrap();
        assert!(matches!(
            sampler.sample(&model, 10, 1),
            Err(McmcError::NonFiniteDensity { .. })
        ));
    }

    #[test]
    fn test_degenerate_input() {
        assert!(matches!(
            CorrelationModel::new(&[1.0, 1.0, 1.0], &[2.0, 1.0, 4.0]),
            Err(McmcError::DegenerateColumn { column: 0 })
        ));
        assert!(matches!(
            CorrelationModel::new(&[1.0, 2.0], &[2.0]),
            Err(McmcError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_posterior_near_sample_correlation() {
        let (x, y) = simulate_bivariate(400, -0.45, 8).unwrap();
        let model = CorrelationModel::new(&x, &y).unwrap();
        let sampler = CorrelationSampler::new(0.1, 0.0).unwrap();
        let posterior = sampler.sample(&model, 10_000, 21).unwrap();
        let chain = posterior.chain().discard(1_000);

        assert!(chain.samples().iter().all(|r| (-1.0..=1.0).contains(r)));
        let mean = chain.posterior_mean()[0];
        let r = model.sample_correlation();
        assert!((mean - r).abs() < 0.05, "mean: {}, r: {}", mean, r);

        let rate = posterior.acceptance().rate().unwrap();
        assert!(rate > 0.15 && rate < 0.6, "rate: {}", rate);
    }
}
