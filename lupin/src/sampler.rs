//! Systematic-scan sampler for Bayesian linear regression.
//!
//! Each sweep visits the coefficients in column order and the residual
//! variance last. Every update conditions on the most recent values of
//! all other parameters, including those already updated in the same
//! sweep.

use crate::gibbs::{draw_from_terms, draw_residual_variance};
use crate::model::{Priors, RegressionData};
use crate::plan::{CoefUpdate, SamplerKind, SamplingPlan};
use crate::posterior::ConditionalTerms;
use log::{debug, info, warn};
use mcmc_util::{
    AcceptanceCounter, ChainParam, McmcChain, McmcError, McmcResult, MhOutcome, VariateSource,
};
use nalgebra::DVector;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use rayon::prelude::*;

/// Acceptance rates outside this band are worth a warning
const ACCEPT_RATE_LOW: f64 = 0.15;
const ACCEPT_RATE_HIGH: f64 = 0.6;

/// One snapshot of the chain: `(β, σ²)`
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionState {
    pub coefficients: DVector<f64>,
    pub residual_variance: f64,
}

impl RegressionState {
    pub fn residual_sd(&self) -> f64 {
        self.residual_variance.sqrt()
    }
}

/// Components are `β_0, …, β_{P-1}, σ²`
impl ChainParam for RegressionState {
    fn dim(&self) -> usize {
        self.coefficients.len() + 1
    }

    fn value(&self, i: usize) -> f64 {
        if i < self.coefficients.len() {
            self.coefficients[i]
        } else {
            self.residual_variance
        }
    }
}

/// Per-coefficient outcome of one sweep; `None` for Gibbs updates
type SweepOutcomes = Vec<Option<MhOutcome>>;

/// One full sweep starting from `state`.
///
/// The state is taken by value and a new one is returned, so an error
/// part-way through leaves the caller's last state untouched. The residual
/// `y - Xβ` is carried through the coefficient updates and adjusted by
/// `x_j (old - new)` after each one.
fn sweep<S: VariateSource + ?Sized>(
    data: &RegressionData,
    priors: &Priors,
    updates: &[CoefUpdate],
    mut state: RegressionState,
    src: &mut S,
) -> McmcResult<(RegressionState, SweepOutcomes)> {
    let s2 = state.residual_variance;
    if !(s2 > 0.0) {
        return Err(McmcError::NonPositiveVariance { value: s2 });
    }

    let mut outcomes = Vec::with_capacity(updates.len());
    let mut residual = data.residuals(&state.coefficients);

    for (j, update) in updates.iter().enumerate() {
        let prior = &priors.coefficients[j];
        let previous = state.coefficients[j];
        let terms = ConditionalTerms::from_residual(j, previous, &residual, data, s2, prior);

        let next = match update {
            CoefUpdate::Gibbs => {
                outcomes.push(None);
                draw_from_terms(&terms, src)?
            }
            CoefUpdate::Metropolis(walk) => {
                let (outcome, _) = walk.step(
                    previous,
                    terms.log_density(previous),
                    |b| terms.log_density(b),
                    "coefficient",
                    src,
                )?;
                outcomes.push(Some(outcome));
                outcome.value()
            }
        };

        if next != previous {
            residual.axpy(previous - next, &data.x().column(j), 1.0);
            state.coefficients[j] = next;
        }
    }

    state.residual_variance =
        draw_residual_variance(&state.coefficients, data, &priors.variance, src)?;

    Ok((state, outcomes))
}

impl<'a> SamplingPlan<'a> {
    /// Start sampling with a seeded `SmallRng`.
    ///
    /// The returned chain has `iterations` entries; the first is the
    /// initial state.
    pub fn sample(self, iterations: usize, seed: u64) -> McmcResult<Posterior<'a, SmallRng>> {
        self.sample_with(iterations, SmallRng::seed_from_u64(seed))
    }

    /// Start sampling with a caller-supplied variate source.
    pub fn sample_with<S: VariateSource>(
        self,
        iterations: usize,
        src: S,
    ) -> McmcResult<Posterior<'a, S>> {
        if iterations == 0 {
            return Err(McmcError::InvalidIterations);
        }
        self.check()?;
        let updates = self.resolve()?;

        let num_mh = updates
            .iter()
            .filter(|u| matches!(u, CoefUpdate::Metropolis(_)))
            .count();
        info!(
            "Sampling {} iterations: {} observations, {} coefficients ({} by Metropolis-Hastings)",
            iterations,
            self.data.nobs(),
            self.data.ncoef(),
            num_mh
        );

        let acceptance = updates
            .iter()
            .map(|u| match u {
                CoefUpdate::Gibbs => None,
                CoefUpdate::Metropolis(_) => Some(AcceptanceCounter::default()),
            })
            .collect();

        let init = RegressionState {
            coefficients: self.init_coefficients,
            residual_variance: self.init_variance,
        };

        let mut chain = McmcChain::with_capacity(iterations);
        let llik = self
            .data
            .log_likelihood(&init.coefficients, init.residual_variance);
        chain.push(init, llik);

        let mut posterior = Posterior {
            data: self.data,
            priors: self.priors,
            kinds: self.kinds,
            updates,
            chain,
            acceptance,
            src,
        };

        posterior.update(iterations - 1)?;
        Ok(posterior)
    }
}

/// A started sampling run.
///
/// Data, priors and sampler assignment are fixed; the only way forward is
/// to append more iterations with [`Posterior::update`].
#[derive(Debug)]
pub struct Posterior<'a, S: VariateSource> {
    data: RegressionData<'a>,
    priors: Priors,
    kinds: Vec<SamplerKind>,
    updates: Vec<CoefUpdate>,
    chain: McmcChain<RegressionState>,
    acceptance: Vec<Option<AcceptanceCounter>>,
    src: S,
}

impl<'a, S: VariateSource> Posterior<'a, S> {
    /// Append `iterations` sweeps to the chain.
    pub fn update(&mut self, iterations: usize) -> McmcResult<()> {
        self.update_while(iterations, |_| true).map(|_| ())
    }

    /// Append up to `iterations` sweeps, asking `keep_going` before each
    /// one. Returns the number of sweeps appended.
    ///
    /// * `keep_going` - called with the number of sweeps done so far
    pub fn update_while<F>(&mut self, iterations: usize, mut keep_going: F) -> McmcResult<usize>
    where
        F: FnMut(usize) -> bool,
    {
        self.chain.reserve(iterations);

        let mut done = 0;
        while done < iterations && keep_going(done) {
            let current = self
                .chain
                .last()
                .cloned()
                .ok_or(McmcError::InvalidIterations)?;

            let (next, outcomes) =
                sweep(&self.data, &self.priors, &self.updates, current, &mut self.src)?;

            for (counter, outcome) in self.acceptance.iter_mut().zip(outcomes.iter()) {
                if let (Some(counter), Some(outcome)) = (counter.as_mut(), outcome) {
                    counter.record(outcome);
                }
            }

            let llik = self
                .data
                .log_likelihood(&next.coefficients, next.residual_variance);
            self.chain.push(next, llik);
            done += 1;
        }

        if done < iterations {
            debug!("stopped after {} of {} sweeps", done, iterations);
        }
        self.report_acceptance();
        Ok(done)
    }

    fn report_acceptance(&self) {
        for (j, rate) in self.acceptance_rates().iter().enumerate() {
            if let Some(rate) = rate {
                if !(ACCEPT_RATE_LOW..=ACCEPT_RATE_HIGH).contains(rate) {
                    warn!(
                        "coefficient {}: acceptance rate {:.3} (scale {})",
                        j, rate, self.kinds[j]
                    );
                } else {
                    debug!("coefficient {}: acceptance rate {:.3}", j, rate);
                }
            }
        }
    }

    pub fn chain(&self) -> &McmcChain<RegressionState> {
        &self.chain
    }

    pub fn into_chain(self) -> McmcChain<RegressionState> {
        self.chain
    }

    pub fn last_state(&self) -> Option<&RegressionState> {
        self.chain.last()
    }

    pub fn samplers(&self) -> &[SamplerKind] {
        &self.kinds
    }

    /// Counter of coefficient `j`, `None` if it is updated by Gibbs
    pub fn acceptance(&self, j: usize) -> Option<&AcceptanceCounter> {
        self.acceptance.get(j).and_then(|c| c.as_ref())
    }

    pub fn acceptance_rates(&self) -> Vec<Option<f64>> {
        self.acceptance
            .iter()
            .map(|c| c.as_ref().and_then(|c| c.rate()))
            .collect()
    }
}

/// Run independent chains of the same plan in parallel.
///
/// Chain `i` is seeded with `seed + i`; data and priors are shared
/// read-only.
pub fn run_chains<'a>(
    plan: &SamplingPlan<'a>,
    iterations: usize,
    num_chains: usize,
    seed: u64,
) -> McmcResult<Vec<Posterior<'a, SmallRng>>> {
    plan.check()?;
    (0..num_chains)
        .into_par_iter()
        .map(|i| plan.clone().sample(iterations, seed.wrapping_add(i as u64)))
        .collect()
}
