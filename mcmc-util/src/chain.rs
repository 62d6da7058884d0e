use crate::traits::ChainParam;

/// Upper bound on the entries allocated ahead of sampling; longer runs
/// grow the chain as they go.
pub const MAX_RESERVE: usize = 1 << 16;

/// Collected MCMC samples, each with the log density recorded for it.
///
/// Append-only: snapshots are pushed one per iteration and never edited.
#[derive(Debug, Clone)]
pub struct McmcChain<P: ChainParam> {
    samples: Vec<P>,
    /// Whatever log density the sampler records per entry: the data
    /// log-likelihood for a regression chain, the log posterior (up to a
    /// constant) for a scalar target
    log_likelihoods: Vec<f64>,
}

impl<P: ChainParam> Default for McmcChain<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: ChainParam> McmcChain<P> {
    pub fn new() -> Self {
        McmcChain {
            samples: vec![],
            log_likelihoods: vec![],
        }
    }

    /// Pre-allocate for `n` entries, at most [`MAX_RESERVE`]
    pub fn with_capacity(n: usize) -> Self {
        let n = n.min(MAX_RESERVE);
        McmcChain {
            samples: Vec::with_capacity(n),
            log_likelihoods: Vec::with_capacity(n),
        }
    }

    pub fn push(&mut self, sample: P, log_likelihood: f64) {
        self.samples.push(sample);
        self.log_likelihoods.push(log_likelihood);
    }

    /// Reserve room for `additional` entries, at most [`MAX_RESERVE`]
    pub fn reserve(&mut self, additional: usize) {
        let additional = additional.min(MAX_RESERVE);
        self.samples.reserve(additional);
        self.log_likelihoods.reserve(additional);
    }

    pub fn n_samples(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[P] {
        &self.samples
    }

    /// Per-entry log density, aligned with [`McmcChain::samples`]
    pub fn log_likelihoods(&self) -> &[f64] {
        &self.log_likelihoods
    }

    pub fn last(&self) -> Option<&P> {
        self.samples.last()
    }

    /// Copy of the chain without the first `burn_in` iterations
    pub fn discard(&self, burn_in: usize) -> McmcChain<P> {
        let b = burn_in.min(self.n_samples());
        McmcChain {
            samples: self.samples[b..].to_vec(),
            log_likelihoods: self.log_likelihoods[b..].to_vec(),
        }
    }

    /// Trace of the `i`-th scalar component
    pub fn column(&self, i: usize) -> Vec<f64> {
        self.samples.iter().map(|s| s.value(i)).collect()
    }

    /// Element-wise posterior mean across samples.
    pub fn posterior_mean(&self) -> Vec<f64> {
        let n = self.n_samples();
        if n == 0 {
            return vec![];
        }
        let d = self.samples[0].dim();
        let mut mean = vec![0.0f64; d];
        for sample in &self.samples {
            for (i, m) in mean.iter_mut().enumerate() {
                *m += sample.value(i);
            }
        }
        let inv_n = 1.0 / n as f64;
        for m in &mut mean {
            *m *= inv_n;
        }
        mean
    }

    /// Element-wise posterior variance across samples.
    pub fn posterior_variance(&self) -> Vec<f64> {
        let n = self.n_samples();
        if n < 2 {
            return vec![];
        }
        let mean = self.posterior_mean();
        let d = mean.len();
        let mut var = vec![0.0f64; d];
        for sample in &self.samples {
            for i in 0..d {
                let diff = sample.value(i) - mean[i];
                var[i] += diff * diff;
            }
        }
        let inv = 1.0 / (n - 1) as f64;
        for v in &mut var {
            *v *= inv;
        }
        var
    }

    /// Element-wise quantile (0 <= q <= 1) across samples.
    pub fn quantile(&self, q: f64) -> Vec<f64> {
        let n = self.n_samples();
        if n == 0 {
            return vec![];
        }
        let d = self.samples[0].dim();
        let idx = (q * (n - 1) as f64).clamp(0.0, (n - 1) as f64);
        let lo = idx.floor() as usize;
        let hi = idx.ceil() as usize;

        (0..d)
            .map(|i| {
                let mut vals = self.column(i);
                vals.sort_unstable_by(|a, b| a.total_cmp(b));
                if lo == hi {
                    vals[lo]
                } else {
                    let frac = idx - lo as f64;
                    vals[lo] * (1.0 - frac) + vals[hi] * frac
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn toy_chain() -> McmcChain<Vec<f64>> {
        let mut chain = McmcChain::new();
        for (i, x) in [1.0, 2.0, 3.0, 4.0, 5.0].iter().enumerate() {
            chain.push(vec![*x, -2.0 * x], -(i as f64));
        }
        chain
    }

    #[test]
    fn test_summaries() {
        let chain = toy_chain();
        assert_eq!(chain.n_samples(), 5);

        let mean = chain.posterior_mean();
        assert_abs_diff_eq!(mean[0], 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(mean[1], -6.0, epsilon = 1e-12);

        let var = chain.posterior_variance();
        assert_abs_diff_eq!(var[0], 2.5, epsilon = 1e-12);
        assert_abs_diff_eq!(var[1], 10.0, epsilon = 1e-12);

        let med = chain.quantile(0.5);
        assert_abs_diff_eq!(med[0], 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(med[1], -6.0, epsilon = 1e-12);

        let q = chain.quantile(0.125);
        assert_abs_diff_eq!(q[0], 1.5, epsilon = 1e-12);
    }

    #[test]
    fn test_discard_and_column() {
        let chain = toy_chain();
        let tail = chain.discard(2);
        assert_eq!(tail.n_samples(), 3);
        assert_eq!(tail.column(0), vec![3.0, 4.0, 5.0]);
        assert_eq!(tail.log_likelihoods(), &[-2.0, -3.0, -4.0]);
        assert!(chain.discard(10).is_empty());
    }

    #[test]
    fn test_reserve_is_capped() {
        let mut chain: McmcChain<f64> = McmcChain::with_capacity(usize::MAX);
        chain.reserve(usize::MAX / 2);
        chain.push(1.0, 0.0);
        assert_eq!(chain.n_samples(), 1);
        assert!(chain.samples.capacity() <= 2 * MAX_RESERVE);
    }

    #[test]
    fn test_empty_chain() {
        let chain: McmcChain<f64> = McmcChain::new();
        assert!(chain.posterior_mean().is_empty());
        assert!(chain.posterior_variance().is_empty());
        assert!(chain.quantile(0.5).is_empty());
        assert!(chain.last().is_none());
    }
}
