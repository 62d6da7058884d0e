use crate::error::{McmcError, McmcResult};
use rand::Rng;
use rand::distr::Open01;
use rand_distr::{Distribution, Gamma, StandardNormal};

/// Source of the pseudo-random variates a sampler consumes.
///
/// Every `rand::Rng` is a source. Tests may supply a scripted source to pin
/// individual draws.
pub trait VariateSource {
    /// A draw from `U(0,1)`, both ends excluded
    fn uniform(&mut self) -> f64;

    /// A draw from `N(0,1)`
    fn std_normal(&mut self) -> f64;

    /// A draw from a gamma distribution with `(shape α, scale θ)`
    ///
    /// $$f(x|\alpha,\theta) = \frac{\theta^{-\alpha}}{\Gamma(\alpha)} x^{\alpha - 1} e^{-x/\theta}$$
    fn gamma(&mut self, shape: f64, scale: f64) -> McmcResult<f64>;
}

impl<R: Rng + ?Sized> VariateSource for R {
    fn uniform(&mut self) -> f64 {
        Open01.sample(self)
    }

    fn std_normal(&mut self) -> f64 {
        StandardNormal.sample(self)
    }

    fn gamma(&mut self, shape: f64, scale: f64) -> McmcResult<f64> {
        let gamma = Gamma::new(shape, scale).map_err(|_| McmcError::InvalidPrior {
            what: "gamma variate",
            reason: "shape and scale must be positive and finite",
        })?;
        Ok(gamma.sample(self))
    }
}

/// Check that a variate is finite before it enters the chain.
pub fn finite_draw(what: &'static str, value: f64) -> McmcResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(McmcError::NonFiniteDraw { what, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn test_uniform_open_interval() {
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..10_000 {
            let u = rng.uniform();
            assert!(u > 0.0 && u < 1.0, "u = {}", u);
            assert!(u.ln().is_finite());
        }
    }

    #[test]
    fn test_gamma_mean() {
        let mut rng = SmallRng::seed_from_u64(11);
        let (shape, scale) = (3.0, 0.5);
        let n = 50_000;
        let mut tot = 0.0;
        for _ in 0..n {
            tot += rng.gamma(shape, scale).unwrap();
        }
        let mean = tot / n as f64;
        assert!((mean - shape * scale).abs() < 0.02, "mean: {}", mean);
    }

    #[test]
    fn test_gamma_rejects_bad_parameters() {
        let mut rng = SmallRng::seed_from_u64(1);
        assert!(rng.gamma(-1.0, 1.0).is_err());
        assert!(rng.gamma(1.0, 0.0).is_err());
    }

    #[test]
    fn test_finite_draw() {
        assert_eq!(finite_draw("x", 1.5), Ok(1.5));
        assert!(matches!(
            finite_draw("x", f64::NAN),
            Err(McmcError::NonFiniteDraw { what: "x", .. })
        ));
        assert!(finite_draw("x", f64::INFINITY).is_err());
    }
}
