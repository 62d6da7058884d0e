use anyhow::Result;
use log::info;
use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal, StandardNormal};

/// Simulated regression data with the generating parameters
#[derive(Debug, Clone)]
pub struct SimulatedRegression {
    /// N × (1 + K) design matrix, first column all ones
    pub x: DMatrix<f64>,
    /// N × 1 response
    pub y: DVector<f64>,
    /// True (intercept, slopes)
    pub coefficients: DVector<f64>,
    pub noise_sd: f64,
}

/// Simulate `y = β_0 + Σ_k β_k x_k + ε`
///
/// * `nobs` - number of observations
/// * `intercept` - β_0
/// * `slopes` - β_1, …, β_K
/// * `x_sd` - standard deviation of each covariate, `x_k ~ N(0, x_sd²)`
/// * `noise_sd` - standard deviation of `ε`
/// * `seed` - random seed
pub fn simulate_regression(
    nobs: usize,
    intercept: f64,
    slopes: &[f64],
    x_sd: f64,
    noise_sd: f64,
    seed: u64,
) -> Result<SimulatedRegression> {
    if nobs == 0 {
        anyhow::bail!("need at least one observation");
    }
    let covariate = Normal::new(0.0, x_sd)
        .map_err(|e| anyhow::anyhow!("invalid covariate sd {}: {}", x_sd, e))?;
    let noise = Normal::new(0.0, noise_sd)
        .map_err(|e| anyhow::anyhow!("invalid noise sd {}: {}", noise_sd, e))?;

    let mut rng = StdRng::seed_from_u64(seed);
    let p = 1 + slopes.len();

    let mut x = DMatrix::from_element(nobs, p, 1.0);
    for k in 1..p {
        for i in 0..nobs {
            x[(i, k)] = covariate.sample(&mut rng);
        }
    }

    let coefficients = DVector::from_iterator(
        p,
        std::iter::once(intercept).chain(slopes.iter().copied()),
    );

    let mut y = &x * &coefficients;
    for y_i in y.iter_mut() {
        *y_i += noise.sample(&mut rng);
    }

    info!(
        "Simulated {} observations, {} covariates (noise sd {})",
        nobs,
        slopes.len(),
        noise_sd
    );

    Ok(SimulatedRegression {
        x,
        y,
        coefficients,
        noise_sd,
    })
}

/// Draw `nobs` pairs from a standard bivariate Normal with correlation `rho`
pub fn simulate_bivariate(nobs: usize, rho: f64, seed: u64) -> Result<(Vec<f64>, Vec<f64>)> {
    if !(rho > -1.0 && rho < 1.0) {
        anyhow::bail!("correlation must lie in (-1, 1), got {}", rho);
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let resid_sd = (1.0 - rho * rho).sqrt();

    let mut xx = Vec::with_capacity(nobs);
    let mut yy = Vec::with_capacity(nobs);
    for _ in 0..nobs {
        let z1: f64 = StandardNormal.sample(&mut rng);
        let z2: f64 = StandardNormal.sample(&mut rng);
        xx.push(z1);
        yy.push(rho * z1 + resid_sd * z2);
    }
    Ok((xx, yy))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulate_regression_shape() {
        let sim = simulate_regression(100, 4.2, &[1.87], 3.0, 2.1, 1).unwrap();
        assert_eq!(sim.x.nrows(), 100);
        assert_eq!(sim.x.ncols(), 2);
        assert!(sim.x.column(0).iter().all(|&v| v == 1.0));
        assert_eq!(sim.y.len(), 100);
        assert_eq!(sim.coefficients.as_slice(), &[4.2, 1.87]);

        let again = simulate_regression(100, 4.2, &[1.87], 3.0, 2.1, 1).unwrap();
        assert_eq!(sim.y, again.y);
    }

    #[test]
    fn test_simulate_bivariate() {
        let (x, y) = simulate_bivariate(20_000, 0.7, 5).unwrap();
        let n = x.len() as f64;
        let r = x.iter().zip(&y).map(|(a, b)| a * b).sum::<f64>() / n;
        assert!((r - 0.7).abs() < 0.03, "r: {}", r);
        assert!(simulate_bivariate(10, 1.0, 5).is_err());
    }
}
