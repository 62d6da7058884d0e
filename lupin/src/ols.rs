use anyhow::Result;
use nalgebra::{DMatrix, DVector};

/// Ordinary least squares, i.e., the maximum-likelihood fit of the
/// Normal linear model
#[derive(Debug, Clone)]
pub struct OlsFit {
    pub coefficients: DVector<f64>,
    pub standard_errors: DVector<f64>,
    /// `sqrt(SSR / (N - P))`
    pub residual_sd: f64,
    /// Approximate standard error of `residual_sd`, `σ̂ / sqrt(2(N - P))`
    pub residual_sd_se: f64,
}

/// Solve `(XᵀX) β = Xᵀy` by Cholesky decomposition
pub fn fit_ols(x: &DMatrix<f64>, y: &DVector<f64>) -> Result<OlsFit> {
    let (n, p) = (x.nrows(), x.ncols());
    if y.len() != n {
        anyhow::bail!("response length ({}) != design rows ({})", y.len(), n);
    }
    if n <= p {
        anyhow::bail!("need more observations ({}) than coefficients ({})", n, p);
    }

    let xtx = x.transpose() * x;
    let chol = xtx
        .cholesky()
        .ok_or(anyhow::anyhow!("XᵀX is not positive definite"))?;

    let coefficients = chol.solve(&(x.transpose() * y));
    let resid = y - x * &coefficients;
    let dof = (n - p) as f64;
    let sigma2 = resid.norm_squared() / dof;

    let xtx_inv = chol.inverse();
    let standard_errors =
        DVector::from_iterator(p, (0..p).map(|j| (sigma2 * xtx_inv[(j, j)]).sqrt()));
    let residual_sd = sigma2.sqrt();

    Ok(OlsFit {
        coefficients,
        standard_errors,
        residual_sd,
        residual_sd_se: residual_sd / (2.0 * dof).sqrt(),
    })
}
