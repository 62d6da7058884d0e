use mcmc_util::{McmcError, McmcResult};
use nalgebra::{DMatrix, DVector};

pub const DEFAULT_COEF_PRIOR_VAR: f64 = 1000.0;
pub const DEFAULT_IG_SHAPE: f64 = 0.001;
pub const DEFAULT_IG_SCALE: f64 = 0.001;

/// Observed data of `y = Xβ + ε`, borrowed from the caller.
///
/// Column sums of squares `x_jᵀx_j` are computed once here since every
/// coefficient update needs them.
#[derive(Debug, Clone)]
pub struct RegressionData<'a> {
    x: &'a DMatrix<f64>,
    y: &'a DVector<f64>,
    col_sq_norms: Vec<f64>,
}

impl<'a> RegressionData<'a> {
    /// * `x` - N × P design matrix (include a column of ones for an intercept)
    /// * `y` - length-N response
    pub fn new(x: &'a DMatrix<f64>, y: &'a DVector<f64>) -> McmcResult<Self> {
        if x.nrows() == 0 || x.ncols() == 0 {
            return Err(McmcError::EmptyData);
        }
        if y.len() != x.nrows() {
            return Err(McmcError::DimensionMismatch {
                what: "response length vs. design rows",
                expected: x.nrows(),
                found: y.len(),
            });
        }
        if x.iter().any(|v| !v.is_finite()) {
            return Err(McmcError::NonFiniteData {
                what: "design matrix",
            });
        }
        if y.iter().any(|v| !v.is_finite()) {
            return Err(McmcError::NonFiniteData { what: "response" });
        }

        let col_sq_norms: Vec<f64> = x.column_iter().map(|x_j| x_j.norm_squared()).collect();

        if let Some(column) = col_sq_norms.iter().position(|&s| s <= 0.0) {
            return Err(McmcError::DegenerateColumn { column });
        }

        Ok(RegressionData { x, y, col_sq_norms })
    }

    pub fn x(&self) -> &DMatrix<f64> {
        self.x
    }

    pub fn y(&self) -> &DVector<f64> {
        self.y
    }

    pub fn nobs(&self) -> usize {
        self.x.nrows()
    }

    pub fn ncoef(&self) -> usize {
        self.x.ncols()
    }

    /// `x_jᵀx_j`
    pub fn col_sq_norm(&self, j: usize) -> f64 {
        self.col_sq_norms[j]
    }

    /// `y - Xβ`
    pub fn residuals(&self, coefficients: &DVector<f64>) -> DVector<f64> {
        self.y - self.x * coefficients
    }

    /// `‖y - Xβ‖²`
    pub fn sum_sq_residuals(&self, coefficients: &DVector<f64>) -> f64 {
        self.residuals(coefficients).norm_squared()
    }

    /// Gaussian log-likelihood of the data at `(β, σ²)`
    pub fn log_likelihood(&self, coefficients: &DVector<f64>, residual_variance: f64) -> f64 {
        let n = self.nobs() as f64;
        let ssr = self.sum_sq_residuals(coefficients);
        -0.5 * n * (2.0 * std::f64::consts::PI * residual_variance).ln()
            - 0.5 * ssr / residual_variance
    }
}

/// `β_j ~ N(mean, variance)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalPrior {
    pub mean: f64,
    pub variance: f64,
}

impl NormalPrior {
    pub fn new(mean: f64, variance: f64) -> McmcResult<Self> {
        if !mean.is_finite() {
            return Err(McmcError::InvalidPrior {
                what: "coefficient",
                reason: "mean must be finite",
            });
        }
        if !(variance.is_finite() && variance > 0.0) {
            return Err(McmcError::InvalidPrior {
                what: "coefficient",
                reason: "variance must be positive and finite",
            });
        }
        Ok(NormalPrior { mean, variance })
    }

    pub fn precision(&self) -> f64 {
        1.0 / self.variance
    }
}

impl Default for NormalPrior {
    fn default() -> Self {
        NormalPrior {
            mean: 0.0,
            variance: DEFAULT_COEF_PRIOR_VAR,
        }
    }
}

/// `σ² ~ IG(shape, scale)`, i.e., `1/σ² ~ Gamma(shape, rate = scale)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InverseGammaPrior {
    pub shape: f64,
    pub scale: f64,
}

impl InverseGammaPrior {
    pub fn new(shape: f64, scale: f64) -> McmcResult<Self> {
        if !(shape.is_finite() && shape > 0.0 && scale.is_finite() && scale > 0.0) {
            return Err(McmcError::InvalidPrior {
                what: "residual variance",
                reason: "shape and scale must be positive and finite",
            });
        }
        Ok(InverseGammaPrior { shape, scale })
    }
}

impl Default for InverseGammaPrior {
    fn default() -> Self {
        InverseGammaPrior {
            shape: DEFAULT_IG_SHAPE,
            scale: DEFAULT_IG_SCALE,
        }
    }
}

/// Independent priors on every coefficient and on the residual variance
#[derive(Debug, Clone, PartialEq)]
pub struct Priors {
    pub coefficients: Vec<NormalPrior>,
    pub variance: InverseGammaPrior,
}

impl Priors {
    /// `N(0, 1000)` on each of `ncoef` coefficients, `IG(0.001, 0.001)` on σ²
    pub fn uninformative(ncoef: usize) -> Self {
        Priors {
            coefficients: vec![NormalPrior::default(); ncoef],
            variance: InverseGammaPrior::default(),
        }
    }

    pub fn check(&self, ncoef: usize) -> McmcResult<()> {
        if self.coefficients.len() != ncoef {
            return Err(McmcError::DimensionMismatch {
                what: "coefficient priors",
                expected: ncoef,
                found: self.coefficients.len(),
            });
        }
        for p in &self.coefficients {
            NormalPrior::new(p.mean, p.variance)?;
        }
        InverseGammaPrior::new(self.variance.shape, self.variance.scale)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_degenerate_column() {
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 0.0, 1.0, 0.0]);
        let y = DVector::from_vec(vec![1.0, 2.0, 3.0]);
        let err = RegressionData::new(&x, &y).unwrap_err();
        assert_eq!(err, McmcError::DegenerateColumn { column: 1 });
    }

    #[test]
    fn test_dimension_mismatch() {
        let x = DMatrix::from_element(3, 1, 1.0);
        let y = DVector::from_vec(vec![1.0, 2.0]);
        assert!(matches!(
            RegressionData::new(&x, &y),
            Err(McmcError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_non_finite_data() {
        let x = DMatrix::from_element(2, 1, 1.0);
        let y = DVector::from_vec(vec![1.0, f64::NAN]);
        assert_eq!(
            RegressionData::new(&x, &y).unwrap_err(),
            McmcError::NonFiniteData { what: "response" }
        );
    }

    #[test]
    fn test_log_likelihood() {
        let x = DMatrix::from_row_slice(2, 1, &[1.0, 1.0]);
        let y = DVector::from_vec(vec![1.0, 3.0]);
        let data = RegressionData::new(&x, &y).unwrap();
        let b = DVector::from_vec(vec![2.0]);
        assert_abs_diff_eq!(data.sum_sq_residuals(&b), 2.0, epsilon = 1e-12);
        let expected = -(2.0 * std::f64::consts::PI).ln() - 1.0;
        assert_abs_diff_eq!(data.log_likelihood(&b, 1.0), expected, epsilon = 1e-12);
        assert_abs_diff_eq!(data.col_sq_norm(0), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_priors() {
        assert!(NormalPrior::new(0.0, 0.0).is_err());
        assert!(InverseGammaPrior::new(1.0, -1.0).is_err());
        let priors = Priors::uninformative(3);
        assert!(priors.check(3).is_ok());
        assert!(priors.check(2).is_err());
    }
}
