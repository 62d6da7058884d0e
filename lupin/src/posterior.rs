//! Conditional posterior of a single regression coefficient.
//!
//! With the partial residual `r = y - X_{-j} β_{-j}`, the Normal likelihood
//! and the `N(m_j, τ_j²)` prior combine into
//!
//! $$\log p(b | \cdot) = -\frac{1}{2} b^2 \left(\frac{x_j^\top x_j}{\sigma^2} + \frac{1}{\tau_j^2}\right) + b \left(\frac{x_j^\top r}{\sigma^2} + \frac{m_j}{\tau_j^2}\right) + C$$
//!
//! Only differences of this quantity are ever used, so `C` is dropped.

use crate::model::{NormalPrior, RegressionData};
use nalgebra::DVector;

/// Quadratic and linear coefficients of the conditional log posterior
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConditionalTerms {
    /// `x_jᵀx_j/σ² + 1/τ_j²`
    pub precision: f64,
    /// `x_jᵀr/σ² + m_j/τ_j²`
    pub linear: f64,
}

impl ConditionalTerms {
    /// Terms for coefficient `j` given the other entries of `coefficients`
    /// (the `j`-th entry is ignored).
    pub fn new(
        j: usize,
        coefficients: &DVector<f64>,
        data: &RegressionData,
        residual_variance: f64,
        prior: &NormalPrior,
    ) -> Self {
        let residual = data.residuals(coefficients);
        Self::from_residual(j, coefficients[j], &residual, data, residual_variance, prior)
    }

    /// Same terms from the full residual `y - Xβ` at the current
    /// coefficients, where `current` is `β_j`. Lets a sweep carry one
    /// residual vector instead of recomputing `Xβ` per coefficient.
    pub fn from_residual(
        j: usize,
        current: f64,
        residual: &DVector<f64>,
        data: &RegressionData,
        residual_variance: f64,
        prior: &NormalPrior,
    ) -> Self {
        // x_jᵀ(y - Xβ) + (x_jᵀx_j) β_j = x_jᵀ(y - X_{-j}β_{-j})
        let xr = data.x().column(j).dot(residual) + data.col_sq_norm(j) * current;

        ConditionalTerms {
            precision: data.col_sq_norm(j) / residual_variance + prior.precision(),
            linear: xr / residual_variance + prior.mean * prior.precision(),
        }
    }

    pub fn log_density(&self, b: f64) -> f64 {
        -0.5 * self.precision * b * b + self.linear * b
    }

    pub fn mean(&self) -> f64 {
        self.linear / self.precision
    }

    pub fn variance(&self) -> f64 {
        1.0 / self.precision
    }

    /// `log p(to) - log p(from)`
    pub fn log_ratio(&self, from: f64, to: f64) -> f64 {
        self.log_density(to) - self.log_density(from)
    }
}

/// Log conditional posterior of coefficient `j` at `candidate`, up to an
/// additive constant.
///
/// * `j` - coefficient index
/// * `candidate` - value of `β_j` to evaluate
/// * `coefficients` - current coefficients (entry `j` is replaced by `candidate`)
/// * `data` - design matrix and response
/// * `residual_variance` - σ²
/// * `prior` - Normal prior of `β_j`
pub fn log_conditional_posterior(
    j: usize,
    candidate: f64,
    coefficients: &DVector<f64>,
    data: &RegressionData,
    residual_variance: f64,
    prior: &NormalPrior,
) -> f64 {
    let mut beta = coefficients.clone();
    beta[j] = candidate;
    ConditionalTerms::new(j, &beta, data, residual_variance, prior).log_density(candidate)
}
