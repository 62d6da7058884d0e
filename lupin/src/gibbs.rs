//! Exact draws from closed-form conditional posteriors.
//!
//! These updates never reject.

use crate::model::{InverseGammaPrior, NormalPrior, RegressionData};
use crate::posterior::ConditionalTerms;
use mcmc_util::variates::finite_draw;
use mcmc_util::{McmcError, McmcResult, VariateSource};
use nalgebra::DVector;

/// Draw `β_j ~ N(mean, 1/precision)` from its conditional posterior.
pub fn draw_coefficient<S: VariateSource + ?Sized>(
    j: usize,
    coefficients: &DVector<f64>,
    data: &RegressionData,
    residual_variance: f64,
    prior: &NormalPrior,
    src: &mut S,
) -> McmcResult<f64> {
    let terms = ConditionalTerms::new(j, coefficients, data, residual_variance, prior);
    draw_from_terms(&terms, src)
}

pub(crate) fn draw_from_terms<S: VariateSource + ?Sized>(
    terms: &ConditionalTerms,
    src: &mut S,
) -> McmcResult<f64> {
    let z = finite_draw("coefficient", src.std_normal())?;
    finite_draw("coefficient", terms.mean() + terms.variance().sqrt() * z)
}

/// Draw `σ² ~ IG(N/2 + a₀, SSR/2 + b₀)` by inverting a gamma draw.
pub fn draw_residual_variance<S: VariateSource + ?Sized>(
    coefficients: &DVector<f64>,
    data: &RegressionData,
    prior: &InverseGammaPrior,
    src: &mut S,
) -> McmcResult<f64> {
    let shape = data.nobs() as f64 / 2.0 + prior.shape;
    let rate = data.sum_sq_residuals(coefficients) / 2.0 + prior.scale;

    let precision = finite_draw("residual variance", src.gamma(shape, 1.0 / rate)?)?;
    let value = finite_draw("residual variance", 1.0 / precision)?;

    if value <= 0.0 {
        return Err(McmcError::NonPositiveVariance { value });
    }
    Ok(value)
}
