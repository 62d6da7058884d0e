//! Bayesian linear regression by Gibbs and Metropolis-Hastings sampling.
//!
//! # Model
//!
//! $$y = X\beta + \epsilon,\quad \epsilon \sim \mathcal{N}(0, \sigma^2 I)$$
//!
//! with independent `β_j ~ N(m_j, τ_j²)` and `σ² ~ IG(a₀, b₀)`. Each
//! coefficient is updated either by an exact draw from its conditional
//! posterior or by a random-walk Metropolis-Hastings step; σ² is always
//! drawn exactly.
//!
//! A bounded correlation model is provided alongside for the
//! Metropolis-Hastings-only case.

/// Observed data and priors
pub mod model;

/// Conditional log posterior of one coefficient
pub mod posterior;

/// Exact conditional draws
pub mod gibbs;

/// Per-coefficient sampler assignment before sampling starts
pub mod plan;

/// Systematic-scan driver and independent parallel chains
pub mod sampler;

/// Correlation coefficient on `[-1, 1]` by Metropolis-Hastings
pub mod correlation;

/// Least-squares reference fit
pub mod ols;

/// Simulated data
pub mod simulate;

/// Reading tables and writing chains
pub mod io;

pub use model::{InverseGammaPrior, NormalPrior, Priors, RegressionData};
pub use plan::{SamplerKind, SamplingPlan};
pub use sampler::{run_chains, Posterior, RegressionState};
