use crate::model::{Priors, RegressionData};
use mcmc_util::{McmcError, McmcResult, RandomWalk};
use nalgebra::DVector;
use std::str::FromStr;

pub const DEFAULT_INIT_VARIANCE: f64 = 1.0;

/// How one coefficient is updated in each sweep
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SamplerKind {
    Gibbs,
    /// Random walk with proposal standard deviation `scale`
    MetropolisHastings { scale: f64 },
}

impl FromStr for SamplerKind {
    type Err = McmcError;

    /// `gibbs`, `mh:<scale>` or `metropolis:<scale>`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unsupported = || McmcError::UnsupportedSamplerType {
            name: s.to_string(),
        };

        let lower = s.trim().to_ascii_lowercase();
        let mut words = lower.splitn(2, ':');
        let name = words.next().unwrap_or_default();
        let arg = words.next();

        match (name, arg) {
            ("gibbs", None) => Ok(SamplerKind::Gibbs),
            ("mh" | "metropolis", Some(scale)) => {
                let scale: f64 = scale.trim().parse().map_err(|_| unsupported())?;
                RandomWalk::new(scale)?;
                Ok(SamplerKind::MetropolisHastings { scale })
            }
            _ => Err(unsupported()),
        }
    }
}

impl std::fmt::Display for SamplerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SamplerKind::Gibbs => write!(f, "gibbs"),
            SamplerKind::MetropolisHastings { scale } => write!(f, "mh:{}", scale),
        }
    }
}

/// Update rule of a coefficient, resolved once before sampling
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum CoefUpdate {
    Gibbs,
    Metropolis(RandomWalk),
}

/// A sampling run that has not started yet.
///
/// Priors, sampler assignment and initial values can be changed freely
/// here; [`SamplingPlan::sample`] consumes the plan, after which only more
/// iterations can be appended.
#[derive(Debug, Clone)]
pub struct SamplingPlan<'a> {
    pub(crate) data: RegressionData<'a>,
    pub(crate) priors: Priors,
    pub(crate) kinds: Vec<SamplerKind>,
    pub(crate) init_coefficients: DVector<f64>,
    pub(crate) init_variance: f64,
    /// First out-of-range index passed to `with_sampler`
    bad_assignment: Option<usize>,
}

impl<'a> SamplingPlan<'a> {
    /// All-Gibbs plan with uninformative priors, zero coefficients and
    /// unit residual variance.
    pub fn new(data: RegressionData<'a>) -> Self {
        let p = data.ncoef();
        SamplingPlan {
            data,
            priors: Priors::uninformative(p),
            kinds: vec![SamplerKind::Gibbs; p],
            init_coefficients: DVector::zeros(p),
            init_variance: DEFAULT_INIT_VARIANCE,
            bad_assignment: None,
        }
    }

    pub fn data(&self) -> &RegressionData<'a> {
        &self.data
    }

    pub fn with_priors(mut self, priors: Priors) -> Self {
        self.priors = priors;
        self
    }

    /// Assign the sampler of coefficient `j`; an out-of-range `j` is
    /// reported by [`SamplingPlan::check`].
    pub fn with_sampler(mut self, j: usize, kind: SamplerKind) -> Self {
        match self.kinds.get_mut(j) {
            Some(slot) => *slot = kind,
            None => {
                self.bad_assignment.get_or_insert(j);
            }
        }
        self
    }

    pub fn with_samplers(mut self, kinds: Vec<SamplerKind>) -> Self {
        self.kinds = kinds;
        self
    }

    pub fn with_initial(mut self, coefficients: DVector<f64>, residual_variance: f64) -> Self {
        self.init_coefficients = coefficients;
        self.init_variance = residual_variance;
        self
    }

    pub fn priors(&self) -> &Priors {
        &self.priors
    }

    pub fn samplers(&self) -> &[SamplerKind] {
        &self.kinds
    }

    /// Validate dimensions, priors, tuning scales and the initial state.
    pub fn check(&self) -> McmcResult<()> {
        let p = self.data.ncoef();
        if let Some(j) = self.bad_assignment {
            return Err(McmcError::DimensionMismatch {
                what: "sampler assignment index",
                expected: p,
                found: j,
            });
        }
        self.priors.check(p)?;

        if self.kinds.len() != p {
            return Err(McmcError::DimensionMismatch {
                what: "sampler assignments",
                expected: p,
                found: self.kinds.len(),
            });
        }
        if self.init_coefficients.len() != p {
            return Err(McmcError::DimensionMismatch {
                what: "initial coefficients",
                expected: p,
                found: self.init_coefficients.len(),
            });
        }
        if self.init_coefficients.iter().any(|b| !b.is_finite()) {
            return Err(McmcError::NonFiniteData {
                what: "initial coefficients",
            });
        }
        if !(self.init_variance > 0.0) {
            return Err(McmcError::NonPositiveVariance {
                value: self.init_variance,
            });
        }
        if !self.init_variance.is_finite() {
            return Err(McmcError::NonFiniteData {
                what: "initial residual variance",
            });
        }
        self.resolve().map(|_| ())
    }

    pub(crate) fn resolve(&self) -> McmcResult<Vec<CoefUpdate>> {
        self.kinds
            .iter()
            .map(|kind| match *kind {
                SamplerKind::Gibbs => Ok(CoefUpdate::Gibbs),
                SamplerKind::MetropolisHastings { scale } => {
                    Ok(CoefUpdate::Metropolis(RandomWalk::new(scale)?))
                }
            })
            .collect()
    }
}
