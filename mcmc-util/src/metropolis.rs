//! Random-walk Metropolis-Hastings for a single scalar parameter.
//!
//! The proposal `x' = x + ζ z, z ~ N(0,1)` is symmetric, so the
//! proposal-density ratio cancels and only the log-posterior difference
//! enters the acceptance test.

use crate::error::{McmcError, McmcResult};
use crate::variates::{finite_draw, VariateSource};
use log::trace;

/// Hard bounds on a parameter, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Support {
    pub lower: f64,
    pub upper: f64,
}

impl Support {
    pub fn new(lower: f64, upper: f64) -> Self {
        Support { lower, upper }
    }

    pub fn contains(&self, x: f64) -> bool {
        x >= self.lower && x <= self.upper
    }
}

/// Result of one MH transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MhOutcome {
    Accepted(f64),
    /// Rejected by the ratio test; carries the previous value
    Rejected(f64),
    /// Proposal fell outside the support; carries the previous value
    OutOfSupport(f64),
}

impl MhOutcome {
    /// The value the parameter holds after the transition
    pub fn value(&self) -> f64 {
        match *self {
            MhOutcome::Accepted(x) | MhOutcome::Rejected(x) | MhOutcome::OutOfSupport(x) => x,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, MhOutcome::Accepted(_))
    }
}

/// Per-parameter tally of MH proposals.
///
/// Out-of-support proposals count towards `proposed`, so the acceptance
/// rate is `accepted / proposed` over every proposal drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AcceptanceCounter {
    pub accepted: usize,
    pub proposed: usize,
    pub out_of_support: usize,
}

impl AcceptanceCounter {
    pub fn record(&mut self, outcome: &MhOutcome) {
        self.proposed += 1;
        match outcome {
            MhOutcome::Accepted(_) => self.accepted += 1,
            MhOutcome::OutOfSupport(_) => self.out_of_support += 1,
            MhOutcome::Rejected(_) => {}
        }
    }

    /// `accepted / proposed`, or `None` before the first proposal
    pub fn rate(&self) -> Option<f64> {
        if self.proposed == 0 {
            None
        } else {
            Some(self.accepted as f64 / self.proposed as f64)
        }
    }

    pub fn merge(&mut self, other: &AcceptanceCounter) {
        self.accepted += other.accepted;
        self.proposed += other.proposed;
        self.out_of_support += other.out_of_support;
    }
}

/// Symmetric Gaussian random-walk proposal with tuning scale ζ.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RandomWalk {
    scale: f64,
    support: Option<Support>,
}

impl RandomWalk {
    /// * `scale` - proposal standard deviation ζ > 0
    pub fn new(scale: f64) -> McmcResult<Self> {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(McmcError::InvalidTuningScale { scale });
        }
        Ok(RandomWalk {
            scale,
            support: None,
        })
    }

    pub fn with_support(mut self, support: Support) -> Self {
        self.support = Some(support);
        self
    }

    /// One MH transition from `previous`. Returns the outcome and the log
    /// density at the value the parameter holds afterwards.
    ///
    /// * `previous` - current value of the parameter
    /// * `cur_lnpdf` - cached log density at `previous`
    /// * `lnpdf` - log posterior up to an additive constant
    /// * `what` - parameter name for error reporting
    /// * `src` - variate source
    ///
    /// `lnpdf` is never called when the proposal is outside the support.
    pub fn step<F, S>(
        &self,
        previous: f64,
        cur_lnpdf: f64,
        lnpdf: F,
        what: &'static str,
        src: &mut S,
    ) -> McmcResult<(MhOutcome, f64)>
    where
        F: Fn(f64) -> f64,
        S: VariateSource + ?Sized,
    {
        let z = finite_draw(what, src.std_normal())?;
        let proposal = previous + self.scale * z;

        if let Some(support) = self.support {
            if !support.contains(proposal) {
                trace!("{}: proposal {} out of support", what, proposal);
                return Ok((MhOutcome::OutOfSupport(previous), cur_lnpdf));
            }
        }

        let new_lnpdf = lnpdf(proposal);
        let log_ratio = new_lnpdf - cur_lnpdf;
        if log_ratio.is_nan() {
            return Err(McmcError::NonFiniteDensity { what });
        }

        let log_u = src.uniform().ln();
        if log_ratio >= log_u {
            Ok((MhOutcome::Accepted(proposal), new_lnpdf))
        } else {
            Ok((MhOutcome::Rejected(previous), cur_lnpdf))
        }
    }
}
