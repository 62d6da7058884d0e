use thiserror::Error;

/// Errors that abort a sampling run.
///
/// Out-of-support proposals are not errors; they are absorbed as ordinary
/// rejections (see [`crate::metropolis::MhOutcome::OutOfSupport`]).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum McmcError {
    /// `x_jᵀx_j = 0`, the conditional precision has no data term
    #[error("design matrix column {column} is degenerate (all zeros)")]
    DegenerateColumn { column: usize },

    #[error("residual variance must be strictly positive, got {value}")]
    NonPositiveVariance { value: f64 },

    #[error("unsupported sampler type: {name}")]
    UnsupportedSamplerType { name: String },

    /// A variate generator returned NaN or ±Infinity
    #[error("non-finite draw while updating {what}: {value}")]
    NonFiniteDraw { what: &'static str, value: f64 },

    #[error("log density is NaN while updating {what}")]
    NonFiniteDensity { what: &'static str },

    #[error("tuning scale must be positive and finite, got {scale}")]
    InvalidTuningScale { scale: f64 },

    #[error("invalid prior for {what}: {reason}")]
    InvalidPrior {
        what: &'static str,
        reason: &'static str,
    },

    #[error("{what}: expected {expected}, found {found}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("non-finite value in {what}")]
    NonFiniteData { what: &'static str },

    #[error("no observations")]
    EmptyData,

    #[error("the number of iterations must be positive")]
    InvalidIterations,
}

/// Crate-wide result alias.
pub type McmcResult<T> = Result<T, McmcError>;
