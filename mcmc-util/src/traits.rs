use crate::metropolis::Support;

/// A chain snapshot that can be read off element by element for
/// posterior summaries.
pub trait ChainParam: Clone {
    /// Number of scalar components
    fn dim(&self) -> usize;

    /// The `i`-th scalar component
    fn value(&self, i: usize) -> f64;
}

impl ChainParam for f64 {
    fn dim(&self) -> usize {
        1
    }

    fn value(&self, _i: usize) -> f64 {
        *self
    }
}

impl ChainParam for Vec<f64> {
    fn dim(&self) -> usize {
        self.len()
    }

    fn value(&self, i: usize) -> f64 {
        self[i]
    }
}

/// Unnormalised log density of a single scalar parameter, optionally
/// restricted to hard bounds.
pub trait ScalarTarget {
    fn log_density(&self, x: f64) -> f64;

    fn support(&self) -> Option<Support> {
        None
    }
}
