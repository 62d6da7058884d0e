//! Building blocks for Markov chain Monte Carlo samplers: an append-only
//! chain with posterior summaries, a random-walk Metropolis-Hastings step
//! with acceptance bookkeeping, and the variate-source seam through which
//! samplers draw their randomness.

pub mod chain;
pub mod error;
pub mod metropolis;
pub mod traits;
pub mod variates;

pub use chain::McmcChain;
pub use error::{McmcError, McmcResult};
pub use metropolis::{AcceptanceCounter, MhOutcome, RandomWalk, Support};
pub use traits::{ChainParam, ScalarTarget};
pub use variates::VariateSource;
