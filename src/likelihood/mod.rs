//! likelihood — the network transient likelihood and its error surface.
//!
//! Purpose
//! -------
//! Expose [`GravitationalWaveTransient`], the single aggregator behind every
//! likelihood variant in the crate, together with the [`Likelihood`]
//! evaluation trait and [`LikelihoodError`].
//!
//! Key behaviors
//! -------------
//! - `log_likelihood = log_likelihood_ratio + noise_log_likelihood`, always.
//! - No waveform, or a detector that cannot contribute, gives `-∞`.
//! - Posterior draws of marginalized parameters take the RNG explicitly.
//!
//! Conventions
//! -----------
//! - Construction errors are fatal and typed; evaluation errors only report
//!   caller contract violations (missing parameters).
//!
//! Testing notes
//! -------------
//! - Unit tests in `transient` compare every marginalization with a
//!   brute-force evaluation of the plain likelihood.

pub mod errors;
pub mod traits;
pub mod transient;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::errors::{LikelihoodError, LikelihoodResult};
pub use self::traits::{Likelihood, NetworkSnrs};
pub use self::transient::GravitationalWaveTransient;

pub mod prelude {
    pub use super::errors::{LikelihoodError, LikelihoodResult};
    pub use super::traits::Likelihood;
    pub use super::transient::GravitationalWaveTransient;
}
