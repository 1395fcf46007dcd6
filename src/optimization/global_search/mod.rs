//! global_search — bounded, derivative-free log-likelihood maximization.
//!
//! Purpose
//! -------
//! Provide an Argmin-backed layer for **maximizing log-likelihoods** `ℓ(θ)`
//! inside a box when no gradient is available and the surface is multimodal,
//! as happens when searching for a fiducial waveform. Callers implement
//! [`LogLikelihood`] and invoke [`maximize_bounded`].
//!
//! Key behaviors
//! -------------
//! - Convert user-supplied log-likelihoods `ℓ(θ)` into Argmin-compatible
//!   cost functions `c(θ) = -ℓ(θ)` via [`adapter::ArgMinAdapter`].
//! - Run a seeded particle swarm ([`run::run_particle_swarm`]) so repeated
//!   searches are reproducible.
//! - Optionally compare the swarm's optimum with a caller-supplied starting
//!   point and keep the better one.
//!
//! Invariants & assumptions
//! ------------------------
//! - The search **always maximizes** `ℓ(θ)`; user code never implements the
//!   cost directly.
//! - `ℓ(θ) = -∞` is a legitimate value (outside the likelihood support);
//!   `NaN` is a hard error.
//! - Bounds are finite and strictly increasing ([`SearchBounds::new`]).
//!
//! Conventions
//! -----------
//! - Parameter vectors follow the name order of [`SearchBounds`].
//! - This module avoids I/O and logging; callers report progress.
//!
//! Downstream usage
//! ----------------
//! - `relative_binning` wraps its fiducial objective in a [`LogLikelihood`]
//!   implementation and calls [`maximize_bounded`] once per refinement
//!   iteration.
//!
//! Testing notes
//! -------------
//! - Unit tests cover the adapter's sign and support conventions, option
//!   validation, and recovery of a known optimum on a smooth bowl.

pub mod adapter;
pub mod api;
pub mod run;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::api::maximize_bounded;
pub use self::traits::{LogLikelihood, SearchOptions, SearchOutcome};
pub use self::types::{Cost, FnEvalMap, SearchBounds, Theta};

// ---- Optional convenience prelude for downstream crates -------------------

pub mod prelude {
    pub use super::api::maximize_bounded;
    pub use super::traits::{LogLikelihood, SearchOptions, SearchOutcome};
    pub use super::types::{SearchBounds, Theta};
}
