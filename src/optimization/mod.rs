//! optimization — bounded search, numerical helpers, and unified error surface.
//!
//! Purpose
//! -------
//! Provide the numerical support layer shared by the likelihoods: a
//! derivative-free bounded maximizer for the relative-binning fiducial
//! search, overflow-safe special functions and reductions for the
//! marginalizations, and a single error/result surface.
//!
//! Key behaviors
//! -------------
//! - Expose [`global_search::maximize_bounded`], an Argmin particle swarm
//!   that maximizes a log-likelihood `ℓ(θ)` inside a box.
//! - Supply [`numerical_stability`] primitives: exponentially scaled Bessel
//!   `I0`, weighted log-sum-exp and trapezoid integration.
//! - Normalize configuration issues, objective failures, and backend solver
//!   errors into [`errors::OptError`] with the alias `OptResult<T>`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Searches maximize `ℓ(θ)` by minimizing `c(θ) = -ℓ(θ)`; `ℓ = -∞` is a
//!   valid value, `NaN` is an error.
//! - Helpers return `-∞` rather than `NaN` for empty or all-zero-weight
//!   inputs.
//!
//! Conventions
//! -----------
//! - Callers never see raw Argmin errors.
//! - No I/O and no logging here; the likelihood layer reports progress.
//!
//! Testing notes
//! -------------
//! - `global_search`: adapter sign conventions, option validation, and
//!   recovery of a known optimum.
//! - `numerical_stability`: agreement with naïve formulas where those are
//!   safe, and finite tails where they overflow.

pub mod errors;
pub mod global_search;
pub mod numerical_stability;

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use gw_likelihood::optimization::prelude::*;
//
// to import the main optimization surface in a single line.

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::global_search::prelude::*;
    pub use super::numerical_stability::prelude::*;
}
