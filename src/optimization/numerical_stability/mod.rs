//! numerical_stability — overflow-safe reductions and special functions.
//!
//! Purpose
//! -------
//! Collect the scalar numerical kernels every marginalization relies on, so
//! the likelihood layers can assume well-conditioned `f64` arithmetic even
//! for log-likelihoods of order 10^6.
//!
//! Key behaviors
//! -------------
//! - Provide max-shifted log-sum-exp reductions, plain and weighted
//!   (`logsumexp`, `logsumexp_weighted`).
//! - Provide the exponentially scaled Bessel function `i0e` and its
//!   logarithm, used by phase marginalization.
//! - Provide trapezoidal quadrature for the ROQ time-resolution estimate.
//!
//! Invariants & assumptions
//! ------------------------
//! - Weighted reductions assume non-negative weights; zero-weight terms are
//!   skipped so `±∞` paired with a zero weight cannot produce NaN.
//! - `-∞` is the canonical "impossible" log-value and propagates cleanly
//!   through every reduction.
//!
//! Conventions
//! -----------
//! - Functions take `ndarray` views and never allocate beyond scalars.
//! - This module never logs, performs I/O, or touches global state.
//!
//! Downstream usage
//! ----------------
//! - `marginalization` builds its distance table and time marginal from
//!   `logsumexp_weighted`, and its phase table from `log_i0e`.
//! - `roq::weights` integrates PSD moments with `trapezoid`.
//!
//! Testing notes
//! -------------
//! - Unit tests compare against naïve formulas on safe grids and against
//!   tabulated Bessel values; tails are checked for finiteness.

pub mod special;
pub mod transformations;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::special::{i0e, log_i0, log_i0e};
pub use self::transformations::{logsumexp, logsumexp_weighted, trapezoid};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use gw_likelihood::optimization::numerical_stability::prelude::*;
//
// to import the main numerical-stability surface in a single line.

pub mod prelude {
    pub use super::special::{i0e, log_i0, log_i0e};
    pub use super::transformations::{logsumexp, logsumexp_weighted, trapezoid};
}
