//! gw_likelihood — gravitational-wave transient likelihoods.
//!
//! Purpose
//! -------
//! Evaluate the log-likelihood of frequency-domain interferometer data given
//! a compact-binary signal model, optionally marginalized over coalescence
//! time, orbital phase and luminosity distance, with two accelerated
//! variants: reduced-order quadrature and relative binning.
//!
//! Key behaviors
//! -------------
//! - [`core`](crate::core) defines the data model, the detector/waveform/prior
//!   collaborators and the noise-weighted inner product.
//! - [`likelihood`] hosts the network aggregator, generic over the
//!   [`SnrProvider`](crate::core::snr::SnrProvider) computing per-detector
//!   inner products.
//! - [`marginalization`] precomputes the distance lookup table (with disk
//!   cache), the Bessel interpolant and the time grid.
//! - [`roq`] and [`relative_binning`] plug their providers into the same
//!   aggregator.
//! - [`optimization`] supplies the bounded global search and the
//!   overflow-safe numerics.
//!
//! Invariants & assumptions
//! ------------------------
//! - `log_likelihood = log_likelihood_ratio + noise_log_likelihood` for
//!   every variant.
//! - Detectors and waveform generators are borrowed and never mutated; the
//!   caller's parameter map is never modified.
//!
//! Conventions
//! -----------
//! - Errors are typed enums ([`likelihood::LikelihoodError`],
//!   [`roq::RoqError`], [`optimization::errors::OptError`]); a model that
//!   produces no waveform yields `-∞`, not an error.
//! - Diagnostics go through `tracing`; installing a subscriber is the
//!   caller's business.
//!
//! Downstream usage
//! ----------------
//! - Implement [`Detector`](crate::core::detector::Detector) and
//!   [`WaveformGenerator`](crate::core::waveform::WaveformGenerator) for your
//!   data and model, or use the toys in [`synthetic`](crate::core::synthetic).
//! - `use gw_likelihood::prelude::*;` imports the common surface.
//!
//! Testing notes
//! -------------
//! - Unit tests live next to each module; `tests/` runs the variants
//!   end-to-end against each other on a synthetic network.

pub mod core;
pub mod likelihood;
pub mod marginalization;
pub mod optimization;
pub mod relative_binning;
pub mod roq;

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use gw_likelihood::prelude::*;
//
// to import the main likelihood surface in a single line.

pub mod prelude {
    pub use crate::core::prelude::*;
    pub use crate::likelihood::prelude::*;
    pub use crate::marginalization::prelude::*;
    pub use crate::relative_binning::prelude::*;
    pub use crate::roq::prelude::*;
}
