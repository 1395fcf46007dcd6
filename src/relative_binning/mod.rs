//! relative_binning — heterodyned likelihood around a fiducial waveform.
//!
//! Purpose
//! -------
//! Approximate the full-bandwidth inner products by a few hundred per-bin
//! sums. Templates close to a fiducial waveform differ from it by a ratio
//! that is nearly linear in frequency inside each bin, so each evaluation
//! only needs the template at the bin edges.
//!
//! Key behaviors
//! -------------
//! - [`BinEdges`] places edges with the post-Newtonian phase-drift bound,
//!   snapped to the native frequency grid.
//! - [`SummaryData`] holds the four per-bin coefficients for one detector.
//! - [`RelativeBinningTransient`] sets up bins and searches for the
//!   fiducial on first use, then refreshes it per [`FiducialRefreshPolicy`].
//!
//! Invariants & assumptions
//! ------------------------
//! - Where the fiducial vanishes at an edge the ratio is borrowed from the
//!   nearest edge where it does not; never NaN.
//! - Time marginalization is not available.
//!
//! Testing notes
//! -------------
//! - A ratio that is exactly linear inside each bin must give exact
//!   ⟨d|h⟩; near the fiducial the binned ratio tracks the full one.

pub mod bins;
pub mod options;
pub mod policy;
pub mod snr;
pub mod summary;
pub mod transient;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::bins::BinEdges;
pub use self::options::{RelativeBinningOptions, SearchObjective};
pub use self::policy::FiducialRefreshPolicy;
pub use self::snr::{Fiducial, FiducialDetector, RelativeBinningSnr};
pub use self::summary::SummaryData;
pub use self::transient::RelativeBinningTransient;

pub mod prelude {
    pub use super::options::{RelativeBinningOptions, SearchObjective};
    pub use super::policy::FiducialRefreshPolicy;
    pub use super::transient::RelativeBinningTransient;
}
