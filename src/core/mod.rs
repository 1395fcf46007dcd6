//! core — data model, collaborator traits and inner products.
//!
//! Purpose
//! -------
//! Define everything the likelihood variants share: the caller's parameter
//! map, the detector/waveform/prior interfaces they consume, the
//! noise-weighted inner product, the per-detector SNR bundle and the
//! [`snr::SnrProvider`] seam, plus construction-time options.
//!
//! Key behaviors
//! -------------
//! - [`detector::Detector`] and [`waveform::WaveformGenerator`] describe the
//!   external collaborators; the crate borrows them and never mutates them.
//! - [`snr::FullBandwidthSnr`] is the reference SNR provider; reduced-order
//!   quadrature and relative binning provide alternatives.
//! - [`frames::SkyFrame`] maps sampled sky/time parameters into the
//!   geocentric frame used for projection.
//! - [`synthetic`] supplies deterministic toy collaborators.
//!
//! Invariants & assumptions
//! ------------------------
//! - Frequency-domain arrays share the detector's native grid
//!   `k / T, k = 0..=fs·T/2` unless stated otherwise.
//! - The inner product is `⟨a|b⟩ = 4/T Σ conj(a) b / S` over the frequency mask.
//!
//! Conventions
//! -----------
//! - Parameter names are the `params::*` constants.
//! - Fallible construction returns `LikelihoodResult`.
//!
//! Downstream usage
//! ----------------
//! - `likelihood::GravitationalWaveTransient` is generic over
//!   [`detector::Detector`] and [`snr::SnrProvider`].
//!
//! Testing notes
//! -------------
//! - Unit tests cover grid construction, the inner-product convention,
//!   prior quantiles, frame parsing and the toy models.

pub mod detector;
pub mod frames;
pub mod options;
pub mod params;
pub mod priors;
pub mod series;
pub mod snr;
pub mod synthetic;
pub mod waveform;

pub mod prelude {
    pub use super::detector::Detector;
    pub use super::frames::{ReferenceFrame, TimeReference};
    pub use super::options::{
        DistanceTableOptions, LikelihoodOptions, LookupTableSource, MarginalizationFlags,
    };
    pub use super::params::{ParameterMap, parameter_map};
    pub use super::priors::{DeltaFunction, Interped, PowerLaw, Prior, PriorDict, Uniform};
    pub use super::snr::{CalculatedSnrs, FullBandwidthSnr, SnrProvider};
    pub use super::waveform::{
        FrequencyDomainModel, Polarizations, RoqPolarizations, RoqWaveformGenerator,
        WaveformGenerator,
    };
}
