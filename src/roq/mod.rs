//! roq — reduced-order-quadrature likelihood.
//!
//! Purpose
//! -------
//! Replace the full-bandwidth inner products by sums over a handful of
//! basis nodes. The data are contracted with the linear and quadratic
//! bases once ([`RoqWeights`]); each evaluation then costs a few dozen
//! complex multiply-adds per detector.
//!
//! Key behaviors
//! -------------
//! - [`RoqParams`] describes the window a basis is valid for; a violated
//!   window is the distinct [`RoqError::ParamsRange`].
//! - [`RoqWeights::build`] sizes the time grid from the time prior and the
//!   network light-crossing time, with an SNR-informed time step.
//! - [`RoqSnr`] plugs the weights into the shared transient aggregator;
//!   distance and phase marginalization work unchanged.
//!
//! Invariants & assumptions
//! ------------------------
//! - Time marginalization is not available; requesting it fails at
//!   construction.
//! - Arrival times within two grid samples of the grid ends give `-∞`.
//!
//! Downstream usage
//! ----------------
//! - Build weights once (or load them), then construct with
//!   [`GravitationalWaveTransient::with_roq`].
//!
//! Testing notes
//! -------------
//! - With an identity basis whose nodes are the detector frequencies, ROQ
//!   inner products must reproduce the full-bandwidth ones.

pub mod errors;
pub mod params;
pub mod snr;
pub mod weights;

use crate::core::detector::Detector;
use crate::core::options::LikelihoodOptions;
use crate::core::priors::PriorDict;
use crate::core::waveform::RoqWaveformGenerator;
use crate::likelihood::errors::LikelihoodResult;
use crate::likelihood::transient::GravitationalWaveTransient;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::errors::{RoqError, RoqResult};
pub use self::params::RoqParams;
pub use self::snr::RoqSnr;
pub use self::weights::{DetectorWeights, RoqBasis, RoqOptions, RoqWeights};

/// Transient likelihood evaluated with reduced-order quadrature.
pub type RoqGravitationalWaveTransient<'a, D, W> = GravitationalWaveTransient<'a, D, RoqSnr<'a, W>>;

impl<'a, D, W> GravitationalWaveTransient<'a, D, RoqSnr<'a, W>>
where
    D: Detector,
    W: RoqWaveformGenerator,
{
    /// # Errors
    /// - `Roq(MissingWeights)` if a detector has no weights.
    /// - `Roq(BasisShape)` if the generator's nodes do not match the weights.
    /// - `UnsupportedMarginalization` if time marginalization is requested.
    /// - Every error of [`GravitationalWaveTransient::new`].
    pub fn with_roq(
        detectors: &'a [D], generator: &'a W, weights: RoqWeights, priors: Option<&mut PriorDict>,
        options: LikelihoodOptions,
    ) -> LikelihoodResult<Self> {
        weights.covers(detectors)?;
        let provider = RoqSnr::new(generator, weights)?;
        Self::new(detectors, provider, priors, options)
    }
}

pub mod prelude {
    pub use super::errors::{RoqError, RoqResult};
    pub use super::params::RoqParams;
    pub use super::weights::{RoqBasis, RoqOptions, RoqWeights};
    pub use super::{RoqGravitationalWaveTransient, RoqSnr};
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::frames::TimeReference;
    use crate::core::options::{DistanceTableOptions, LookupTableSource, MarginalizationFlags};
    use crate::core::params::{self, ParameterMap, parameter_map};
    use crate::core::priors::{PowerLaw, Uniform};
    use crate::core::snr::FullBandwidthSnr;
    use crate::core::synthetic::{
        HANFORD_VERTEX, LIVINGSTON_VERTEX, SyntheticInterferometer, ToyInspiral, ToyRoqGenerator,
    };
    use crate::likelihood::errors::LikelihoodError;
    use crate::likelihood::traits::Likelihood;
    use ndarray::{Array1, Array2};
    use num_complex::Complex64;

    // ---- Scope ----
    // End-to-end ROQ against the full-bandwidth likelihood with an identity
    // basis, the out-of-grid edge, and construction errors.

    const FS: f64 = 128.0;
    const T: f64 = 4.0;
    const START: f64 = 1000.0;
    const F_MIN: f64 = 20.0;
    const F_MAX: f64 = 60.0;

    fn injection() -> ParameterMap {
        parameter_map([
            (params::CHIRP_MASS, 28.0),
            (params::LUMINOSITY_DISTANCE, 400.0),
            (params::PHASE, 0.7),
            (params::RA, 1.3),
            (params::DEC, -0.4),
            (params::PSI, 0.6),
            (params::GEOCENT_TIME, START + 2.0),
        ])
    }

    fn inspiral() -> ToyInspiral {
        ToyInspiral::new(T, FS, START, F_MIN, F_MAX)
    }

    fn network(waveform_generator: &ToyInspiral) -> Vec<SyntheticInterferometer> {
        let mut h1 = SyntheticInterferometer::new("H1", HANFORD_VERTEX, FS, T, START, F_MIN, F_MAX, 1.0);
        let mut l1 = SyntheticInterferometer::new("L1", LIVINGSTON_VERTEX, FS, T, START, F_MIN, F_MAX, 1.0);
        h1.inject(waveform_generator, &injection()).unwrap();
        l1.inject(waveform_generator, &injection()).unwrap();
        vec![h1, l1]
    }

    fn priors() -> PriorDict {
        let mut priors = PriorDict::new();
        priors.insert(params::GEOCENT_TIME, Uniform::new(START + 1.9, START + 2.1).unwrap());
        priors.insert(params::PHASE, Uniform::new(0.0, 2.0 * std::f64::consts::PI).unwrap());
        priors.insert(params::LUMINOSITY_DISTANCE, PowerLaw::new(2.0, 100.0, 1500.0).unwrap());
        priors
    }

    fn masked_frequencies(det: &SyntheticInterferometer) -> Array1<f64> {
        det.frequency_array()
            .iter()
            .zip(det.frequency_mask().iter())
            .filter(|&(_, &m)| m)
            .map(|(&f, _)| f)
            .collect()
    }

    /// Identity basis over the masked band; nodes are the masked frequencies.
    fn identity_setup(dets: &[SyntheticInterferometer]) -> (ToyRoqGenerator, RoqWeights) {
        let nodes = masked_frequencies(&dets[0]);
        let n = nodes.len();
        let linear = Array2::from_shape_fn((n, n), |(i, j)| {
            if i == j { Complex64::new(1.0, 0.0) } else { Complex64::new(0.0, 0.0) }
        });
        let quadratic = Array2::from_shape_fn((n, n), |(i, j)| if i == j { 1.0 } else { 0.0 });
        let basis = RoqBasis::new(linear, quadratic).unwrap();
        let options = RoqOptions { time_resolution: Some(5e-4), ..RoqOptions::default() };
        let weights =
            RoqWeights::build(dets, &basis, &priors(), &TimeReference::Geocenter, &options).unwrap();
        (ToyRoqGenerator::new(inspiral(), nodes.clone(), nodes), weights)
    }

    #[test]
    // Purpose
    // -------
    // ROQ inner products reproduce the full-bandwidth ones when the basis
    // is exact.
    //
    // Given
    // -----
    // - an injected two-detector network, identity basis, Δt = 0.5 ms, a
    //   template slightly off the injection in mass and time.
    //
    // Expect
    // ------
    // - ⟨h|h⟩ equal to 1e-9 relative; ⟨d|h⟩ equal to 2e-3 relative (cubic
    //   time interpolation); log-likelihood ratios within 1e-2 · |ratio|.
    fn identity_basis_matches_full_bandwidth() {
        // Arrange
        let waveform_generator = inspiral();
        let dets = network(&waveform_generator);
        let (roq_gen, weights) = identity_setup(&dets);
        let mut roq =
            GravitationalWaveTransient::with_roq(&dets, &roq_gen, weights, None, LikelihoodOptions::default())
                .unwrap();
        let mut full =
            GravitationalWaveTransient::new(&dets, FullBandwidthSnr::new(&waveform_generator), None, LikelihoodOptions::default())
                .unwrap();
        let mut template = injection();
        template.insert(params::CHIRP_MASS.to_string(), 28.02);
        template.insert(params::GEOCENT_TIME.to_string(), START + 2.0004);

        // Act
        let roq_snrs = roq.calculate_snrs(&template).unwrap().unwrap();
        let full_snrs = full.calculate_snrs(&template).unwrap().unwrap();
        let roq_ratio = roq.log_likelihood_ratio(&template).unwrap();
        let full_ratio = full.log_likelihood_ratio(&template).unwrap();

        // Assert
        for (r, f) in roq_snrs.iter().zip(full_snrs.iter()) {
            assert!((r.optimal_snr_squared - f.optimal_snr_squared).abs() <= 1e-9 * f.optimal_snr_squared);
            assert!((r.d_inner_h - f.d_inner_h).norm() <= 2e-3 * f.d_inner_h.norm());
        }
        assert!((roq_ratio - full_ratio).abs() <= 1e-2 * full_ratio.abs().max(1.0));
    }

    #[test]
    // Purpose
    // -------
    // Arrival times outside the weight grid are impossible, not errors.
    //
    // Given
    // -----
    // - weights built for a time prior [1.9, 2.1] s into the segment.
    //
    // Expect
    // ------
    // - the ratio at 3.5 s is -∞; log_likelihood stays ratio + noise.
    fn time_outside_grid_gives_negative_infinity() {
        let waveform_generator = inspiral();
        let dets = network(&waveform_generator);
        let (roq_gen, weights) = identity_setup(&dets);
        let mut roq =
            GravitationalWaveTransient::with_roq(&dets, &roq_gen, weights, None, LikelihoodOptions::default())
                .unwrap();
        let mut outside = injection();
        outside.insert(params::GEOCENT_TIME.to_string(), START + 3.5);
        assert_eq!(roq.log_likelihood_ratio(&outside).unwrap(), f64::NEG_INFINITY);
        assert_eq!(roq.log_likelihood(&outside).unwrap(), f64::NEG_INFINITY);
    }

    #[test]
    // Purpose
    // -------
    // The five-sample interpolation window decides the edges of the usable
    // grid: the closest sample needs two neighbours on each side.
    //
    // Given
    // -----
    // - geocentre times placing the earliest detector just past sample 2 or
    //   sample 1, and the latest detector just short of sample n-3 or n-2.
    //
    // Expect
    // ------
    // - samples 2 and n-3 give finite ratios; samples 1 and n-2 give -∞.
    fn time_window_margin_is_two_samples() {
        // Arrange
        let waveform_generator = inspiral();
        let dets = network(&waveform_generator);
        let (roq_gen, weights) = identity_setup(&dets);
        let times = weights.time_samples().to_owned();
        let n = times.len();
        let dt = times[1] - times[0];
        let (ra, dec) = (1.3, -0.4);
        let delays: Vec<f64> = dets.iter().map(|d| d.time_delay_from_geocenter(ra, dec, START + 2.0)).collect();
        let earliest = delays.iter().copied().fold(f64::INFINITY, f64::min);
        let latest = delays.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let at = |geocent: f64| {
            let mut p = injection();
            p.insert(params::GEOCENT_TIME.to_string(), geocent);
            p
        };
        let low = |k: usize| at(START + times[k] + 0.1 * dt - earliest);
        let high = |k: usize| at(START + times[k] - 0.1 * dt - latest);
        let mut roq =
            GravitationalWaveTransient::with_roq(&dets, &roq_gen, weights, None, LikelihoodOptions::default())
                .unwrap();

        // Act
        let inside_low = roq.log_likelihood_ratio(&low(2)).unwrap();
        let outside_low = roq.log_likelihood_ratio(&low(1)).unwrap();
        let inside_high = roq.log_likelihood_ratio(&high(n - 3)).unwrap();
        let outside_high = roq.log_likelihood_ratio(&high(n - 2)).unwrap();

        // Assert
        assert!(inside_low.is_finite(), "sample 2 gave {inside_low}");
        assert!(inside_high.is_finite(), "sample n-3 gave {inside_high}");
        assert_eq!(outside_low, f64::NEG_INFINITY);
        assert_eq!(outside_high, f64::NEG_INFINITY);
    }

    #[test]
    fn distance_and_phase_marginalization_run_on_roq() {
        let waveform_generator = inspiral();
        let dets = network(&waveform_generator);
        let (roq_gen, weights) = identity_setup(&dets);
        let mut priors = priors();
        let options = LikelihoodOptions::default()
            .with_flags(MarginalizationFlags::new(false, true, true))
            .with_distance_table(DistanceTableOptions::new(500, 40, 80, LookupTableSource::NoCache).unwrap());
        let mut roq =
            GravitationalWaveTransient::with_roq(&dets, &roq_gen, weights, Some(&mut priors), options).unwrap();
        let value = roq.log_likelihood_ratio(&injection()).unwrap();
        assert!(value.is_finite() && value > 0.0);
    }

    #[test]
    fn construction_errors() {
        let waveform_generator = inspiral();
        let dets = network(&waveform_generator);
        let (roq_gen, weights) = identity_setup(&dets);

        let mut priors = priors();
        let options = LikelihoodOptions::default().with_flags(MarginalizationFlags::new(true, false, false));
        let err = GravitationalWaveTransient::with_roq(&dets, &roq_gen, weights.clone(), Some(&mut priors), options)
            .unwrap_err();
        assert!(matches!(err, LikelihoodError::UnsupportedMarginalization { name: "time", .. }));

        let wrong_nodes = ToyRoqGenerator::new(inspiral(), Array1::linspace(20.0, 60.0, 7), Array1::linspace(20.0, 60.0, 7));
        let err = GravitationalWaveTransient::with_roq(
            &dets,
            &wrong_nodes,
            weights.clone(),
            None,
            LikelihoodOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, LikelihoodError::Roq(RoqError::BasisShape { .. })));

        let mut extra = dets.clone();
        extra.push(SyntheticInterferometer::new("V1", HANFORD_VERTEX, FS, T, START, F_MIN, F_MAX, 1.0));
        let err = GravitationalWaveTransient::with_roq(&extra, &roq_gen, weights, None, LikelihoodOptions::default())
            .unwrap_err();
        assert_eq!(err, LikelihoodError::Roq(RoqError::MissingWeights { detector: "V1".into() }));
    }
}
