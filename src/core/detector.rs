//! Interferometer interface consumed by the likelihoods.
//!
//! A [`Detector`] owns its strain, PSD and frequency mask; the likelihoods
//! borrow it for their whole lifetime and never mutate it.
use crate::core::params::{self, ParameterMap};
use crate::core::waveform::Polarizations;
use crate::likelihood::errors::{LikelihoodError, LikelihoodResult};
use ndarray::{Array1, ArrayView1, Zip};
use num_complex::Complex64;
use std::f64::consts::PI;

/// Speed of light in m/s.
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Mean Earth radius in metres.
pub const EARTH_RADIUS: f64 = 6_371_000.0;

pub trait Detector {
    fn name(&self) -> &str;

    /// Geocentric Cartesian position of the vertex in metres.
    fn vertex(&self) -> [f64; 3];

    fn frequency_array(&self) -> ArrayView1<'_, f64>;
    fn frequency_domain_strain(&self) -> ArrayView1<'_, Complex64>;
    fn power_spectral_density_array(&self) -> ArrayView1<'_, f64>;
    fn frequency_mask(&self) -> ArrayView1<'_, bool>;

    fn minimum_frequency(&self) -> f64;
    fn maximum_frequency(&self) -> f64;
    fn duration(&self) -> f64;
    fn sampling_frequency(&self) -> f64;
    fn start_time(&self) -> f64;

    /// Antenna pattern for `mode` (`"plus"`, `"cross"`, ...).
    fn antenna_response(&self, ra: f64, dec: f64, time: f64, psi: f64, mode: &str) -> f64;

    /// Arrival-time offset of this detector relative to the geocentre.
    fn time_delay_from_geocenter(&self, ra: f64, dec: f64, time: f64) -> f64;

    /// Multiplicative calibration model on `frequencies`; unity by default.
    fn calibration_factor(
        &self, frequencies: ArrayView1<f64>, _parameters: &ParameterMap,
    ) -> Array1<Complex64> {
        Array1::from_elem(frequencies.len(), Complex64::new(1.0, 0.0))
    }

    /// Optimal SNR recorded for an injection in this detector, if any.
    fn optimal_snr(&self) -> Option<f64> {
        None
    }

    /// Project `polarizations` (sampled on `frequencies`) into this detector.
    ///
    /// Reads `ra`, `dec`, `psi` and `geocent_time`. The arrival time shift
    /// relative to the segment start and the calibration model are applied.
    ///
    /// Errors
    /// ------
    /// - `MissingParameter` when an extrinsic parameter is absent.
    /// - `ShapeMismatch` when a mode is not sampled on `frequencies`.
    fn detector_response_at(
        &self, polarizations: &Polarizations, parameters: &ParameterMap,
        frequencies: ArrayView1<f64>,
    ) -> LikelihoodResult<Array1<Complex64>> {
        let ra = params::require(parameters, params::RA)?;
        let dec = params::require(parameters, params::DEC)?;
        let psi = params::require(parameters, params::PSI)?;
        let time = params::require(parameters, params::GEOCENT_TIME)?;

        let mut signal = Array1::<Complex64>::zeros(frequencies.len());
        for (mode, strain) in polarizations.iter() {
            if strain.len() != frequencies.len() {
                return Err(LikelihoodError::ShapeMismatch {
                    what: "polarization length",
                    expected: frequencies.len(),
                    found: strain.len(),
                });
            }
            let response = self.antenna_response(ra, dec, time, psi, mode);
            Zip::from(&mut signal).and(strain).for_each(|s, &h| *s += h * response);
        }

        let dt = time + self.time_delay_from_geocenter(ra, dec, time) - self.start_time();
        let calibration = self.calibration_factor(frequencies, parameters);
        Zip::from(&mut signal).and(&frequencies).and(&calibration).for_each(|s, &f, &c| {
            *s *= Complex64::from_polar(1.0, -2.0 * PI * f * dt) * c;
        });
        Ok(signal)
    }

    /// [`Detector::detector_response_at`] on the native grid, zeroed outside the mask.
    fn detector_response(
        &self, polarizations: &Polarizations, parameters: &ParameterMap,
    ) -> LikelihoodResult<Array1<Complex64>> {
        let mut signal =
            self.detector_response_at(polarizations, parameters, self.frequency_array())?;
        Zip::from(&mut signal).and(&self.frequency_mask()).for_each(|s, &m| {
            if !m {
                *s = Complex64::new(0.0, 0.0);
            }
        });
        Ok(signal)
    }
}
