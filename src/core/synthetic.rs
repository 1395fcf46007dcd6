//! Deterministic toy detectors and waveforms.
//!
//! These implement the collaborator traits with closed-form models so the
//! likelihoods can be exercised end-to-end without external physics
//! libraries: a [`SyntheticInterferometer`] with a simple quadrupole-like
//! antenna pattern and geometric time delays, and a [`ToyInspiral`] whose
//! amplitude and phase follow the leading-order chirp scaling.
use crate::core::detector::{Detector, SPEED_OF_LIGHT};
use crate::core::params::{self, ParameterMap};
use crate::core::series::create_frequency_series;
use crate::core::waveform::{
    CROSS, FrequencyDomainModel, PLUS, Polarizations, RoqPolarizations, RoqWaveformGenerator,
    WaveformGenerator,
};
use crate::likelihood::errors::LikelihoodResult;
use ndarray::{Array1, ArrayView1};
use num_complex::Complex64;
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

/// Solar mass in seconds (G·M☉/c³).
const SOLAR_MASS_SECONDS: f64 = 4.925_491_025_543_575e-6;

/// Strain amplitude at 100 Hz for M_c = 30 M☉ at 100 Mpc.
const AMPLITUDE_AT_100_MPC: f64 = 5.0;

/// LIGO Hanford vertex (m, geocentric).
pub const HANFORD_VERTEX: [f64; 3] = [-2.161_414_926_36e6, -3.834_695_178_89e6, 4.600_350_226_64e6];
/// LIGO Livingston vertex (m, geocentric).
pub const LIVINGSTON_VERTEX: [f64; 3] = [-7.427_604_4e4, -5.496_283_719_71e6, 3.224_257_017_44e6];

/// An interferometer with analytic response and a caller-supplied PSD.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticInterferometer {
    name: String,
    vertex: [f64; 3],
    frequency_array: Array1<f64>,
    strain: Array1<Complex64>,
    psd: Array1<f64>,
    mask: Array1<bool>,
    minimum_frequency: f64,
    maximum_frequency: f64,
    duration: f64,
    sampling_frequency: f64,
    start_time: f64,
    optimal_snr: Option<f64>,
}

impl SyntheticInterferometer {
    /// Zero-strain detector with a flat PSD of `psd_level`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: &str, vertex: [f64; 3], sampling_frequency: f64, duration: f64, start_time: f64,
        minimum_frequency: f64, maximum_frequency: f64, psd_level: f64,
    ) -> Self {
        let frequency_array = create_frequency_series(sampling_frequency, duration);
        let n = frequency_array.len();
        let mask = frequency_array.mapv(|f| f >= minimum_frequency && f <= maximum_frequency);
        Self {
            name: name.to_string(),
            vertex,
            frequency_array,
            strain: Array1::zeros(n),
            psd: Array1::from_elem(n, psd_level),
            mask,
            minimum_frequency,
            maximum_frequency,
            duration,
            sampling_frequency,
            start_time,
            optimal_snr: None,
        }
    }

    pub fn with_psd(mut self, psd: Array1<f64>) -> Self {
        self.psd = psd;
        self
    }

    pub fn set_strain(&mut self, strain: Array1<Complex64>) {
        self.strain = strain;
    }

    /// Add the projection of `generator` at `parameters` to the strain and
    /// record the injection's optimal SNR.
    ///
    /// Returns the optimal SNR, or `None` if the generator produced no signal.
    pub fn inject<W>(&mut self, generator: &W, parameters: &ParameterMap) -> LikelihoodResult<Option<f64>>
    where
        W: WaveformGenerator<Output = Polarizations>,
    {
        let Some(polarizations) = generator.frequency_domain_strain(parameters) else {
            return Ok(None);
        };
        let signal = self.detector_response(&polarizations, parameters)?;
        let snr_sq = crate::core::series::masked_inner_product(
            signal.view(),
            signal.view(),
            self.psd.view(),
            self.mask.view(),
            self.duration,
        )
        .re;
        self.strain = &self.strain + &signal;
        self.optimal_snr = Some(snr_sq.sqrt());
        Ok(self.optimal_snr)
    }
}

impl Detector for SyntheticInterferometer {
    fn name(&self) -> &str {
        &self.name
    }

    fn vertex(&self) -> [f64; 3] {
        self.vertex
    }

    fn frequency_array(&self) -> ArrayView1<'_, f64> {
        self.frequency_array.view()
    }

    fn frequency_domain_strain(&self) -> ArrayView1<'_, Complex64> {
        self.strain.view()
    }

    fn power_spectral_density_array(&self) -> ArrayView1<'_, f64> {
        self.psd.view()
    }

    fn frequency_mask(&self) -> ArrayView1<'_, bool> {
        self.mask.view()
    }

    fn minimum_frequency(&self) -> f64 {
        self.minimum_frequency
    }

    fn maximum_frequency(&self) -> f64 {
        self.maximum_frequency
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn sampling_frequency(&self) -> f64 {
        self.sampling_frequency
    }

    fn start_time(&self) -> f64 {
        self.start_time
    }

    fn antenna_response(&self, ra: f64, dec: f64, _time: f64, psi: f64, mode: &str) -> f64 {
        let hour_angle = ra - self.vertex[1].atan2(self.vertex[0]);
        let a = 0.5 * (1.0 + dec.sin().powi(2)) * (2.0 * hour_angle).cos();
        let b = dec.sin() * (2.0 * hour_angle).sin();
        let (s2p, c2p) = (2.0 * psi).sin_cos();
        match mode {
            PLUS => a * c2p - b * s2p,
            CROSS => a * s2p + b * c2p,
            _ => 0.0,
        }
    }

    fn time_delay_from_geocenter(&self, ra: f64, dec: f64, _time: f64) -> f64 {
        let n = [dec.cos() * ra.cos(), dec.cos() * ra.sin(), dec.sin()];
        -(self.vertex[0] * n[0] + self.vertex[1] * n[1] + self.vertex[2] * n[2]) / SPEED_OF_LIGHT
    }

    fn optimal_snr(&self) -> Option<f64> {
        self.optimal_snr
    }
}

/// Leading-order inspiral toy model.
///
/// Reads `chirp_mass` (M☉), `luminosity_distance` (Mpc), `phase` and
/// optionally `theta_jn`. Amplitude scales as `M_c^{5/6} f^{-7/6} / D`,
/// phase as `(π M_c f)^{-5/3}`, and `h ∝ e^{2iφ}`. Zero outside
/// `[f_lower, f_upper]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ToyInspiral {
    duration: f64,
    sampling_frequency: f64,
    start_time: f64,
    frequency_array: Array1<f64>,
    f_lower: f64,
    f_upper: f64,
}

impl ToyInspiral {
    pub fn new(
        duration: f64, sampling_frequency: f64, start_time: f64, f_lower: f64, f_upper: f64,
    ) -> Self {
        Self {
            duration,
            sampling_frequency,
            start_time,
            frequency_array: create_frequency_series(sampling_frequency, duration),
            f_lower,
            f_upper,
        }
    }

    pub fn frequency_array(&self) -> ArrayView1<'_, f64> {
        self.frequency_array.view()
    }

    fn polarizations_at(
        &self, parameters: &ParameterMap, frequencies: ArrayView1<f64>,
    ) -> Option<Polarizations> {
        let chirp_mass = parameters.get(params::CHIRP_MASS).copied()?;
        let distance = parameters.get(params::LUMINOSITY_DISTANCE).copied()?;
        let phase = parameters.get(params::PHASE).copied().unwrap_or(0.0);
        let theta_jn = parameters.get("theta_jn").copied().unwrap_or(0.0);
        if !(chirp_mass > 0.0 && distance > 0.0) {
            return None;
        }
        let amplitude = AMPLITUDE_AT_100_MPC * (chirp_mass / 30.0).powf(5.0 / 6.0) * (100.0 / distance);
        let mc_seconds = chirp_mass * SOLAR_MASS_SECONDS;
        let plus_factor = 0.5 * (1.0 + theta_jn.cos().powi(2));
        let cross_factor = theta_jn.cos();

        let mut plus = Array1::<Complex64>::zeros(frequencies.len());
        let mut cross = Array1::<Complex64>::zeros(frequencies.len());
        for (i, &f) in frequencies.iter().enumerate() {
            if f < self.f_lower || f > self.f_upper || f <= 0.0 {
                continue;
            }
            let amp = amplitude * (f / 100.0).powf(-7.0 / 6.0);
            let psi_f = 3.0 / 128.0 * (PI * mc_seconds * f).powf(-5.0 / 3.0);
            let arg = 2.0 * phase - psi_f + FRAC_PI_4;
            plus[i] = Complex64::from_polar(amp * plus_factor, arg);
            cross[i] = Complex64::from_polar(amp * cross_factor, arg - FRAC_PI_2);
        }
        Some(Polarizations::new().with_mode(PLUS, plus).with_mode(CROSS, cross))
    }
}

impl WaveformGenerator for ToyInspiral {
    type Output = Polarizations;

    fn duration(&self) -> f64 {
        self.duration
    }

    fn sampling_frequency(&self) -> f64 {
        self.sampling_frequency
    }

    fn start_time(&self) -> f64 {
        self.start_time
    }

    fn frequency_domain_strain(&self, parameters: &ParameterMap) -> Option<Polarizations> {
        self.polarizations_at(parameters, self.frequency_array.view())
    }
}

impl FrequencyDomainModel for ToyInspiral {
    fn frequency_domain_strain_at(
        &self, parameters: &ParameterMap, frequencies: ArrayView1<f64>,
    ) -> Option<Polarizations> {
        self.polarizations_at(parameters, frequencies)
    }
}

/// [`ToyInspiral`] sampled on fixed linear and quadratic ROQ nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct ToyRoqGenerator {
    inspiral: ToyInspiral,
    nodes_linear: Array1<f64>,
    nodes_quadratic: Array1<f64>,
}

impl ToyRoqGenerator {
    pub fn new(inspiral: ToyInspiral, nodes_linear: Array1<f64>, nodes_quadratic: Array1<f64>) -> Self {
        Self { inspiral, nodes_linear, nodes_quadratic }
    }
}

impl WaveformGenerator for ToyRoqGenerator {
    type Output = RoqPolarizations;

    fn duration(&self) -> f64 {
        self.inspiral.duration
    }

    fn sampling_frequency(&self) -> f64 {
        self.inspiral.sampling_frequency
    }

    fn start_time(&self) -> f64 {
        self.inspiral.start_time
    }

    fn frequency_domain_strain(&self, parameters: &ParameterMap) -> Option<RoqPolarizations> {
        Some(RoqPolarizations {
            linear: self.inspiral.polarizations_at(parameters, self.nodes_linear.view())?,
            quadratic: self.inspiral.polarizations_at(parameters, self.nodes_quadratic.view())?,
        })
    }
}

impl RoqWaveformGenerator for ToyRoqGenerator {
    fn frequency_nodes_linear(&self) -> ArrayView1<'_, f64> {
        self.nodes_linear.view()
    }

    fn frequency_nodes_quadratic(&self) -> ArrayView1<'_, f64> {
        self.nodes_quadratic.view()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::params::parameter_map;

    fn injection() -> ParameterMap {
        parameter_map([
            (params::CHIRP_MASS, 28.0),
            (params::LUMINOSITY_DISTANCE, 400.0),
            (params::PHASE, 0.7),
            (params::RA, 1.3),
            (params::DEC, -0.4),
            (params::PSI, 0.6),
            (params::GEOCENT_TIME, 2.0),
        ])
    }

    #[test]
    // Purpose
    // -------
    // Injection fills the strain and reports a positive optimal SNR.
    //
    // Given
    // -----
    // - a 4 s, 512 Hz Hanford-like detector and the toy model.
    //
    // Expect
    // ------
    // - SNR > 0 and strain non-zero only inside the mask.
    fn injection_populates_strain() {
        let generator = ToyInspiral::new(4.0, 512.0, 0.0, 20.0, 250.0);
        let mut ifo = SyntheticInterferometer::new("H1", HANFORD_VERTEX, 512.0, 4.0, 0.0, 20.0, 250.0, 1.0);
        let snr = ifo.inject(&generator, &injection()).unwrap().unwrap();
        assert!(snr > 0.0);
        for (s, &m) in ifo.frequency_domain_strain().iter().zip(ifo.frequency_mask().iter()) {
            if !m {
                assert_eq!(s.norm(), 0.0);
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // Phase convention h ∝ e^{2iφ}.
    //
    // Given
    // -----
    // - the same parameters at φ and φ + 0.25.
    //
    // Expect
    // ------
    // - plus ratio equals e^{0.5 i}.
    fn polarizations_rotate_with_twice_the_phase() {
        let generator = ToyInspiral::new(4.0, 512.0, 0.0, 20.0, 250.0);
        let mut p = injection();
        let a = generator.frequency_domain_strain(&p).unwrap();
        p.insert(params::PHASE.to_string(), 0.95);
        let b = generator.frequency_domain_strain(&p).unwrap();
        let k = 200;
        let ratio = b.get(PLUS).unwrap()[k] / a.get(PLUS).unwrap()[k];
        assert!((ratio - Complex64::from_polar(1.0, 0.5)).norm() < 1e-12);
    }

    #[test]
    fn missing_intrinsic_parameters_mean_no_signal() {
        let generator = ToyInspiral::new(4.0, 512.0, 0.0, 20.0, 250.0);
        let mut p = injection();
        p.remove(params::CHIRP_MASS);
        assert!(generator.frequency_domain_strain(&p).is_none());
    }
}
