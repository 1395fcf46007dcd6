//! Network likelihood for a transient gravitational-wave signal.
//!
//! Purpose
//! -------
//! Combine per-detector inner products from an injected [`SnrProvider`] into
//! the (optionally marginalized) log-likelihood ratio, the noise
//! log-likelihood, and posterior draws of the marginalized parameters.
//!
//! Key behaviors
//! -------------
//! - Construction validates timing, the reference frame and priors, and
//!   precomputes every marginalization once.
//! - Each evaluation works on a private copy of the parameters: sky-frame
//!   conversion and time jitter never touch the caller's map.
//! - The noise log-likelihood is computed once; data never change.
//!
//! Invariants & assumptions
//! ------------------------
//! - Detectors and the provider's generator share duration, sampling
//!   frequency and start time.
//! - Time marginalization requires a geocentric time reference; with a
//!   detector time reference it is switched off with an info log.
//!
//! Downstream usage
//! ----------------
//! - ROQ and relative binning reuse this type with their own providers.
use crate::core::detector::Detector;
use crate::core::frames::SkyFrame;
use crate::core::options::LikelihoodOptions;
use crate::core::params::{self, ParameterMap};
use crate::core::priors::PriorDict;
use crate::core::series::masked_inner_product;
use crate::core::snr::{SegmentTiming, SnrProvider, TimeShiftTransform};
use crate::likelihood::errors::{LikelihoodError, LikelihoodResult};
use crate::likelihood::traits::{Likelihood, NetworkSnrs};
use crate::marginalization::Marginalizer;
use crate::marginalization::reconstruction::{
    TIME_RECONSTRUCTION_RATE, sample_distance, sample_phase, sample_time,
};
use ndarray::Array1;
use num_complex::Complex64;
use rand::RngCore;

/// Relative tolerance when comparing segment timing.
const TIMING_TOLERANCE: f64 = 1e-9;

#[derive(Debug)]
pub struct GravitationalWaveTransient<'a, D, P> {
    detectors: &'a [D],
    provider: P,
    marginalizer: Marginalizer,
    sky_frame: SkyFrame,
    timing: SegmentTiming,
    noise_log_likelihood: f64,
}

fn check_timing<D: Detector>(detectors: &[D], timing: SegmentTiming) -> LikelihoodResult<()> {
    let close = |a: f64, b: f64| (a - b).abs() <= TIMING_TOLERANCE * a.abs().max(b.abs()).max(1.0);
    for det in detectors {
        for (quantity, detector_value, generator_value) in [
            ("duration", det.duration(), timing.duration),
            ("sampling_frequency", det.sampling_frequency(), timing.sampling_frequency),
            ("start_time", det.start_time(), timing.start_time),
        ] {
            if !close(detector_value, generator_value) {
                return Err(LikelihoodError::TimingMismatch {
                    quantity,
                    detector: det.name().to_string(),
                    detector_value,
                    generator_value,
                });
            }
        }
    }
    Ok(())
}

/// `−⟨d|d⟩/2` over the network.
pub fn network_noise_log_likelihood<D: Detector>(detectors: &[D]) -> f64 {
    detectors
        .iter()
        .map(|det| {
            let strain = det.frequency_domain_strain();
            let dd = masked_inner_product(
                strain,
                strain,
                det.power_spectral_density_array(),
                det.frequency_mask(),
                det.duration(),
            );
            -dd.re / 2.0
        })
        .sum()
}

impl<'a, D, P> GravitationalWaveTransient<'a, D, P>
where
    D: Detector,
    P: SnrProvider<D>,
{
    /// # Errors
    /// - `EmptyNetwork`, `TimingMismatch`, `UnknownDetector`.
    /// - `UnsupportedMarginalization` if time marginalization is requested
    ///   from a provider that cannot produce time-shifted inner products.
    /// - Prior errors from the marginalization setup.
    pub fn new(
        detectors: &'a [D], provider: P, priors: Option<&mut PriorDict>, options: LikelihoodOptions,
    ) -> LikelihoodResult<Self> {
        if detectors.is_empty() {
            return Err(LikelihoodError::EmptyNetwork);
        }
        let timing = provider.timing();
        check_timing(detectors, timing)?;

        let mut flags = options.flags;
        let mut jitter_time = options.jitter_time;
        if flags.time && !options.time_reference.is_geocenter() {
            tracing::info!(
                time_reference = %options.time_reference.time_parameter(),
                "Cannot marginalise over non-geocenter time"
            );
            flags.time = false;
            jitter_time = false;
        }
        if flags.time && !provider.supports_time_marginalization() {
            return Err(LikelihoodError::UnsupportedMarginalization {
                name: "time",
                reason: "The SNR provider cannot evaluate time-shifted inner products.",
            });
        }

        let sky_frame =
            SkyFrame::resolve(&options.reference_frame, &options.time_reference, detectors)?;
        let marginalizer =
            Marginalizer::new(flags, jitter_time, priors, timing, &options.distance_table)?;
        tracing::debug!(
            detectors = detectors.len(),
            marginalized = ?marginalizer.marginalized_parameters(),
            "Transient likelihood ready"
        );

        Ok(Self {
            detectors,
            provider,
            marginalizer,
            sky_frame,
            timing,
            noise_log_likelihood: network_noise_log_likelihood(detectors),
        })
    }

    pub fn detectors(&self) -> &'a [D] {
        self.detectors
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    pub fn marginalizer(&self) -> &Marginalizer {
        &self.marginalizer
    }

    pub fn timing(&self) -> SegmentTiming {
        self.timing
    }

    /// Evaluation-local parameters: sky-frame `ra`/`dec`/`geocent_time`, with
    /// the time jitter added when time marginalization jitters.
    ///
    /// # Errors
    /// - `MissingParameter` for absent sky, time or jitter parameters.
    pub fn local_parameters(&self, parameters: &ParameterMap) -> LikelihoodResult<ParameterMap> {
        let mut local = self.sky_frame.to_sky_frame(parameters, self.detectors)?;
        if self.marginalizer.time().is_some_and(|t| t.jitter()) {
            let jitter = params::require(parameters, params::TIME_JITTER)?;
            if let Some(t) = local.get_mut(params::GEOCENT_TIME) {
                *t += jitter;
            }
        }
        Ok(local)
    }

    /// Per-detector SNRs for `parameters`, in network order; `None` when the
    /// model has no waveform or a detector cannot contribute.
    ///
    /// # Errors
    /// - `MissingParameter` for absent sky or time parameters.
    pub fn calculate_snrs(
        &self, parameters: &ParameterMap,
    ) -> LikelihoodResult<Option<Vec<crate::core::snr::CalculatedSnrs>>> {
        let local = self.local_parameters(parameters)?;
        let Some(waveform) = self.provider.waveform(&local) else {
            return Ok(None);
        };
        let mut out = Vec::with_capacity(self.detectors.len());
        for det in self.detectors {
            match self.provider.calculate_snrs(&waveform, det, &local, None)? {
                Some(snrs) => out.push(snrs),
                None => return Ok(None),
            }
        }
        Ok(Some(out))
    }

    fn network_snrs(
        &self, waveform: &P::Waveform, local: &ParameterMap, time_shift: Option<&TimeShiftTransform>,
    ) -> LikelihoodResult<Option<NetworkSnrs>> {
        let mut net = NetworkSnrs::default();
        for det in self.detectors {
            match self.provider.calculate_snrs(waveform, det, local, time_shift)? {
                Some(snrs) => net.accumulate(snrs),
                None => return Ok(None),
            }
        }
        Ok(Some(net))
    }

    pub(crate) fn ratio(&self, parameters: &ParameterMap) -> LikelihoodResult<f64> {
        let local = self.local_parameters(parameters)?;
        let Some(waveform) = self.provider.waveform(&local) else {
            return Ok(f64::NEG_INFINITY);
        };
        let transform = self.marginalizer.time().map(|t| t.grid().transform());
        let Some(net) = self.network_snrs(&waveform, &local, transform)? else {
            return Ok(f64::NEG_INFINITY);
        };
        self.marginalizer.log_likelihood_ratio(
            net.d_inner_h,
            net.optimal_snr_squared,
            net.d_inner_h_tc_array.as_ref().map(|a| a.view()),
            &local,
        )
    }

    fn draw_time(
        &self, waveform: &P::Waveform, local: &ParameterMap, rng: &mut dyn RngCore,
    ) -> LikelihoodResult<Option<f64>> {
        let Some(time) = self.marginalizer.time() else {
            return Ok(None);
        };
        let n = (self.timing.duration * TIME_RECONSTRUCTION_RATE).round() as usize;
        let transform = TimeShiftTransform::new(n);
        let mut d_inner_h = Array1::<Complex64>::zeros(n);
        let mut optimal_snr_squared = 0.0;
        for det in self.detectors {
            let Some(shifted) = self.provider.shifted_inner_products(waveform, det, local, &transform)?
            else {
                return Ok(None);
            };
            let Some(snrs) = self.provider.calculate_snrs(waveform, det, local, None)? else {
                return Ok(None);
            };
            d_inner_h = d_inner_h + &shifted;
            optimal_snr_squared += snrs.optimal_snr_squared;
        }

        let template_time = params::require(local, params::GEOCENT_TIME)?;
        let (start, duration) = (self.timing.start_time, self.timing.duration);
        let times = Array1::from_iter((0..n).map(|k| {
            start + (template_time - start + k as f64 / TIME_RECONSTRUCTION_RATE).rem_euclid(duration)
        }));
        let distance = match self.marginalizer.distance() {
            Some(_) => params::require(local, params::LUMINOSITY_DISTANCE)?,
            None => f64::NAN,
        };
        let log_like =
            self.marginalizer.log_likelihood_array(d_inner_h.view(), optimal_snr_squared, distance);
        Ok(sample_time(times.view(), log_like.view(), time.prior(), rng))
    }

    /// Draw the marginalized parameters from their conditional posteriors.
    ///
    /// Order: time, then distance (inner products at the new time), then
    /// phase (template rescaled to the new distance). Parameters that are
    /// not marginalized are returned unchanged; without marginalization the
    /// input is returned as is.
    ///
    /// # Errors
    /// - `MissingParameter` for absent sky, time, jitter or distance values.
    pub fn generate_posterior_sample_from_marginalized_likelihood(
        &self, parameters: &ParameterMap, rng: &mut dyn RngCore,
    ) -> LikelihoodResult<ParameterMap> {
        let mut sample = parameters.clone();
        if !self.marginalizer.flags().any() {
            return Ok(sample);
        }
        let mut local = self.local_parameters(parameters)?;
        let Some(mut waveform) = self.provider.waveform(&local) else {
            tracing::warn!("No waveform for posterior reconstruction; returning input unchanged");
            return Ok(sample);
        };

        if self.marginalizer.time().is_some() {
            match self.draw_time(&waveform, &local, rng)? {
                Some(t) => {
                    sample.insert(params::GEOCENT_TIME.to_string(), t);
                    local.insert(params::GEOCENT_TIME.to_string(), t);
                }
                None => tracing::warn!("Time posterior could not be tabulated; keeping input time"),
            }
        }

        if let Some(dist) = self.marginalizer.distance() {
            let current = params::require(&local, params::LUMINOSITY_DISTANCE)?;
            let draw = match self.network_snrs(&waveform, &local, None)? {
                Some(net) => sample_distance(
                    dist.distance_array(),
                    dist.prior_array(),
                    net.d_inner_h,
                    net.optimal_snr_squared,
                    current,
                    self.marginalizer.phase(),
                    rng,
                ),
                None => None,
            };
            match draw {
                Some(d) => {
                    waveform = self.provider.rescale_waveform(&waveform, current / d);
                    sample.insert(params::LUMINOSITY_DISTANCE.to_string(), d);
                    local.insert(params::LUMINOSITY_DISTANCE.to_string(), d);
                }
                None => tracing::warn!("Distance posterior could not be tabulated; keeping input distance"),
            }
        }

        if self.marginalizer.phase().is_some() {
            let draw = self
                .network_snrs(&waveform, &local, None)?
                .and_then(|net| sample_phase(net.d_inner_h, net.optimal_snr_squared, rng));
            match draw {
                Some(phi) => {
                    sample.insert(params::PHASE.to_string(), phi);
                }
                None => tracing::warn!("Phase posterior could not be tabulated; keeping input phase"),
            }
        }

        Ok(sample)
    }
}

impl<'a, D, P> Likelihood for GravitationalWaveTransient<'a, D, P>
where
    D: Detector,
    P: SnrProvider<D>,
{
    fn log_likelihood_ratio(&mut self, parameters: &ParameterMap) -> LikelihoodResult<f64> {
        self.ratio(parameters)
    }

    fn noise_log_likelihood(&self) -> f64 {
        self.noise_log_likelihood
    }
}
