//! ROQ evaluation of the per-detector inner products.
//!
//! The signal is only evaluated at the basis nodes. `⟨d|h⟩` is formed on
//! the five time samples closest to the detector arrival time and cubically
//! interpolated to it; `⟨h|h⟩` needs no time information. Arrival times
//! within two samples of either end of the grid yield no contribution, so
//! the likelihood is `-∞` there.
use crate::core::detector::Detector;
use crate::core::params::{self, ParameterMap};
use crate::core::snr::{CalculatedSnrs, SegmentTiming, SnrProvider, TimeShiftTransform};
use crate::core::waveform::{Polarizations, RoqPolarizations, RoqWaveformGenerator};
use crate::likelihood::errors::{LikelihoodError, LikelihoodResult};
use crate::marginalization::interp::cubic_interpolate;
use crate::roq::errors::{RoqError, RoqResult};
use crate::roq::weights::RoqWeights;
use ndarray::{Array1, ArrayView1, Zip};
use num_complex::Complex64;
use std::ops::Range;

/// Samples on each side of the closest time sample.
const HALF_WINDOW: usize = 2;

/// Index of the sample of sorted `times` closest to `x`.
fn closest_index(times: ArrayView1<f64>, x: f64) -> Option<usize> {
    let n = times.len();
    if n == 0 || !x.is_finite() {
        return None;
    }
    let (mut lo, mut hi) = (0, n);
    while lo < hi {
        let mid = (lo + hi) / 2;
        if times[mid] < x {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    Some(match lo {
        0 => 0,
        i if i == n => n - 1,
        i if x - times[i - 1] <= times[i] - x => i - 1,
        i => i,
    })
}

/// The five samples centred on the one closest to `x`, or `None` when that
/// window leaves the grid.
pub fn closest_time_window(times: ArrayView1<f64>, x: f64) -> Option<Range<usize>> {
    let c = closest_index(times, x)?;
    (c >= HALF_WINDOW && c + HALF_WINDOW < times.len()).then(|| c - HALF_WINDOW..c + HALF_WINDOW + 1)
}

/// Antenna-weighted, calibrated sum of the modes at `nodes`, without the
/// arrival-time phase (the linear weights carry it).
fn project_at_nodes<D: Detector>(
    detector: &D, polarizations: &Polarizations, nodes: ArrayView1<f64>, parameters: &ParameterMap,
) -> LikelihoodResult<Array1<Complex64>> {
    let ra = params::require(parameters, params::RA)?;
    let dec = params::require(parameters, params::DEC)?;
    let psi = params::require(parameters, params::PSI)?;
    let time = params::require(parameters, params::GEOCENT_TIME)?;

    let mut signal = Array1::<Complex64>::zeros(nodes.len());
    for (mode, strain) in polarizations.iter() {
        if strain.len() != nodes.len() {
            return Err(LikelihoodError::ShapeMismatch {
                what: "ROQ node polarization length",
                expected: nodes.len(),
                found: strain.len(),
            });
        }
        let response = detector.antenna_response(ra, dec, time, psi, mode);
        Zip::from(&mut signal).and(strain).for_each(|s, &h| *s += h * response);
    }
    signal *= &detector.calibration_factor(nodes, parameters);
    Ok(signal)
}

/// [`SnrProvider`] backed by precomputed [`RoqWeights`].
#[derive(Debug, Clone)]
pub struct RoqSnr<'a, W> {
    generator: &'a W,
    weights: RoqWeights,
}

impl<'a, W: RoqWaveformGenerator> RoqSnr<'a, W> {
    /// # Errors
    /// - `BasisShape` if the generator's node counts do not match the weights.
    pub fn new(generator: &'a W, weights: RoqWeights) -> RoqResult<Self> {
        let n_linear = generator.frequency_nodes_linear().len();
        let n_quadratic = generator.frequency_nodes_quadratic().len();
        for name in weights.detector_names() {
            let Some(w) = weights.detector(name) else { continue };
            if w.linear.ncols() != n_linear {
                return Err(RoqError::BasisShape {
                    what: "linear frequency nodes",
                    expected: w.linear.ncols(),
                    found: n_linear,
                });
            }
            if w.quadratic.len() != n_quadratic {
                return Err(RoqError::BasisShape {
                    what: "quadratic frequency nodes",
                    expected: w.quadratic.len(),
                    found: n_quadratic,
                });
            }
        }
        Ok(Self { generator, weights })
    }

    pub fn weights(&self) -> &RoqWeights {
        &self.weights
    }
}

impl<'a, D, W> SnrProvider<D> for RoqSnr<'a, W>
where
    D: Detector,
    W: RoqWaveformGenerator,
{
    type Waveform = RoqPolarizations;

    fn timing(&self) -> SegmentTiming {
        SegmentTiming::of(self.generator)
    }

    fn waveform(&self, parameters: &ParameterMap) -> Option<RoqPolarizations> {
        self.generator.frequency_domain_strain(parameters)
    }

    fn calculate_snrs(
        &self, waveform: &RoqPolarizations, detector: &D, parameters: &ParameterMap,
        _time_shift: Option<&TimeShiftTransform>,
    ) -> LikelihoodResult<Option<CalculatedSnrs>> {
        let weights = self
            .weights
            .detector(detector.name())
            .ok_or_else(|| RoqError::MissingWeights { detector: detector.name().to_string() })?;

        let h_linear = project_at_nodes(
            detector,
            &waveform.linear,
            self.generator.frequency_nodes_linear(),
            parameters,
        )?;
        let h_quadratic = project_at_nodes(
            detector,
            &waveform.quadratic,
            self.generator.frequency_nodes_quadratic(),
            parameters,
        )?;

        let ra = params::require(parameters, params::RA)?;
        let dec = params::require(parameters, params::DEC)?;
        let time = params::require(parameters, params::GEOCENT_TIME)?;
        let ifo_time =
            time - detector.start_time() + detector.time_delay_from_geocenter(ra, dec, time);

        let times = self.weights.time_samples();
        let Some(window) = closest_time_window(times, ifo_time) else {
            tracing::debug!(
                detector = detector.name(),
                ifo_time,
                "Requested time outside the ROQ time grid"
            );
            return Ok(None);
        };

        let grid: Vec<f64> = window.clone().map(|j| times[j]).collect();
        let d_inner_h_tc: Vec<Complex64> = window
            .map(|j| {
                weights.linear.row(j).iter().zip(h_linear.iter()).map(|(&w, h)| h.conj() * w).sum()
            })
            .collect();
        let Some(d_inner_h) = cubic_interpolate(&grid, &d_inner_h_tc, ifo_time) else {
            return Ok(None);
        };
        let optimal_snr_squared: f64 =
            h_quadratic.iter().zip(weights.quadratic.iter()).map(|(h, &w)| h.norm_sqr() * w).sum();

        Ok(Some(CalculatedSnrs::new(d_inner_h, optimal_snr_squared)))
    }

    fn rescale_waveform(&self, waveform: &RoqPolarizations, factor: f64) -> RoqPolarizations {
        waveform.scaled(factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // ---- Scope ----
    // Window selection at the grid edges. Agreement with full-bandwidth
    // inner products is tested in the module root with a complete network.

    #[test]
    // Purpose
    // -------
    // The five-sample window exists only two samples away from either end.
    //
    // Given
    // -----
    // - times 0, 1, ..., 9.
    //
    // Expect
    // ------
    // - 4.4 → 2..7, 1.6 → 0..5, 7.4 → 5..10; 1.4 and 7.6 → None.
    fn window_requires_two_samples_each_side() {
        let times = Array1::range(0.0, 10.0, 1.0);
        assert_eq!(closest_time_window(times.view(), 4.4), Some(2..7));
        assert_eq!(closest_time_window(times.view(), 1.6), Some(0..5));
        assert_eq!(closest_time_window(times.view(), 1.4), None);
        assert_eq!(closest_time_window(times.view(), 7.4), Some(5..10));
        assert_eq!(closest_time_window(times.view(), 7.6), None);
        assert_eq!(closest_time_window(times.view(), f64::NAN), None);
    }

    #[test]
    fn closest_index_breaks_ties_downwards() {
        let times = array![0.0, 1.0, 2.0];
        assert_eq!(closest_index(times.view(), 0.5), Some(0));
        assert_eq!(closest_index(times.view(), -3.0), Some(0));
        assert_eq!(closest_index(times.view(), 9.0), Some(2));
    }
}
