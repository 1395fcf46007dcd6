//! ROQ options, basis matrices and precomputed quadrature weights.
//!
//! Purpose
//! -------
//! Contract the data with the reduced bases once, so that each likelihood
//! evaluation only needs the signal at the basis nodes.
//!
//! Key behaviors
//! -------------
//! - Linear weights `W_lin[t, k] = 4/T Σ_f (d/S)(f) e^{2πi f t} B_lin[f, k]`
//!   are tabulated on a time grid covering the time prior widened by the
//!   light-crossing time, in blocks bounded by a memory ceiling.
//! - Quadratic weights `W_quad[k] = 4/T Σ_f B_quad[f, k] / S(f)` are time
//!   independent.
//! - The time step follows the signal bandwidth: `Δt = 1 / (5 f_high)` with
//!   `f_high` derived from the noise curve and the expected network SNR.
//!
//! Invariants & assumptions
//! ------------------------
//! - Basis rows correspond one-to-one to detector frequencies inside the
//!   mask (or inside the basis band when the validity window is known);
//!   any mismatch is an error, never a silent truncation.
//! - Time samples are relative to the segment start.
//!
//! Conventions
//! -----------
//! - Weights persist as `.json` (serde_json) or `.bin` (bincode), chosen by
//!   file extension.
use crate::core::detector::{Detector, EARTH_RADIUS, SPEED_OF_LIGHT};
use crate::core::frames::TimeReference;
use crate::core::priors::PriorDict;
use crate::core::series::frequency_bin;
use crate::likelihood::errors::{LikelihoodError, LikelihoodResult};
use crate::optimization::numerical_stability::trapezoid;
use crate::roq::errors::{RoqError, RoqResult};
use crate::roq::params::RoqParams;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, s};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f64::consts::PI;
use std::path::Path;

pub const DEFAULT_MAX_BLOCK_GIGABYTES: f64 = 4.0;

/// SNR assumed per detector when no injection SNR is recorded.
const ASSUMED_SNR: f64 = 30.0;
/// Per-detector SNR cap entering the time resolution.
const SNR_CAP: f64 = 10.0;
const TIME_STEP_SAFETY: f64 = 5.0;
/// Grid points added beyond the light-crossing margin on each side.
const PADDING_STEPS: f64 = 5.0;
const BYTES_PER_GIGABYTE: f64 = 1_073_741_824.0;

/// Options of the ROQ likelihood.
///
/// Default: no validity window, checks on, unit scale factor, a 4 GiB block
/// ceiling and an SNR-derived time step.
#[derive(Debug, Clone, PartialEq)]
pub struct RoqOptions {
    /// Unscaled validity window of the basis.
    pub roq_params: Option<RoqParams>,
    pub params_check: bool,
    pub scale_factor: f64,
    pub max_block_gigabytes: f64,
    pub time_resolution: Option<f64>,
}

impl RoqOptions {
    /// # Errors
    /// - `InvalidOption` for a non-positive scale factor, block ceiling or
    ///   time resolution.
    pub fn new(
        roq_params: Option<RoqParams>, params_check: bool, scale_factor: f64,
        max_block_gigabytes: f64, time_resolution: Option<f64>,
    ) -> LikelihoodResult<Self> {
        let positive = |name: &'static str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(LikelihoodError::InvalidOption { name, value, reason: "Must be finite and > 0." })
            }
        };
        positive("scale_factor", scale_factor)?;
        positive("max_block_gigabytes", max_block_gigabytes)?;
        if let Some(dt) = time_resolution {
            positive("time_resolution", dt)?;
        }
        Ok(Self { roq_params, params_check, scale_factor, max_block_gigabytes, time_resolution })
    }

    /// Validity window after the scale factor.
    pub fn scaled_params(&self) -> Option<RoqParams> {
        self.roq_params.map(|p| p.scaled(self.scale_factor))
    }
}

impl Default for RoqOptions {
    fn default() -> Self {
        Self {
            roq_params: None,
            params_check: true,
            scale_factor: 1.0,
            max_block_gigabytes: DEFAULT_MAX_BLOCK_GIGABYTES,
            time_resolution: None,
        }
    }
}

/// Linear `(n_freq, n_linear)` and quadratic `(n_freq, n_quadratic)` bases.
#[derive(Debug, Clone, PartialEq)]
pub struct RoqBasis {
    linear: Array2<Complex64>,
    quadratic: Array2<f64>,
}

impl RoqBasis {
    /// # Errors
    /// - `BasisShape` if the two bases do not share their frequency rows or
    ///   either has no columns.
    pub fn new(linear: Array2<Complex64>, quadratic: Array2<f64>) -> RoqResult<Self> {
        if quadratic.nrows() != linear.nrows() {
            return Err(RoqError::BasisShape {
                what: "quadratic basis rows",
                expected: linear.nrows(),
                found: quadratic.nrows(),
            });
        }
        if linear.ncols() == 0 || quadratic.ncols() == 0 {
            return Err(RoqError::BasisShape { what: "basis columns", expected: 1, found: 0 });
        }
        Ok(Self { linear, quadratic })
    }

    pub fn n_frequencies(&self) -> usize {
        self.linear.nrows()
    }

    pub fn n_linear(&self) -> usize {
        self.linear.ncols()
    }

    pub fn n_quadratic(&self) -> usize {
        self.quadratic.ncols()
    }

    pub fn linear(&self) -> ArrayView2<'_, Complex64> {
        self.linear.view()
    }

    pub fn quadratic(&self) -> ArrayView2<'_, f64> {
        self.quadratic.view()
    }
}

/// Weights of one detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorWeights {
    /// `(n_time, n_linear)`.
    pub linear: Array2<Complex64>,
    /// `(n_quadratic,)`.
    pub quadratic: Array1<f64>,
}

/// Per-detector weights on a shared time grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoqWeights {
    time_samples: Array1<f64>,
    detectors: BTreeMap<String, DetectorWeights>,
}

enum WeightsFormat {
    Json,
    Bincode,
}

fn weights_format(path: &Path) -> RoqResult<WeightsFormat> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => Ok(WeightsFormat::Json),
        Some("bin") => Ok(WeightsFormat::Bincode),
        _ => Err(RoqError::WeightsFormat { path: path.display().to_string() }),
    }
}

impl RoqWeights {
    /// # Errors
    /// - `BasisShape` when a detector's weight shapes disagree with the
    ///   time grid or with another detector.
    pub fn from_parts(
        time_samples: Array1<f64>, detectors: BTreeMap<String, DetectorWeights>,
    ) -> RoqResult<Self> {
        let mut n_linear = None;
        for w in detectors.values() {
            if w.linear.nrows() != time_samples.len() {
                return Err(RoqError::BasisShape {
                    what: "linear weight rows",
                    expected: time_samples.len(),
                    found: w.linear.nrows(),
                });
            }
            let expected = *n_linear.get_or_insert(w.linear.ncols());
            if w.linear.ncols() != expected {
                return Err(RoqError::BasisShape {
                    what: "linear weight columns",
                    expected,
                    found: w.linear.ncols(),
                });
            }
        }
        Ok(Self { time_samples, detectors })
    }

    /// Contract every detector's data with `basis`.
    ///
    /// The time grid spans the prior of `time_reference`'s time parameter,
    /// widened by the light-crossing time of the network.
    ///
    /// # Errors
    /// - `EmptyNetwork`.
    /// - `Roq(ParamsRange)` when the validity window is checked and violated.
    /// - `Roq(MissingTimePrior)`, `Roq(FrequencyMismatch)`.
    pub fn build<D: Detector>(
        detectors: &[D], basis: &RoqBasis, priors: &PriorDict, time_reference: &TimeReference,
        options: &RoqOptions,
    ) -> LikelihoodResult<Self> {
        if detectors.is_empty() {
            return Err(LikelihoodError::EmptyNetwork);
        }
        let window = options.scaled_params();
        match (&window, options.params_check) {
            (Some(window), true) => {
                for det in detectors {
                    window.check(det, Some(priors))?;
                }
            }
            (Some(_), false) => tracing::warn!("No ROQ params checking performed"),
            (None, _) => {}
        }

        let delta_t = options.time_resolution.unwrap_or_else(|| time_resolution(detectors));
        tracing::info!(delta_t, "ROQ time-step");
        let time_samples = time_samples(detectors, priors, time_reference, delta_t)?;

        let mut weights = BTreeMap::new();
        for det in detectors {
            let rows = frequency_rows(det, basis, window.as_ref())?;
            let linear =
                linear_weights(det, basis, &rows, time_samples.view(), options.max_block_gigabytes);
            let quadratic = quadratic_weights(det, basis, &rows);
            weights.insert(det.name().to_string(), DetectorWeights { linear, quadratic });
        }
        tracing::info!(
            detectors = detectors.len(),
            time_samples = time_samples.len(),
            n_linear = basis.n_linear(),
            n_quadratic = basis.n_quadratic(),
            "ROQ weights built"
        );
        Ok(Self { time_samples, detectors: weights })
    }

    pub fn time_samples(&self) -> ArrayView1<'_, f64> {
        self.time_samples.view()
    }

    pub fn detector(&self, name: &str) -> Option<&DetectorWeights> {
        self.detectors.get(name)
    }

    pub fn detector_names(&self) -> impl Iterator<Item = &str> {
        self.detectors.keys().map(String::as_str)
    }

    /// `MissingWeights` for the first detector without weights.
    pub fn covers<D: Detector>(&self, detectors: &[D]) -> RoqResult<()> {
        match detectors.iter().find(|d| !self.detectors.contains_key(d.name())) {
            Some(det) => Err(RoqError::MissingWeights { detector: det.name().to_string() }),
            None => Ok(()),
        }
    }

    /// Write to `path`; `.json` or `.bin`.
    ///
    /// # Errors
    /// - `WeightsFormat` for other extensions, `WeightsIo` on failure.
    pub fn save(&self, path: &Path) -> RoqResult<()> {
        let io = |text: String| RoqError::WeightsIo { path: path.display().to_string(), text };
        let bytes = match weights_format(path)? {
            WeightsFormat::Json => serde_json::to_vec(self).map_err(|e| io(e.to_string()))?,
            WeightsFormat::Bincode => bincode::serialize(self).map_err(|e| io(e.to_string()))?,
        };
        std::fs::write(path, bytes).map_err(|e| io(e.to_string()))?;
        tracing::info!(path = %path.display(), "Saved ROQ weights");
        Ok(())
    }

    /// Read weights written by [`RoqWeights::save`].
    ///
    /// # Errors
    /// - `WeightsFormat` for other extensions, `WeightsIo` on failure.
    pub fn load(path: &Path) -> RoqResult<Self> {
        let io = |text: String| RoqError::WeightsIo { path: path.display().to_string(), text };
        let format = weights_format(path)?;
        let bytes = std::fs::read(path).map_err(|e| io(e.to_string()))?;
        let weights: Self = match format {
            WeightsFormat::Json => serde_json::from_slice(&bytes).map_err(|e| io(e.to_string()))?,
            WeightsFormat::Bincode => bincode::deserialize(&bytes).map_err(|e| io(e.to_string()))?,
        };
        tracing::info!(path = %path.display(), "Loaded ROQ weights");
        Self::from_parts(weights.time_samples, weights.detectors)
    }
}

/// `(π² ρ² / 6)^{1/3}`.
fn c_f_scaling(snr: f64) -> f64 {
    (PI.powi(2) * snr.powi(2) / 6.0).cbrt()
}

/// SNR-informed time step `1 / (5 f_high)`.
///
/// Each detector contributes `min(10, ρ)²` to the network SNR², with `ρ = 30`
/// when no injection SNR is recorded. The characteristic frequency uses the
/// noise curve of the last detector.
pub fn time_resolution<D: Detector>(detectors: &[D]) -> f64 {
    let snr_squared: f64 = detectors
        .iter()
        .map(|d| d.optimal_snr().unwrap_or(ASSUMED_SNR).min(SNR_CAP).powi(2))
        .sum();
    let Some(det) = detectors.last() else {
        return f64::NAN;
    };
    let mask = det.frequency_mask();
    let select = |values: ArrayView1<f64>| -> Array1<f64> {
        values.iter().zip(mask.iter()).filter(|&(_, &m)| m).map(|(&v, _)| v).collect()
    };
    let freq = select(det.frequency_array());
    let psd = select(det.power_spectral_density_array());

    let low: Array1<f64> = Array1::from_iter(freq.iter().zip(psd.iter()).map(|(&f, &s)| f.powf(-7.0 / 3.0) / s));
    let high: Array1<f64> = Array1::from_iter(freq.iter().zip(psd.iter()).map(|(&f, &s)| f.powf(2.0 / 3.0) / s));
    let f_3_bar = trapezoid(high.view(), freq.view()) / trapezoid(low.view(), freq.view());
    let f_high = c_f_scaling(snr_squared.sqrt()) * f_3_bar.cbrt();
    if f_high.is_finite() && f_high > 0.0 {
        1.0 / f_high / TIME_STEP_SAFETY
    } else {
        1.0 / det.sampling_frequency()
    }
}

/// `[min − margin, max + margin)` in steps of `delta_t`, relative to the
/// segment start.
fn time_samples<D: Detector>(
    detectors: &[D], priors: &PriorDict, time_reference: &TimeReference, delta_t: f64,
) -> RoqResult<Array1<f64>> {
    let prior = priors.get(&time_reference.time_parameter()).ok_or(RoqError::MissingTimePrior)?;
    let radius = detectors
        .iter()
        .map(|d| d.vertex().iter().map(|v| v * v).sum::<f64>().sqrt())
        .fold(EARTH_RADIUS, f64::max);
    let margin = radius / SPEED_OF_LIGHT + PADDING_STEPS * delta_t;
    let start = detectors.first().map_or(0.0, |d| d.start_time());
    let lo = prior.minimum() - margin;
    let hi = prior.maximum() + margin;
    let n = ((hi - lo) / delta_t).ceil().max(0.0) as usize;
    Ok(Array1::from_shape_fn(n, |i| lo + i as f64 * delta_t - start))
}

/// `(detector index, basis row)` pairs of every usable frequency.
fn frequency_rows<D: Detector>(
    det: &D, basis: &RoqBasis, window: Option<&RoqParams>,
) -> RoqResult<Vec<(usize, usize)>> {
    let freqs = det.frequency_array();
    let mask = det.frequency_mask();
    let masked = (0..freqs.len()).filter(|&j| mask[j]);
    let mismatch = |detector_rows: usize| RoqError::FrequencyMismatch {
        detector: det.name().to_string(),
        basis_rows: basis.n_frequencies(),
        detector_rows,
    };

    let rows: Vec<(usize, usize)> = match window {
        Some(p) => {
            let lo = (p.flow * p.seglen).ceil() as i64;
            let hi = (p.fhigh * p.seglen).floor() as i64;
            let grid_rows = (hi - lo + 1).max(0) as usize;
            if grid_rows != basis.n_frequencies() {
                return Err(mismatch(grid_rows));
            }
            masked
                .filter_map(|j| {
                    let bin = frequency_bin(freqs[j], p.seglen)?;
                    (lo..=hi).contains(&bin).then(|| (j, (bin - lo) as usize))
                })
                .collect()
        }
        None => {
            let rows: Vec<(usize, usize)> = masked.enumerate().map(|(row, j)| (j, row)).collect();
            if rows.len() != basis.n_frequencies() {
                return Err(mismatch(rows.len()));
            }
            rows
        }
    };
    if rows.is_empty() {
        return Err(mismatch(0));
    }
    Ok(rows)
}

fn linear_weights<D: Detector>(
    det: &D, basis: &RoqBasis, rows: &[(usize, usize)], times: ArrayView1<f64>,
    max_block_gigabytes: f64,
) -> Array2<Complex64> {
    let freqs = det.frequency_array();
    let strain = det.frequency_domain_strain();
    let psd = det.power_spectral_density_array();
    let scale = 4.0 / det.duration();

    let data: Vec<Complex64> = rows.iter().map(|&(j, _)| strain[j] / psd[j] * scale).collect();
    let f: Vec<f64> = rows.iter().map(|&(j, _)| freqs[j]).collect();
    let basis_rows: Vec<usize> = rows.iter().map(|&(_, r)| r).collect();
    let sub_basis = basis.linear().select(Axis(0), &basis_rows);

    let n_times = times.len();
    let bytes_per_time = (16 * rows.len()) as f64;
    let block = ((max_block_gigabytes * BYTES_PER_GIGABYTE / bytes_per_time).floor() as usize).max(1);

    let mut weights = Array2::<Complex64>::zeros((n_times, basis.n_linear()));
    let mut start = 0;
    while start < n_times {
        let end = (start + block).min(n_times);
        let shifted = Array2::from_shape_fn((end - start, rows.len()), |(i, k)| {
            data[k] * Complex64::from_polar(1.0, 2.0 * PI * f[k] * times[start + i])
        });
        weights.slice_mut(s![start..end, ..]).assign(&shifted.dot(&sub_basis));
        start = end;
    }
    weights
}

fn quadratic_weights<D: Detector>(det: &D, basis: &RoqBasis, rows: &[(usize, usize)]) -> Array1<f64> {
    let psd = det.power_spectral_density_array();
    let scale = 4.0 / det.duration();
    let quadratic = basis.quadratic();
    let mut weights = Array1::<f64>::zeros(basis.n_quadratic());
    for &(j, r) in rows {
        let inv = scale / psd[j];
        weights.zip_mut_with(&quadratic.row(r), |w, &b| *w += b * inv);
    }
    weights
}
