//! Frequency bins from the phase-drift heuristic.
//!
//! The phase of any waveform near the fiducial one is bounded by a sum of
//! post-Newtonian power laws `f^γ`, `γ ∈ {-5/3, -2/3, 1, 5/3, 7/3}`, each
//! perturbed by `chi · 2π` at the edge of the band where it is largest.
//! Bins are chosen so this bound grows by at most `epsilon` across a bin,
//! then snapped onto the native frequency grid.
use crate::likelihood::errors::{LikelihoodError, LikelihoodResult};
use crate::relative_binning::options::RelativeBinningOptions;
use ndarray::{Array1, ArrayView1};
use std::f64::consts::PI;

/// Points of the fine grid the phase bound is tabulated on.
const FINE_GRID_POINTS: usize = 50_000;

const GAMMA: [f64; 5] = [-5.0 / 3.0, -2.0 / 3.0, 1.0, 5.0 / 3.0, 7.0 / 3.0];

/// Bin edges on the native grid.
#[derive(Debug, Clone, PartialEq)]
pub struct BinEdges {
    frequencies: Array1<f64>,
    indices: Vec<usize>,
}

fn heaviside(x: f64) -> f64 {
    if x >= 0.0 { 1.0 } else { 0.0 }
}

/// Phase-drift bound on `fine`, measured from its first point.
fn phase_drift(fine: ArrayView1<f64>, f_min: f64, f_max: f64, chi: f64) -> Array1<f64> {
    let d_alpha: Vec<f64> = GAMMA
        .iter()
        .map(|&g| chi * 2.0 * PI / (f_min.powf(g) * heaviside(-g) - f_max.powf(g) * heaviside(g)).abs())
        .collect();
    let phi = fine.mapv(|f| {
        GAMMA.iter().zip(&d_alpha).map(|(&g, &a)| g.signum() * a * f.powf(g)).sum::<f64>()
    });
    let start = phi[0];
    phi.mapv(|p| p - start)
}

impl BinEdges {
    /// Bins over `[min_bin_frequency, min(max_bin_frequency, f_last)]`.
    ///
    /// # Errors
    /// - `InvalidOption` if the band lies outside `frequency_array` or fewer
    ///   than two distinct edges remain after snapping.
    pub fn from_phase_drift(
        frequency_array: ArrayView1<f64>, options: &RelativeBinningOptions,
    ) -> LikelihoodResult<Self> {
        let last = frequency_array.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let f_min = options.min_bin_frequency;
        let f_max = options.max_bin_frequency.min(last);
        if !(f_max > f_min) {
            return Err(LikelihoodError::InvalidOption {
                name: "min_bin_frequency",
                value: f_min,
                reason: "Bin band lies above the data's frequency range.",
            });
        }

        let fine = Array1::linspace(f_min, f_max, FINE_GRID_POINTS);
        let drift = phase_drift(fine.view(), f_min, f_max, options.chi);
        let total = drift[FINE_GRID_POINTS - 1];
        let num_bins = ((total / options.epsilon).floor() as usize).max(1);

        let mut indices: Vec<usize> = Vec::with_capacity(num_bins + 1);
        let mut cursor = 0;
        for i in 0..=num_bins {
            let target = i as f64 / num_bins as f64 * total;
            while cursor < FINE_GRID_POINTS - 1 && drift[cursor] < target {
                cursor += 1;
            }
            let edge = fine[cursor];
            let native = frequency_array
                .iter()
                .position(|&f| f >= edge)
                .unwrap_or(frequency_array.len() - 1);
            if indices.last() != Some(&native) {
                indices.push(native);
            }
        }
        if indices.len() < 2 {
            return Err(LikelihoodError::InvalidOption {
                name: "epsilon",
                value: options.epsilon,
                reason: "Fewer than two distinct bin edges on the frequency grid.",
            });
        }
        let frequencies = indices.iter().map(|&i| frequency_array[i]).collect();
        Ok(Self { frequencies, indices })
    }

    pub fn frequencies(&self) -> ArrayView1<'_, f64> {
        self.frequencies.view()
    }

    /// Native-grid index of every edge.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn n_bins(&self) -> usize {
        self.indices.len() - 1
    }
}
