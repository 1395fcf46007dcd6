//! Discrete coalescence-time grid used by time marginalization.
//!
//! The grid has one entry per circular shift the inverse FFT of
//! `conj(h)·d/S` can represent: `n = fs·T/2` entries spaced `Δt = T/n = 2/fs`
//! apart, starting at the template's own coalescence time and wrapping back
//! into the analysis segment.
use crate::core::priors::Prior;
use crate::core::snr::{SegmentTiming, TimeShiftTransform};
use crate::optimization::numerical_stability::transformations::logsumexp_weighted;
use ndarray::{Array1, ArrayView1};

#[derive(Debug, Clone)]
pub struct TimeGrid {
    start_time: f64,
    duration: f64,
    delta_tc: f64,
    offsets: Array1<f64>,
    transform: TimeShiftTransform,
}

impl TimeGrid {
    pub fn new(timing: SegmentTiming) -> Self {
        let n = (timing.duration * timing.sampling_frequency / 2.0).round().max(1.0) as usize;
        let delta_tc = timing.duration / n as f64;
        Self {
            start_time: timing.start_time,
            duration: timing.duration,
            delta_tc,
            offsets: Array1::from_iter((0..n).map(|k| k as f64 * delta_tc)),
            transform: TimeShiftTransform::new(n),
        }
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Grid spacing `2/fs`.
    pub fn delta_tc(&self) -> f64 {
        self.delta_tc
    }

    /// Transform producing `⟨h|d⟩` at every grid shift.
    pub fn transform(&self) -> &TimeShiftTransform {
        &self.transform
    }

    /// Absolute times of the grid for a template placed at `template_time`.
    ///
    /// Entry `k` is `template_time + kΔt`, wrapped into
    /// `[start_time, start_time + T)`.
    pub fn times(&self, template_time: f64) -> Array1<f64> {
        let base = template_time - self.start_time;
        self.offsets
            .mapv(|dt| self.start_time + (base + dt).rem_euclid(self.duration))
    }

    /// Prior mass of each grid cell: `p(t_k) · Δt`.
    pub fn prior_weights(&self, prior: &dyn Prior, template_time: f64) -> Array1<f64> {
        self.times(template_time).mapv(|t| prior.prob(t) * self.delta_tc)
    }

    /// `log Σ_k exp(log_l[k]) · p(t_k) Δt`.
    pub fn marginalize(
        &self, log_l: ArrayView1<f64>, prior: &dyn Prior, template_time: f64,
    ) -> f64 {
        logsumexp_weighted(log_l, self.prior_weights(prior, template_time).view())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::priors::Uniform;

    fn timing() -> SegmentTiming {
        SegmentTiming { duration: 4.0, sampling_frequency: 64.0, start_time: 100.0 }
    }

    #[test]
    // Purpose
    // -------
    // Grid size and spacing follow the segment.
    //
    // Given
    // -----
    // - T = 4 s, fs = 64 Hz.
    //
    // Expect
    // ------
    // - 128 entries, Δt = 1/32, times start at the template time and wrap.
    fn grid_follows_segment() {
        let grid = TimeGrid::new(timing());
        assert_eq!(grid.len(), 128);
        assert!((grid.delta_tc() - 2.0 / 64.0).abs() < 1e-15);

        let times = grid.times(103.5);
        assert!((times[0] - 103.5).abs() < 1e-12);
        assert!((times[16] - 100.0).abs() < 1e-12);
        assert!(times.iter().all(|&t| (100.0..104.0).contains(&t)));
    }

    #[test]
    // Purpose
    // -------
    // A flat log-likelihood marginalizes to the log prior mass covered.
    //
    // Given
    // -----
    // - log_l = 0 everywhere; Uniform(100, 102) time prior.
    //
    // Expect
    // ------
    // - result ≈ ln(64 · Δt / 2) = 0 within one cell's mass.
    fn flat_likelihood_recovers_prior_mass() {
        let grid = TimeGrid::new(timing());
        let prior = Uniform::new(100.0, 102.0).unwrap();
        let log_l = Array1::zeros(grid.len());
        let got = grid.marginalize(log_l.view(), &prior, 100.0);
        assert!(got.abs() < 0.02, "got {got}");
    }

    #[test]
    fn prior_outside_support_gives_negative_infinity() {
        let grid = TimeGrid::new(timing());
        let prior = Uniform::new(500.0, 501.0).unwrap();
        let log_l = Array1::zeros(grid.len());
        assert_eq!(grid.marginalize(log_l.view(), &prior, 100.0), f64::NEG_INFINITY);
    }
}
