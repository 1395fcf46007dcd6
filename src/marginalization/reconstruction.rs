//! Draws of marginalized parameters from their conditional posteriors.
//!
//! Each draw tabulates the one-dimensional conditional posterior on a grid
//! and samples it with an [`Interped`] inverse CDF. The caller supplies the
//! inner products; this module only does the grid arithmetic.
use crate::core::priors::{Interped, Prior};
use crate::marginalization::phase::PhaseBesselInterpolant;
use ndarray::{Array1, ArrayView1};
use num_complex::Complex64;
use rand::RngCore;

/// Sampling rate of the upsampled time grid used for time draws.
pub const TIME_RECONSTRUCTION_RATE: f64 = 16384.0;

/// Number of phases on `[0, 2π]` tabulated for phase draws.
pub const PHASE_GRID_POINTS: usize = 101;

/// Points below `max / TIME_POSTERIOR_FLOOR` are dropped from the time draw.
const TIME_POSTERIOR_FLOOR: f64 = 1000.0;

fn sorted_pairs(xs: ArrayView1<f64>, ys: ArrayView1<f64>) -> (Array1<f64>, Array1<f64>) {
    let mut pairs: Vec<(f64, f64)> = xs.iter().copied().zip(ys.iter().copied()).collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
    pairs.dedup_by(|a, b| a.0 == b.0);
    let (x, y): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();
    (Array1::from(x), Array1::from(y))
}

fn argmax(values: ArrayView1<f64>) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i)
}

/// `exp(log_like − max) · prior`, zero where either factor is degenerate.
pub fn unnormalized_posterior(log_like: ArrayView1<f64>, prior: ArrayView1<f64>) -> Array1<f64> {
    let peak = log_like.iter().copied().filter(|v| v.is_finite()).fold(f64::NEG_INFINITY, f64::max);
    if !peak.is_finite() {
        return Array1::zeros(log_like.len());
    }
    Array1::from_iter(log_like.iter().zip(prior.iter()).map(|(&l, &p)| {
        let v = (l - peak).exp() * p;
        if v.is_finite() { v } else { 0.0 }
    }))
}

/// Keep points above `max / 1000`; if fewer than three survive, also keep
/// their immediate neighbours.
pub fn trim_to_support(post: ArrayView1<f64>) -> Vec<bool> {
    let peak = post.iter().copied().fold(0.0, f64::max);
    let keep: Vec<bool> = post.iter().map(|&p| p > peak / TIME_POSTERIOR_FLOOR).collect();
    if keep.iter().filter(|&&k| k).count() >= 3 || keep.len() < 3 {
        return keep;
    }
    let mut widened = keep.clone();
    for i in 1..keep.len() - 1 {
        widened[i] = keep[i] || keep[i - 1] || keep[i + 1];
    }
    widened
}

/// Sample `xs` with weights `post` by piecewise-linear inverse CDF, falling
/// back to the mode when the table cannot be interpolated.
pub fn draw_from_grid(xs: ArrayView1<f64>, post: ArrayView1<f64>, rng: &mut dyn RngCore) -> Option<f64> {
    let (x, y) = sorted_pairs(xs, post);
    match Interped::new(x.clone(), y.clone()) {
        Some(dist) => Some(dist.sample(rng)),
        None => argmax(y.view()).filter(|&i| y[i] > 0.0).map(|i| x[i]),
    }
}

/// Coalescence-time draw from the log-likelihood on an upsampled time grid.
///
/// `times` may be unsorted (they wrap around the segment); points outside
/// `[prior.minimum, prior.maximum)` are discarded first.
pub fn sample_time(
    times: ArrayView1<f64>, log_like: ArrayView1<f64>, prior: &dyn Prior, rng: &mut dyn RngCore,
) -> Option<f64> {
    let (lo, hi) = (prior.minimum(), prior.maximum());
    let inside: Vec<usize> = (0..times.len()).filter(|&i| times[i] >= lo && times[i] < hi).collect();
    let t = Array1::from_iter(inside.iter().map(|&i| times[i]));
    let ll = Array1::from_iter(inside.iter().map(|&i| log_like[i]));
    let (t, ll) = sorted_pairs(t.view(), ll.view());

    let post = unnormalized_posterior(ll.view(), t.mapv(|x| prior.prob(x)).view());
    let keep = trim_to_support(post.view());
    let t_kept = Array1::from_iter(t.iter().zip(&keep).filter(|(_, k)| **k).map(|(x, _)| *x));
    let p_kept = Array1::from_iter(post.iter().zip(&keep).filter(|(_, k)| **k).map(|(x, _)| *x));
    draw_from_grid(t_kept.view(), p_kept.view(), rng)
}

/// Log-likelihood over the distance grid for inner products computed at
/// `current_distance`.
pub fn distance_log_likelihood(
    distances: ArrayView1<f64>, d_inner_h: Complex64, optimal_snr_squared: f64,
    current_distance: f64, phase: Option<&PhaseBesselInterpolant>,
) -> Array1<f64> {
    distances.mapv(|d| {
        let r = current_distance / d;
        let dh = d_inner_h * r;
        let dh_term = match phase {
            Some(bessel) => bessel.bessel(dh.norm()),
            None => dh.re,
        };
        dh_term - optimal_snr_squared * r * r / 2.0
    })
}

/// Luminosity-distance draw on the lookup-table distance grid.
pub fn sample_distance(
    distances: ArrayView1<f64>, prior_array: ArrayView1<f64>, d_inner_h: Complex64,
    optimal_snr_squared: f64, current_distance: f64, phase: Option<&PhaseBesselInterpolant>,
    rng: &mut dyn RngCore,
) -> Option<f64> {
    let log_like =
        distance_log_likelihood(distances, d_inner_h, optimal_snr_squared, current_distance, phase);
    let post = unnormalized_posterior(log_like.view(), prior_array);
    draw_from_grid(distances, post.view(), rng)
}

/// `linspace(0, 2π, 101)`.
pub fn phase_grid() -> Array1<f64> {
    Array1::linspace(0.0, 2.0 * std::f64::consts::PI, PHASE_GRID_POINTS)
}

/// `Re(⟨d|h⟩ e^{-2iφ}) − ⟨h|h⟩/2` for a template evaluated at phase zero.
pub fn phase_log_likelihood(phases: ArrayView1<f64>, d_inner_h: Complex64, optimal_snr_squared: f64) -> Array1<f64> {
    phases.mapv(|phi| (d_inner_h * Complex64::from_polar(1.0, -2.0 * phi)).re - optimal_snr_squared / 2.0)
}

/// Phase draw assuming the template phase enters as `e^{2iφ}`.
pub fn sample_phase(d_inner_h: Complex64, optimal_snr_squared: f64, rng: &mut dyn RngCore) -> Option<f64> {
    let phases = phase_grid();
    let log_like = phase_log_likelihood(phases.view(), d_inner_h, optimal_snr_squared);
    let post = unnormalized_posterior(log_like.view(), Array1::ones(phases.len()).view());
    draw_from_grid(phases.view(), post.view(), rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::priors::Uniform;
    use ndarray::array;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    // ---- Scope ----
    // Grid draws concentrate where the conditional posterior peaks; support
    // trimming follows the keep/widen rule.

    #[test]
    fn trimming_keeps_neighbours_of_a_lone_peak() {
        let post = array![0.0, 0.0, 1.0, 0.0, 0.0];
        assert_eq!(trim_to_support(post.view()), vec![false, true, true, true, false]);
        let broad = array![0.0, 0.5, 1.0, 0.6, 0.0];
        assert_eq!(trim_to_support(broad.view()), vec![false, true, true, true, false]);
    }

    #[test]
    // Purpose
    // -------
    // Phase draws land near the phase that maximizes Re(d e^{-2iφ}).
    //
    // Given
    // -----
    // - ⟨d|h⟩ = 200 e^{2i·0.4}, ⟨h|h⟩ = 200: sharply peaked at φ = 0.4 and
    //   φ = 0.4 + π.
    //
    // Expect
    // ------
    // - every draw within 0.2 rad of one of the two modes.
    fn phase_draws_follow_the_peak() {
        let mut rng = StdRng::seed_from_u64(7);
        let d = Complex64::from_polar(200.0, 0.8);
        for _ in 0..50 {
            let phi = sample_phase(d, 200.0, &mut rng).unwrap();
            let near = (phi - 0.4).abs() < 0.2 || (phi - 0.4 - std::f64::consts::PI).abs() < 0.2;
            assert!(near, "phi = {phi}");
        }
    }

    #[test]
    // Purpose
    // -------
    // Distance draws concentrate at the maximum-likelihood distance.
    //
    // Given
    // -----
    // - inner products of a loud signal at 400 Mpc evaluated at 400 Mpc
    //   (⟨d|h⟩ = ⟨h|h⟩ = 900), flat prior on [100, 1000].
    //
    // Expect
    // ------
    // - draws within 15% of 400 Mpc.
    fn distance_draws_follow_the_peak() {
        let mut rng = StdRng::seed_from_u64(11);
        let distances = Array1::linspace(100.0, 1000.0, 2000);
        let prior = Array1::ones(distances.len());
        for _ in 0..50 {
            let d = sample_distance(
                distances.view(),
                prior.view(),
                Complex64::new(900.0, 0.0),
                900.0,
                400.0,
                None,
                &mut rng,
            )
            .unwrap();
            assert!((d - 400.0).abs() < 60.0, "d = {d}");
        }
    }

    #[test]
    fn time_draws_respect_prior_support() {
        let mut rng = StdRng::seed_from_u64(3);
        let times = array![10.3, 10.4, 10.5, 10.0, 10.1, 10.2];
        let log_like = array![0.0, -1.0, -50.0, -50.0, -1.0, 0.0];
        let prior = Uniform::new(10.05, 10.45).unwrap();
        for _ in 0..20 {
            let t = sample_time(times.view(), log_like.view(), &prior, &mut rng).unwrap();
            assert!((10.1..=10.4).contains(&t), "t = {t}");
        }
    }

    #[test]
    fn degenerate_posteriors_give_none() {
        let mut rng = StdRng::seed_from_u64(1);
        let xs = array![0.0, 1.0, 2.0];
        let post = array![0.0, 0.0, 0.0];
        assert!(draw_from_grid(xs.view(), post.view(), &mut rng).is_none());
    }
}
