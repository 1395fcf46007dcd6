//! Frequency/time grids and the noise-weighted inner product.
//!
//! The inner product convention throughout the crate is
//!
//! ```text
//! ⟨a|b⟩ = 4/T · Σ_f conj(a(f)) · b(f) / S(f)
//! ```
//!
//! with `T` the segment duration and `S` the one-sided PSD. It is complex in
//! general; optimal SNRs take its real part.
use ndarray::{Array1, ArrayView1};
use num_complex::Complex64;

/// Uniform one-sided frequency grid `[0, fs/2]` for a segment of `duration`.
pub fn create_frequency_series(sampling_frequency: f64, duration: f64) -> Array1<f64> {
    let n = (sampling_frequency * duration / 2.0).round() as usize + 1;
    Array1::linspace(0.0, sampling_frequency / 2.0, n)
}

/// Uniform time grid `start + k/fs`, `k = 0..round(fs·T)`.
pub fn create_time_series(sampling_frequency: f64, duration: f64, start_time: f64) -> Array1<f64> {
    let n = (sampling_frequency * duration).round() as usize;
    Array1::from_iter((0..n).map(|k| start_time + k as f64 / sampling_frequency))
}

/// `4/T · Σ conj(a)·b/S` over all entries.
pub fn noise_weighted_inner_product(
    a: ArrayView1<Complex64>, b: ArrayView1<Complex64>, psd: ArrayView1<f64>, duration: f64,
) -> Complex64 {
    let sum: Complex64 =
        a.iter().zip(b.iter()).zip(psd.iter()).map(|((x, y), &s)| x.conj() * y / s).sum();
    sum * (4.0 / duration)
}

/// [`noise_weighted_inner_product`] restricted to entries where `mask` holds.
pub fn masked_inner_product(
    a: ArrayView1<Complex64>, b: ArrayView1<Complex64>, psd: ArrayView1<f64>,
    mask: ArrayView1<bool>, duration: f64,
) -> Complex64 {
    let sum: Complex64 = a
        .iter()
        .zip(b.iter())
        .zip(psd.iter())
        .zip(mask.iter())
        .filter(|&(_, &m)| m)
        .map(|(((x, y), &s), _)| x.conj() * y / s)
        .sum();
    sum * (4.0 / duration)
}

/// Round a frequency onto the integer bin index of a grid with spacing `1/duration`.
///
/// Returns `None` when `f` is not within `1e-6` bins of a grid point.
pub fn frequency_bin(f: f64, duration: f64) -> Option<i64> {
    let x = f * duration;
    let k = x.round();
    ((x - k).abs() < 1e-6).then_some(k as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // ---- Scope ----
    // Covers grid sizes, the inner-product convention and masking.

    #[test]
    // Purpose
    // -------
    // Grid lengths follow fs·T/2 + 1 and fs·T.
    //
    // Given
    // -----
    // - fs = 256, T = 4.
    //
    // Expect
    // ------
    // - 513 frequencies with spacing 0.25, 1024 times starting at start.
    fn grid_sizes_follow_segment() {
        let f = create_frequency_series(256.0, 4.0);
        assert_eq!(f.len(), 513);
        assert!((f[1] - 0.25).abs() < 1e-12);
        assert!((f[512] - 128.0).abs() < 1e-12);

        let t = create_time_series(256.0, 4.0, 10.0);
        assert_eq!(t.len(), 1024);
        assert_eq!(t[0], 10.0);
    }

    #[test]
    // Purpose
    // -------
    // Conjugation sits on the first argument and masking drops entries.
    //
    // Given
    // -----
    // - a = [i, 1], b = [1, 1], S = [1, 2], T = 4, mask = [true, false].
    //
    // Expect
    // ------
    // - full: (−i + 0.5); masked: −i.
    fn inner_product_conjugates_first_argument() {
        let a = array![Complex64::new(0.0, 1.0), Complex64::new(1.0, 0.0)];
        let b = array![Complex64::new(1.0, 0.0), Complex64::new(1.0, 0.0)];
        let psd = array![1.0, 2.0];
        let mask = array![true, false];

        let full = noise_weighted_inner_product(a.view(), b.view(), psd.view(), 4.0);
        let masked = masked_inner_product(a.view(), b.view(), psd.view(), mask.view(), 4.0);

        assert!((full - Complex64::new(0.5, -1.0)).norm() < 1e-12);
        assert!((masked - Complex64::new(0.0, -1.0)).norm() < 1e-12);
    }

    #[test]
    fn frequency_bin_rejects_off_grid_values() {
        assert_eq!(frequency_bin(20.25, 4.0), Some(81));
        assert_eq!(frequency_bin(20.3, 4.0), None);
    }
}
