//! Per-bin summary data and the binned inner products.
//!
//! Within bin `b` the ratio `r(f) = h(f) / h0(f)` of a template to the
//! fiducial waveform is linear, `r ≈ r0_b + r1_b (f − f_b)` with `f_b` the
//! bin midpoint. Then
//!
//! ```text
//! ⟨d|h⟩ ≈ Σ_b a0_b conj(r0_b) + a1_b conj(r1_b)
//! ⟨h|h⟩ ≈ Σ_b b0_b |r0_b|² + 2 b1_b Re(r0_b conj(r1_b))
//! ```
//!
//! with `a0, a1, b0, b1` computed once from the data and `h0`.
use crate::core::detector::Detector;
use crate::relative_binning::bins::BinEdges;
use ndarray::{Array1, ArrayView1};
use num_complex::Complex64;

/// Four coefficients per bin for one detector.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryData {
    pub a0: Array1<Complex64>,
    pub a1: Array1<Complex64>,
    pub b0: Array1<f64>,
    pub b1: Array1<f64>,
}

impl SummaryData {
    /// Coefficients from `fiducial`, the detector response to the fiducial
    /// waveform on the native grid. Bin `b` sums the masked native bins in
    /// `[index_b, index_{b+1})`.
    pub fn compute<D: Detector + ?Sized>(
        detector: &D, fiducial: ArrayView1<Complex64>, bins: &BinEdges,
    ) -> Self {
        let strain = detector.frequency_domain_strain();
        let psd = detector.power_spectral_density_array();
        let mask = detector.frequency_mask();
        let freqs = detector.frequency_array();
        let scale = 4.0 / detector.duration();
        let edges = bins.frequencies();
        let n = bins.n_bins();

        let mut out = Self {
            a0: Array1::zeros(n),
            a1: Array1::zeros(n),
            b0: Array1::zeros(n),
            b1: Array1::zeros(n),
        };
        for (b, window) in bins.indices().windows(2).enumerate() {
            let midpoint = 0.5 * (edges[b] + edges[b + 1]);
            for j in window[0]..window[1] {
                if !mask[j] {
                    continue;
                }
                let a = strain[j] * fiducial[j].conj() / psd[j] * scale;
                let h = fiducial[j].norm_sqr() / psd[j] * scale;
                let offset = freqs[j] - midpoint;
                out.a0[b] += a;
                out.a1[b] += a * offset;
                out.b0[b] += h;
                out.b1[b] += h * offset;
            }
        }
        out
    }

    /// `(⟨d|h⟩, ⟨h|h⟩)` for the ratio coefficients `r0`, `r1`.
    pub fn inner_products(&self, r0: ArrayView1<Complex64>, r1: ArrayView1<Complex64>) -> (Complex64, f64) {
        let mut d_inner_h = Complex64::new(0.0, 0.0);
        let mut h_inner_h = 0.0;
        for b in 0..self.a0.len() {
            d_inner_h += self.a0[b] * r0[b].conj() + self.a1[b] * r1[b].conj();
            h_inner_h += self.b0[b] * r0[b].norm_sqr() + 2.0 * self.b1[b] * (r0[b] * r1[b].conj()).re;
        }
        (d_inner_h, h_inner_h)
    }
}

/// `h / h0` at every bin edge.
///
/// Where the fiducial vanishes the ratio is undefined; it is taken from the
/// nearest edge with a non-vanishing fiducial (the lower one on ties), or
/// zero when the fiducial vanishes everywhere.
pub fn relative_ratio(h: ArrayView1<Complex64>, h0: ArrayView1<Complex64>) -> Array1<Complex64> {
    let n = h.len().min(h0.len());
    let valid: Vec<bool> = (0..n).map(|i| h0[i].norm_sqr() > 0.0 && h0[i].is_finite()).collect();
    let direct = |i: usize| h[i] / h0[i];
    Array1::from_shape_fn(n, |i| {
        if valid[i] {
            return direct(i);
        }
        let below = (0..i).rev().find(|&j| valid[j]);
        let above = (i + 1..n).find(|&j| valid[j]);
        match (below, above) {
            (Some(lo), Some(hi)) if i - lo <= hi - i => direct(lo),
            (_, Some(hi)) => direct(hi),
            (Some(lo), None) => direct(lo),
            (None, None) => Complex64::new(0.0, 0.0),
        }
    })
}

/// Bin midpoint value and slope of the edge ratios `r`.
pub fn ratio_coefficients(
    r: ArrayView1<Complex64>, edges: ArrayView1<f64>,
) -> (Array1<Complex64>, Array1<Complex64>) {
    let n = r.len().saturating_sub(1);
    let r0 = Array1::from_shape_fn(n, |b| (r[b + 1] + r[b]) * 0.5);
    let r1 = Array1::from_shape_fn(n, |b| (r[b + 1] - r[b]) / (edges[b + 1] - edges[b]));
    (r0, r1)
}
