//! Numerical stability utilities.
//!
//! Provides safe implementations of reductions that overflow or underflow in
//! naïve form when applied to log-likelihood values, which routinely reach
//! magnitudes of 10^3–10^6 for loud signals.
//!
//! # Provided items
//! - [`logsumexp`]: `ln Σ exp(aᵢ)` with a max-shift.
//! - [`logsumexp_weighted`]: `ln Σ bᵢ exp(aᵢ)` for non-negative weights `bᵢ`,
//!   the workhorse of every grid-based marginalization.
//! - [`trapezoid`]: composite trapezoidal quadrature on an arbitrary grid.
//!
//! # Rationale
//! Every marginal integral in this crate is a weighted sum of exponentials of
//! log-likelihoods; evaluating it directly would overflow for any signal with
//! SNR above ~38.
use ndarray::ArrayView1;

/// Numerically stable `ln Σᵢ exp(aᵢ)`.
///
/// Returns `-∞` for empty input or when every term is `-∞`, and `+∞` if any
/// term is `+∞`. NaN inputs propagate.
pub fn logsumexp(values: ArrayView1<f64>) -> f64 {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY || max == f64::INFINITY {
        return max;
    }
    let sum: f64 = values.iter().map(|&a| (a - max).exp()).sum();
    max + sum.ln()
}

/// Numerically stable `ln Σᵢ bᵢ exp(aᵢ)` with non-negative weights.
///
/// Terms with `bᵢ == 0` are skipped entirely so that `aᵢ = ±∞` paired with a
/// zero weight does not poison the result.
///
/// Parameters
/// ----------
/// - `values`: log-space terms `aᵢ`.
/// - `weights`: linear-space weights `bᵢ ≥ 0`, same length as `values`.
///
/// Returns
/// -------
/// - `ln Σ bᵢ exp(aᵢ)`, or `-∞` if every weighted term vanishes.
///
/// Panics
/// ------
/// - Never; mismatched lengths are truncated to the shorter input.
pub fn logsumexp_weighted(values: ArrayView1<f64>, weights: ArrayView1<f64>) -> f64 {
    let mut max = f64::NEG_INFINITY;
    for (&a, &b) in values.iter().zip(weights.iter()) {
        if b > 0.0 && a > max {
            max = a;
        }
    }
    if max == f64::NEG_INFINITY || max == f64::INFINITY {
        return max;
    }
    let sum: f64 = values
        .iter()
        .zip(weights.iter())
        .filter(|&(_, &b)| b > 0.0)
        .map(|(&a, &b)| b * (a - max).exp())
        .sum();
    if sum > 0.0 { max + sum.ln() } else { f64::NEG_INFINITY }
}

/// Composite trapezoidal rule `∫ y dx` on the (possibly non-uniform) grid `x`.
pub fn trapezoid(y: ArrayView1<f64>, x: ArrayView1<f64>) -> f64 {
    let n = y.len().min(x.len());
    (1..n).map(|i| 0.5 * (y[i] + y[i - 1]) * (x[i] - x[i - 1])).sum()
}
