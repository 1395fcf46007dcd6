//! Local polynomial interpolation on non-uniform grids.
//!
//! - [`lagrange4_weights`]: cubic Lagrange weights on a 4-point stencil.
//! - [`stencil_start`]: the 4-point window around a query point.
//! - [`Bicubic`]: tensor-product cubic interpolation on a rectilinear grid,
//!   `-∞` outside its domain.
//! - [`cubic_interpolate`]: 1D cubic interpolation of real or complex data.

/// Cubic Lagrange weights for evaluating at `x` from samples at `xs`.
pub fn lagrange4_weights(xs: [f64; 4], x: f64) -> [f64; 4] {
    std::array::from_fn(|i| {
        let mut w = 1.0;
        for (j, &xj) in xs.iter().enumerate() {
            if j != i {
                w *= (x - xj) / (xs[i] - xj);
            }
        }
        w
    })
}

/// Start index of the 4-point stencil of a sorted `grid` around `x`.
///
/// The stencil brackets `x` with two points on each side where possible and
/// is clamped to the grid ends. Requires `grid.len() >= 4`.
pub fn stencil_start(grid: &[f64], x: f64) -> usize {
    let upper = grid.partition_point(|&g| g <= x);
    let lower = upper.saturating_sub(1);
    lower.saturating_sub(1).min(grid.len() - 4)
}

fn in_domain(grid: &[f64], x: f64) -> bool {
    match (grid.first(), grid.last()) {
        (Some(&lo), Some(&hi)) => x >= lo && x <= hi,
        _ => false,
    }
}

/// Cubic interpolation of `values` sampled on sorted `grid` (length ≥ 4).
///
/// Generic over anything that scales by `f64` and sums, e.g. `f64` and
/// `Complex64`. Returns `None` outside the grid.
pub fn cubic_interpolate<T>(grid: &[f64], values: &[T], x: f64) -> Option<T>
where
    T: Copy + std::ops::Mul<f64, Output = T> + std::ops::Add<Output = T>,
{
    if grid.len() < 4 || grid.len() != values.len() || !in_domain(grid, x) {
        return None;
    }
    let s = stencil_start(grid, x);
    let w = lagrange4_weights([grid[s], grid[s + 1], grid[s + 2], grid[s + 3]], x);
    Some(values[s] * w[0] + values[s + 1] * w[1] + values[s + 2] * w[2] + values[s + 3] * w[3])
}

/// Tensor-product cubic interpolant of `z[(iy, ix)]` on `(x, y)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Bicubic {
    x: Vec<f64>,
    y: Vec<f64>,
    z: ndarray::Array2<f64>,
}

impl Bicubic {
    /// `z` has shape `(y.len(), x.len())`; both grids sorted, length ≥ 4.
    pub fn new(x: Vec<f64>, y: Vec<f64>, z: ndarray::Array2<f64>) -> Option<Self> {
        if x.len() < 4 || y.len() < 4 || z.dim() != (y.len(), x.len()) {
            return None;
        }
        Some(Self { x, y, z })
    }

    /// Interpolated value, or `-∞` outside the grid.
    pub fn eval(&self, x: f64, y: f64) -> f64 {
        if !in_domain(&self.x, x) || !in_domain(&self.y, y) {
            return f64::NEG_INFINITY;
        }
        let sx = stencil_start(&self.x, x);
        let sy = stencil_start(&self.y, y);
        let wx = lagrange4_weights([self.x[sx], self.x[sx + 1], self.x[sx + 2], self.x[sx + 3]], x);
        let wy = lagrange4_weights([self.y[sy], self.y[sy + 1], self.y[sy + 2], self.y[sy + 3]], y);
        let mut out = 0.0;
        for (a, &wya) in wy.iter().enumerate() {
            let row = self.z.row(sy + a);
            let mut acc = 0.0;
            for (b, &wxb) in wx.iter().enumerate() {
                acc += wxb * row[sx + b];
            }
            out += wya * acc;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;
    use num_complex::Complex64;

    // ---- Scope ----
    // Covers exactness on cubic polynomials, stencil clamping and the
    // out-of-domain convention.

    #[test]
    // Purpose
    // -------
    // Cubic interpolation reproduces a cubic exactly on a non-uniform grid.
    //
    // Given
    // -----
    // - f(x) = x³ − 2x on x = [0, 0.3, 1, 1.7, 3, 4.1].
    //
    // Expect
    // ------
    // - f(2.2) to 1e-12; None outside.
    fn cubic_is_exact_for_cubics() {
        let grid = [0.0, 0.3, 1.0, 1.7, 3.0, 4.1];
        let vals: Vec<f64> = grid.iter().map(|&x| x * x * x - 2.0 * x).collect();
        let got = cubic_interpolate(&grid, &vals, 2.2).unwrap();
        assert!((got - (2.2f64.powi(3) - 4.4)).abs() < 1e-12);
        assert!(cubic_interpolate(&grid, &vals, 4.2).is_none());
    }

    #[test]
    fn cubic_interpolates_complex_values() {
        let grid = [0.0, 1.0, 2.0, 3.0];
        let vals: Vec<Complex64> = grid.iter().map(|&x| Complex64::new(x, -2.0 * x)).collect();
        let got = cubic_interpolate(&grid, &vals, 1.25).unwrap();
        assert!((got - Complex64::new(1.25, -2.5)).norm() < 1e-12);
    }

    #[test]
    fn stencil_is_clamped_to_grid_ends() {
        let grid = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(stencil_start(&grid, 0.1), 0);
        assert_eq!(stencil_start(&grid, 2.5), 1);
        assert_eq!(stencil_start(&grid, 5.0), 2);
    }

    #[test]
    // Purpose
    // -------
    // Bicubic reproduces a bilinear-plus-cubic surface and is -inf outside.
    //
    // Given
    // -----
    // - z = x²y − y³ on a 6 × 5 grid.
    //
    // Expect
    // ------
    // - exact at an interior point; -inf just outside.
    fn bicubic_is_exact_for_cubic_surfaces() {
        let x: Vec<f64> = vec![0.0, 0.5, 1.2, 2.0, 2.5, 3.0];
        let y: Vec<f64> = vec![-1.0, 0.0, 0.4, 1.5, 2.0];
        let z = Array2::from_shape_fn((y.len(), x.len()), |(i, j)| x[j] * x[j] * y[i] - y[i].powi(3));
        let interp = Bicubic::new(x, y, z).unwrap();
        let (qx, qy): (f64, f64) = (1.7, 0.9);
        assert!((interp.eval(qx, qy) - (qx * qx * qy - qy.powi(3))).abs() < 1e-10);
        assert_eq!(interp.eval(3.1, 0.0), f64::NEG_INFINITY);
    }
}
