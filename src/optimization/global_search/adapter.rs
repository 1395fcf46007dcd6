//! Adapter that exposes a user `LogLikelihood` as an `argmin` problem.
//!
//! We convert a *maximization* of a log-likelihood `ℓ(θ)` into a *minimization*
//! problem by defining the cost as `c(θ) = -ℓ(θ)`. Particles may wander into
//! regions where `ℓ = -∞`; those map to `c = +∞`, which the swarm simply
//! never prefers.
use crate::optimization::{
    errors::OptError,
    global_search::{
        traits::LogLikelihood,
        types::{Cost, Theta},
    },
};
use argmin::core::{CostFunction, Error};

/// Bridges a user `LogLikelihood` to `argmin`'s `CostFunction`.
#[derive(Debug, Clone)]
pub struct ArgMinAdapter<'a, F: LogLikelihood> {
    pub f: &'a F,
    pub data: &'a F::Data,
}

impl<'a, F: LogLikelihood> CostFunction for ArgMinAdapter<'a, F> {
    type Param = Theta;
    type Output = Cost;

    /// Evaluate the cost `c(θ) = -ℓ(θ)`.
    ///
    /// # Errors
    /// - Propagates any `OptError` from the user's `value` via `?`.
    /// - Returns `NonFiniteCost` if the log-likelihood is `NaN`.
    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, Error> {
        let output = self.f.value(theta, self.data)?;
        if output.is_nan() {
            return Err((OptError::NonFiniteCost { value: output }).into());
        }
        Ok(-output)
    }
}

impl<'a, F: LogLikelihood> ArgMinAdapter<'a, F> {
    /// Construct a new adapter over a user `LogLikelihood` and its data.
    pub fn new(f: &'a F, data: &'a F::Data) -> Self {
        Self { f, data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::errors::OptResult;
    use ndarray::array;

    struct Parabola;

    impl LogLikelihood for Parabola {
        type Data = f64;

        fn value(&self, theta: &Theta, data: &f64) -> OptResult<f64> {
            if theta[0] < 0.0 {
                return Ok(f64::NEG_INFINITY);
            }
            if theta[0] > 100.0 {
                return Ok(f64::NAN);
            }
            Ok(-(theta[0] - data).powi(2))
        }
    }

    #[test]
    // Purpose
    // -------
    // Sign flip, -inf mapping and NaN rejection of the adapter.
    //
    // Given
    // -----
    // - ℓ(θ) = -(θ - 3)² on θ ≥ 0, -inf below, NaN above 100.
    //
    // Expect
    // ------
    // - cost(5) = 4, cost(-1) = +inf, cost(200) is an error.
    fn adapter_flips_sign_and_maps_support() {
        // Arrange
        let data = 3.0;
        let adapter = ArgMinAdapter::new(&Parabola, &data);

        // Act / Assert
        assert!((adapter.cost(&array![5.0]).unwrap() - 4.0).abs() < 1e-12);
        assert_eq!(adapter.cost(&array![-1.0]).unwrap(), f64::INFINITY);
        assert!(adapter.cost(&array![200.0]).is_err());
    }
}
