//! Validation helpers for the bounded global search.
//!
//! - **Bounds**: [`validate_bound_pair`] enforces finite, strictly increasing
//!   intervals.
//! - **Parameter estimates**: [`validate_theta_hat`] ensures a candidate
//!   exists, has the expected dimension and only finite entries.
//! - **Objective values**: [`validate_value`] checks the best log-likelihood
//!   for finiteness.
use crate::optimization::{
    errors::{OptError, OptResult},
    global_search::types::Theta,
};

/// Validate one `(lower, upper)` search interval.
///
/// # Errors
/// Returns [`OptError::InvalidBounds`] if either end is non-finite or the
/// interval is empty.
pub fn validate_bound_pair(name: &str, lower: f64, upper: f64) -> OptResult<()> {
    if !lower.is_finite() || !upper.is_finite() {
        return Err(OptError::InvalidBounds {
            name: name.to_string(),
            lower,
            upper,
            reason: "Bounds must be finite.",
        });
    }
    if lower >= upper {
        return Err(OptError::InvalidBounds {
            name: name.to_string(),
            lower,
            upper,
            reason: "Lower bound must be strictly below the upper bound.",
        });
    }
    Ok(())
}

/// Validate and unwrap an estimated parameter vector (`theta_hat`).
///
/// # Errors
/// - [`OptError::MissingThetaHat`] if no vector was provided.
/// - [`OptError::DimensionMismatch`] if the length differs from `dim`.
/// - [`OptError::InvalidThetaHat`] if any element is non-finite.
pub fn validate_theta_hat(theta_hat: Option<Theta>, dim: usize) -> OptResult<Theta> {
    let t = theta_hat.ok_or(OptError::MissingThetaHat)?;
    if t.len() != dim {
        return Err(OptError::DimensionMismatch { expected: dim, found: t.len() });
    }
    for (index, &value) in t.iter().enumerate() {
        if !value.is_finite() {
            return Err(OptError::InvalidThetaHat {
                index,
                value,
                reason: "Parameter estimates must be finite.",
            });
        }
    }
    Ok(t)
}

/// Validate that the best log-likelihood value is finite.
///
/// # Errors
/// Returns [`OptError::InvalidValue`] if the value is `NaN` or infinite, which
/// means no particle ever reached the support of the likelihood.
pub fn validate_value(value: f64) -> OptResult<()> {
    if !value.is_finite() {
        return Err(OptError::InvalidValue {
            value,
            reason: "No finite log-likelihood was found inside the bounds.",
        });
    }
    Ok(())
}
