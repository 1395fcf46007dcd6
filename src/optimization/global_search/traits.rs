//! Public API surface for bounded log-likelihood maximization.
//!
//! - [`LogLikelihood`]: trait users implement for their objective.
//! - [`SearchOptions`]: swarm size, iteration cap and RNG seed.
//! - [`SearchOutcome`]: normalized result returned by [`maximize_bounded`].
//!
//! Convention: we *maximize* a user log-likelihood `ℓ(θ)` by minimizing the cost
//! `c(θ) = -ℓ(θ)`. Points outside the likelihood support may return `-∞`;
//! the adapter turns them into an infinitely bad cost rather than an error.
//!
//! [`maximize_bounded`]: crate::optimization::global_search::maximize_bounded
use crate::optimization::{
    errors::{OptError, OptResult},
    global_search::{
        types::{FnEvalMap, Theta},
        validation::{validate_theta_hat, validate_value},
    },
};
use argmin::core::TerminationStatus;

/// User-implemented log-likelihood interface.
///
/// - `type Data`: per-objective payload carried into `value`.
///
/// Required:
/// - `value(&Theta, &Data) -> OptResult<f64>`: evaluate `ℓ(θ)`; `-∞` marks
///   points with zero likelihood, `NaN` is treated as a hard failure.
pub trait LogLikelihood {
    type Data;

    fn value(&self, theta: &Theta, data: &Self::Data) -> OptResult<f64>;
}

/// Search-level configuration.
///
/// Fields:
/// - `num_particles: usize` — swarm size (≥ 2).
/// - `max_iter: u64` — hard cap on swarm iterations (> 0).
/// - `seed: u64` — seed for the swarm's RNG; equal seeds reproduce a search.
///
/// Default:
/// - `num_particles = 40`, `max_iter = 100`, `seed = 150_914`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    pub num_particles: usize,
    pub max_iter: u64,
    pub seed: u64,
}

impl SearchOptions {
    /// Construct validated search options.
    ///
    /// # Errors
    /// - [`OptError::InvalidNumParticles`] if `num_particles < 2`.
    /// - [`OptError::InvalidMaxIter`] if `max_iter == 0`.
    pub fn new(num_particles: usize, max_iter: u64, seed: u64) -> OptResult<Self> {
        if num_particles < 2 {
            return Err(OptError::InvalidNumParticles {
                num_particles,
                reason: "A swarm needs at least two particles.",
            });
        }
        if max_iter == 0 {
            return Err(OptError::InvalidMaxIter {
                max_iter,
                reason: "Maximum iterations must be greater than zero.",
            });
        }
        Ok(Self { num_particles, max_iter, seed })
    }
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self { num_particles: 40, max_iter: 100, seed: 150_914 }
    }
}

/// Canonical result returned by `maximize_bounded`.
///
/// - `theta_hat`: best parameter vector found (ordered like the bounds).
/// - `value`: best **log-likelihood** value `ℓ(θ)` (not the cost).
/// - `status`: human-readable termination status string.
/// - `iterations`: number of swarm iterations performed.
/// - `fn_evals`: function-evaluation counters reported by `argmin`.
/// - `from_initial_guess`: `true` when the supplied starting point beat
///   every particle and was returned instead.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub theta_hat: Theta,
    pub value: f64,
    pub status: String,
    pub iterations: usize,
    pub fn_evals: FnEvalMap,
    pub from_initial_guess: bool,
}

impl SearchOutcome {
    /// Build a validated [`SearchOutcome`] from raw solver state.
    ///
    /// # Errors
    /// - Propagates any validation errors for `theta_hat` or `value`.
    pub fn new(
        theta_hat_opt: Option<Theta>, dim: usize, value: f64, status: &TerminationStatus,
        iterations: u64, fn_evals: FnEvalMap,
    ) -> OptResult<Self> {
        let theta_hat = validate_theta_hat(theta_hat_opt, dim)?;
        validate_value(value)?;
        let status = match status {
            TerminationStatus::NotTerminated => "Not terminated".to_string(),
            other => format!("{other:?}"),
        };
        Ok(Self {
            theta_hat,
            value,
            status,
            iterations: iterations as usize,
            fn_evals,
            from_initial_guess: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // SearchOptions rejects degenerate swarms and zero iteration caps.
    //
    // Given
    // -----
    // - (1, 10), (10, 0), (10, 10).
    //
    // Expect
    // ------
    // - Err, Err, Ok.
    fn search_options_are_validated() {
        assert!(matches!(SearchOptions::new(1, 10, 0), Err(OptError::InvalidNumParticles { .. })));
        assert!(matches!(SearchOptions::new(10, 0, 0), Err(OptError::InvalidMaxIter { .. })));
        assert!(SearchOptions::new(10, 10, 0).is_ok());
    }
}
