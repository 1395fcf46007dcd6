use argmin::core::{ArgminError, Error};

/// Crate-wide result alias for optimizer operations.
pub type OptResult<T> = Result<T, OptError>;

#[derive(Debug, Clone, PartialEq)]
pub enum OptError {
    // ---- SearchOptions ----
    /// Swarm size needs to be at least 2.
    InvalidNumParticles {
        num_particles: usize,
        reason: &'static str,
    },
    /// Maximum iterations needs to be positive.
    InvalidMaxIter {
        max_iter: u64,
        reason: &'static str,
    },

    // ---- Bounds ----
    /// No parameter was given a search interval.
    EmptyBounds,
    /// A bound pair is non-finite or not strictly increasing.
    InvalidBounds {
        name: String,
        lower: f64,
        upper: f64,
        reason: &'static str,
    },
    /// Parameter vector length does not match the number of bounded names.
    DimensionMismatch {
        expected: usize,
        found: usize,
    },

    // ---- Cost function ----
    /// Cost function returned NaN.
    NonFiniteCost {
        value: f64,
    },
    /// The objective itself reported an error.
    ObjectiveFailed {
        text: String,
    },

    // ---- Optimizer outcome ----
    /// Estimated parameters must be finite.
    InvalidThetaHat {
        index: usize,
        value: f64,
        reason: &'static str,
    },
    /// Theta hat is missing
    MissingThetaHat,
    /// Best objective value must be finite.
    InvalidValue {
        value: f64,
        reason: &'static str,
    },

    // ---- Backend ----
    /// An argmin failure; `kind` names the argmin error class.
    Backend {
        kind: &'static str,
        text: String,
    },
}

impl std::error::Error for OptError {}

impl std::fmt::Display for OptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- SearchOptions ----
            OptError::InvalidNumParticles { num_particles, reason } => {
                write!(f, "Invalid number of particles {num_particles}: {reason}")
            }
            OptError::InvalidMaxIter { max_iter, reason } => {
                write!(f, "Invalid maximum iterations {max_iter}: {reason}")
            }

            // ---- Bounds ----
            OptError::EmptyBounds => {
                write!(f, "No search bounds provided")
            }
            OptError::InvalidBounds { name, lower, upper, reason } => {
                write!(f, "Invalid bounds for '{name}' [{lower}, {upper}]: {reason}")
            }
            OptError::DimensionMismatch { expected, found } => {
                write!(f, "Parameter dimension mismatch: expected {expected}, found {found}")
            }

            // ---- Cost function ----
            OptError::NonFiniteCost { value } => {
                write!(f, "Non-finite cost value: {value}")
            }
            OptError::ObjectiveFailed { text } => {
                write!(f, "Objective evaluation failed: {text}")
            }

            // ---- Optimizer outcome ----
            OptError::InvalidThetaHat { index, value, reason } => {
                write!(f, "Invalid estimated parameter at index {index}: {value}: {reason}")
            }
            OptError::MissingThetaHat => {
                write!(f, "Missing estimated parameters (theta hat)")
            }
            OptError::InvalidValue { value, reason } => {
                write!(f, "Invalid objective value {value}: {reason}")
            }

            // ---- Backend ----
            OptError::Backend { kind, text } => {
                write!(f, "Particle swarm failed ({kind}): {text}")
            }
        }
    }
}

/// Normalise argmin errors. An [`OptError`] raised inside the cost function
/// comes back unchanged.
impl From<Error> for OptError {
    fn from(err: Error) -> Self {
        let err = match err.downcast::<OptError>() {
            Ok(own) => return own,
            Err(err) => err,
        };
        match err.downcast::<ArgminError>() {
            Ok(argmin_err) => {
                let (kind, text) = match argmin_err {
                    ArgminError::InvalidParameter { text } => ("invalid parameter", text),
                    ArgminError::NotImplemented { text } => ("not implemented", text),
                    ArgminError::NotInitialized { text } => ("not initialized", text),
                    ArgminError::ConditionViolated { text } => ("condition violated", text),
                    ArgminError::PotentialBug { text } => ("potential bug", text),
                    other => ("other", other.to_string()),
                };
                OptError::Backend { kind, text }
            }
            Err(other) => OptError::Backend { kind: "other", text: other.to_string() },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ---- Scope ----
    // Errors crossing the argmin boundary in both directions.

    #[test]
    // Purpose
    // -------
    // An OptError returned from a cost function survives the round trip
    // through argmin's anyhow-based error type.
    //
    // Given
    // -----
    // - OptError::NonFiniteCost wrapped into argmin::core::Error.
    //
    // Expect
    // ------
    // - From<Error> recovers the same variant.
    fn own_errors_survive_backend_wrapping() {
        let wrapped: Error = OptError::NonFiniteCost { value: f64::INFINITY }.into();
        let back: OptError = wrapped.into();
        assert_eq!(back, OptError::NonFiniteCost { value: f64::INFINITY });
    }

    #[test]
    // Purpose
    // -------
    // Argmin's own error variants map onto their wrappers.
    //
    // Given
    // -----
    // - ArgminError::NotInitialized.
    //
    // Expect
    // ------
    // - OptError::Backend tagged "not initialized" with the same text.
    fn argmin_errors_become_backend_errors() {
        let wrapped: Error = ArgminError::NotInitialized { text: "state".to_string() }.into();
        let back: OptError = wrapped.into();
        assert_eq!(back, OptError::Backend { kind: "not initialized", text: "state".to_string() });
    }
}
