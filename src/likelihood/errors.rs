//! Error surface for likelihood construction and evaluation.
//!
//! Construction-time problems (priors, reference frames, option values,
//! cache files) are fatal and reported here. Numerical degeneracies during
//! evaluation are *not* errors: they evaluate to `-∞`. The only evaluation
//! error is a caller contract violation such as a missing parameter.
use crate::optimization::errors::OptError;
use crate::roq::errors::RoqError;

/// Crate-wide result alias for likelihood operations.
pub type LikelihoodResult<T> = Result<T, LikelihoodError>;

#[derive(Debug, Clone, PartialEq)]
pub enum LikelihoodError {
    // ---- Priors ----
    /// A marginalization was requested but no prior dictionary was supplied.
    MissingPriors,
    /// The prior needed by an enabled marginalization is absent.
    MissingPrior {
        key: String,
    },
    /// The prior needed by an enabled marginalization is a fixed value.
    FixedPrior {
        key: String,
    },
    /// A prior could not be constructed.
    InvalidPrior {
        key: String,
        reason: String,
    },

    // ---- Parameters ----
    /// A required parameter is absent from the caller's map.
    MissingParameter {
        key: String,
    },

    /// An array handed in by a collaborator has the wrong length.
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    // ---- Configuration ----
    /// Reference frame is neither "sky" nor a pair of known detectors.
    InvalidReferenceFrame {
        text: String,
    },
    /// A detector named by the configuration is not in the network.
    UnknownDetector {
        name: String,
    },
    /// The detector network is empty.
    EmptyNetwork,
    /// Detectors and waveform generator disagree on segment timing.
    TimingMismatch {
        quantity: &'static str,
        detector: String,
        detector_value: f64,
        generator_value: f64,
    },
    /// Numeric option out of its valid range.
    InvalidOption {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },
    /// The SNR provider cannot serve the requested marginalization.
    UnsupportedMarginalization {
        name: &'static str,
        reason: &'static str,
    },

    // ---- Cache ----
    /// Reading or writing a cache file failed.
    CacheIo {
        path: String,
        text: String,
    },
    /// A cache blob could not be encoded or decoded.
    CacheFormat {
        text: String,
    },

    // ---- Relative binning ----
    /// No usable fiducial waveform for relative binning.
    FiducialWaveform {
        reason: &'static str,
    },

    // ---- Wrapped ----
    /// Reduced-order-quadrature configuration error.
    Roq(RoqError),
    /// Fiducial search failure.
    Optimization(OptError),
}

impl std::error::Error for LikelihoodError {}

impl std::fmt::Display for LikelihoodError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Priors ----
            LikelihoodError::MissingPriors => {
                write!(f, "Marginalization requested but no priors were provided")
            }
            LikelihoodError::MissingPrior { key } => {
                write!(f, "Marginalization over '{key}' requires a prior for '{key}'")
            }
            LikelihoodError::FixedPrior { key } => {
                write!(f, "Cannot marginalize over '{key}': its prior is a fixed value")
            }
            LikelihoodError::InvalidPrior { key, reason } => {
                write!(f, "Invalid prior for '{key}': {reason}")
            }

            // ---- Parameters ----
            LikelihoodError::MissingParameter { key } => {
                write!(f, "Missing required parameter '{key}'")
            }

            LikelihoodError::ShapeMismatch { what, expected, found } => {
                write!(f, "Unexpected {what}: expected {expected}, found {found}")
            }

            // ---- Configuration ----
            LikelihoodError::InvalidReferenceFrame { text } => {
                write!(
                    f,
                    "Invalid reference frame '{text}': expected 'sky' or two detector names"
                )
            }
            LikelihoodError::UnknownDetector { name } => {
                write!(f, "Detector '{name}' is not part of the network")
            }
            LikelihoodError::EmptyNetwork => {
                write!(f, "The detector network is empty")
            }
            LikelihoodError::TimingMismatch {
                quantity,
                detector,
                detector_value,
                generator_value,
            } => {
                write!(
                    f,
                    "Detector '{detector}' {quantity} {detector_value} differs from the waveform generator {quantity} {generator_value}"
                )
            }
            LikelihoodError::InvalidOption { name, value, reason } => {
                write!(f, "Invalid option {name} = {value}: {reason}")
            }
            LikelihoodError::UnsupportedMarginalization { name, reason } => {
                write!(f, "Unsupported {name} marginalization: {reason}")
            }

            // ---- Cache ----
            LikelihoodError::CacheIo { path, text } => {
                write!(f, "Cache I/O failure at '{path}': {text}")
            }
            LikelihoodError::CacheFormat { text } => {
                write!(f, "Cache encoding failure: {text}")
            }

            // ---- Wrapped ----
            LikelihoodError::FiducialWaveform { reason } => {
                write!(f, "Relative-binning fiducial waveform unavailable: {reason}")
            }
            LikelihoodError::Roq(err) => write!(f, "ROQ error: {err}"),
            LikelihoodError::Optimization(err) => write!(f, "Fiducial search error: {err}"),
        }
    }
}

impl From<RoqError> for LikelihoodError {
    fn from(err: RoqError) -> Self {
        LikelihoodError::Roq(err)
    }
}

impl From<OptError> for LikelihoodError {
    fn from(err: OptError) -> Self {
        LikelihoodError::Optimization(err)
    }
}

impl From<bincode::Error> for LikelihoodError {
    fn from(err: bincode::Error) -> Self {
        LikelihoodError::CacheFormat { text: err.to_string() }
    }
}
