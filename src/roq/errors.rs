/// Result alias for reduced-order-quadrature operations.
pub type RoqResult<T> = Result<T, RoqError>;

#[derive(Debug, Clone, PartialEq)]
pub enum RoqError {
    // ---- Validity window ----
    /// The requested analysis lies outside the window the basis was built for.
    ParamsRange {
        text: String,
    },

    // ---- Inputs ----
    /// The basis parameter file is unreadable or malformed.
    ParamsFile {
        path: String,
        text: String,
    },
    /// Detector and basis frequency grids do not line up.
    FrequencyMismatch {
        detector: String,
        basis_rows: usize,
        detector_rows: usize,
    },
    /// Basis matrices or nodes have inconsistent shapes.
    BasisShape {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    /// The time prior needed for the weight grid is missing.
    MissingTimePrior,

    // ---- Weights persistence ----
    /// Unsupported weights file extension.
    WeightsFormat {
        path: String,
    },
    /// Reading, writing or decoding a weights file failed.
    WeightsIo {
        path: String,
        text: String,
    },
    /// Weights do not cover a detector of the network.
    MissingWeights {
        detector: String,
    },
}

impl std::error::Error for RoqError {}

impl std::fmt::Display for RoqError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoqError::ParamsRange { text } => write!(f, "ROQ parameters out of range: {text}"),
            RoqError::ParamsFile { path, text } => {
                write!(f, "Unable to read ROQ parameter file '{path}': {text}")
            }
            RoqError::FrequencyMismatch { detector, basis_rows, detector_rows } => {
                write!(
                    f,
                    "Mismatch between ROQ basis and frequency array for {detector}: basis has {basis_rows} rows, detector provides {detector_rows} matching frequencies"
                )
            }
            RoqError::BasisShape { what, expected, found } => {
                write!(f, "Invalid ROQ {what}: expected {expected}, found {found}")
            }
            RoqError::MissingTimePrior => {
                write!(f, "ROQ weights need a geocent_time prior to size the time grid")
            }
            RoqError::WeightsFormat { path } => {
                write!(f, "Unsupported ROQ weights format for '{path}': use .json or .bin")
            }
            RoqError::WeightsIo { path, text } => {
                write!(f, "ROQ weights I/O failure at '{path}': {text}")
            }
            RoqError::MissingWeights { detector } => {
                write!(f, "ROQ weights missing for detector {detector}")
            }
        }
    }
}
