//! Named-parameter maps and the canonical parameter names read by the
//! likelihoods.
use crate::likelihood::errors::{LikelihoodError, LikelihoodResult};
use std::collections::BTreeMap;

/// Mapping from parameter name to value, supplied by the caller per call.
pub type ParameterMap = BTreeMap<String, f64>;

pub const GEOCENT_TIME: &str = "geocent_time";
pub const LUMINOSITY_DISTANCE: &str = "luminosity_distance";
pub const PHASE: &str = "phase";
pub const TIME_JITTER: &str = "time_jitter";
pub const RA: &str = "ra";
pub const DEC: &str = "dec";
pub const PSI: &str = "psi";
pub const ZENITH: &str = "zenith";
pub const AZIMUTH: &str = "azimuth";
pub const CHIRP_MASS: &str = "chirp_mass";
pub const MASS_1: &str = "mass_1";
pub const MASS_2: &str = "mass_2";
pub const REDSHIFT: &str = "redshift";
pub const COMOVING_DISTANCE: &str = "comoving_distance";

/// Read a required parameter.
///
/// # Errors
/// - [`LikelihoodError::MissingParameter`] if `key` is absent.
pub fn require(parameters: &ParameterMap, key: &str) -> LikelihoodResult<f64> {
    parameters
        .get(key)
        .copied()
        .ok_or_else(|| LikelihoodError::MissingParameter { key: key.to_string() })
}

/// Build a [`ParameterMap`] from `(name, value)` pairs.
pub fn parameter_map<'s, I>(pairs: I) -> ParameterMap
where
    I: IntoIterator<Item = (&'s str, f64)>,
{
    pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}
