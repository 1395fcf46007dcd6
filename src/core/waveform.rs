//! Waveform-generator interfaces consumed by the likelihoods.
//!
//! The crate never computes waveform physics itself. A generator maps a
//! [`ParameterMap`] to frequency-domain polarizations; returning `None`
//! signals "no signal for these parameters", which the likelihood turns into
//! `-∞`.
use crate::core::params::ParameterMap;
use ndarray::{Array1, ArrayView1};
use num_complex::Complex64;
use std::collections::BTreeMap;

pub const PLUS: &str = "plus";
pub const CROSS: &str = "cross";

/// Frequency-domain polarization modes keyed by name (`"plus"`, `"cross"`, ...).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polarizations {
    modes: BTreeMap<String, Array1<Complex64>>,
}

impl Polarizations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion.
    pub fn with_mode(mut self, mode: &str, strain: Array1<Complex64>) -> Self {
        self.modes.insert(mode.to_string(), strain);
        self
    }

    pub fn insert(&mut self, mode: &str, strain: Array1<Complex64>) {
        self.modes.insert(mode.to_string(), strain);
    }

    pub fn get(&self, mode: &str) -> Option<&Array1<Complex64>> {
        self.modes.get(mode)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Array1<Complex64>)> {
        self.modes.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }

    /// Copy with every mode multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self { modes: self.modes.iter().map(|(k, v)| (k.clone(), v * factor)).collect() }
    }
}

/// Maps parameters to a frequency-domain signal model on a fixed segment.
pub trait WaveformGenerator {
    type Output;

    fn duration(&self) -> f64;
    fn sampling_frequency(&self) -> f64;
    fn start_time(&self) -> f64;

    /// Signal for `parameters`, or `None` when the model has no signal there.
    fn frequency_domain_strain(&self, parameters: &ParameterMap) -> Option<Self::Output>;
}

/// A generator that can also evaluate polarizations on arbitrary frequencies.
///
/// Relative binning needs the model only at bin edges.
pub trait FrequencyDomainModel: WaveformGenerator<Output = Polarizations> {
    fn frequency_domain_strain_at(
        &self, parameters: &ParameterMap, frequencies: ArrayView1<f64>,
    ) -> Option<Polarizations>;
}

/// Polarizations evaluated on the linear and quadratic ROQ frequency nodes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RoqPolarizations {
    pub linear: Polarizations,
    pub quadratic: Polarizations,
}

impl RoqPolarizations {
    pub fn scaled(&self, factor: f64) -> Self {
        Self { linear: self.linear.scaled(factor), quadratic: self.quadratic.scaled(factor) }
    }
}

/// A generator producing [`RoqPolarizations`] on fixed node sets.
pub trait RoqWaveformGenerator: WaveformGenerator<Output = RoqPolarizations> {
    fn frequency_nodes_linear(&self) -> ArrayView1<'_, f64>;
    fn frequency_nodes_quadratic(&self) -> ArrayView1<'_, f64>;
}
