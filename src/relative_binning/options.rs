//! Relative-binning configuration.
use crate::likelihood::errors::{LikelihoodError, LikelihoodResult};
use crate::optimization::global_search::SearchOptions;
use crate::relative_binning::policy::FiducialRefreshPolicy;

/// What the fiducial search maximizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchObjective {
    /// Exact inner products over the full frequency band.
    #[default]
    FullBandwidth,
    /// The binned approximation around the current fiducial waveform.
    Binned,
}

/// Options of the relative-binning likelihood.
///
/// Fields:
/// - `min_bin_frequency`, `max_bin_frequency`: band covered by the bins;
///   the upper edge is clipped to the data.
/// - `chi`: scale of the post-Newtonian phase perturbation.
/// - `epsilon`: largest phase drift allowed across one bin.
/// - `max_iterations`, `likelihood_threshold`: stop the fiducial search after
///   `max_iterations` rounds or once the best log-likelihood changes by less
///   than the threshold.
/// - `search`: particle-swarm settings for each round.
/// - `objective`: what each round maximizes.
/// - `refresh`: when an established fiducial is searched again.
///
/// Default: 20–1000 Hz, `chi = 1`, `epsilon = 0.5`, 10 rounds, threshold 1,
/// full-bandwidth objective, never refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct RelativeBinningOptions {
    pub min_bin_frequency: f64,
    pub max_bin_frequency: f64,
    pub chi: f64,
    pub epsilon: f64,
    pub max_iterations: usize,
    pub likelihood_threshold: f64,
    pub search: SearchOptions,
    pub objective: SearchObjective,
    pub refresh: FiducialRefreshPolicy,
}

impl RelativeBinningOptions {
    /// # Errors
    /// - `InvalidOption` for a non-positive or inverted band, non-positive
    ///   `chi` or `epsilon`, zero iterations, a negative threshold, or an
    ///   invalid refresh policy.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        min_bin_frequency: f64, max_bin_frequency: f64, chi: f64, epsilon: f64,
        max_iterations: usize, likelihood_threshold: f64, search: SearchOptions,
        objective: SearchObjective, refresh: FiducialRefreshPolicy,
    ) -> LikelihoodResult<Self> {
        let options = Self {
            min_bin_frequency,
            max_bin_frequency,
            chi,
            epsilon,
            max_iterations,
            likelihood_threshold,
            search,
            objective,
            refresh,
        };
        options.validate()?;
        Ok(options)
    }

    /// Check the invariants documented on [`RelativeBinningOptions::new`].
    pub fn validate(&self) -> LikelihoodResult<()> {
        let invalid = |name: &'static str, value: f64, reason: &'static str| {
            Err(LikelihoodError::InvalidOption { name, value, reason })
        };
        if !(self.min_bin_frequency.is_finite() && self.min_bin_frequency > 0.0) {
            return invalid("min_bin_frequency", self.min_bin_frequency, "Must be finite and > 0.");
        }
        if !(self.max_bin_frequency.is_finite() && self.max_bin_frequency > self.min_bin_frequency) {
            return invalid(
                "max_bin_frequency",
                self.max_bin_frequency,
                "Must be finite and above min_bin_frequency.",
            );
        }
        if !(self.chi.is_finite() && self.chi > 0.0) {
            return invalid("chi", self.chi, "Must be finite and > 0.");
        }
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return invalid("epsilon", self.epsilon, "Must be finite and > 0.");
        }
        if self.max_iterations == 0 {
            return invalid("max_iterations", 0.0, "At least one search round is needed.");
        }
        if !(self.likelihood_threshold >= 0.0) {
            return invalid("likelihood_threshold", self.likelihood_threshold, "Must be >= 0.");
        }
        self.refresh.validate()
    }
}

impl Default for RelativeBinningOptions {
    fn default() -> Self {
        Self {
            min_bin_frequency: 20.0,
            max_bin_frequency: 1000.0,
            chi: 1.0,
            epsilon: 0.5,
            max_iterations: 10,
            likelihood_threshold: 1.0,
            search: SearchOptions::default(),
            objective: SearchObjective::default(),
            refresh: FiducialRefreshPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(RelativeBinningOptions::default().validate().is_ok());
    }

    #[test]
    // Purpose
    // -------
    // Each out-of-range field is rejected by name.
    //
    // Given
    // -----
    // - defaults with one field broken at a time.
    //
    // Expect
    // ------
    // - InvalidOption naming that field.
    fn invalid_fields_are_named() {
        let name_of = |options: RelativeBinningOptions| match options.validate() {
            Err(LikelihoodError::InvalidOption { name, .. }) => name,
            other => panic!("expected InvalidOption, got {other:?}"),
        };
        let base = RelativeBinningOptions::default;
        assert_eq!(name_of(RelativeBinningOptions { min_bin_frequency: 0.0, ..base() }), "min_bin_frequency");
        assert_eq!(name_of(RelativeBinningOptions { max_bin_frequency: 10.0, ..base() }), "max_bin_frequency");
        assert_eq!(name_of(RelativeBinningOptions { chi: -1.0, ..base() }), "chi");
        assert_eq!(name_of(RelativeBinningOptions { epsilon: f64::NAN, ..base() }), "epsilon");
        assert_eq!(name_of(RelativeBinningOptions { max_iterations: 0, ..base() }), "max_iterations");
        assert_eq!(
            name_of(RelativeBinningOptions { likelihood_threshold: -0.5, ..base() }),
            "likelihood_threshold"
        );
        assert_eq!(
            name_of(RelativeBinningOptions { refresh: FiducialRefreshPolicy::EveryNCalls(0), ..base() }),
            "refresh_every_n_calls"
        );
    }
}
