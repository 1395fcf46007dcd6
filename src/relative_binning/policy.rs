//! When an established fiducial waveform is searched for again.
use crate::likelihood::errors::{LikelihoodError, LikelihoodResult};

/// Staleness rule for the fiducial waveform.
///
/// A refresh reruns the fiducial search starting from the current fiducial
/// parameters and recomputes the summary data.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum FiducialRefreshPolicy {
    /// Keep the first fiducial for the lifetime of the likelihood.
    #[default]
    Never,
    /// Refresh after this many evaluations.
    EveryNCalls(usize),
    /// Refresh when the binned and full-bandwidth log-likelihood ratios at
    /// the evaluated point differ by more than this amount. Every evaluation
    /// then also pays for a full-bandwidth one.
    DriftThreshold(f64),
}

impl FiducialRefreshPolicy {
    /// # Errors
    /// - `InvalidOption` for a zero call count or a non-positive threshold.
    pub fn validate(&self) -> LikelihoodResult<()> {
        match *self {
            FiducialRefreshPolicy::EveryNCalls(0) => Err(LikelihoodError::InvalidOption {
                name: "refresh_every_n_calls",
                value: 0.0,
                reason: "Must be at least 1.",
            }),
            FiducialRefreshPolicy::DriftThreshold(t) if !(t.is_finite() && t > 0.0) => {
                Err(LikelihoodError::InvalidOption {
                    name: "refresh_drift_threshold",
                    value: t,
                    reason: "Must be finite and > 0.",
                })
            }
            _ => Ok(()),
        }
    }

    /// Whether `calls_since_refresh` evaluations exhaust the call budget.
    pub fn refresh_due(&self, calls_since_refresh: usize) -> bool {
        matches!(*self, FiducialRefreshPolicy::EveryNCalls(n) if calls_since_refresh >= n)
    }

    pub fn checks_drift(&self) -> bool {
        matches!(self, FiducialRefreshPolicy::DriftThreshold(_))
    }

    /// Whether `binned` has drifted from `full`. Equal values (including
    /// both `-∞`) never count as drift.
    pub fn drifted(&self, binned: f64, full: f64) -> bool {
        match *self {
            FiducialRefreshPolicy::DriftThreshold(t) => binned != full && !((binned - full).abs() <= t),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ---- Scope ----
    // Validation and the two triggers.

    #[test]
    fn never_policy_never_triggers() {
        let policy = FiducialRefreshPolicy::Never;
        assert!(!policy.refresh_due(usize::MAX));
        assert!(!policy.checks_drift());
        assert!(!policy.drifted(0.0, 1e9));
    }

    #[test]
    fn call_budget_triggers_at_n() {
        let policy = FiducialRefreshPolicy::EveryNCalls(3);
        assert!(!policy.refresh_due(2));
        assert!(policy.refresh_due(3));
    }

    #[test]
    // Purpose
    // -------
    // Drift compares absolute differences and treats matching -∞ as no drift.
    //
    // Given
    // -----
    // - threshold 2.
    //
    // Expect
    // ------
    // - |Δ| = 1 no drift, |Δ| = 3 drift, (-∞, -∞) no drift, (finite, -∞) drift.
    fn drift_threshold_compares_absolute_difference() {
        let policy = FiducialRefreshPolicy::DriftThreshold(2.0);
        assert!(!policy.drifted(10.0, 11.0));
        assert!(policy.drifted(10.0, 7.0));
        assert!(!policy.drifted(f64::NEG_INFINITY, f64::NEG_INFINITY));
        assert!(policy.drifted(3.0, f64::NEG_INFINITY));
    }

    #[test]
    fn invalid_policies_are_rejected() {
        assert!(FiducialRefreshPolicy::EveryNCalls(0).validate().is_err());
        assert!(FiducialRefreshPolicy::DriftThreshold(0.0).validate().is_err());
        assert!(FiducialRefreshPolicy::DriftThreshold(f64::INFINITY).validate().is_err());
        assert!(FiducialRefreshPolicy::EveryNCalls(5).validate().is_ok());
    }
}
