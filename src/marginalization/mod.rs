//! marginalization — analytic integration over time, distance and phase.
//!
//! Purpose
//! -------
//! Replace sampling over coalescence time, luminosity distance and orbital
//! phase by evaluating their integrals directly from the network inner
//! products. [`Marginalizer`] owns every precomputed structure (time grid,
//! Bessel table, distance lookup table) and the dispatch between them.
//!
//! Key behaviors
//! -------------
//! - Setup validates the priors of every enabled marginalization and fixes
//!   them in the caller's [`PriorDict`] (time at the segment start, phase at
//!   zero, distance at the prior median) so a sampler no longer varies them.
//! - Dispatch order is time, then distance, then phase: time marginalization
//!   applies the distance or phase marginal at every time shift before
//!   summing over the time prior.
//! - [`reconstruction`] draws the marginalized parameters back after a run.
//!
//! Invariants & assumptions
//! ------------------------
//! - The time prior is copied before it is fixed; the copy is what weights
//!   the time grid and bounds time draws.
//! - A time-jitter prior `Uniform(-Δt/2, Δt/2)` is added when jitter is on.
//! - Enabling distance and phase together widens the Bessel table so the
//!   distance table never evaluates it out of range.
//!
//! Conventions
//! -----------
//! - Degenerate evaluations produce `-∞`, never errors.
//!
//! Downstream usage
//! ----------------
//! - `likelihood::GravitationalWaveTransient` and the relative-binning
//!   evaluator build one [`Marginalizer`] each.
//!
//! Testing notes
//! -------------
//! - Unit tests cover prior validation and fixing, dispatch, and the
//!   time-marginal against a brute-force sum. Table numerics are tested in
//!   the submodules.

pub mod distance;
pub mod interp;
pub mod phase;
pub mod reconstruction;
pub mod time;

use crate::core::options::{DistanceTableOptions, MarginalizationFlags};
use crate::core::params::{self, ParameterMap};
use crate::core::priors::{Prior, PriorDict, Uniform};
use crate::core::snr::SegmentTiming;
use crate::likelihood::errors::{LikelihoodError, LikelihoodResult};
use ndarray::{Array1, ArrayView1};
use num_complex::Complex64;
use std::sync::Arc;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::distance::{CacheStatus, DistanceLookupCache, DistanceMarginalization};
pub use self::phase::PhaseBesselInterpolant;
pub use self::time::TimeGrid;

/// Time grid together with the (pre-fixing) time prior weighting it.
#[derive(Debug, Clone)]
pub struct TimeMarginalization {
    grid: TimeGrid,
    prior: Arc<dyn Prior>,
    jitter: bool,
}

impl TimeMarginalization {
    pub fn grid(&self) -> &TimeGrid {
        &self.grid
    }

    pub fn prior(&self) -> &dyn Prior {
        self.prior.as_ref()
    }

    pub fn jitter(&self) -> bool {
        self.jitter
    }
}

#[derive(Debug, Clone)]
pub struct Marginalizer {
    time: Option<TimeMarginalization>,
    phase: Option<PhaseBesselInterpolant>,
    distance: Option<DistanceMarginalization>,
    marginalized: Vec<&'static str>,
}

fn marginalized_prior(priors: &PriorDict, key: &str) -> LikelihoodResult<Arc<dyn Prior>> {
    let prior = priors
        .get(key)
        .ok_or_else(|| LikelihoodError::MissingPrior { key: key.to_string() })?;
    if prior.is_fixed() {
        return Err(LikelihoodError::FixedPrior { key: key.to_string() });
    }
    Ok(Arc::clone(prior))
}

impl Marginalizer {
    /// Validate priors, fix the marginalized parameters and precompute every
    /// enabled marginalization.
    ///
    /// # Errors
    /// - `MissingPriors` if any marginalization is on and `priors` is `None`.
    /// - `MissingPrior` / `FixedPrior` for the parameter being marginalized.
    /// - Distance-table construction errors.
    pub fn new(
        flags: MarginalizationFlags, jitter_time: bool, priors: Option<&mut PriorDict>,
        timing: SegmentTiming, table: &DistanceTableOptions,
    ) -> LikelihoodResult<Self> {
        if !flags.any() {
            if jitter_time {
                tracing::debug!("Time jittering requested without time marginalization; ignoring");
            }
            return Ok(Self::disabled());
        }
        let priors = priors.ok_or(LikelihoodError::MissingPriors)?;
        let mut marginalized = Vec::new();

        let time = if flags.time {
            let prior = marginalized_prior(priors, params::GEOCENT_TIME)?;
            let grid = TimeGrid::new(timing);
            priors.fix(params::GEOCENT_TIME, timing.start_time);
            if jitter_time {
                let half = grid.delta_tc() / 2.0;
                priors.insert(params::TIME_JITTER, Uniform::new(-half, half)?);
            }
            marginalized.push(params::GEOCENT_TIME);
            Some(TimeMarginalization { grid, prior, jitter: jitter_time })
        } else {
            if jitter_time {
                tracing::debug!("Time jittering requested without time marginalization; ignoring");
            }
            None
        };

        let mut phase = if flags.phase {
            marginalized_prior(priors, params::PHASE)?;
            priors.fix(params::PHASE, 0.0);
            marginalized.push(params::PHASE);
            Some(PhaseBesselInterpolant::default())
        } else {
            None
        };

        let distance = if flags.distance {
            let prior = marginalized_prior(priors, params::LUMINOSITY_DISTANCE)?;
            if phase.is_some() {
                let bound = PhaseBesselInterpolant::max_bound_for_distance(
                    prior.rescale(0.5),
                    prior.minimum(),
                );
                phase = Some(PhaseBesselInterpolant::new(bound));
            }
            let marg = DistanceMarginalization::new(prior.as_ref(), table, phase.as_ref())?;
            for key in [params::REDSHIFT, params::COMOVING_DISTANCE] {
                priors.remove(key);
            }
            priors.fix(params::LUMINOSITY_DISTANCE, marg.reference_distance());
            marginalized.push(params::LUMINOSITY_DISTANCE);
            Some(marg)
        } else {
            None
        };

        Ok(Self { time, phase, distance, marginalized })
    }

    /// No marginalization: the ratio is `Re⟨d|h⟩ − ⟨h|h⟩/2`.
    pub fn disabled() -> Self {
        Self { time: None, phase: None, distance: None, marginalized: Vec::new() }
    }

    pub fn flags(&self) -> MarginalizationFlags {
        MarginalizationFlags::new(self.time.is_some(), self.distance.is_some(), self.phase.is_some())
    }

    /// Names of the parameters integrated out, in setup order.
    pub fn marginalized_parameters(&self) -> &[&'static str] {
        &self.marginalized
    }

    pub fn time(&self) -> Option<&TimeMarginalization> {
        self.time.as_ref()
    }

    pub fn phase(&self) -> Option<&PhaseBesselInterpolant> {
        self.phase.as_ref()
    }

    pub fn distance(&self) -> Option<&DistanceMarginalization> {
        self.distance.as_ref()
    }

    fn current_distance(&self, parameters: &ParameterMap) -> LikelihoodResult<f64> {
        match &self.distance {
            Some(_) => params::require(parameters, params::LUMINOSITY_DISTANCE),
            None => Ok(f64::NAN),
        }
    }

    /// Distance, phase or plain log-likelihood ratio of one inner product.
    pub fn log_likelihood_at(&self, d_inner_h: Complex64, optimal_snr_squared: f64, distance: f64) -> f64 {
        if let Some(dist) = &self.distance {
            dist.log_likelihood(d_inner_h, optimal_snr_squared, distance)
        } else if let Some(phase) = &self.phase {
            phase.log_likelihood(d_inner_h, optimal_snr_squared)
        } else {
            d_inner_h.re - optimal_snr_squared / 2.0
        }
    }

    /// [`Marginalizer::log_likelihood_at`] over an array of inner products.
    pub fn log_likelihood_array(
        &self, d_inner_h: ArrayView1<Complex64>, optimal_snr_squared: f64, distance: f64,
    ) -> Array1<f64> {
        d_inner_h.mapv(|d| self.log_likelihood_at(d, optimal_snr_squared, distance))
    }

    /// Marginalized log-likelihood ratio of the network inner products.
    ///
    /// `parameters` is the evaluation-local map: its `geocent_time` already
    /// includes any jitter.
    ///
    /// # Errors
    /// - `MissingParameter` for `luminosity_distance` or `geocent_time` when
    ///   the corresponding marginalization needs them.
    /// - `UnsupportedMarginalization` if time marginalization is on but no
    ///   time series was computed.
    pub fn log_likelihood_ratio(
        &self, d_inner_h: Complex64, optimal_snr_squared: f64,
        d_inner_h_tc_array: Option<ArrayView1<Complex64>>, parameters: &ParameterMap,
    ) -> LikelihoodResult<f64> {
        let distance = self.current_distance(parameters)?;
        let Some(time) = &self.time else {
            return Ok(self.log_likelihood_at(d_inner_h, optimal_snr_squared, distance));
        };
        let tc = d_inner_h_tc_array.ok_or(LikelihoodError::UnsupportedMarginalization {
            name: "time",
            reason: "No time-shifted inner products were computed.",
        })?;
        let template_time = params::require(parameters, params::GEOCENT_TIME)?;
        let log_l = self.log_likelihood_array(tc, optimal_snr_squared, distance);
        Ok(time.grid.marginalize(log_l.view(), time.prior(), template_time))
    }
}

pub mod prelude {
    pub use super::Marginalizer;
    pub use super::distance::{CacheStatus, DistanceLookupCache};
    pub use super::phase::PhaseBesselInterpolant;
    pub use super::time::TimeGrid;
}
