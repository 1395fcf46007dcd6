//! Relative-binning transient likelihood with a lazily established fiducial.
//!
//! Purpose
//! -------
//! Wrap the shared transient aggregator around [`RelativeBinningSnr`] and
//! drive its state: bins and the fiducial waveform are set up on the first
//! evaluation, refined by a bounded global search, and refreshed according
//! to the configured [`FiducialRefreshPolicy`].
//!
//! Key behaviors
//! -------------
//! - Evaluation takes `&mut self`; the fiducial state is owned and changes
//!   only inside `log_likelihood_ratio`, [`RelativeBinningTransient::initialize`]
//!   and [`RelativeBinningTransient::refresh_fiducial`].
//! - The search works on a parameter vector over the sorted names of the
//!   bounds; all other parameters come from the initial guess.
//! - [`RelativeBinningTransient::log_likelihood_ratio_full`] evaluates the
//!   same (marginalized) ratio with full-bandwidth inner products.
//!
//! Invariants & assumptions
//! ------------------------
//! - Time marginalization is not available.
//! - Without bounds the fiducial is the initial guess, unchanged, until a
//!   refresh moves it onto the evaluated point.
//! - A refresh restarts the search at the point whose evaluation triggered
//!   it, so the new fiducial follows the sampler.
use crate::core::detector::Detector;
use crate::core::options::LikelihoodOptions;
use crate::core::params::ParameterMap;
use crate::core::priors::PriorDict;
use crate::core::snr::{FullBandwidthSnr, SnrProvider};
use crate::core::waveform::FrequencyDomainModel;
use crate::likelihood::errors::LikelihoodResult;
use crate::likelihood::traits::{Likelihood, NetworkSnrs};
use crate::likelihood::transient::GravitationalWaveTransient;
use crate::optimization::errors::{OptError, OptResult};
use crate::optimization::global_search::{
    LogLikelihood, SearchBounds, Theta, maximize_bounded,
};
use crate::relative_binning::bins::BinEdges;
use crate::relative_binning::options::{RelativeBinningOptions, SearchObjective};
use crate::relative_binning::policy::FiducialRefreshPolicy;
use crate::relative_binning::snr::RelativeBinningSnr;
use ndarray::Array1;
use rand::RngCore;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
enum FiducialState {
    Pending,
    Established { calls_since_refresh: usize },
}

/// Overwrite the bounded names of `base` with `theta`.
pub fn theta_to_parameters(base: &ParameterMap, names: &[String], theta: &Theta) -> ParameterMap {
    let mut parameters = base.clone();
    for (name, &value) in names.iter().zip(theta.iter()) {
        parameters.insert(name.clone(), value);
    }
    parameters
}

/// `parameters` restricted to `names`, or `None` if any is missing.
pub fn parameters_to_theta(parameters: &ParameterMap, names: &[String]) -> Option<Theta> {
    names.iter().map(|n| parameters.get(n).copied()).collect::<Option<Vec<f64>>>().map(Array1::from)
}

#[derive(Debug)]
pub struct RelativeBinningTransient<'a, D, W> {
    inner: GravitationalWaveTransient<'a, D, RelativeBinningSnr<'a, W>>,
    options: RelativeBinningOptions,
    initial_parameters: ParameterMap,
    bounds: Option<SearchBounds>,
    state: FiducialState,
}

/// The fiducial-search objective over a bounded parameter vector.
struct FiducialObjective<'t, 'a, D, W> {
    transient: &'t RelativeBinningTransient<'a, D, W>,
    names: &'t [String],
    objective: SearchObjective,
}

impl<'t, 'a, D, W> LogLikelihood for FiducialObjective<'t, 'a, D, W>
where
    D: Detector,
    W: FrequencyDomainModel,
{
    type Data = ParameterMap;

    fn value(&self, theta: &Theta, base: &ParameterMap) -> OptResult<f64> {
        let parameters = theta_to_parameters(base, self.names, theta);
        let value = match self.objective {
            SearchObjective::FullBandwidth => self.transient.log_likelihood_ratio_full(&parameters),
            SearchObjective::Binned => self.transient.inner.ratio(&parameters),
        };
        value.map_err(|e| OptError::ObjectiveFailed { text: e.to_string() })
    }
}

impl<'a, D, W> RelativeBinningTransient<'a, D, W>
where
    D: Detector,
    W: FrequencyDomainModel,
{
    /// Validate the configuration; no waveform is evaluated yet.
    ///
    /// `parameter_bounds` maps each searched parameter to `(lower, upper)`;
    /// `initial_parameters` must hold every parameter the model and the
    /// detectors read.
    ///
    /// # Errors
    /// - `InvalidOption` from [`RelativeBinningOptions::validate`].
    /// - `Optimization(InvalidBounds)` for malformed bounds.
    /// - `UnsupportedMarginalization` if time marginalization is requested.
    /// - Every error of [`GravitationalWaveTransient::new`].
    pub fn new(
        detectors: &'a [D], generator: &'a W, priors: Option<&mut PriorDict>,
        options: LikelihoodOptions, initial_parameters: ParameterMap,
        parameter_bounds: BTreeMap<String, (f64, f64)>, binning: RelativeBinningOptions,
    ) -> LikelihoodResult<Self> {
        binning.validate()?;
        let bounds = if parameter_bounds.is_empty() {
            None
        } else {
            Some(SearchBounds::new(parameter_bounds.into_iter().map(|(k, (lo, hi))| (k, lo, hi)))?)
        };
        let inner =
            GravitationalWaveTransient::new(detectors, RelativeBinningSnr::new(generator), priors, options)?;
        Ok(Self { inner, options: binning, initial_parameters, bounds, state: FiducialState::Pending })
    }

    pub fn inner(&self) -> &GravitationalWaveTransient<'a, D, RelativeBinningSnr<'a, W>> {
        &self.inner
    }

    pub fn options(&self) -> &RelativeBinningOptions {
        &self.options
    }

    pub fn is_established(&self) -> bool {
        matches!(self.state, FiducialState::Established { .. })
    }

    pub fn bin_edges(&self) -> Option<&BinEdges> {
        self.inner.provider().bins()
    }

    /// Parameters of the current fiducial waveform, in the sampling frame.
    pub fn fiducial_parameters(&self) -> Option<&ParameterMap> {
        self.inner.provider().fiducial().map(|f| &f.parameters)
    }

    /// Set up bins and search for the fiducial now instead of on the first
    /// evaluation. A no-op once established.
    ///
    /// # Errors
    /// - `InvalidOption` if no bins fit the data.
    /// - `FiducialWaveform` if the model has no signal at a fiducial point.
    /// - `Optimization` for search failures.
    pub fn initialize(&mut self) -> LikelihoodResult<()> {
        if self.is_established() {
            return Ok(());
        }
        if self.inner.provider().bins().is_none() {
            let detectors = self.inner.detectors();
            let bins = BinEdges::from_phase_drift(detectors[0].frequency_array(), &self.options)?;
            tracing::info!(bins = bins.n_bins(), "Relative-binning bin setup completed");
            self.inner.provider_mut().set_bins(bins);
        }
        let start = self.initial_parameters.clone();
        self.search_fiducial(start)?;
        self.state = FiducialState::Established { calls_since_refresh: 0 };
        Ok(())
    }

    /// Move the fiducial to `around` and search again from there.
    ///
    /// Parameters missing from `around` keep their initial-guess values.
    /// Without bounds the fiducial becomes `around` itself.
    ///
    /// # Errors
    /// - As for [`RelativeBinningTransient::initialize`].
    pub fn refresh_fiducial(&mut self, around: &ParameterMap) -> LikelihoodResult<()> {
        self.initialize()?;
        let start = self.recentred_start(around);
        self.search_fiducial(start)?;
        self.state = FiducialState::Established { calls_since_refresh: 0 };
        tracing::info!("Relative-binning fiducial refreshed");
        Ok(())
    }

    /// Initial guess overridden by every value in `around`.
    fn recentred_start(&self, around: &ParameterMap) -> ParameterMap {
        let mut start = self.initial_parameters.clone();
        start.extend(around.iter().map(|(k, v)| (k.clone(), *v)));
        start
    }

    fn set_fiducial(&mut self, parameters: &ParameterMap) -> LikelihoodResult<()> {
        let local = self.inner.local_parameters(parameters)?;
        let detectors = self.inner.detectors();
        self.inner.provider_mut().set_fiducial(detectors, &local)?;
        // Keep the sampling-frame values, not the converted ones.
        if let Some(fiducial) = self.inner.provider_mut().fiducial_mut() {
            fiducial.parameters = parameters.clone();
        }
        Ok(())
    }

    /// Alternate bounded searches and summary-data updates until the best
    /// log-likelihood ratio changes by less than the threshold.
    fn search_fiducial(&mut self, start: ParameterMap) -> LikelihoodResult<()> {
        self.set_fiducial(&start)?;
        let Some(bounds) = self.bounds.clone() else {
            tracing::info!("No search bounds; fiducial fixed at the start parameters");
            return Ok(());
        };
        let mut theta0 = parameters_to_theta(&start, bounds.names());
        let mut previous = f64::NEG_INFINITY;
        for iteration in 0..self.options.max_iterations {
            let outcome = {
                let objective = FiducialObjective {
                    transient: &*self,
                    names: bounds.names(),
                    objective: self.options.objective,
                };
                maximize_bounded(&objective, theta0.as_ref(), &bounds, &start, &self.options.search)?
            };
            let best = theta_to_parameters(&start, bounds.names(), &outcome.theta_hat);
            self.set_fiducial(&best)?;
            tracing::info!(iteration, log_likelihood_ratio = outcome.value, "Fiducial search iteration");

            if (outcome.value - previous).abs() < self.options.likelihood_threshold {
                tracing::info!(iteration, "Likelihood change threshold reached");
                return Ok(());
            }
            previous = outcome.value;
            theta0 = Some(outcome.theta_hat);
        }
        tracing::info!(max_iterations = self.options.max_iterations, "Fiducial search iteration cap reached");
        Ok(())
    }

    /// The same ratio as [`Likelihood::log_likelihood_ratio`] with exact
    /// full-bandwidth inner products. Needs no fiducial.
    ///
    /// # Errors
    /// - `MissingParameter` for absent sky or time parameters.
    pub fn log_likelihood_ratio_full(&self, parameters: &ParameterMap) -> LikelihoodResult<f64> {
        let local = self.inner.local_parameters(parameters)?;
        let generator = self.inner.provider().generator();
        let Some(waveform) = generator.frequency_domain_strain(&local) else {
            return Ok(f64::NEG_INFINITY);
        };
        let full = FullBandwidthSnr::new(generator);
        let mut net = NetworkSnrs::default();
        for det in self.inner.detectors() {
            match SnrProvider::<D>::calculate_snrs(&full, &waveform, det, &local, None)? {
                Some(snrs) => net.accumulate(snrs),
                None => return Ok(f64::NEG_INFINITY),
            }
        }
        self.inner.marginalizer().log_likelihood_ratio(net.d_inner_h, net.optimal_snr_squared, None, &local)
    }

    /// Draw marginalized parameters with binned inner products, establishing
    /// the fiducial first if needed.
    ///
    /// # Errors
    /// - As for [`RelativeBinningTransient::initialize`] and
    ///   [`GravitationalWaveTransient::generate_posterior_sample_from_marginalized_likelihood`].
    pub fn generate_posterior_sample_from_marginalized_likelihood(
        &mut self, parameters: &ParameterMap, rng: &mut dyn RngCore,
    ) -> LikelihoodResult<ParameterMap> {
        self.initialize()?;
        self.inner.generate_posterior_sample_from_marginalized_likelihood(parameters, rng)
    }

    fn apply_refresh_policy(&mut self, parameters: &ParameterMap, binned: f64) -> LikelihoodResult<f64> {
        let policy: FiducialRefreshPolicy = self.options.refresh;
        let calls = match &mut self.state {
            FiducialState::Established { calls_since_refresh } => {
                *calls_since_refresh += 1;
                *calls_since_refresh
            }
            FiducialState::Pending => 0,
        };
        let stale = policy.refresh_due(calls)
            || (policy.checks_drift() && policy.drifted(binned, self.log_likelihood_ratio_full(parameters)?));
        if !stale {
            return Ok(binned);
        }
        tracing::debug!(calls, "Fiducial waveform stale");
        self.refresh_fiducial(parameters)?;
        self.inner.ratio(parameters)
    }
}

impl<'a, D, W> Likelihood for RelativeBinningTransient<'a, D, W>
where
    D: Detector,
    W: FrequencyDomainModel,
{
    fn log_likelihood_ratio(&mut self, parameters: &ParameterMap) -> LikelihoodResult<f64> {
        self.initialize()?;
        let binned = self.inner.ratio(parameters)?;
        self.apply_refresh_policy(parameters, binned)
    }

    fn noise_log_likelihood(&self) -> f64 {
        self.inner.noise_log_likelihood()
    }
}
