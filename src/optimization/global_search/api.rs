use crate::optimization::{
    errors::{OptError, OptResult},
    global_search::{
        LogLikelihood, SearchOptions, SearchOutcome,
        adapter::ArgMinAdapter,
        run::run_particle_swarm,
        types::{SearchBounds, Theta},
    },
};

/// Maximize a log-likelihood inside a box with a seeded particle swarm.
///
/// Workflow:
/// 1. Validate the optional starting point against the bounds' dimension.
/// 2. Run the swarm via [`run_particle_swarm`].
/// 3. If the starting point (clamped into the box) scores better than the
///    swarm's best particle, return it instead, so repeated searches seeded
///    with the previous optimum never lose ground.
///
/// # Errors
/// - [`OptError::DimensionMismatch`] for a starting point of the wrong length.
/// - Any error surfaced by the swarm run or outcome validation.
pub fn maximize_bounded<F: LogLikelihood>(
    f: &F, theta0: Option<&Theta>, bounds: &SearchBounds, data: &F::Data, opts: &SearchOptions,
) -> OptResult<SearchOutcome> {
    if let Some(theta0) = theta0 {
        if theta0.len() != bounds.dim() {
            return Err(OptError::DimensionMismatch { expected: bounds.dim(), found: theta0.len() });
        }
    }
    let problem = ArgMinAdapter::new(f, data);
    let mut outcome = run_particle_swarm(problem, bounds, opts)?;
    if let Some(theta0) = theta0 {
        let start = bounds.clamp(theta0);
        let start_value = f.value(&start, data)?;
        if start_value.is_finite() && start_value > outcome.value {
            outcome.theta_hat = start;
            outcome.value = start_value;
            outcome.from_initial_guess = true;
        }
    }
    Ok(outcome)
}
