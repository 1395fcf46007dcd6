//! Execution helper that runs argmin's particle swarm on a log-likelihood
//! problem and returns a crate-friendly [`SearchOutcome`].
use crate::optimization::{
    errors::OptResult,
    global_search::{
        LogLikelihood, SearchOptions, SearchOutcome,
        adapter::ArgMinAdapter,
        types::{SearchBounds, SeededParticleSwarm},
    },
};
use argmin::core::{Executor, State};
use argmin::solver::particleswarm::ParticleSwarm;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Run a seeded particle swarm inside `bounds`.
///
/// # Arguments
/// - `problem`: an [`ArgMinAdapter`] wrapping the user's objective and data.
/// - `bounds`: validated box constraints; also fixes the parameter order.
/// - `opts`: swarm size, iteration cap and seed.
///
/// # Errors
/// - Any backend or objective error, normalized into `OptError`.
/// - Validation errors when no finite optimum was found.
pub fn run_particle_swarm<F: LogLikelihood>(
    problem: ArgMinAdapter<'_, F>, bounds: &SearchBounds, opts: &SearchOptions,
) -> OptResult<SearchOutcome> {
    let solver: SeededParticleSwarm =
        ParticleSwarm::new((bounds.lower().clone(), bounds.upper().clone()), opts.num_particles)
            .with_rng_generator(StdRng::seed_from_u64(opts.seed));
    let result =
        Executor::new(problem, solver).configure(|state| state.max_iters(opts.max_iter)).run()?;
    let state = result.state();
    let theta_hat = state.get_best_param().map(|particle| particle.position.clone());
    SearchOutcome::new(
        theta_hat,
        bounds.dim(),
        -state.get_best_cost(),
        state.get_termination_status(),
        state.get_iter(),
        state.get_func_counts().clone(),
    )
}
