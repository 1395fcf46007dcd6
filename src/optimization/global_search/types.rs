//! global_search::types — shared numeric aliases and solver wiring.
//!
//! Purpose
//! -------
//! Centralize the numeric types and the particle-swarm solver alias used by
//! the bounded global search, so the rest of the module stays agnostic to
//! `ndarray` and Argmin generics.
//!
//! Conventions
//! -----------
//! - `Theta` is a parameter vector in the ordering fixed by [`SearchBounds`];
//!   higher layers map it to and from named parameter maps.
//! - `Cost` is the argmin-facing objective `c(θ) = -ℓ(θ)`.
use crate::optimization::{
    errors::{OptError, OptResult},
    global_search::validation::validate_bound_pair,
};
use argmin::solver::particleswarm::ParticleSwarm;
use ndarray::Array1;
use rand::rngs::StdRng;
use std::collections::HashMap;

/// Parameter vector `θ` for the bounded search.
pub type Theta = Array1<f64>;

/// Scalar objective value handed to the solver (`-ℓ(θ)`).
pub type Cost = f64;

/// Function-evaluation counters as reported by the solver.
pub type FnEvalMap = HashMap<String, u64>;

/// Particle swarm specialized to this crate's numeric types, seeded for
/// reproducible searches.
pub type SeededParticleSwarm = ParticleSwarm<Theta, Cost, StdRng>;

/// Named, validated box constraints.
///
/// Names are kept in the order they were supplied; the `i`-th entry of every
/// `Theta` handled by the search refers to `names[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchBounds {
    names: Vec<String>,
    lower: Theta,
    upper: Theta,
}

impl SearchBounds {
    /// Build bounds from `(name, lower, upper)` triples.
    ///
    /// Errors
    /// ------
    /// - [`OptError::EmptyBounds`] when no triple is supplied.
    /// - [`OptError::InvalidBounds`] for non-finite or non-increasing pairs.
    pub fn new<I, S>(entries: I) -> OptResult<Self>
    where
        I: IntoIterator<Item = (S, f64, f64)>,
        S: Into<String>,
    {
        let mut names = Vec::new();
        let mut lower = Vec::new();
        let mut upper = Vec::new();
        for (name, lo, hi) in entries {
            let name = name.into();
            validate_bound_pair(&name, lo, hi)?;
            names.push(name);
            lower.push(lo);
            upper.push(hi);
        }
        if names.is_empty() {
            return Err(OptError::EmptyBounds);
        }
        Ok(Self { names, lower: Array1::from(lower), upper: Array1::from(upper) })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn lower(&self) -> &Theta {
        &self.lower
    }

    pub fn upper(&self) -> &Theta {
        &self.upper
    }

    pub fn dim(&self) -> usize {
        self.names.len()
    }

    /// Clamp `theta` into the box, component-wise.
    pub fn clamp(&self, theta: &Theta) -> Theta {
        let mut out = theta.clone();
        for ((x, &lo), &hi) in out.iter_mut().zip(self.lower.iter()).zip(self.upper.iter()) {
            *x = x.clamp(lo, hi);
        }
        out
    }
}
