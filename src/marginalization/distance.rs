//! Distance marginalization through a precomputed 2D lookup table.
//!
//! Purpose
//! -------
//! Integrating the likelihood over luminosity distance is done once, up
//! front, on a grid of reference-distance inner products. The signal scales
//! as `1/D`, so with `d_ref` the median of the distance prior,
//!
//! ```text
//! ⟨d|h⟩(D)  = ⟨d|h⟩_ref · d_ref / D
//! ⟨h|h⟩(D)  = ⟨h|h⟩_ref · d_ref² / D²
//! ```
//!
//! and the marginal depends only on `(⟨d|h⟩_ref, ⟨h|h⟩_ref)`.
//!
//! Key behaviors
//! -------------
//! - Table rows (one per `⟨h|h⟩_ref`) are built in parallel with rayon.
//! - The table is cached to disk with bincode together with the keys that
//!   determine it; a cache is reused only when every key matches exactly.
//! - Cache writes go to a sibling temporary file first and are renamed into
//!   place, so a reader never sees a partially written table.
//!
//! Invariants & assumptions
//! ------------------------
//! - `⟨h|h⟩_ref ∈ [1e-5, 1e10]` (log-spaced). `⟨d|h⟩_ref` is log-spaced on
//!   `[1e-5, 1e10]` under phase marginalization (it is an absolute value),
//!   otherwise it spans `[-1e3, -1e-3] ∪ [1e-3, 1e10]`.
//! - Lookups outside the table evaluate to `-∞`.
//!
//! Testing notes
//! -------------
//! - Unit tests compare table nodes against a direct sum, check that a
//!   written cache is reloaded, and that a key mismatch forces a rebuild.
use crate::core::options::{DistanceTableOptions, LookupTableSource};
use crate::core::priors::Prior;
use crate::likelihood::errors::{LikelihoodError, LikelihoodResult};
use crate::marginalization::interp::Bicubic;
use crate::marginalization::phase::PhaseBesselInterpolant;
use crate::optimization::numerical_stability::transformations::logsumexp_weighted;
use ndarray::{Array1, Array2, ArrayView1, Zip};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Everything persisted for a distance lookup table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceLookupCache {
    pub distance_array: Vec<f64>,
    pub prior_array: Vec<f64>,
    pub reference_distance: f64,
    pub phase_marginalization: bool,
    pub lookup_table: Array2<f64>,
}

impl DistanceLookupCache {
    /// Name of the first key that differs from the expected configuration.
    fn mismatch(&self, expected: &TableKeys, shape: (usize, usize)) -> Option<&'static str> {
        if self.distance_array != expected.distance_array {
            Some("distance_array")
        } else if self.prior_array != expected.prior_array {
            Some("prior_array")
        } else if self.reference_distance != expected.reference_distance {
            Some("reference_distance")
        } else if self.phase_marginalization != expected.phase_marginalization {
            Some("phase_marginalization")
        } else if self.lookup_table.dim() != shape {
            Some("lookup_table")
        } else {
            None
        }
    }

    /// # Errors
    /// - `CacheIo` if the file cannot be read, `CacheFormat` if it does not
    ///   decode.
    pub fn load(path: &Path) -> LikelihoodResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| LikelihoodError::CacheIo {
            path: path.display().to_string(),
            text: e.to_string(),
        })?;
        Ok(bincode::deserialize(&bytes)?)
    }

    /// Write through a temporary sibling file and rename into place.
    ///
    /// # Errors
    /// - `CacheIo` on any filesystem failure.
    pub fn save(&self, path: &Path) -> LikelihoodResult<()> {
        let bytes = bincode::serialize(self)?;
        let io_err = |e: std::io::Error| LikelihoodError::CacheIo {
            path: path.display().to_string(),
            text: e.to_string(),
        };
        let mut tmp_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        tmp_name.push(".tmp");
        let tmp = path.with_file_name(tmp_name);
        std::fs::write(&tmp, bytes).map_err(io_err)?;
        std::fs::rename(&tmp, path).map_err(io_err)
    }
}

/// How the table in use was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Loaded,
    Rebuilt,
}

struct TableKeys {
    distance_array: Vec<f64>,
    prior_array: Vec<f64>,
    reference_distance: f64,
    phase_marginalization: bool,
}

#[derive(Debug, Clone)]
pub struct DistanceMarginalization {
    cache: DistanceLookupCache,
    interpolant: Bicubic,
    status: CacheStatus,
}

impl DistanceMarginalization {
    /// Build or load the lookup table for `prior`.
    ///
    /// `phase` must be given exactly when phase marginalization is also on;
    /// the table then integrates `ln I0(|⟨d|h⟩|)` instead of `Re⟨d|h⟩`.
    ///
    /// # Errors
    /// - `InvalidPrior` if the prior has no positive support or zero mass on
    ///   the distance grid.
    /// - Cache write failures (`CacheIo`, `CacheFormat`). Unreadable or
    ///   stale caches are not errors; they are rebuilt.
    pub fn new(
        prior: &dyn Prior, options: &DistanceTableOptions, phase: Option<&PhaseBesselInterpolant>,
    ) -> LikelihoodResult<Self> {
        let keys = table_keys(prior, options.n_distance, phase.is_some())?;
        let shape = (options.n_snr_squared, options.n_d_inner_h);

        let (cache, status) = match &options.source {
            LookupTableSource::InMemory(cached) => match cached.mismatch(&keys, shape) {
                None => ((**cached).clone(), CacheStatus::Loaded),
                Some(key) => {
                    tracing::info!(key, "Supplied distance lookup table does not match; rebuilding");
                    (build(&keys, shape, phase), CacheStatus::Rebuilt)
                }
            },
            LookupTableSource::NoCache => (build(&keys, shape, phase), CacheStatus::Rebuilt),
            source @ (LookupTableSource::DefaultFile | LookupTableSource::File(_)) => {
                let path = source.path().unwrap_or_default();
                match load_matching(&path, &keys, shape) {
                    Some(cache) => (cache, CacheStatus::Loaded),
                    None => {
                        let cache = build(&keys, shape, phase);
                        cache.save(&path)?;
                        tracing::info!(path = %path.display(), "Cached distance marginalization lookup table");
                        (cache, CacheStatus::Rebuilt)
                    }
                }
            }
        };

        let interpolant = Bicubic::new(
            d_inner_h_ref_grid(shape.1, cache.phase_marginalization).to_vec(),
            snr_squared_ref_grid(shape.0).to_vec(),
            cache.lookup_table.clone(),
        )
        .ok_or(LikelihoodError::ShapeMismatch {
            what: "distance lookup table",
            expected: shape.0 * shape.1,
            found: cache.lookup_table.len(),
        })?;

        Ok(Self { cache, interpolant, status })
    }

    pub fn status(&self) -> CacheStatus {
        self.status
    }

    pub fn cache(&self) -> &DistanceLookupCache {
        &self.cache
    }

    /// Median of the distance prior.
    pub fn reference_distance(&self) -> f64 {
        self.cache.reference_distance
    }

    pub fn distance_array(&self) -> ArrayView1<'_, f64> {
        ArrayView1::from(&self.cache.distance_array[..])
    }

    pub fn prior_array(&self) -> ArrayView1<'_, f64> {
        ArrayView1::from(&self.cache.prior_array[..])
    }

    /// Distance-marginalized log-likelihood ratio for inner products
    /// computed at `distance`.
    pub fn log_likelihood(&self, d_inner_h: Complex64, optimal_snr_squared: f64, distance: f64) -> f64 {
        let ratio = distance / self.cache.reference_distance;
        let d_ref = d_inner_h * ratio;
        let h_ref = optimal_snr_squared * ratio * ratio;
        let x = if self.cache.phase_marginalization { d_ref.norm() } else { d_ref.re };
        self.interpolant.eval(x, h_ref)
    }
}

fn table_keys(prior: &dyn Prior, n_distance: usize, phase: bool) -> LikelihoodResult<TableKeys> {
    let (lo, hi) = (prior.minimum(), prior.maximum());
    if !(lo.is_finite() && hi.is_finite() && lo > 0.0 && hi > lo) {
        return Err(LikelihoodError::InvalidPrior {
            key: crate::core::params::LUMINOSITY_DISTANCE.to_string(),
            reason: format!("support [{lo}, {hi}] must be finite, positive and non-empty"),
        });
    }
    let distance_array = Array1::linspace(lo, hi, n_distance).to_vec();
    let prior_array: Vec<f64> = distance_array.iter().map(|&d| prior.prob(d)).collect();
    if !prior_array.iter().any(|&p| p > 0.0) {
        return Err(LikelihoodError::InvalidPrior {
            key: crate::core::params::LUMINOSITY_DISTANCE.to_string(),
            reason: "no probability mass on the distance grid".to_string(),
        });
    }
    Ok(TableKeys {
        distance_array,
        prior_array,
        reference_distance: prior.rescale(0.5),
        phase_marginalization: phase,
    })
}

fn load_matching(path: &Path, keys: &TableKeys, shape: (usize, usize)) -> Option<DistanceLookupCache> {
    if !path.exists() {
        tracing::info!(path = %path.display(), "Distance marginalization file does not exist");
        return None;
    }
    match DistanceLookupCache::load(path) {
        Ok(cache) => match cache.mismatch(keys, shape) {
            None => {
                tracing::info!(path = %path.display(), "Loaded distance marginalization lookup table");
                Some(cache)
            }
            Some(key) => {
                tracing::info!(key, "Loaded distance marginalization lookup table does not match");
                None
            }
        },
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "Could not read distance marginalization lookup table");
            None
        }
    }
}

/// `⟨h|h⟩_ref` axis: `logspace(-5, 10, n)`.
pub fn snr_squared_ref_grid(n: usize) -> Array1<f64> {
    Array1::logspace(10.0, -5.0, 10.0, n)
}

/// `⟨d|h⟩_ref` axis.
pub fn d_inner_h_ref_grid(n: usize, phase_marginalization: bool) -> Array1<f64> {
    if phase_marginalization {
        return Array1::logspace(10.0, -5.0, 10.0, n);
    }
    let n_negative = n / 2;
    let negative = Array1::logspace(10.0, 3.0, -3.0, n_negative).mapv(|x| -x);
    let positive = Array1::logspace(10.0, -3.0, 10.0, n - n_negative);
    ndarray::concatenate![ndarray::Axis(0), negative, positive]
}

fn build(keys: &TableKeys, shape: (usize, usize), phase: Option<&PhaseBesselInterpolant>) -> DistanceLookupCache {
    tracing::info!(rows = shape.0, cols = shape.1, "Building lookup table for distance marginalization");

    let distances = ArrayView1::from(&keys.distance_array[..]);
    let delta = distances[1] - distances[0];
    let weights = Array1::from_iter(keys.prior_array.iter().map(|&p| p * delta));
    let ratio = distances.mapv(|d| keys.reference_distance / d);
    let hh_grid = snr_squared_ref_grid(shape.0);
    let dh_grid = d_inner_h_ref_grid(shape.1, phase.is_some());
    let log_norm = logsumexp_weighted(Array1::zeros(weights.len()).view(), weights.view());

    let mut table = Array2::<f64>::zeros(shape);
    Zip::from(table.rows_mut()).and(&hh_grid).par_for_each(|mut row, &hh_ref| {
        let mut buffer = Array1::<f64>::zeros(ratio.len());
        for (cell, &dh_ref) in row.iter_mut().zip(dh_grid.iter()) {
            for (b, &r) in buffer.iter_mut().zip(ratio.iter()) {
                let dh = dh_ref * r;
                let dh_term = match phase {
                    Some(bessel) => bessel.bessel(dh),
                    None => dh,
                };
                *b = dh_term - hh_ref * r * r / 2.0;
            }
            *cell = logsumexp_weighted(buffer.view(), weights.view()) - log_norm;
        }
    });

    DistanceLookupCache {
        distance_array: keys.distance_array.clone(),
        prior_array: keys.prior_array.clone(),
        reference_distance: keys.reference_distance,
        phase_marginalization: keys.phase_marginalization,
        lookup_table: table,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::priors::{PowerLaw, Uniform};

    // ---- Scope ----
    // Table values at grid nodes, lookup scaling with distance, the -inf
    // convention and the cache lifecycle (write, reload, stale rebuild).

    fn small_options(source: LookupTableSource) -> DistanceTableOptions {
        DistanceTableOptions::new(400, 16, 24, source).unwrap()
    }

    fn direct(prior: &dyn Prior, n: usize, dh_ref: f64, hh_ref: f64, phase: Option<&PhaseBesselInterpolant>) -> f64 {
        let keys = table_keys(prior, n, phase.is_some()).unwrap();
        let delta = keys.distance_array[1] - keys.distance_array[0];
        let terms: Vec<(f64, f64)> = keys
            .distance_array
            .iter()
            .zip(keys.prior_array.iter())
            .map(|(&d, &p)| {
                let r = keys.reference_distance / d;
                let dh = match phase {
                    Some(t) => t.bessel(dh_ref * r),
                    None => dh_ref * r,
                };
                (dh - hh_ref * r * r / 2.0, p * delta)
            })
            .collect();
        let peak = terms.iter().filter(|t| t.1 > 0.0).map(|t| t.0).fold(f64::NEG_INFINITY, f64::max);
        let num: f64 = terms.iter().map(|&(v, w)| w * (v - peak).exp()).sum();
        let den: f64 = terms.iter().map(|t| t.1).sum();
        peak + (num / den).ln()
    }

    #[test]
    // Purpose
    // -------
    // At a table node, the lookup equals the direct distance integral.
    //
    // Given
    // -----
    // - PowerLaw(α = 2) on [100, 5000] Mpc, 400 distances, 16 × 24 table.
    // - node (⟨d|h⟩_ref, ⟨h|h⟩_ref) taken from the grids, D = d_ref.
    //
    // Expect
    // ------
    // - lookup matches the direct sum to 1e-9.
    fn node_values_match_direct_sum() {
        // Arrange
        let prior = PowerLaw::new(2.0, 100.0, 5000.0).unwrap();
        let opts = small_options(LookupTableSource::NoCache);
        let marg = DistanceMarginalization::new(&prior, &opts, None).unwrap();
        let hh = snr_squared_ref_grid(16)[6];
        let dh = d_inner_h_ref_grid(24, false)[15];

        // Act
        let got = marg.log_likelihood(Complex64::new(dh, 0.3), hh, marg.reference_distance());

        // Assert
        let expected = direct(&prior, 400, dh, hh, None);
        assert!((got - expected).abs() < 1e-9, "got {got}, expected {expected}");
        assert_eq!(marg.status(), CacheStatus::Rebuilt);
    }

    #[test]
    fn phase_table_uses_absolute_inner_product() {
        let prior = PowerLaw::new(2.0, 100.0, 5000.0).unwrap();
        let opts = small_options(LookupTableSource::NoCache);
        let bound = PhaseBesselInterpolant::max_bound_for_distance(prior.rescale(0.5), 100.0);
        let bessel = PhaseBesselInterpolant::new(bound);
        let marg = DistanceMarginalization::new(&prior, &opts, Some(&bessel)).unwrap();
        let hh = snr_squared_ref_grid(16)[5];
        let dh = d_inner_h_ref_grid(24, true)[10];

        let d = marg.reference_distance();
        let a = marg.log_likelihood(Complex64::new(dh, 0.0), hh, d);
        let b = marg.log_likelihood(Complex64::new(0.0, -dh), hh, d);
        let expected = direct(&prior, 400, dh, hh, Some(&bessel));
        assert!((a - expected).abs() < 1e-9);
        assert!((a - b).abs() < 1e-9);
    }

    #[test]
    // Purpose
    // -------
    // Inner products at another distance are mapped back to the reference.
    //
    // Given
    // -----
    // - the same signal evaluated at D = d_ref and D = 2 d_ref.
    //
    // Expect
    // ------
    // - ⟨d|h⟩/2 and ⟨h|h⟩/4 at 2 d_ref give the same marginal.
    fn lookup_is_invariant_under_distance_rescaling() {
        let prior = Uniform::new(50.0, 2000.0).unwrap();
        let opts = small_options(LookupTableSource::NoCache);
        let marg = DistanceMarginalization::new(&prior, &opts, None).unwrap();
        let d_ref = marg.reference_distance();
        let (dh, hh) = (Complex64::new(40.0, 1.0), 900.0);
        let a = marg.log_likelihood(dh, hh, d_ref);
        let b = marg.log_likelihood(dh / 2.0, hh / 4.0, 2.0 * d_ref);
        assert!((a - b).abs() < 1e-9);
    }

    #[test]
    fn outside_table_is_negative_infinity() {
        let prior = Uniform::new(50.0, 2000.0).unwrap();
        let marg = DistanceMarginalization::new(&prior, &small_options(LookupTableSource::NoCache), None).unwrap();
        let d = marg.reference_distance();
        assert_eq!(marg.log_likelihood(Complex64::new(1.0, 0.0), 1e12, d), f64::NEG_INFINITY);
        assert_eq!(marg.log_likelihood(Complex64::new(-5e3, 0.0), 1.0, d), f64::NEG_INFINITY);
    }

    #[test]
    // Purpose
    // -------
    // The cache lifecycle: first build writes, second run loads, a prior
    // change rebuilds and overwrites.
    //
    // Given
    // -----
    // - a temporary directory and two different distance priors.
    //
    // Expect
    // ------
    // - Rebuilt, Loaded (identical table), Rebuilt.
    fn cache_is_written_reloaded_and_invalidated() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.bin");
        let opts = small_options(LookupTableSource::File(path.clone()));
        let prior = Uniform::new(50.0, 2000.0).unwrap();

        // Act
        let first = DistanceMarginalization::new(&prior, &opts, None).unwrap();
        let second = DistanceMarginalization::new(&prior, &opts, None).unwrap();
        let other = Uniform::new(60.0, 2000.0).unwrap();
        let third = DistanceMarginalization::new(&other, &opts, None).unwrap();

        // Assert
        assert_eq!(first.status(), CacheStatus::Rebuilt);
        assert!(path.exists());
        assert_eq!(second.status(), CacheStatus::Loaded);
        assert_eq!(first.cache(), second.cache());
        assert_eq!(third.status(), CacheStatus::Rebuilt);
        assert_eq!(DistanceLookupCache::load(&path).unwrap().distance_array[0], 60.0);
    }

    #[test]
    fn corrupt_cache_is_rebuilt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.bin");
        std::fs::write(&path, b"not a table").unwrap();
        let opts = small_options(LookupTableSource::File(path.clone()));
        let prior = Uniform::new(50.0, 2000.0).unwrap();
        let marg = DistanceMarginalization::new(&prior, &opts, None).unwrap();
        assert_eq!(marg.status(), CacheStatus::Rebuilt);
        assert!(DistanceLookupCache::load(&path).is_ok());
    }

    #[test]
    fn in_memory_table_is_reused_when_keys_match() {
        let prior = Uniform::new(50.0, 2000.0).unwrap();
        let built = DistanceMarginalization::new(&prior, &small_options(LookupTableSource::NoCache), None).unwrap();
        let source = LookupTableSource::InMemory(Box::new(built.cache().clone()));
        let reused = DistanceMarginalization::new(&prior, &small_options(source.clone()), None).unwrap();
        assert_eq!(reused.status(), CacheStatus::Loaded);

        let bessel = PhaseBesselInterpolant::default();
        let rebuilt = DistanceMarginalization::new(&prior, &small_options(source), Some(&bessel)).unwrap();
        assert_eq!(rebuilt.status(), CacheStatus::Rebuilt);
    }
}
