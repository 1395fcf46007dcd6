//! Prior distributions consumed by the marginalizations.
//!
//! Purpose
//! -------
//! The likelihoods only ever need a handful of operations from a prior:
//! its support, its density, its quantile function and whether it is a fixed
//! value. [`Prior`] captures exactly that; [`PriorDict`] holds the caller's
//! priors by name.
//!
//! Key behaviors
//! -------------
//! - [`Uniform`] delegates density and quantiles to `statrs`.
//! - [`PowerLaw`] covers `p(x) ∝ x^α`, e.g. the Euclidean distance prior
//!   `α = 2`.
//! - [`DeltaFunction`] is the fixed value substituted for every marginalized
//!   parameter.
//! - [`Interped`] is the empirical distribution used to draw marginalized
//!   parameters back from a tabulated posterior.
//!
//! Conventions
//! -----------
//! - `prob` is zero outside `[minimum, maximum]`.
//! - `rescale` maps a unit-interval draw to the parameter (inverse CDF).
use crate::likelihood::errors::{LikelihoodError, LikelihoodResult};
use ndarray::{Array1, ArrayView1};
use rand::{Rng, RngCore};
use statrs::distribution::{Continuous, ContinuousCDF};
use std::collections::BTreeMap;
use std::sync::Arc;

pub trait Prior: std::fmt::Debug + Send + Sync {
    fn minimum(&self) -> f64;
    fn maximum(&self) -> f64;
    fn prob(&self, x: f64) -> f64;
    fn rescale(&self, u: f64) -> f64;

    fn sample(&self, rng: &mut dyn RngCore) -> f64 {
        self.rescale(rng.r#gen::<f64>())
    }

    fn is_fixed(&self) -> bool {
        false
    }

    fn prob_array(&self, xs: ArrayView1<f64>) -> Array1<f64> {
        xs.mapv(|x| self.prob(x))
    }
}

/// Uniform prior on `[minimum, maximum]`.
#[derive(Debug, Clone)]
pub struct Uniform {
    inner: statrs::distribution::Uniform,
}

impl Uniform {
    /// # Errors
    /// - `InvalidPrior` when the bounds are non-finite or not increasing.
    pub fn new(minimum: f64, maximum: f64) -> LikelihoodResult<Self> {
        let inner = statrs::distribution::Uniform::new(minimum, maximum).map_err(|e| {
            LikelihoodError::InvalidPrior { key: "Uniform".to_string(), reason: e.to_string() }
        })?;
        Ok(Self { inner })
    }
}

impl Prior for Uniform {
    fn minimum(&self) -> f64 {
        statrs::statistics::Min::min(&self.inner)
    }

    fn maximum(&self) -> f64 {
        statrs::statistics::Max::max(&self.inner)
    }

    fn prob(&self, x: f64) -> f64 {
        self.inner.pdf(x)
    }

    fn rescale(&self, u: f64) -> f64 {
        self.inner.inverse_cdf(u.clamp(0.0, 1.0))
    }
}

/// Power-law prior `p(x) ∝ x^α` on `[minimum, maximum]`, `minimum > 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct PowerLaw {
    alpha: f64,
    minimum: f64,
    maximum: f64,
}

impl PowerLaw {
    /// # Errors
    /// - `InvalidPrior` unless `0 < minimum < maximum` and all values are finite.
    pub fn new(alpha: f64, minimum: f64, maximum: f64) -> LikelihoodResult<Self> {
        if !(alpha.is_finite() && minimum.is_finite() && maximum.is_finite())
            || minimum <= 0.0
            || minimum >= maximum
        {
            return Err(LikelihoodError::InvalidPrior {
                key: "PowerLaw".to_string(),
                reason: format!(
                    "need finite alpha and 0 < minimum < maximum, got alpha={alpha}, [{minimum}, {maximum}]"
                ),
            });
        }
        Ok(Self { alpha, minimum, maximum })
    }

    fn is_log_uniform(&self) -> bool {
        (self.alpha + 1.0).abs() < 1e-12
    }
}

impl Prior for PowerLaw {
    fn minimum(&self) -> f64 {
        self.minimum
    }

    fn maximum(&self) -> f64 {
        self.maximum
    }

    fn prob(&self, x: f64) -> f64 {
        if x < self.minimum || x > self.maximum {
            return 0.0;
        }
        if self.is_log_uniform() {
            return 1.0 / (x * (self.maximum / self.minimum).ln());
        }
        let a1 = self.alpha + 1.0;
        a1 * x.powf(self.alpha) / (self.maximum.powf(a1) - self.minimum.powf(a1))
    }

    fn rescale(&self, u: f64) -> f64 {
        let u = u.clamp(0.0, 1.0);
        if self.is_log_uniform() {
            return self.minimum * (self.maximum / self.minimum).powf(u);
        }
        let a1 = self.alpha + 1.0;
        let lo = self.minimum.powf(a1);
        let hi = self.maximum.powf(a1);
        (lo + u * (hi - lo)).powf(1.0 / a1)
    }
}

/// A parameter pinned to a single value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeltaFunction {
    pub peak: f64,
}

impl Prior for DeltaFunction {
    fn minimum(&self) -> f64 {
        self.peak
    }

    fn maximum(&self) -> f64 {
        self.peak
    }

    fn prob(&self, x: f64) -> f64 {
        if x == self.peak { f64::INFINITY } else { 0.0 }
    }

    fn rescale(&self, _u: f64) -> f64 {
        self.peak
    }

    fn is_fixed(&self) -> bool {
        true
    }
}

/// Empirical distribution given by a tabulated, unnormalized density.
///
/// Sampling inverts the trapezoid-integrated CDF by linear interpolation.
#[derive(Debug, Clone, PartialEq)]
pub struct Interped {
    xx: Array1<f64>,
    yy: Array1<f64>,
    cdf: Array1<f64>,
}

impl Interped {
    /// Build from strictly increasing `xx` and non-negative `yy`.
    ///
    /// Returns `None` when fewer than two points are given, the grid is not
    /// increasing, or the total mass is zero or non-finite.
    pub fn new(xx: Array1<f64>, yy: Array1<f64>) -> Option<Self> {
        if xx.len() < 2 || xx.len() != yy.len() {
            return None;
        }
        if xx.windows(2).into_iter().any(|w| w[1] <= w[0]) {
            return None;
        }
        let yy = yy.mapv(|y| if y.is_finite() && y > 0.0 { y } else { 0.0 });
        let mut cdf: Array1<f64> = Array1::zeros(xx.len());
        for i in 1..xx.len() {
            cdf[i] = cdf[i - 1] + 0.5 * (yy[i] + yy[i - 1]) * (xx[i] - xx[i - 1]);
        }
        let total = cdf[xx.len() - 1];
        if !(total.is_finite() && total > 0.0) {
            return None;
        }
        cdf /= total;
        let norm = yy / total;
        Some(Self { xx, yy: norm, cdf })
    }
}

impl Prior for Interped {
    fn minimum(&self) -> f64 {
        self.xx[0]
    }

    fn maximum(&self) -> f64 {
        self.xx[self.xx.len() - 1]
    }

    fn prob(&self, x: f64) -> f64 {
        if x < self.minimum() || x > self.maximum() {
            return 0.0;
        }
        let i = self.xx.iter().position(|&v| v >= x).unwrap_or(self.xx.len() - 1).max(1);
        let w = (x - self.xx[i - 1]) / (self.xx[i] - self.xx[i - 1]);
        self.yy[i - 1] + w * (self.yy[i] - self.yy[i - 1])
    }

    fn rescale(&self, u: f64) -> f64 {
        let u = u.clamp(0.0, 1.0);
        let n = self.cdf.len();
        let i = self.cdf.iter().position(|&c| c >= u).unwrap_or(n - 1).max(1);
        let (c0, c1) = (self.cdf[i - 1], self.cdf[i]);
        if c1 <= c0 {
            return self.xx[i];
        }
        self.xx[i - 1] + (u - c0) / (c1 - c0) * (self.xx[i] - self.xx[i - 1])
    }
}

/// Caller-held priors keyed by parameter name.
#[derive(Debug, Clone, Default)]
pub struct PriorDict {
    entries: BTreeMap<String, Arc<dyn Prior>>,
}

impl PriorDict {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<P: Prior + 'static>(&mut self, key: &str, prior: P) {
        self.entries.insert(key.to_string(), Arc::new(prior));
    }

    pub fn insert_shared(&mut self, key: &str, prior: Arc<dyn Prior>) {
        self.entries.insert(key.to_string(), prior);
    }

    pub fn get(&self, key: &str) -> Option<&Arc<dyn Prior>> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Arc<dyn Prior>> {
        self.entries.remove(key)
    }

    /// Replace the entry for `key` with a [`DeltaFunction`] at `value`.
    pub fn fix(&mut self, key: &str, value: f64) {
        self.insert(key, DeltaFunction { peak: value });
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    // ---- Scope ----
    // Covers normalisation and quantiles of the analytic priors, fixing in a
    // PriorDict, and inverse-CDF sampling of Interped.

    #[test]
    // Purpose
    // -------
    // Uniform density and quantiles follow the bounds.
    //
    // Given
    // -----
    // - U(2, 6).
    //
    // Expect
    // ------
    // - prob = 0.25 inside, 0 outside; rescale(0.5) = 4.
    fn uniform_density_and_quantiles() {
        let p = Uniform::new(2.0, 6.0).unwrap();
        assert!((p.prob(3.0) - 0.25).abs() < 1e-12);
        assert_eq!(p.prob(7.0), 0.0);
        assert!((p.rescale(0.5) - 4.0).abs() < 1e-12);
        assert!(Uniform::new(1.0, 1.0).is_err());
    }

    #[test]
    // Purpose
    // -------
    // The d² distance prior is normalized and its median is analytic.
    //
    // Given
    // -----
    // - PowerLaw(2, 10, 1000).
    //
    // Expect
    // ------
    // - median = ((10³ + 1000³)/2)^(1/3); density integrates to ~1.
    fn power_law_median_and_normalisation() {
        let p = PowerLaw::new(2.0, 10.0, 1000.0).unwrap();
        let median = ((10f64.powi(3) + 1000f64.powi(3)) / 2.0).cbrt();
        assert!((p.rescale(0.5) - median).abs() < 1e-9);

        let xs = Array1::linspace(10.0, 1000.0, 20_001);
        let ys = p.prob_array(xs.view());
        let mass = crate::optimization::numerical_stability::trapezoid(ys.view(), xs.view());
        assert!((mass - 1.0).abs() < 1e-6);
    }

    #[test]
    // Purpose
    // -------
    // Fixing a key swaps in a DeltaFunction.
    //
    // Given
    // -----
    // - a dict with a Uniform phase prior, fixed to 0.
    //
    // Expect
    // ------
    // - is_fixed and rescale returns the peak.
    fn fixing_replaces_prior() {
        let mut priors = PriorDict::new();
        priors.insert("phase", Uniform::new(0.0, 6.0).unwrap());
        priors.fix("phase", 0.0);
        let p = priors.get("phase").unwrap();
        assert!(p.is_fixed());
        assert_eq!(p.rescale(0.7), 0.0);
    }

    #[test]
    // Purpose
    // -------
    // Interped draws respect the tabulated density.
    //
    // Given
    // -----
    // - a triangular density on [0, 2] peaking at 1; 20k draws.
    //
    // Expect
    // ------
    // - sample mean within 0.02 of 1; all draws inside [0, 2];
    //   rescale(0.5) = 1 exactly by symmetry.
    fn interped_inverse_cdf_sampling() {
        let xx = array![0.0, 1.0, 2.0];
        let yy = array![0.0, 1.0, 0.0];
        let p = Interped::new(xx, yy).unwrap();
        assert!((p.rescale(0.5) - 1.0).abs() < 1e-12);

        let mut rng = StdRng::seed_from_u64(11);
        let n = 20_000;
        let mut mean = 0.0;
        for _ in 0..n {
            let x = p.sample(&mut rng);
            assert!((0.0..=2.0).contains(&x));
            mean += x / n as f64;
        }
        assert!((mean - 1.0).abs() < 0.02);
    }

    #[test]
    fn interped_rejects_massless_tables() {
        assert!(Interped::new(array![0.0, 1.0], array![0.0, 0.0]).is_none());
        assert!(Interped::new(array![1.0, 0.0], array![1.0, 1.0]).is_none());
    }
}
