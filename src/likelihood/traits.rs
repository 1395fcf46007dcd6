//! The evaluation surface shared by every transient likelihood.
use crate::core::params::ParameterMap;
use crate::likelihood::errors::LikelihoodResult;
use num_complex::Complex64;
use ndarray::Array1;

/// A gravitational-wave likelihood evaluated at caller-supplied parameters.
///
/// Evaluation takes `&mut self` because some variants finish their setup
/// lazily on the first call or refresh cached state between calls. The
/// caller's map is never modified.
pub trait Likelihood {
    /// `ln L(d|θ) − ln L(d|noise)`, marginalized as configured. `-∞` when
    /// the signal model produces no waveform for `parameters`.
    ///
    /// # Errors
    /// - `MissingParameter` when a required parameter is absent.
    fn log_likelihood_ratio(&mut self, parameters: &ParameterMap) -> LikelihoodResult<f64>;

    /// `−⟨d|d⟩/2` summed over the network.
    fn noise_log_likelihood(&self) -> f64;

    /// Always exactly `log_likelihood_ratio + noise_log_likelihood`.
    fn log_likelihood(&mut self, parameters: &ParameterMap) -> LikelihoodResult<f64> {
        Ok(self.log_likelihood_ratio(parameters)? + self.noise_log_likelihood())
    }
}

/// Inner products summed over the detector network.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkSnrs {
    pub d_inner_h: Complex64,
    pub optimal_snr_squared: f64,
    pub d_inner_h_tc_array: Option<Array1<Complex64>>,
}

impl Default for NetworkSnrs {
    fn default() -> Self {
        Self {
            d_inner_h: Complex64::new(0.0, 0.0),
            optimal_snr_squared: 0.0,
            d_inner_h_tc_array: None,
        }
    }
}

impl NetworkSnrs {
    /// Add one detector's contribution.
    pub fn accumulate(&mut self, snrs: crate::core::snr::CalculatedSnrs) {
        self.d_inner_h += snrs.d_inner_h;
        self.optimal_snr_squared += snrs.optimal_snr_squared;
        if let Some(tc) = snrs.d_inner_h_tc_array {
            self.d_inner_h_tc_array = Some(match self.d_inner_h_tc_array.take() {
                Some(acc) if acc.len() == tc.len() => acc + &tc,
                _ => tc,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::snr::CalculatedSnrs;
    use ndarray::array;

    #[test]
    fn network_sums_detector_contributions() {
        let mut net = NetworkSnrs::default();
        net.accumulate(
            CalculatedSnrs::new(Complex64::new(1.0, 2.0), 3.0)
                .with_time_series(array![Complex64::new(1.0, 0.0), Complex64::new(0.0, 1.0)]),
        );
        net.accumulate(
            CalculatedSnrs::new(Complex64::new(0.5, -1.0), 4.0)
                .with_time_series(array![Complex64::new(2.0, 0.0), Complex64::new(0.0, 2.0)]),
        );
        assert_eq!(net.d_inner_h, Complex64::new(1.5, 1.0));
        assert_eq!(net.optimal_snr_squared, 7.0);
        assert_eq!(
            net.d_inner_h_tc_array.unwrap(),
            array![Complex64::new(3.0, 0.0), Complex64::new(0.0, 3.0)]
        );
    }
}
