//! Validity window of a reduced-order-quadrature basis.
//!
//! A basis is certified for a frequency band, a segment length and a mass
//! range. The window is read from a small whitespace table
//!
//! ```text
//! flow fhigh seglen chirpmassmin chirpmassmax compmin
//! 20   1024  4      12.3         45           7.9
//! ```
//!
//! and rescaled by a scale factor `s`: frequencies multiply by `s`, the
//! segment length and masses divide by `s`.
use crate::core::detector::Detector;
use crate::core::params;
use crate::core::priors::PriorDict;
use crate::roq::errors::{RoqError, RoqResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

const COLUMNS: [&str; 6] = ["flow", "fhigh", "seglen", "chirpmassmin", "chirpmassmax", "compmin"];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoqParams {
    pub flow: f64,
    pub fhigh: f64,
    pub seglen: f64,
    pub chirpmassmin: f64,
    pub chirpmassmax: f64,
    pub compmin: f64,
}

impl RoqParams {
    /// # Errors
    /// - `ParamsFile` if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> RoqResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| RoqError::ParamsFile {
            path: path.display().to_string(),
            text: e.to_string(),
        })?;
        Self::parse(&text).map_err(|reason| RoqError::ParamsFile {
            path: path.display().to_string(),
            text: reason,
        })
    }

    /// Parse a header line of column names followed by one line of values.
    /// Blank lines and `#` comments are skipped; column order is free.
    pub fn parse(text: &str) -> Result<Self, String> {
        let mut lines = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'));
        let header: Vec<&str> = lines.next().ok_or("missing header line")?.split_whitespace().collect();
        let values: Vec<f64> = lines
            .next()
            .ok_or("missing value line")?
            .split_whitespace()
            .map(|v| v.parse::<f64>().map_err(|e| format!("bad value '{v}': {e}")))
            .collect::<Result<_, _>>()?;
        if header.len() != values.len() {
            return Err(format!("{} columns but {} values", header.len(), values.len()));
        }
        let column = |name: &str| {
            header
                .iter()
                .position(|h| *h == name)
                .map(|i| values[i])
                .ok_or_else(|| format!("missing column '{name}'"))
        };
        let [flow, fhigh, seglen, chirpmassmin, chirpmassmax, compmin] = COLUMNS;
        Ok(Self {
            flow: column(flow)?,
            fhigh: column(fhigh)?,
            seglen: column(seglen)?,
            chirpmassmin: column(chirpmassmin)?,
            chirpmassmax: column(chirpmassmax)?,
            compmin: column(compmin)?,
        })
    }

    /// Window after applying `scale_factor`.
    pub fn scaled(&self, scale_factor: f64) -> Self {
        Self {
            flow: self.flow * scale_factor,
            fhigh: self.fhigh * scale_factor,
            seglen: self.seglen / scale_factor,
            chirpmassmin: self.chirpmassmin / scale_factor,
            chirpmassmax: self.chirpmassmax / scale_factor,
            compmin: self.compmin / scale_factor,
        }
    }

    /// Reject a detector band, segment or prior mass range outside the
    /// (already scaled) window.
    ///
    /// Mass bounds are read from the `chirp_mass`, `mass_1` and `mass_2`
    /// priors; absent priors are logged and skipped.
    ///
    /// # Errors
    /// - `ParamsRange` naming the first violated bound.
    pub fn check<D: Detector + ?Sized>(&self, detector: &D, priors: Option<&PriorDict>) -> RoqResult<()> {
        let range = |text: String| Err(RoqError::ParamsRange { text });
        if detector.maximum_frequency() > self.fhigh {
            return range(format!(
                "Requested maximum frequency {} larger than ROQ basis fhigh {}",
                detector.maximum_frequency(),
                self.fhigh
            ));
        }
        if detector.minimum_frequency() < self.flow {
            return range(format!(
                "Requested minimum frequency {} lower than ROQ basis flow {}",
                detector.minimum_frequency(),
                self.flow
            ));
        }
        if (detector.duration() - self.seglen).abs() > 1e-9 * self.seglen.abs().max(1.0) {
            return range(format!(
                "Requested duration {} differs from ROQ basis seglen {}",
                detector.duration(),
                self.seglen
            ));
        }

        let Some(priors) = priors else {
            tracing::warn!("Unable to check ROQ parameter bounds: no priors");
            return Ok(());
        };
        match priors.get(params::CHIRP_MASS) {
            Some(prior) => {
                if prior.minimum() < self.chirpmassmin {
                    return range(format!(
                        "Prior minimum chirp mass {} less than ROQ basis bound {}",
                        prior.minimum(),
                        self.chirpmassmin
                    ));
                }
                if prior.maximum() > self.chirpmassmax {
                    return range(format!(
                        "Prior maximum chirp mass {} greater than ROQ basis bound {}",
                        prior.maximum(),
                        self.chirpmassmax
                    ));
                }
            }
            None => tracing::warn!("Unable to check chirp mass ROQ bounds"),
        }
        let component_min = [params::MASS_1, params::MASS_2]
            .iter()
            .filter_map(|key| priors.get(key).map(|p| p.minimum()))
            .reduce(f64::min);
        match component_min {
            Some(m) if m < self.compmin => range(format!(
                "Prior minimum component mass {m} less than ROQ basis bound {}",
                self.compmin
            )),
            Some(_) => Ok(()),
            None => {
                tracing::warn!("Unable to check minimum component mass ROQ bounds");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::priors::Uniform;
    use crate::core::synthetic::{HANFORD_VERTEX, SyntheticInterferometer};

    // ---- Scope ----
    // Parsing of the window table, scaling, and each range check.

    const TABLE: &str = "# basis window\nflow fhigh seglen chirpmassmin chirpmassmax compmin\n20 1024 4 12.3 45 7.9\n";

    fn ifo(fmin: f64, fmax: f64, duration: f64) -> SyntheticInterferometer {
        SyntheticInterferometer::new("H1", HANFORD_VERTEX, 2048.0, duration, 0.0, fmin, fmax, 1.0)
    }

    #[test]
    fn parses_and_scales_window() {
        let p = RoqParams::parse(TABLE).unwrap();
        assert_eq!(p.fhigh, 1024.0);
        assert_eq!(p.compmin, 7.9);
        let s = p.scaled(2.0);
        assert_eq!((s.flow, s.fhigh, s.seglen, s.chirpmassmax), (40.0, 2048.0, 2.0, 22.5));
    }

    #[test]
    fn reordered_columns_and_missing_columns() {
        let p = RoqParams::parse("fhigh flow compmin seglen chirpmassmax chirpmassmin\n1 2 3 4 5 6").unwrap();
        assert_eq!((p.flow, p.fhigh, p.chirpmassmin), (2.0, 1.0, 6.0));
        assert!(RoqParams::parse("flow fhigh\n1 2").is_err());
    }

    #[test]
    fn unreadable_file_is_a_params_file_error() {
        let err = RoqParams::from_file(Path::new("/nonexistent/params.dat")).unwrap_err();
        assert!(matches!(err, RoqError::ParamsFile { .. }));
    }

    #[test]
    // Purpose
    // -------
    // Each bound of the window produces ParamsRange.
    //
    // Given
    // -----
    // - the table window; detectors with too-high fmax, too-low fmin, wrong
    //   duration; a chirp-mass prior reaching below the basis.
    //
    // Expect
    // ------
    // - ParamsRange in each case, Ok for a compliant setup.
    fn range_checks() {
        let p = RoqParams::parse(TABLE).unwrap();
        let is_range = |r: RoqResult<()>| matches!(r, Err(RoqError::ParamsRange { .. }));
        assert!(is_range(p.check(&ifo(20.0, 1500.0, 4.0), None)));
        assert!(is_range(p.check(&ifo(10.0, 1000.0, 4.0), None)));
        assert!(is_range(p.check(&ifo(20.0, 1000.0, 8.0), None)));

        let mut priors = PriorDict::new();
        priors.insert(params::CHIRP_MASS, Uniform::new(10.0, 40.0).unwrap());
        assert!(is_range(p.check(&ifo(20.0, 1000.0, 4.0), Some(&priors))));

        priors.insert(params::CHIRP_MASS, Uniform::new(15.0, 40.0).unwrap());
        priors.insert(params::MASS_1, Uniform::new(8.0, 80.0).unwrap());
        priors.insert(params::MASS_2, Uniform::new(5.0, 80.0).unwrap());
        assert!(is_range(p.check(&ifo(20.0, 1000.0, 4.0), Some(&priors))));

        priors.insert(params::MASS_2, Uniform::new(8.0, 80.0).unwrap());
        assert!(p.check(&ifo(20.0, 1000.0, 4.0), Some(&priors)).is_ok());
    }
}
