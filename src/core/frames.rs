//! Sky reference frames and time references.
//!
//! Samplers may explore the sky either directly in `(ra, dec)` or in
//! `(zenith, azimuth)` measured about the baseline joining two detectors,
//! and may parameterize arrival time at the geocentre or at one detector.
//! [`SkyFrame`] resolves both choices against a detector network and maps a
//! caller's parameters to the `(ra, dec, geocent_time)` the projection uses.
use crate::core::detector::Detector;
use crate::core::params::{self, ParameterMap};
use crate::likelihood::errors::{LikelihoodError, LikelihoodResult};
use std::f64::consts::PI;
use std::str::FromStr;

/// GPS epoch expressed in Unix seconds.
const GPS_EPOCH_UNIX: f64 = 315_964_800.0;
/// GPS − UTC offset valid since 2017-01-01.
const GPS_UTC_LEAP_SECONDS: f64 = 18.0;

/// How sky position is parameterized.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReferenceFrame {
    #[default]
    Sky,
    /// Zenith/azimuth about the baseline from the first to the second detector.
    Detectors(String, String),
}

impl ReferenceFrame {
    /// Build from a list of exactly two detector names.
    ///
    /// # Errors
    /// - `InvalidReferenceFrame` for any other length.
    pub fn from_detector_names(names: &[&str]) -> LikelihoodResult<Self> {
        match names {
            [a, b] => Ok(ReferenceFrame::Detectors(a.to_string(), b.to_string())),
            _ => Err(LikelihoodError::InvalidReferenceFrame { text: names.join(",") }),
        }
    }
}

impl FromStr for ReferenceFrame {
    type Err = LikelihoodError;

    /// Accepts `"sky"` (case-insensitive) or a concatenation of two
    /// two-character detector names such as `"H1L1"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("sky") {
            return Ok(ReferenceFrame::Sky);
        }
        if s.len() == 4 && s.is_ascii() {
            return Ok(ReferenceFrame::Detectors(s[..2].to_string(), s[2..].to_string()));
        }
        Err(LikelihoodError::InvalidReferenceFrame { text: s.to_string() })
    }
}

/// Where the arrival-time parameter is measured.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TimeReference {
    #[default]
    Geocenter,
    Detector(String),
}

impl TimeReference {
    /// Name of the sampled time parameter, e.g. `geocent_time` or `H1_time`.
    pub fn time_parameter(&self) -> String {
        match self {
            TimeReference::Geocenter => params::GEOCENT_TIME.to_string(),
            TimeReference::Detector(name) => format!("{name}_time"),
        }
    }

    pub fn is_geocenter(&self) -> bool {
        matches!(self, TimeReference::Geocenter)
    }
}

impl FromStr for TimeReference {
    type Err = LikelihoodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("geocent") || s.eq_ignore_ascii_case("geocenter") {
            Ok(TimeReference::Geocenter)
        } else if s.is_empty() {
            Err(LikelihoodError::UnknownDetector { name: String::new() })
        } else {
            Ok(TimeReference::Detector(s.to_string()))
        }
    }
}

/// Reference frame and time reference resolved against a detector network.
#[derive(Debug, Clone, PartialEq)]
pub struct SkyFrame {
    baseline: Option<[[f64; 3]; 2]>,
    reference_index: Option<usize>,
    time_reference: TimeReference,
}

impl SkyFrame {
    /// # Errors
    /// - `UnknownDetector` if a named detector is not in `detectors`.
    pub fn resolve<D: Detector>(
        frame: &ReferenceFrame, time_reference: &TimeReference, detectors: &[D],
    ) -> LikelihoodResult<Self> {
        let find = |name: &str| {
            detectors
                .iter()
                .position(|d| d.name() == name)
                .ok_or_else(|| LikelihoodError::UnknownDetector { name: name.to_string() })
        };
        let baseline = match frame {
            ReferenceFrame::Sky => None,
            ReferenceFrame::Detectors(a, b) => {
                Some([detectors[find(a)?].vertex(), detectors[find(b)?].vertex()])
            }
        };
        let reference_index = match time_reference {
            TimeReference::Geocenter => None,
            TimeReference::Detector(name) => Some(find(name)?),
        };
        Ok(Self { baseline, reference_index, time_reference: time_reference.clone() })
    }

    pub fn time_reference(&self) -> &TimeReference {
        &self.time_reference
    }

    /// Return `parameters` extended with `ra`, `dec` and `geocent_time` in
    /// the geocentric sky frame.
    ///
    /// # Errors
    /// - `MissingParameter` if the sampled sky or time parameters are absent.
    pub fn to_sky_frame<D: Detector>(
        &self, parameters: &ParameterMap, detectors: &[D],
    ) -> LikelihoodResult<ParameterMap> {
        let time = params::require(parameters, &self.time_reference.time_parameter())?;
        let (ra, dec) = match &self.baseline {
            None => (
                params::require(parameters, params::RA)?,
                params::require(parameters, params::DEC)?,
            ),
            Some([v0, v1]) => zenith_azimuth_to_ra_dec(
                params::require(parameters, params::ZENITH)?,
                params::require(parameters, params::AZIMUTH)?,
                time,
                v0,
                v1,
            ),
        };
        let geocent_time = match self.reference_index {
            None => time,
            Some(i) => time - detectors[i].time_delay_from_geocenter(ra, dec, time),
        };
        let mut out = parameters.clone();
        out.insert(params::RA.to_string(), ra);
        out.insert(params::DEC.to_string(), dec);
        out.insert(params::GEOCENT_TIME.to_string(), geocent_time);
        Ok(out)
    }
}

/// Greenwich mean sidereal time in radians for a GPS time.
pub fn greenwich_mean_sidereal_time(gps_time: f64) -> f64 {
    let unix = gps_time + GPS_EPOCH_UNIX - GPS_UTC_LEAP_SECONDS;
    let julian_day = unix / 86_400.0 + 2_440_587.5;
    let degrees = 280.460_618_37 + 360.985_647_366_29 * (julian_day - 2_451_545.0);
    degrees.rem_euclid(360.0).to_radians()
}

/// Convert zenith/azimuth about the `v0 → v1` detector baseline to `(ra, dec)`.
///
/// The zenith axis is the baseline direction; azimuth is measured from the
/// projection of the Earth's rotation axis onto the plane normal to it.
pub fn zenith_azimuth_to_ra_dec(
    zenith: f64, azimuth: f64, gps_time: f64, v0: &[f64; 3], v1: &[f64; 3],
) -> (f64, f64) {
    let z = normalize([v0[0] - v1[0], v0[1] - v1[1], v0[2] - v1[2]]);
    let pole = if z[2].abs() > 1.0 - 1e-12 { [1.0, 0.0, 0.0] } else { [0.0, 0.0, 1.0] };
    let x = normalize(cross(cross(z, pole), z));
    let y = cross(z, x);
    let (sz, cz) = zenith.sin_cos();
    let (sa, ca) = azimuth.sin_cos();
    let omega: [f64; 3] =
        std::array::from_fn(|i| sz * ca * x[i] + sz * sa * y[i] + cz * z[i]);
    let dec = omega[2].clamp(-1.0, 1.0).asin();
    let ra = (omega[1].atan2(omega[0]) + greenwich_mean_sidereal_time(gps_time)).rem_euclid(2.0 * PI);
    (ra, dec)
}

fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[1] * b[2] - a[2] * b[1], a[2] * b[0] - a[0] * b[2], a[0] * b[1] - a[1] * b[0]]
}

fn normalize(v: [f64; 3]) -> [f64; 3] {
    let n = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if n > 0.0 { [v[0] / n, v[1] / n, v[2] / n] } else { [0.0, 0.0, 1.0] }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ---- Scope ----
    // Covers parsing of frame/time-reference strings and geometric sanity of
    // the zenith/azimuth conversion. Detector-based time conversion is
    // covered by the likelihood tests.

    #[test]
    // Purpose
    // -------
    // Accepted and rejected reference-frame specifications.
    //
    // Given
    // -----
    // - "sky", "H1L1", ["H1", "V1"], "H1L1V1", ["H1"].
    //
    // Expect
    // ------
    // - Sky, Detectors(H1, L1), Detectors(H1, V1), Err, Err.
    fn reference_frame_parsing() {
        assert_eq!("SKY".parse::<ReferenceFrame>(), Ok(ReferenceFrame::Sky));
        assert_eq!(
            "H1L1".parse::<ReferenceFrame>(),
            Ok(ReferenceFrame::Detectors("H1".into(), "L1".into()))
        );
        assert_eq!(
            ReferenceFrame::from_detector_names(&["H1", "V1"]),
            Ok(ReferenceFrame::Detectors("H1".into(), "V1".into()))
        );
        assert!(matches!(
            "H1L1V1".parse::<ReferenceFrame>(),
            Err(LikelihoodError::InvalidReferenceFrame { .. })
        ));
        assert!(ReferenceFrame::from_detector_names(&["H1"]).is_err());
    }

    #[test]
    fn time_reference_names_time_parameter() {
        assert_eq!("geocent".parse::<TimeReference>().unwrap().time_parameter(), "geocent_time");
        assert_eq!("L1".parse::<TimeReference>().unwrap().time_parameter(), "L1_time");
    }

    #[test]
    // Purpose
    // -------
    // Zenith zero points along the baseline.
    //
    // Given
    // -----
    // - a baseline along the Earth's rotation axis (v0 − v1 ∝ +z).
    //
    // Expect
    // ------
    // - dec = +π/2 for zenith 0 and −π/2 for zenith π.
    fn zenith_axis_is_the_baseline() {
        let v0 = [0.0, 0.0, 1.0e6];
        let v1 = [0.0, 0.0, -1.0e6];
        let (_, dec) = zenith_azimuth_to_ra_dec(0.0, 0.3, 1e9, &v0, &v1);
        assert!((dec - PI / 2.0).abs() < 1e-9);
        let (_, dec) = zenith_azimuth_to_ra_dec(PI, 0.3, 1e9, &v0, &v1);
        assert!((dec + PI / 2.0).abs() < 1e-9);
    }

    #[test]
    fn gmst_is_an_angle() {
        let g = greenwich_mean_sidereal_time(1_126_259_642.413);
        assert!((0.0..2.0 * PI).contains(&g));
    }
}
