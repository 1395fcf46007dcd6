//! The relative-binning [`SnrProvider`].
//!
//! Owns the bin edges and, once a fiducial waveform is set, its detector
//! responses at the edges and the summary data of every detector. Templates
//! are only evaluated at the bin edges.
use crate::core::detector::Detector;
use crate::core::params::ParameterMap;
use crate::core::snr::{CalculatedSnrs, SegmentTiming, SnrProvider, TimeShiftTransform};
use crate::core::waveform::{FrequencyDomainModel, Polarizations};
use crate::likelihood::errors::{LikelihoodError, LikelihoodResult};
use crate::relative_binning::bins::BinEdges;
use crate::relative_binning::summary::{SummaryData, ratio_coefficients, relative_ratio};
use ndarray::{Array1, ArrayView1};
use num_complex::Complex64;
use std::collections::BTreeMap;

/// Fiducial state of one detector.
#[derive(Debug, Clone, PartialEq)]
pub struct FiducialDetector {
    /// Detector response to the fiducial waveform at the bin edges.
    pub edge_response: Array1<Complex64>,
    pub summary: SummaryData,
}

/// The waveform the summary data are built around.
#[derive(Debug, Clone, PartialEq)]
pub struct Fiducial {
    pub parameters: ParameterMap,
    pub detectors: BTreeMap<String, FiducialDetector>,
}

#[derive(Debug, Clone)]
pub struct RelativeBinningSnr<'a, W> {
    generator: &'a W,
    bins: Option<BinEdges>,
    fiducial: Option<Fiducial>,
}

impl<'a, W: FrequencyDomainModel> RelativeBinningSnr<'a, W> {
    pub fn new(generator: &'a W) -> Self {
        Self { generator, bins: None, fiducial: None }
    }

    pub fn generator(&self) -> &'a W {
        self.generator
    }

    pub fn bins(&self) -> Option<&BinEdges> {
        self.bins.as_ref()
    }

    /// Replacing the bins invalidates the fiducial.
    pub fn set_bins(&mut self, bins: BinEdges) {
        self.bins = Some(bins);
        self.fiducial = None;
    }

    pub fn fiducial(&self) -> Option<&Fiducial> {
        self.fiducial.as_ref()
    }

    pub(crate) fn fiducial_mut(&mut self) -> Option<&mut Fiducial> {
        self.fiducial.as_mut()
    }

    /// Evaluate the fiducial waveform at `parameters` (already in the sky
    /// frame) and rebuild every detector's summary data.
    ///
    /// # Errors
    /// - `FiducialWaveform` before the bins are set or when the model has no
    ///   signal at `parameters`.
    /// - `MissingParameter`, `ShapeMismatch` from the detector projection.
    pub fn set_fiducial<D: Detector>(
        &mut self, detectors: &[D], parameters: &ParameterMap,
    ) -> LikelihoodResult<()> {
        let bins = self
            .bins
            .as_ref()
            .ok_or(LikelihoodError::FiducialWaveform { reason: "bins are not set up" })?;
        let native = self.generator.frequency_domain_strain(parameters).ok_or(
            LikelihoodError::FiducialWaveform { reason: "no signal at the fiducial parameters" },
        )?;
        let at_edges = self
            .generator
            .frequency_domain_strain_at(parameters, bins.frequencies())
            .ok_or(LikelihoodError::FiducialWaveform {
                reason: "no signal at the fiducial parameters",
            })?;

        let mut per_detector = BTreeMap::new();
        for det in detectors {
            let response = det.detector_response(&native, parameters)?;
            let summary = SummaryData::compute(det, response.view(), bins);
            let edge_response = det.detector_response_at(&at_edges, parameters, bins.frequencies())?;
            per_detector.insert(det.name().to_string(), FiducialDetector { edge_response, summary });
        }
        self.fiducial = Some(Fiducial { parameters: parameters.clone(), detectors: per_detector });
        Ok(())
    }
}

impl<'a, D, W> SnrProvider<D> for RelativeBinningSnr<'a, W>
where
    D: Detector,
    W: FrequencyDomainModel,
{
    /// Polarizations at the bin edges.
    type Waveform = Polarizations;

    fn timing(&self) -> SegmentTiming {
        SegmentTiming::of(self.generator)
    }

    fn waveform(&self, parameters: &ParameterMap) -> Option<Polarizations> {
        let bins = self.bins.as_ref()?;
        self.generator.frequency_domain_strain_at(parameters, bins.frequencies())
    }

    fn calculate_snrs(
        &self, waveform: &Polarizations, detector: &D, parameters: &ParameterMap,
        _time_shift: Option<&TimeShiftTransform>,
    ) -> LikelihoodResult<Option<CalculatedSnrs>> {
        let (Some(bins), Some(fiducial)) = (self.bins.as_ref(), self.fiducial.as_ref()) else {
            return Err(LikelihoodError::FiducialWaveform { reason: "fiducial waveform not established" });
        };
        let reference = fiducial.detectors.get(detector.name()).ok_or_else(|| {
            LikelihoodError::UnknownDetector { name: detector.name().to_string() }
        })?;
        let response = detector.detector_response_at(waveform, parameters, bins.frequencies())?;
        let (d_inner_h, optimal_snr_squared) =
            binned_inner_products(response.view(), reference, bins.frequencies());
        Ok(Some(CalculatedSnrs::new(d_inner_h, optimal_snr_squared)))
    }

    fn rescale_waveform(&self, waveform: &Polarizations, factor: f64) -> Polarizations {
        waveform.scaled(factor)
    }
}

fn binned_inner_products(
    response: ArrayView1<Complex64>, reference: &FiducialDetector, edges: ArrayView1<f64>,
) -> (Complex64, f64) {
    let r = relative_ratio(response, reference.edge_response.view());
    let (r0, r1) = ratio_coefficients(r.view(), edges);
    reference.summary.inner_products(r0.view(), r1.view())
}
