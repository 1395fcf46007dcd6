//! Construction-time configuration for the likelihoods.
//!
//! Options are plain structs with validated constructors and `Default`
//! impls; everything that can be wrong about them is reported once, at
//! construction, as a [`LikelihoodError`].
use crate::core::frames::{ReferenceFrame, TimeReference};
use crate::likelihood::errors::{LikelihoodError, LikelihoodResult};
use crate::marginalization::distance::DistanceLookupCache;
use std::path::PathBuf;

/// Default file name of the distance-marginalization cache.
pub const DEFAULT_LOOKUP_TABLE_FILE: &str = ".distance_marginalization_lookup.bin";

/// Which nuisance parameters are integrated out analytically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MarginalizationFlags {
    pub time: bool,
    pub distance: bool,
    pub phase: bool,
}

impl MarginalizationFlags {
    pub fn new(time: bool, distance: bool, phase: bool) -> Self {
        Self { time, distance, phase }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn any(&self) -> bool {
        self.time || self.distance || self.phase
    }
}

/// Where the distance lookup table comes from and where it is persisted.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LookupTableSource {
    /// Load/store [`DEFAULT_LOOKUP_TABLE_FILE`] in the working directory.
    #[default]
    DefaultFile,
    /// Load/store the given path.
    File(PathBuf),
    /// Use a table already in memory if its keys match, else rebuild without
    /// touching the filesystem.
    InMemory(Box<DistanceLookupCache>),
    /// Always rebuild, never persist.
    NoCache,
}

impl LookupTableSource {
    pub fn path(&self) -> Option<PathBuf> {
        match self {
            LookupTableSource::DefaultFile => Some(PathBuf::from(DEFAULT_LOOKUP_TABLE_FILE)),
            LookupTableSource::File(path) => Some(path.clone()),
            _ => None,
        }
    }
}

/// Shape and provenance of the distance lookup table.
///
/// Default: 10 000 distance samples and a 400 × 800 table over
/// `(⟨h|h⟩_ref, ⟨d|h⟩_ref)`.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceTableOptions {
    pub n_distance: usize,
    pub n_snr_squared: usize,
    pub n_d_inner_h: usize,
    pub source: LookupTableSource,
}

impl DistanceTableOptions {
    /// # Errors
    /// - `InvalidOption` if any grid has fewer than 4 points (bicubic needs a
    ///   4 × 4 stencil) or `n_d_inner_h` is odd (it is split evenly between
    ///   negative and positive matched-filter SNRs).
    pub fn new(
        n_distance: usize, n_snr_squared: usize, n_d_inner_h: usize, source: LookupTableSource,
    ) -> LikelihoodResult<Self> {
        for (name, n) in [
            ("n_distance", n_distance),
            ("n_snr_squared", n_snr_squared),
            ("n_d_inner_h", n_d_inner_h),
        ] {
            if n < 4 {
                return Err(LikelihoodError::InvalidOption {
                    name,
                    value: n as f64,
                    reason: "Grids need at least 4 points.",
                });
            }
        }
        if n_d_inner_h % 2 != 0 {
            return Err(LikelihoodError::InvalidOption {
                name: "n_d_inner_h",
                value: n_d_inner_h as f64,
                reason: "Must be even.",
            });
        }
        Ok(Self { n_distance, n_snr_squared, n_d_inner_h, source })
    }
}

impl Default for DistanceTableOptions {
    fn default() -> Self {
        Self {
            n_distance: 10_000,
            n_snr_squared: 400,
            n_d_inner_h: 800,
            source: LookupTableSource::DefaultFile,
        }
    }
}

/// Options of the base transient likelihood.
///
/// Default: no marginalization, time jitter on (only used together with
/// time marginalization), sky frame, geocentric time reference.
#[derive(Debug, Clone, PartialEq)]
pub struct LikelihoodOptions {
    pub flags: MarginalizationFlags,
    pub jitter_time: bool,
    pub reference_frame: ReferenceFrame,
    pub time_reference: TimeReference,
    pub distance_table: DistanceTableOptions,
}

impl LikelihoodOptions {
    pub fn with_flags(mut self, flags: MarginalizationFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_jitter_time(mut self, jitter_time: bool) -> Self {
        self.jitter_time = jitter_time;
        self
    }

    pub fn with_reference_frame(mut self, frame: ReferenceFrame) -> Self {
        self.reference_frame = frame;
        self
    }

    pub fn with_time_reference(mut self, time_reference: TimeReference) -> Self {
        self.time_reference = time_reference;
        self
    }

    pub fn with_distance_table(mut self, table: DistanceTableOptions) -> Self {
        self.distance_table = table;
        self
    }
}

impl Default for LikelihoodOptions {
    fn default() -> Self {
        Self {
            flags: MarginalizationFlags::none(),
            jitter_time: true,
            reference_frame: ReferenceFrame::Sky,
            time_reference: TimeReference::Geocenter,
            distance_table: DistanceTableOptions::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Distance-table shapes are validated.
    //
    // Given
    // -----
    // - a 3-point grid, an odd d_inner_h grid, a valid small grid.
    //
    // Expect
    // ------
    // - InvalidOption, InvalidOption, Ok.
    fn distance_table_options_are_validated() {
        assert!(matches!(
            DistanceTableOptions::new(3, 10, 10, LookupTableSource::NoCache),
            Err(LikelihoodError::InvalidOption { name: "n_distance", .. })
        ));
        assert!(matches!(
            DistanceTableOptions::new(100, 10, 11, LookupTableSource::NoCache),
            Err(LikelihoodError::InvalidOption { name: "n_d_inner_h", .. })
        ));
        assert!(DistanceTableOptions::new(100, 10, 10, LookupTableSource::NoCache).is_ok());
    }

    #[test]
    fn default_source_points_at_default_file() {
        let opts = LikelihoodOptions::default();
        assert_eq!(opts.distance_table.source.path(), Some(PathBuf::from(DEFAULT_LOOKUP_TABLE_FILE)));
        assert!(!opts.flags.any());
        assert!(opts.jitter_time);
    }
}
