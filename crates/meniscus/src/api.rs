//! High-level tracking API.
//!
//! [`VolumeTracker`] is the primary entry point: it wraps calibration, the two
//! container ROIs and a [`PipelineConfig`], and turns a frame set into raw and
//! cleaned volume series in one call.

use std::path::Path;

use crate::batch::{
    BatchError, BatchProcessor, DiagnosticSink, DirectorySource, FrameSource, NullSink,
    TimeSeries, CONTAINERS,
};
use crate::calibration::Calibration;
use crate::clean::{CleanReport, SeriesCleaner};
use crate::config::PipelineConfig;
use crate::detector::MeniscusDetector;
use crate::roi::Roi;

/// Output of one tracking run.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TrackingResult {
    pub rois: [Roi; CONTAINERS],
    pub calibration: Calibration,
    /// Series straight from detection and mapping.
    pub raw: TimeSeries,
    /// Series after outlier removal and interpolation. Holds the retained
    /// frames, if any.
    pub cleaned: TimeSeries,
    pub cleaning: [CleanReport; CONTAINERS],
}

/// Primary tracking interface.
///
/// Create once, run on any number of frame sets.
///
/// # Examples
///
/// ```no_run
/// use meniscus::{Calibration, Roi, VolumeTracker};
/// use std::path::Path;
///
/// let cal = Calibration::from_file(Path::new("calibration.txt")).unwrap();
/// let rois = ["120,40,60,300".parse::<Roi>().unwrap(), "320,40,60,300".parse().unwrap()];
/// let tracker = VolumeTracker::new(rois, cal).unwrap();
/// let result = tracker.track_dir(Path::new("frames")).unwrap();
/// println!("{} samples", result.cleaned.len());
/// ```
#[derive(Debug, Clone)]
pub struct VolumeTracker {
    rois: [Roi; CONTAINERS],
    calibration: Calibration,
    config: PipelineConfig,
    processor: BatchProcessor,
    cleaner: SeriesCleaner,
}

impl VolumeTracker {
    /// Tracker with the default pipeline configuration.
    pub fn new(rois: [Roi; CONTAINERS], calibration: Calibration) -> Result<Self, BatchError> {
        Self::with_config(rois, calibration, PipelineConfig::default())
    }

    /// Tracker with an explicit configuration. Validates everything up front.
    pub fn with_config(
        rois: [Roi; CONTAINERS],
        calibration: Calibration,
        config: PipelineConfig,
    ) -> Result<Self, BatchError> {
        config.validate()?;
        let processor = BatchProcessor::new(
            MeniscusDetector::new(config.detector.clone()),
            rois,
            &calibration,
        )?
        .with_not_found(config.not_found)
        .with_retain_frames(config.retain_frames);
        Ok(Self {
            rois,
            calibration,
            cleaner: SeriesCleaner::new(config.cleaner.clone()),
            processor,
            config,
        })
    }

    /// Load calibration (and optionally a JSON config) from disk.
    pub fn from_files(
        rois: [Roi; CONTAINERS],
        calibration_path: &Path,
        config_path: Option<&Path>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let calibration = Calibration::from_file(calibration_path)?;
        let config = match config_path {
            Some(p) => PipelineConfig::from_json_file(p)?,
            None => PipelineConfig::default(),
        };
        Ok(Self::with_config(rois, calibration, config)?)
    }

    pub fn rois(&self) -> &[Roi; CONTAINERS] {
        &self.rois
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Process and clean a frame directory without diagnostics.
    pub fn track_dir(&self, frames_dir: &Path) -> Result<TrackingResult, BatchError> {
        self.track(&DirectorySource::new(frames_dir), &mut NullSink)
    }

    /// Process and clean frames from any source, sending diagnostics to `sink`.
    pub fn track<S, D>(&self, source: &S, sink: &mut D) -> Result<TrackingResult, BatchError>
    where
        S: FrameSource + ?Sized,
        D: DiagnosticSink + ?Sized,
    {
        let (raw, cleaned, cleaning) = self
            .processor
            .process(source, sink)?
            .into_cleaned(&self.cleaner);
        let filled: usize = cleaning.iter().map(|r| r.n_filled).sum();
        let missing: usize = cleaning.iter().map(|r| r.n_unfilled).sum();
        tracing::info!(
            "cleaned {} samples: {} values interpolated, {} left missing",
            cleaned.len(),
            filled,
            missing
        );
        Ok(TrackingResult {
            rois: self.rois,
            calibration: self.calibration.clone(),
            raw,
            cleaned,
            cleaning,
        })
    }
}
