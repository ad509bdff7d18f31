//! Batch processing of an ordered frame set into a volume time series.

mod series;
mod sink;
mod source;

pub use series::{RetainedFrame, TimeSeries, VolumeSample, CONTAINERS};
pub use sink::{DiagnosticSink, DirectorySink, NullSink, BLUR_DIR, PROCESSED_DIR};
pub use source::{
    parse_frame_name, DirectorySource, FrameEntry, FrameSource, FRAME_EXTENSION,
    FRAME_TIMESTAMP_FORMAT,
};

use std::path::Path;

use crate::calibration::{Calibration, CalibrationError};
use crate::config::ConfigError;
use crate::detector::{Detection, MeniscusDetector};
use crate::roi::{Roi, RoiError};
use crate::volume::{NotFoundPolicy, VolumeMapper};

/// Fatal batch failure.
#[derive(Debug)]
pub enum BatchError {
    /// Frame source could not be listed.
    Listing {
        source_label: String,
        source: std::io::Error,
    },
    /// A container ROI does not fit a frame.
    Roi {
        container: usize,
        frame: String,
        source: RoiError,
    },
    Calibration(CalibrationError),
    Config(ConfigError),
    /// No frame was processed.
    NoFrames { source_label: String },
}

impl std::fmt::Display for BatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Listing {
                source_label,
                source,
            } => write!(f, "cannot list frames in {}: {}", source_label, source),
            Self::Roi {
                container,
                frame,
                source,
            } => write!(
                f,
                "container {} ROI invalid for frame {}: {}",
                container, frame, source
            ),
            Self::Calibration(e) => write!(f, "calibration error: {}", e),
            Self::Config(e) => write!(f, "{}", e),
            Self::NoFrames { source_label } => write!(
                f,
                "no processable frames in {} (expected YYYYMMDD-HHMMSS.jpg)",
                source_label
            ),
        }
    }
}

impl std::error::Error for BatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Listing { source, .. } => Some(source),
            Self::Roi { source, .. } => Some(source),
            Self::Calibration(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::NoFrames { .. } => None,
        }
    }
}

impl From<CalibrationError> for BatchError {
    fn from(e: CalibrationError) -> Self {
        Self::Calibration(e)
    }
}

impl From<ConfigError> for BatchError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Drives detection and volume mapping over every frame of a source.
#[derive(Debug, Clone)]
pub struct BatchProcessor {
    detector: MeniscusDetector,
    rois: [Roi; CONTAINERS],
    mappers: [VolumeMapper; CONTAINERS],
    not_found: NotFoundPolicy,
    retain_frames: bool,
}

impl BatchProcessor {
    /// Each container's mapper uses its ROI height as the full-scale span.
    pub fn new(
        detector: MeniscusDetector,
        rois: [Roi; CONTAINERS],
        calibration: &Calibration,
    ) -> Result<Self, BatchError> {
        let mappers = [
            VolumeMapper::new(calibration, rois[0].height)?,
            VolumeMapper::new(calibration, rois[1].height)?,
        ];
        Ok(Self {
            detector,
            rois,
            mappers,
            not_found: NotFoundPolicy::default(),
            retain_frames: false,
        })
    }

    pub fn with_not_found(mut self, policy: NotFoundPolicy) -> Self {
        self.not_found = policy;
        self
    }

    pub fn with_retain_frames(mut self, retain: bool) -> Self {
        self.retain_frames = retain;
        self
    }

    pub fn rois(&self) -> &[Roi; CONTAINERS] {
        &self.rois
    }

    /// Process every frame of `source` in listing order.
    ///
    /// Undecodable frames are skipped with a warning. A ROI that does not fit
    /// a frame aborts the run, as does an empty result.
    pub fn process<S, D>(&self, source: &S, sink: &mut D) -> Result<TimeSeries, BatchError>
    where
        S: FrameSource + ?Sized,
        D: DiagnosticSink + ?Sized,
    {
        let entries = source.entries().map_err(|e| BatchError::Listing {
            source_label: source.label(),
            source: e,
        })?;
        tracing::info!("{} frames listed in {}", entries.len(), source.label());

        let mut series = TimeSeries::default();
        let mut n_not_found = [0usize; CONTAINERS];
        for entry in &entries {
            let frame = match source.load(entry) {
                Ok(f) => f,
                Err(e) => {
                    tracing::warn!("skipping unreadable frame {}: {}", entry.name, e);
                    series.skipped_files.push(entry.name.clone());
                    continue;
                }
            };

            let mut detections: Vec<Detection> = Vec::with_capacity(CONTAINERS);
            for (i, roi) in self.rois.iter().enumerate() {
                let container = i + 1;
                let roi_err = |source| BatchError::Roi {
                    container,
                    frame: entry.name.clone(),
                    source,
                };
                let detection = if sink.wants_debug() {
                    let (d, dbg) = self
                        .detector
                        .detect_with_debug(roi, &frame)
                        .map_err(roi_err)?;
                    if let Err(e) = sink.record(container, &entry.name, &dbg) {
                        tracing::warn!(
                            "cannot write diagnostics for {} container {}: {}",
                            entry.name,
                            container,
                            e
                        );
                    }
                    d
                } else {
                    self.detector.detect(roi, &frame).map_err(roi_err)?
                };
                if detection.reading.is_not_found() {
                    n_not_found[i] += 1;
                }
                detections.push(detection);
            }

            let sample = VolumeSample {
                file_name: entry.name.clone(),
                timestamp: entry.timestamp,
                readings: [detections[0].reading, detections[1].reading],
                heights: [detections[0].height_px, detections[1].height_px],
                meniscus_rows: [
                    detections[0].meniscus_row(&self.rois[0]),
                    detections[1].meniscus_row(&self.rois[1]),
                ],
                volumes: [
                    self.mappers[0].map_reading(detections[0].reading, self.not_found),
                    self.mappers[1].map_reading(detections[1].reading, self.not_found),
                ],
            };
            tracing::debug!(
                "{}: heights {:?} volumes {:?}",
                sample.file_name,
                sample.heights,
                sample.volumes
            );
            series.samples.push(sample);
            if self.retain_frames {
                series.frames.push(RetainedFrame {
                    file_name: entry.name.clone(),
                    image: frame,
                });
            }
        }

        if series.is_empty() {
            return Err(BatchError::NoFrames {
                source_label: source.label(),
            });
        }
        for (i, &n) in n_not_found.iter().enumerate() {
            if n > 0 {
                tracing::warn!(
                    "container {}: no meniscus in {}/{} frames",
                    i + 1,
                    n,
                    series.len()
                );
            }
        }
        tracing::info!(
            "processed {} frames ({} skipped)",
            series.len(),
            series.skipped_files.len()
        );
        Ok(series)
    }
}

/// Process a frame directory with the default detector and no diagnostics.
pub fn process(
    frames_dir: &Path,
    roi1: Roi,
    roi2: Roi,
    calibration: &Calibration,
) -> Result<TimeSeries, BatchError> {
    let processor = BatchProcessor::new(MeniscusDetector::default(), [roi1, roi2], calibration)?;
    processor.process(&DirectorySource::new(frames_dir), &mut NullSink)
}
