//! meniscus: liquid volume tracking from timestamped container photographs.
//!
//! Two containers are photographed over time. For each frame and each
//! container ROI the liquid surface is located, its pixel height converted to
//! a volume through a calibration, and the resulting series cleaned of
//! outliers. The stages are:
//!
//! 1. **Detect**: crop → grayscale → threshold/smooth → median-anchored Canny
//!    → external contours → wide-contour selection.
//! 2. **Map**: linear height → volume for cylindrical containers.
//! 3. **Batch**: filename-ordered frames → per-container time series.
//! 4. **Clean**: ceiling mask, z-score mask, linear gap interpolation.
//!
//! # Public API
//! - [`VolumeTracker`] as the primary entry point
//! - [`MeniscusDetector`], [`VolumeMapper`], [`BatchProcessor`] and
//!   [`SeriesCleaner`] for running stages individually
//! - [`PipelineConfig`] and the per-stage configs for tuning
//! - CSV/JSON writers and frame annotation for handing results on

mod annotate;
mod api;
mod batch;
mod calibration;
mod clean;
mod config;
mod detector;
mod output;
mod roi;
mod volume;

#[cfg(test)]
mod test_utils;

pub use annotate::{annotate_frame, write_annotated_frames, MENISCUS_COLOR, ROI_COLOR};
pub use api::{TrackingResult, VolumeTracker};
pub use batch::{
    parse_frame_name, process, BatchError, BatchProcessor, DiagnosticSink, DirectorySink,
    DirectorySource, FrameEntry, FrameSource, NullSink, RetainedFrame, TimeSeries, VolumeSample,
    BLUR_DIR, CONTAINERS, FRAME_EXTENSION, FRAME_TIMESTAMP_FORMAT, PROCESSED_DIR,
};
pub use calibration::{Calibration, CalibrationError, ContainerShape};
pub use clean::{
    CleanReport, CleanerConfig, SeriesCleaner, StatisticsBasis, DEFAULT_Z_THRESHOLD,
    LEGACY_PLAUSIBLE_CEILING,
};
pub use config::{ConfigError, PipelineConfig, CONFIG_SCHEMA_V1};
pub use detector::{
    BlurKernel, BoundingBox, ContourStats, Detection, DetectionDebug, DetectorConfig,
    EdgeThresholds, MeniscusDetector, MeniscusReading, PreprocessMode, TieBreak,
    THRESHOLD_LEVEL_RANGE,
};
pub use output::{
    write_csv, write_csv_file, write_json_file, OutputError, CSV_HEADER, CSV_TIMESTAMP_FORMAT,
    DEFAULT_CSV_NAME,
};
pub use roi::{Roi, RoiError};
pub use volume::{height_to_volume, NotFoundPolicy, VolumeMapper};
