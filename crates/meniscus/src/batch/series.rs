//! Per-frame volume samples and the assembled series.

use chrono::NaiveDateTime;
use image::RgbImage;

use crate::clean::{CleanReport, SeriesCleaner};
use crate::detector::MeniscusReading;

/// Number of tracked containers.
pub const CONTAINERS: usize = 2;

/// Measurements of both containers in one frame.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VolumeSample {
    pub file_name: String,
    pub timestamp: NaiveDateTime,
    pub readings: [MeniscusReading; CONTAINERS],
    /// Scalar heights (`0` when not found).
    pub heights: [u32; CONTAINERS],
    /// Detected meniscus row in frame coordinates.
    pub meniscus_rows: [Option<u32>; CONTAINERS],
    /// `None` marks a gap.
    pub volumes: [Option<f64>; CONTAINERS],
}

impl VolumeSample {
    /// Sum of both volumes; missing when either part is.
    pub fn total_volume(&self) -> Option<f64> {
        Some(self.volumes[0]? + self.volumes[1]?)
    }
}

/// Decoded frame kept for annotation.
#[derive(Debug, Clone)]
pub struct RetainedFrame {
    pub file_name: String,
    pub image: RgbImage,
}

/// Chronologically ordered samples of one batch run.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct TimeSeries {
    pub samples: Vec<VolumeSample>,
    /// Frames that matched the naming scheme but failed to decode.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_files: Vec<String>,
    /// Present only when frame retention was requested; index-aligned with
    /// `samples`.
    #[serde(skip)]
    pub frames: Vec<RetainedFrame>,
}

impl TimeSeries {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn timestamps(&self) -> Vec<NaiveDateTime> {
        self.samples.iter().map(|s| s.timestamp).collect()
    }

    /// Volume column of one container (0-based index).
    pub fn volume_column(&self, container: usize) -> Vec<Option<f64>> {
        self.samples.iter().map(|s| s.volumes[container]).collect()
    }

    pub fn height_column(&self, container: usize) -> Vec<u32> {
        self.samples.iter().map(|s| s.heights[container]).collect()
    }

    /// Clean each container's volume column independently.
    ///
    /// Heights and readings are carried over unchanged. Retained frames are
    /// not copied; see [`TimeSeries::into_cleaned`] to move them across.
    pub fn cleaned(&self, cleaner: &SeriesCleaner) -> (TimeSeries, [CleanReport; CONTAINERS]) {
        let mut out = TimeSeries {
            samples: self.samples.clone(),
            skipped_files: self.skipped_files.clone(),
            frames: Vec::new(),
        };
        let mut reports: [CleanReport; CONTAINERS] = Default::default();
        for (c, report) in reports.iter_mut().enumerate() {
            let (column, r) = cleaner.clean(&self.volume_column(c));
            for (sample, v) in out.samples.iter_mut().zip(column) {
                sample.volumes[c] = v;
            }
            tracing::debug!(
                "container {}: {} above ceiling, {} outliers, {} filled, {} missing",
                c + 1,
                r.n_above_ceiling,
                r.n_outliers,
                r.n_filled,
                r.n_unfilled
            );
            *report = r;
        }
        (out, reports)
    }

    /// Like [`TimeSeries::cleaned`], but moves retained frames into the
    /// cleaned series. The returned raw series has no frames.
    pub fn into_cleaned(
        mut self,
        cleaner: &SeriesCleaner,
    ) -> (TimeSeries, TimeSeries, [CleanReport; CONTAINERS]) {
        let (mut out, reports) = self.cleaned(cleaner);
        out.frames = std::mem::take(&mut self.frames);
        (self, out, reports)
    }
}
