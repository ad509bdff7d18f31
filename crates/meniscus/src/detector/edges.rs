//! Median-anchored Canny edge detection.

use image::GrayImage;

use super::config::DetectorConfig;

/// Canny bounds derived from the median intensity of the smoothed crop.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EdgeThresholds {
    pub median: f32,
    pub low: f32,
    pub high: f32,
}

/// Median of all pixel intensities; the mean of the two middle values when
/// the pixel count is even.
pub(crate) fn median_intensity(img: &GrayImage) -> f32 {
    let mut hist = [0u64; 256];
    for p in img.pixels() {
        hist[p[0] as usize] += 1;
    }
    let n = img.width() as u64 * img.height() as u64;
    if n == 0 {
        return 0.0;
    }

    let value_at_rank = |rank: u64| -> f32 {
        let mut acc = 0u64;
        for (value, &count) in hist.iter().enumerate() {
            acc += count;
            if acc > rank {
                return value as f32;
            }
        }
        255.0
    };
    0.5 * (value_at_rank((n - 1) / 2) + value_at_rank(n / 2))
}

pub(crate) fn adaptive_thresholds(median: f32, config: &DetectorConfig) -> EdgeThresholds {
    let bound = |ratio: f32| {
        (ratio * median)
            .clamp(0.0, 255.0)
            .floor()
            .max(config.min_edge_threshold)
    };
    let low = bound(config.edge_low_ratio);
    let high = bound(config.edge_high_ratio).max(low);
    EdgeThresholds { median, low, high }
}

/// Binary edge map (255 = edge) of `smoothed`.
pub(crate) fn detect_edges(
    smoothed: &GrayImage,
    config: &DetectorConfig,
) -> (GrayImage, EdgeThresholds) {
    let thresholds = adaptive_thresholds(median_intensity(smoothed), config);
    let edges = imageproc::edges::canny(smoothed, thresholds.low, thresholds.high);
    (edges, thresholds)
}
