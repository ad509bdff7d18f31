//! Meniscus detection inside one container ROI.
//!
//! Stages, in fixed order:
//! crop → grayscale → threshold/smooth → median-anchored Canny →
//! external contours → aspect/angle gate + tie-break → `roi.height - y`.

mod config;
mod contour;
mod debug;
mod edges;
mod preprocess;
mod select;

pub use config::{
    BlurKernel, DetectorConfig, PreprocessMode, TieBreak, THRESHOLD_LEVEL_RANGE,
};
pub use contour::{BoundingBox, ContourStats};
pub use debug::DetectionDebug;
pub use edges::EdgeThresholds;

use image::RgbImage;

use crate::roi::{Roi, RoiError};

/// Classified result of one ROI detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MeniscusReading {
    /// Liquid surface found `height_px` rows above the ROI bottom.
    Found { height_px: u32 },
    /// Surface found inside the floor band: the container reads empty.
    Empty,
    /// No contour survived selection.
    NotFound,
}

impl MeniscusReading {
    pub fn is_not_found(self) -> bool {
        matches!(self, Self::NotFound)
    }
}

/// Full detection output for one ROI of one frame.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Detection {
    pub reading: MeniscusReading,
    /// Scalar height: `roi.height - y` of the chosen contour, `0` when not found.
    pub height_px: u32,
    /// Bounding box of the chosen contour in ROI coordinates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meniscus: Option<BoundingBox>,
    pub thresholds: EdgeThresholds,
    pub n_contours: usize,
    pub n_candidates: usize,
}

impl Detection {
    /// Meniscus row in source-image coordinates, if a contour was chosen.
    pub fn meniscus_row(&self, roi: &Roi) -> Option<u32> {
        self.meniscus.map(|b| roi.y + b.y)
    }
}

/// Meniscus detector.
///
/// Holds one immutable configuration; create once, run on every ROI of every
/// frame.
#[derive(Debug, Clone, Default)]
pub struct MeniscusDetector {
    config: DetectorConfig,
}

impl MeniscusDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Liquid height in pixels above the ROI bottom; `0` when no meniscus
    /// was found.
    pub fn detect_height(&self, roi: &Roi, frame: &RgbImage) -> Result<u32, RoiError> {
        Ok(self.detect(roi, frame)?.height_px)
    }

    /// Detect the meniscus of `roi` in `frame`.
    ///
    /// Fails only when the ROI does not fit the frame.
    pub fn detect(&self, roi: &Roi, frame: &RgbImage) -> Result<Detection, RoiError> {
        Ok(self.run(roi, frame)?.detection)
    }

    /// Detect and also return intermediate images for diagnostics.
    pub fn detect_with_debug(
        &self,
        roi: &Roi,
        frame: &RgbImage,
    ) -> Result<(Detection, DetectionDebug), RoiError> {
        let stages = self.run(roi, frame)?;
        let dbg = DetectionDebug {
            annotated: debug::render_annotated(&stages.edges, &stages.contours, stages.best),
            smoothed: stages.smoothed,
            edges: stages.edges,
            thresholds: stages.detection.thresholds,
            contours: stages.contours,
        };
        Ok((stages.detection, dbg))
    }

    fn run(&self, roi: &Roi, frame: &RgbImage) -> Result<Stages, RoiError> {
        let (fw, fh) = frame.dimensions();
        roi.validate_within(fw, fh)?;
        let cfg = &self.config;

        let gray = preprocess::crop_gray(frame, roi);
        let smoothed = preprocess::preprocess(&gray, cfg);
        let (edge_map, thresholds) = edges::detect_edges(&smoothed, cfg);

        let contours: Vec<ContourStats> = contour::external_contours(&edge_map)
            .into_iter()
            .filter_map(|points| contour::measure(points, cfg.angle_filter))
            .collect();
        let selection = select::select_meniscus(&contours, cfg);
        let meniscus = selection.best.map(|i| contours[i].bbox);

        let (reading, height_px) = match meniscus {
            None => (MeniscusReading::NotFound, 0),
            Some(bbox) => {
                let height_px = roi.height.saturating_sub(bbox.y);
                if height_px <= cfg.floor_band_px {
                    (MeniscusReading::Empty, height_px)
                } else {
                    (MeniscusReading::Found { height_px }, height_px)
                }
            }
        };

        tracing::trace!(
            "roi {}: median={:.1} canny=[{}, {}] contours={} candidates={} height={}",
            roi,
            thresholds.median,
            thresholds.low,
            thresholds.high,
            contours.len(),
            selection.n_candidates,
            height_px
        );

        Ok(Stages {
            detection: Detection {
                reading,
                height_px,
                meniscus,
                thresholds,
                n_contours: contours.len(),
                n_candidates: selection.n_candidates,
            },
            smoothed,
            edges: edge_map,
            contours,
            best: selection.best,
        })
    }
}

struct Stages {
    detection: Detection,
    smoothed: image::GrayImage,
    edges: image::GrayImage,
    contours: Vec<ContourStats>,
    best: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{add_noise, container_frame, ContainerSpec};

    fn roi() -> Roi {
        Roi::new(20, 10, 40, 120).unwrap()
    }

    fn frame_with_level(liquid_top_row: u32) -> RgbImage {
        container_frame(
            100,
            160,
            &[ContainerSpec {
                roi: roi(),
                liquid_top_row,
            }],
        )
    }

    #[test]
    fn reports_height_above_roi_bottom() {
        let det = MeniscusDetector::default();
        for level in [40u32, 70, 100] {
            let frame = frame_with_level(level);
            let d = det.detect(&roi(), &frame).unwrap();
            let expected = roi().bottom() as i64 - level as i64;
            assert!(
                (d.height_px as i64 - expected).abs() <= 3,
                "level {}: got {} expected ~{}",
                level,
                d.height_px,
                expected
            );
            assert!(matches!(d.reading, MeniscusReading::Found { .. }));
            let bbox = d.meniscus.unwrap();
            assert_eq!(d.height_px, roi().height - bbox.y);
            assert!(d.height_px <= roi().height);
        }
    }

    #[test]
    fn higher_liquid_reads_taller() {
        let det = MeniscusDetector::default();
        let low = det.detect_height(&roi(), &frame_with_level(100)).unwrap();
        let high = det.detect_height(&roi(), &frame_with_level(50)).unwrap();
        assert!(high > low);
    }

    #[test]
    fn uniform_roi_is_not_found_and_reads_zero() {
        let det = MeniscusDetector::default();
        let frame = RgbImage::from_pixel(100, 160, image::Rgb([20, 20, 20]));
        let d = det.detect(&roi(), &frame).unwrap();
        assert_eq!(d.reading, MeniscusReading::NotFound);
        assert_eq!(d.height_px, 0);
        assert!(d.meniscus.is_none());
    }

    #[test]
    fn vertical_stripe_alone_is_not_a_meniscus() {
        let det = MeniscusDetector::default();
        let mut frame = RgbImage::from_pixel(100, 160, image::Rgb([20, 20, 20]));
        for y in 10..130 {
            for x in 38..42 {
                frame.put_pixel(x, y, image::Rgb([230, 230, 230]));
            }
        }
        assert_eq!(det.detect_height(&roi(), &frame).unwrap(), 0);
    }

    #[test]
    fn noise_does_not_move_the_reading_much() {
        let det = MeniscusDetector::default();
        let mut frame = frame_with_level(70);
        add_noise(&mut frame, 12, 7);
        let h = det.detect_height(&roi(), &frame).unwrap() as i64;
        assert!((h - 60).abs() <= 4, "height {}", h);
    }

    #[test]
    fn aspect_ratio_preset_finds_the_same_level() {
        let det = MeniscusDetector::new(DetectorConfig::max_aspect_ratio());
        let h = det.detect_height(&roi(), &frame_with_level(70)).unwrap() as i64;
        assert!((h - 60).abs() <= 4, "height {}", h);
    }

    #[test]
    fn floor_band_classifies_bottom_line_as_empty() {
        let det = MeniscusDetector::new(DetectorConfig {
            floor_band_px: 10,
            ..Default::default()
        });
        let frame = frame_with_level(125);
        let d = det.detect(&roi(), &frame).unwrap();
        assert_eq!(d.reading, MeniscusReading::Empty);
        assert!(d.height_px > 0 && d.height_px <= 10);
    }

    #[test]
    fn roi_outside_frame_is_rejected() {
        let det = MeniscusDetector::default();
        let frame = RgbImage::new(50, 50);
        assert!(matches!(
            det.detect(&roi(), &frame),
            Err(RoiError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn debug_images_match_roi_size() {
        let det = MeniscusDetector::default();
        let (d, dbg) = det.detect_with_debug(&roi(), &frame_with_level(70)).unwrap();
        assert_eq!(dbg.smoothed.dimensions(), (40, 120));
        assert_eq!(dbg.edges.dimensions(), (40, 120));
        assert_eq!(dbg.annotated.dimensions(), (40, 120));
        assert_eq!(dbg.contours.len(), d.n_contours);
        let bbox = d.meniscus.unwrap();
        assert_eq!(
            *dbg.annotated.get_pixel(bbox.x, bbox.y),
            debug::SELECTED_COLOR
        );
    }
}
