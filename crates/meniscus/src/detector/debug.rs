//! Diagnostic renderings of one detection.

use image::{GrayImage, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use super::contour::{BoundingBox, ContourStats};
use super::edges::EdgeThresholds;

pub(crate) const CONTOUR_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub(crate) const SELECTED_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Intermediate images and measurements of one ROI detection.
#[derive(Debug, Clone)]
pub struct DetectionDebug {
    /// Preprocessed (thresholded and/or smoothed) crop fed to the edge detector.
    pub smoothed: GrayImage,
    /// Raw edge map.
    pub edges: GrayImage,
    /// Edge map with all contours (green) and the selected box (red).
    pub annotated: RgbImage,
    pub thresholds: EdgeThresholds,
    pub contours: Vec<ContourStats>,
}

pub(crate) fn bbox_rect(bbox: &BoundingBox) -> Rect {
    Rect::at(bbox.x as i32, bbox.y as i32).of_size(bbox.width.max(1), bbox.height.max(1))
}

pub(crate) fn render_annotated(
    edges: &GrayImage,
    contours: &[ContourStats],
    selected: Option<usize>,
) -> RgbImage {
    let (w, h) = edges.dimensions();
    let mut out = RgbImage::from_fn(w, h, |x, y| {
        let v = edges.get_pixel(x, y)[0];
        Rgb([v, v, v])
    });
    for c in contours {
        for p in &c.points {
            if p.x >= 0 && p.y >= 0 && (p.x as u32) < w && (p.y as u32) < h {
                out.put_pixel(p.x as u32, p.y as u32, CONTOUR_COLOR);
            }
        }
    }
    if let Some(c) = selected.and_then(|i| contours.get(i)) {
        draw_hollow_rect_mut(&mut out, bbox_rect(&c.bbox), SELECTED_COLOR);
    }
    out
}
