//! External contour extraction and per-contour geometry.

use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use imageproc::geometry::{arc_length, min_area_rect};
use imageproc::point::Point;

/// Axis-aligned bounding box in ROI pixel coordinates (inclusive extents,
/// so a single pixel has `width == height == 1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    /// Tight box around `points`. `None` for an empty slice.
    pub fn enclosing(points: &[Point<i32>]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut max_x, mut min_y, mut max_y) = (first.x, first.x, first.y, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            max_x = max_x.max(p.x);
            min_y = min_y.min(p.y);
            max_y = max_y.max(p.y);
        }
        Some(Self {
            x: min_x.max(0) as u32,
            y: min_y.max(0) as u32,
            width: (max_x - min_x + 1) as u32,
            height: (max_y - min_y + 1) as u32,
        })
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

/// One extracted contour with the measurements the selection policy needs.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ContourStats {
    pub bbox: BoundingBox,
    /// Closed arc length in pixels.
    pub perimeter: f64,
    pub aspect_ratio: f64,
    /// Orientation of the min-area rectangle's long side, degrees in
    /// `(-90, 90]`. Only computed when the angle gate is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub angle_deg: Option<f64>,
    pub n_points: usize,
    #[serde(skip)]
    pub points: Vec<Point<i32>>,
}

/// Outermost contours of the non-zero regions of `edges`.
pub(crate) fn external_contours(edges: &GrayImage) -> Vec<Vec<Point<i32>>> {
    find_contours::<i32>(edges)
        .into_iter()
        .filter(|c| c.parent.is_none() && matches!(c.border_type, BorderType::Outer))
        .map(|c| c.points)
        .filter(|points| !points.is_empty())
        .collect()
}

fn normalize_half_turn(deg: f64) -> f64 {
    let mut a = deg % 180.0;
    if a <= -90.0 {
        a += 180.0;
    } else if a > 90.0 {
        a -= 180.0;
    }
    a
}

/// Long-side orientation of the minimum-area rectangle around `points`.
pub(crate) fn orientation_deg(points: &[Point<i32>]) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    let corners = min_area_rect(points);
    let e1 = (corners[1].x - corners[0].x, corners[1].y - corners[0].y);
    let e2 = (corners[2].x - corners[1].x, corners[2].y - corners[1].y);
    let len2 = |e: (i32, i32)| (e.0 as f64).powi(2) + (e.1 as f64).powi(2);
    let (dx, dy) = if len2(e1) >= len2(e2) { e1 } else { e2 };
    if dx == 0 && dy == 0 {
        return 0.0;
    }
    normalize_half_turn((dy as f64).atan2(dx as f64).to_degrees())
}

pub(crate) fn measure(points: Vec<Point<i32>>, with_angle: bool) -> Option<ContourStats> {
    let bbox = BoundingBox::enclosing(&points)?;
    let perimeter = arc_length(&points, true);
    let angle_deg = with_angle.then(|| orientation_deg(&points));
    Some(ContourStats {
        bbox,
        perimeter,
        aspect_ratio: bbox.aspect_ratio(),
        angle_deg,
        n_points: points.len(),
        points,
    })
}
