//! Meniscus contour selection policy.

use super::config::{DetectorConfig, TieBreak};
use super::contour::ContourStats;

/// Why a contour was not chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Rejection {
    AspectRatio,
    Angle,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AspectRatio => f.write_str("aspect_ratio"),
            Self::Angle => f.write_str("angle"),
        }
    }
}

pub(crate) fn gate(stats: &ContourStats, config: &DetectorConfig) -> Result<(), Rejection> {
    if stats.aspect_ratio <= config.aspect_ratio_min {
        return Err(Rejection::AspectRatio);
    }
    if config.angle_filter {
        let angle = stats.angle_deg.unwrap_or(0.0);
        if angle.abs() > config.max_abs_angle_deg {
            return Err(Rejection::Angle);
        }
    }
    Ok(())
}

fn score(stats: &ContourStats, tie_break: TieBreak) -> f64 {
    match tie_break {
        TieBreak::MaxPerimeter => stats.perimeter,
        TieBreak::MaxAspectRatio => stats.aspect_ratio,
    }
}

/// Outcome of running the selection policy over all contours of one ROI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Selection {
    /// Index into the input slice of the chosen contour.
    pub best: Option<usize>,
    /// Contours that passed the gates.
    pub n_candidates: usize,
}

/// Pick the meniscus among `contours`.
///
/// Contours are visited top to bottom; a later contour wins only with a
/// strictly higher score, so exact ties resolve to the topmost one.
pub(crate) fn select_meniscus(contours: &[ContourStats], config: &DetectorConfig) -> Selection {
    let mut order: Vec<usize> = (0..contours.len()).collect();
    order.sort_by_key(|&i| contours[i].bbox.y);

    let mut best: Option<(usize, f64)> = None;
    let mut n_candidates = 0;
    for i in order {
        let stats = &contours[i];
        if let Err(reason) = gate(stats, config) {
            tracing::trace!(
                "contour at y={} ({}x{}) rejected: {}",
                stats.bbox.y,
                stats.bbox.width,
                stats.bbox.height,
                reason
            );
            continue;
        }
        n_candidates += 1;
        let s = score(stats, config.tie_break);
        if best.map_or(true, |(_, b)| s > b) {
            best = Some((i, s));
        }
    }

    Selection {
        best: best.map(|(i, _)| i),
        n_candidates,
    }
}
