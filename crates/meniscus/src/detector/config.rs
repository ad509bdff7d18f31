/// Intensity preprocessing applied to the cropped ROI before edge detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreprocessMode {
    /// Fixed binary threshold only.
    Threshold,
    /// Anisotropic Gaussian smoothing only.
    Blur,
    /// Binary threshold followed by anisotropic smoothing.
    #[default]
    ThresholdThenBlur,
}

impl PreprocessMode {
    pub fn uses_threshold(self) -> bool {
        matches!(self, Self::Threshold | Self::ThresholdThenBlur)
    }

    pub fn uses_blur(self) -> bool {
        matches!(self, Self::Blur | Self::ThresholdThenBlur)
    }
}

/// Gaussian kernel footprint in pixels. Both sides must be odd.
///
/// A kernel wider than tall suppresses horizontal noise while keeping the
/// horizontal meniscus edge sharp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BlurKernel {
    pub width: u32,
    pub height: u32,
}

impl BlurKernel {
    pub fn is_valid(self) -> bool {
        self.width % 2 == 1 && self.height % 2 == 1
    }
}

impl Default for BlurKernel {
    fn default() -> Self {
        Self {
            width: 25,
            height: 5,
        }
    }
}

/// How one contour is chosen among those passing the aspect-ratio gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Longest closed arc length.
    #[default]
    MaxPerimeter,
    /// Widest bounding box relative to its height.
    MaxAspectRatio,
}

/// Accepted binary threshold levels.
pub const THRESHOLD_LEVEL_RANGE: std::ops::RangeInclusive<u8> = 30..=128;

/// Meniscus detector configuration.
///
/// Every field is fixed for a whole run; nothing is re-derived per frame.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub preprocess: PreprocessMode,
    /// Binary threshold level: pixels strictly above become 255, others 0.
    pub threshold_level: u8,
    pub blur_kernel: BlurKernel,
    /// Canny low bound as a fraction of the median intensity.
    pub edge_low_ratio: f32,
    /// Canny high bound as a fraction of the median intensity.
    pub edge_high_ratio: f32,
    /// Floor applied to both Canny bounds.
    ///
    /// Hysteresis accepts magnitudes `>= high`, so a zero bound would turn
    /// every flat pixel into an edge.
    pub min_edge_threshold: f32,
    /// Contours need bounding-box `width / height` strictly above this.
    pub aspect_ratio_min: f64,
    pub tie_break: TieBreak,
    /// Also require the min-area-rectangle orientation within
    /// `[-max_abs_angle_deg, max_abs_angle_deg]`.
    pub angle_filter: bool,
    pub max_abs_angle_deg: f64,
    /// Rows above the ROI floor in which a detected line reads as an empty
    /// container. `0` disables the empty class.
    pub floor_band_px: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            preprocess: PreprocessMode::default(),
            threshold_level: 60,
            blur_kernel: BlurKernel::default(),
            edge_low_ratio: 0.4,
            edge_high_ratio: 1.6,
            min_edge_threshold: 1.0,
            aspect_ratio_min: 2.0,
            tie_break: TieBreak::default(),
            angle_filter: false,
            max_abs_angle_deg: 45.0,
            floor_band_px: 0,
        }
    }
}

impl DetectorConfig {
    /// Longest-contour selection over a thresholded, smoothed crop.
    pub fn max_perimeter() -> Self {
        Self::default()
    }

    /// Widest-contour selection with the near-horizontal orientation gate,
    /// smoothing only.
    pub fn max_aspect_ratio() -> Self {
        Self {
            preprocess: PreprocessMode::Blur,
            blur_kernel: BlurKernel {
                width: 3,
                height: 3,
            },
            tie_break: TieBreak::MaxAspectRatio,
            angle_filter: true,
            ..Self::default()
        }
    }

    /// Check ranges that would otherwise make detection meaningless.
    pub fn validate(&self) -> Result<(), String> {
        let level_ok = THRESHOLD_LEVEL_RANGE.contains(&self.threshold_level);
        if self.preprocess.uses_threshold() && !level_ok {
            return Err(format!(
                "threshold_level must lie in [{}, {}] (got {})",
                THRESHOLD_LEVEL_RANGE.start(),
                THRESHOLD_LEVEL_RANGE.end(),
                self.threshold_level
            ));
        }
        if self.preprocess.uses_blur() && !self.blur_kernel.is_valid() {
            return Err(format!(
                "blur kernel {}x{} must have odd sides",
                self.blur_kernel.width, self.blur_kernel.height
            ));
        }
        if !(self.edge_low_ratio.is_finite() && self.edge_high_ratio.is_finite())
            || self.edge_low_ratio < 0.0
            || self.edge_high_ratio < self.edge_low_ratio
        {
            return Err(format!(
                "edge ratios must satisfy 0 <= low <= high (got {} / {})",
                self.edge_low_ratio, self.edge_high_ratio
            ));
        }
        if !self.min_edge_threshold.is_finite() || self.min_edge_threshold < 0.0 {
            return Err(format!(
                "min_edge_threshold must be non-negative (got {})",
                self.min_edge_threshold
            ));
        }
        if !self.aspect_ratio_min.is_finite() || self.aspect_ratio_min < 0.0 {
            return Err(format!(
                "aspect_ratio_min must be non-negative (got {})",
                self.aspect_ratio_min
            ));
        }
        if !(0.0..=90.0).contains(&self.max_abs_angle_deg) {
            return Err(format!(
                "max_abs_angle_deg must lie in [0, 90] (got {})",
                self.max_abs_angle_deg
            ));
        }
        Ok(())
    }
}
