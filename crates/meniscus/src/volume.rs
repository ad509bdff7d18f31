//! Height → volume mapping.

use crate::calibration::{Calibration, CalibrationError, ContainerShape};
use crate::detector::MeniscusReading;

/// What a `NotFound` reading turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotFoundPolicy {
    /// Missing sample, later filled by the series cleaner where possible.
    #[default]
    Gap,
    /// Treat as height 0, i.e. the calibrated minimum volume.
    Zero,
}

/// Convert a liquid height to a volume.
///
/// `container_height` is the ROI's full-scale pixel span.
pub fn height_to_volume(
    height: f64,
    min_volume: f64,
    max_volume: f64,
    container_height: u32,
    shape: ContainerShape,
) -> Result<f64, CalibrationError> {
    if container_height == 0 {
        return Err(CalibrationError::ZeroContainerHeight);
    }
    Ok(match shape {
        ContainerShape::Cylindrical => {
            min_volume + (height / container_height as f64) * (max_volume - min_volume)
        }
    })
}

/// Calibrated mapper for one container.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeMapper {
    shape: ContainerShape,
    min_volume: f64,
    max_volume: f64,
    container_height: u32,
}

impl VolumeMapper {
    /// Build a mapper; rejects a zero container height and invalid ranges.
    pub fn new(calibration: &Calibration, container_height: u32) -> Result<Self, CalibrationError> {
        calibration.validate()?;
        if container_height == 0 {
            return Err(CalibrationError::ZeroContainerHeight);
        }
        Ok(Self {
            shape: calibration.shape,
            min_volume: calibration.min_volume,
            max_volume: calibration.max_volume,
            container_height,
        })
    }

    pub fn container_height(&self) -> u32 {
        self.container_height
    }

    /// Volume for a pixel height.
    pub fn volume_at(&self, height_px: f64) -> f64 {
        let fraction = height_px / self.container_height as f64;
        match self.shape {
            ContainerShape::Cylindrical => {
                self.min_volume + fraction * (self.max_volume - self.min_volume)
            }
        }
    }

    /// Volume for a classified reading; `None` marks a gap.
    pub fn map_reading(&self, reading: MeniscusReading, policy: NotFoundPolicy) -> Option<f64> {
        match reading {
            MeniscusReading::Found { height_px } => Some(self.volume_at(height_px as f64)),
            MeniscusReading::Empty => Some(self.min_volume),
            MeniscusReading::NotFound => match policy {
                NotFoundPolicy::Gap => None,
                NotFoundPolicy::Zero => Some(self.volume_at(0.0)),
            },
        }
    }
}
