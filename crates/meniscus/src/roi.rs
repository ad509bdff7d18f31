//! Per-container region of interest.

use std::str::FromStr;

/// Errors raised while parsing or validating a region of interest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoiError {
    /// Text form was not `x,y,width,height` with non-negative integers.
    Malformed(String),
    /// Width or height is zero.
    Empty { width: u32, height: u32 },
    /// Rectangle does not fit inside the image.
    OutOfBounds {
        roi: Roi,
        image_width: u32,
        image_height: u32,
    },
}

impl std::fmt::Display for RoiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(s) => {
                write!(f, "malformed ROI '{}': expected x,y,width,height", s)
            }
            Self::Empty { width, height } => {
                write!(f, "ROI must have non-zero size, got {}x{}", width, height)
            }
            Self::OutOfBounds {
                roi,
                image_width,
                image_height,
            } => write!(
                f,
                "ROI {} exceeds image bounds {}x{}",
                roi, image_width, image_height
            ),
        }
    }
}

impl std::error::Error for RoiError {}

/// Axis-aligned rectangle in source-image pixel coordinates.
///
/// `y` grows downwards, so the container floor is the row `y + height - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Roi {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Roi {
    /// Build a ROI, rejecting zero-sized rectangles.
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Result<Self, RoiError> {
        if width == 0 || height == 0 {
            return Err(RoiError::Empty { width, height });
        }
        Ok(Self {
            x,
            y,
            width,
            height,
        })
    }

    /// Exclusive right edge.
    pub fn right(&self) -> u64 {
        self.x as u64 + self.width as u64
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u64 {
        self.y as u64 + self.height as u64
    }

    /// Check that the rectangle is non-empty and lies fully inside a
    /// `image_width x image_height` image.
    pub fn validate_within(&self, image_width: u32, image_height: u32) -> Result<(), RoiError> {
        if self.width == 0 || self.height == 0 {
            return Err(RoiError::Empty {
                width: self.width,
                height: self.height,
            });
        }
        if self.right() > image_width as u64 || self.bottom() > image_height as u64 {
            return Err(RoiError::OutOfBounds {
                roi: *self,
                image_width,
                image_height,
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for Roi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{},{},{}", self.x, self.y, self.width, self.height)
    }
}

impl FromStr for Roi {
    type Err = RoiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(RoiError::Malformed(s.to_string()));
        }
        let mut vals = [0u32; 4];
        for (slot, part) in vals.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| RoiError::Malformed(s.to_string()))?;
        }
        Self::new(vals[0], vals[1], vals[2], vals[3])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_separated_form() {
        let roi: Roi = "10, 20,30,40".parse().unwrap();
        assert_eq!(roi, Roi::new(10, 20, 30, 40).unwrap());
        assert_eq!(roi.to_string(), "10,20,30,40");
    }

    #[test]
    fn rejects_malformed_and_empty() {
        assert!(matches!("1,2,3".parse::<Roi>(), Err(RoiError::Malformed(_))));
        assert!(matches!("1,2,x,4".parse::<Roi>(), Err(RoiError::Malformed(_))));
        assert!(matches!("-1,2,3,4".parse::<Roi>(), Err(RoiError::Malformed(_))));
        assert_eq!(
            "1,2,0,4".parse::<Roi>(),
            Err(RoiError::Empty {
                width: 0,
                height: 4
            })
        );
    }

    #[test]
    fn bounds_check_is_exclusive_on_far_edges() {
        let roi = Roi::new(10, 10, 20, 30).unwrap();
        assert!(roi.validate_within(30, 40).is_ok());
        assert!(matches!(
            roi.validate_within(29, 40),
            Err(RoiError::OutOfBounds { .. })
        ));
        assert!(matches!(
            roi.validate_within(30, 39),
            Err(RoiError::OutOfBounds { .. })
        ));
    }
}
