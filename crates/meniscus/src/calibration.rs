//! Container calibration: shape model plus empty/full volume readings.
//!
//! The on-disk format is four `Key: value` lines in fixed order:
//!
//! ```text
//! Shape: cylindrical
//! MinVolume: 0.5
//! MaxVolume: 6.0
//! Instructions: fill to the upper mark before starting
//! ```

use std::path::Path;
use std::str::FromStr;

const CALIBRATION_KEYS: [&str; 4] = ["Shape", "MinVolume", "MaxVolume", "Instructions"];

/// Errors raised while loading or validating a calibration.
#[derive(Debug)]
pub enum CalibrationError {
    /// Calibration file could not be read.
    Io(std::io::Error),
    /// Fewer than the four required lines.
    MissingLine { line: usize, key: &'static str },
    /// A line lacked the `Key: value` form or carried the wrong key.
    MalformedLine {
        line: usize,
        expected: &'static str,
        found: String,
    },
    /// A numeric field did not parse as a finite number.
    InvalidNumber { key: &'static str, value: String },
    /// Shape name is not a supported container model.
    UnsupportedShape(String),
    /// Full-scale volume is below the empty reading.
    InvertedRange { min_volume: f64, max_volume: f64 },
    /// Container pixel height is zero, so no height fraction can be formed.
    ZeroContainerHeight,
}

impl std::fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read calibration: {}", e),
            Self::MissingLine { line, key } => {
                write!(f, "calibration line {} ({}) is missing", line, key)
            }
            Self::MalformedLine {
                line,
                expected,
                found,
            } => write!(
                f,
                "calibration line {}: expected '{}: <value>', found '{}'",
                line, expected, found
            ),
            Self::InvalidNumber { key, value } => {
                write!(f, "calibration {} is not a finite number: '{}'", key, value)
            }
            Self::UnsupportedShape(s) => write!(f, "unsupported container shape '{}'", s),
            Self::InvertedRange {
                min_volume,
                max_volume,
            } => write!(
                f,
                "calibration MaxVolume {} is below MinVolume {}",
                max_volume, min_volume
            ),
            Self::ZeroContainerHeight => write!(f, "container height must be positive"),
        }
    }
}

impl std::error::Error for CalibrationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CalibrationError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// Container geometry model used to turn a height fraction into a volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerShape {
    /// Constant cross-section: volume is linear in liquid height.
    #[default]
    Cylindrical,
}

impl ContainerShape {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cylindrical => "cylindrical",
        }
    }
}

impl FromStr for ContainerShape {
    type Err = CalibrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("cylindrical") {
            Ok(Self::Cylindrical)
        } else {
            Err(CalibrationError::UnsupportedShape(s.trim().to_string()))
        }
    }
}

impl std::fmt::Display for ContainerShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Calibrated volume range of one container type.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Calibration {
    pub shape: ContainerShape,
    /// Volume reported for an empty ROI (height 0).
    pub min_volume: f64,
    /// Volume reported for a ROI filled to its top edge.
    pub max_volume: f64,
    /// Free-text operator instructions carried by the file.
    #[serde(default)]
    pub instructions: String,
}

impl Calibration {
    /// Build a validated calibration.
    pub fn new(
        shape: ContainerShape,
        min_volume: f64,
        max_volume: f64,
    ) -> Result<Self, CalibrationError> {
        let cal = Self {
            shape,
            min_volume,
            max_volume,
            instructions: String::new(),
        };
        cal.validate()?;
        Ok(cal)
    }

    /// Load a calibration file from disk.
    pub fn from_file(path: &Path) -> Result<Self, CalibrationError> {
        let text = std::fs::read_to_string(path)?;
        let cal = text.parse::<Self>()?;
        tracing::info!(
            "Calibration {}: shape={}, volume range [{}, {}]",
            path.display(),
            cal.shape,
            cal.min_volume,
            cal.max_volume
        );
        Ok(cal)
    }

    pub fn validate(&self) -> Result<(), CalibrationError> {
        if !self.min_volume.is_finite() {
            return Err(CalibrationError::InvalidNumber {
                key: "MinVolume",
                value: self.min_volume.to_string(),
            });
        }
        if !self.max_volume.is_finite() {
            return Err(CalibrationError::InvalidNumber {
                key: "MaxVolume",
                value: self.max_volume.to_string(),
            });
        }
        if self.max_volume < self.min_volume {
            return Err(CalibrationError::InvertedRange {
                min_volume: self.min_volume,
                max_volume: self.max_volume,
            });
        }
        Ok(())
    }

    /// `max_volume - min_volume`.
    pub fn span(&self) -> f64 {
        self.max_volume - self.min_volume
    }
}

fn split_line<'a>(lines: &[&'a str], index: usize) -> Result<&'a str, CalibrationError> {
    let key = CALIBRATION_KEYS[index];
    let line = lines.get(index).ok_or(CalibrationError::MissingLine {
        line: index + 1,
        key,
    })?;
    let malformed = || CalibrationError::MalformedLine {
        line: index + 1,
        expected: key,
        found: line.to_string(),
    };
    let (k, v) = line.split_once(':').ok_or_else(malformed)?;
    if !k.trim().eq_ignore_ascii_case(key) {
        return Err(malformed());
    }
    Ok(v.trim())
}

fn parse_number(key: &'static str, value: &str) -> Result<f64, CalibrationError> {
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(CalibrationError::InvalidNumber {
            key,
            value: value.to_string(),
        }),
    }
}

impl FromStr for Calibration {
    type Err = CalibrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lines: Vec<&str> = s.lines().filter(|l| !l.trim().is_empty()).collect();
        let shape: ContainerShape = split_line(&lines, 0)?.parse()?;
        let min_volume = parse_number("MinVolume", split_line(&lines, 1)?)?;
        let max_volume = parse_number("MaxVolume", split_line(&lines, 2)?)?;
        let instructions = split_line(&lines, 3)?.to_string();

        let cal = Self {
            shape,
            min_volume,
            max_volume,
            instructions,
        };
        cal.validate()?;
        Ok(cal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Shape: cylindrical\nMinVolume: 0.5\nMaxVolume:  6.0 \nInstructions: align at 10:00 mark\n";

    #[test]
    fn parses_four_line_file() {
        let cal: Calibration = SAMPLE.parse().unwrap();
        assert_eq!(cal.shape, ContainerShape::Cylindrical);
        assert_eq!(cal.min_volume, 0.5);
        assert_eq!(cal.max_volume, 6.0);
        assert_eq!(cal.instructions, "align at 10:00 mark");
    }

    #[test]
    fn unsupported_shape_is_rejected() {
        let text = SAMPLE.replace("cylindrical", "conical");
        match text.parse::<Calibration>() {
            Err(CalibrationError::UnsupportedShape(s)) => assert_eq!(s, "conical"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn missing_and_malformed_lines_are_rejected() {
        let truncated = "Shape: cylindrical\nMinVolume: 1\n";
        assert!(matches!(
            truncated.parse::<Calibration>(),
            Err(CalibrationError::MissingLine { line: 3, .. })
        ));

        let swapped = "Shape: cylindrical\nMaxVolume: 1\nMinVolume: 2\nInstructions: x\n";
        assert!(matches!(
            swapped.parse::<Calibration>(),
            Err(CalibrationError::MalformedLine { line: 2, .. })
        ));

        let no_colon = "Shape cylindrical\nMinVolume: 1\nMaxVolume: 2\nInstructions: x\n";
        assert!(matches!(
            no_colon.parse::<Calibration>(),
            Err(CalibrationError::MalformedLine { line: 1, .. })
        ));
    }

    #[test]
    fn numeric_fields_are_validated() {
        let nan = SAMPLE.replace("0.5", "NaN");
        assert!(matches!(
            nan.parse::<Calibration>(),
            Err(CalibrationError::InvalidNumber { key: "MinVolume", .. })
        ));

        let inverted = SAMPLE.replace("6.0", "0.1");
        assert!(matches!(
            inverted.parse::<Calibration>(),
            Err(CalibrationError::InvertedRange { .. })
        ));
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calibration.txt");
        std::fs::write(&path, SAMPLE).unwrap();
        let cal = Calibration::from_file(&path).unwrap();
        assert_eq!(cal.max_volume, 6.0);

        let missing = Calibration::from_file(&dir.path().join("nope.txt"));
        assert!(matches!(missing, Err(CalibrationError::Io(_))));
    }
}
