//! CSV and JSON writers for a processed series.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::batch::TimeSeries;

/// Column names of the volume table, in order.
pub const CSV_HEADER: [&str; 6] = [
    "Timestamp",
    "Height1",
    "Height2",
    "Volume1",
    "Volume2",
    "TotalVolume",
];
/// Timestamp rendering in the volume table.
pub const CSV_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// File name used when no explicit output path is given.
pub const DEFAULT_CSV_NAME: &str = "volumes.csv";

#[derive(Debug)]
pub enum OutputError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Csv(csv::Error),
    Json(serde_json::Error),
    Image(image::ImageError),
}

impl std::fmt::Display for OutputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "cannot write {}: {}", path.display(), source),
            Self::Csv(e) => write!(f, "CSV error: {}", e),
            Self::Json(e) => write!(f, "JSON error: {}", e),
            Self::Image(e) => write!(f, "image error: {}", e),
        }
    }
}

impl std::error::Error for OutputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Csv(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Image(e) => Some(e),
        }
    }
}

impl From<csv::Error> for OutputError {
    fn from(e: csv::Error) -> Self {
        Self::Csv(e)
    }
}

impl From<serde_json::Error> for OutputError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl From<image::ImageError> for OutputError {
    fn from(e: image::ImageError) -> Self {
        Self::Image(e)
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn fixed2(v: Option<f64>) -> String {
    v.map(|x| format!("{:.2}", x)).unwrap_or_default()
}

/// Write the volume table. Missing volumes (and their totals) are empty fields.
///
/// Volumes are rounded to 2 decimals before summing, so the emitted
/// `TotalVolume` equals `Volume1 + Volume2` as printed.
pub fn write_csv<W: Write>(series: &TimeSeries, writer: W) -> Result<(), OutputError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(CSV_HEADER)?;
    for s in &series.samples {
        let v1 = s.volumes[0].map(round2);
        let v2 = s.volumes[1].map(round2);
        let total = v1.zip(v2).map(|(a, b)| a + b);
        wtr.write_record([
            s.timestamp.format(CSV_TIMESTAMP_FORMAT).to_string(),
            format!("{:.2}", s.heights[0] as f64),
            format!("{:.2}", s.heights[1] as f64),
            fixed2(v1),
            fixed2(v2),
            fixed2(total),
        ])?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

pub fn write_csv_file(series: &TimeSeries, path: &Path) -> Result<(), OutputError> {
    let file = std::fs::File::create(path).map_err(|source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    write_csv(series, std::io::BufWriter::new(file))?;
    tracing::info!("{} rows written to {}", series.len(), path.display());
    Ok(())
}

/// Pretty-printed JSON dump of any serializable result.
pub fn write_json_file<T: serde::Serialize>(value: &T, path: &Path) -> Result<(), OutputError> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).map_err(|source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!("JSON written to {}", path.display());
    Ok(())
}
