//! Frame listing and decoding.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use image::RgbImage;

/// `strftime` layout of a frame file stem.
pub const FRAME_TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";
/// Accepted frame extension (matched case-insensitively).
pub const FRAME_EXTENSION: &str = "jpg";

const FRAME_STEM_LEN: usize = 15;

/// Parse the capture time from a frame file name `YYYYMMDD-HHMMSS.jpg`.
///
/// Returns `None` for names that are not frames.
pub fn parse_frame_name(name: &str) -> Option<NaiveDateTime> {
    let (stem, ext) = name.rsplit_once('.')?;
    if !ext.eq_ignore_ascii_case(FRAME_EXTENSION) || stem.len() != FRAME_STEM_LEN {
        return None;
    }
    NaiveDateTime::parse_from_str(stem, FRAME_TIMESTAMP_FORMAT).ok()
}

/// One listed frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameEntry {
    /// File name, used as the key for diagnostics and output rows.
    pub name: String,
    pub timestamp: NaiveDateTime,
}

/// Ordered supply of frames for one batch run.
pub trait FrameSource {
    /// Human-readable origin (directory path, fixture name).
    fn label(&self) -> String;

    /// All frames, sorted by name.
    fn entries(&self) -> std::io::Result<Vec<FrameEntry>>;

    /// Decode one listed frame.
    fn load(&self, entry: &FrameEntry) -> image::ImageResult<RgbImage>;
}

/// Flat directory of `YYYYMMDD-HHMMSS.jpg` files.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_of(&self, entry: &FrameEntry) -> PathBuf {
        self.root.join(&entry.name)
    }
}

impl FrameSource for DirectorySource {
    fn label(&self) -> String {
        self.root.display().to_string()
    }

    fn entries(&self) -> std::io::Result<Vec<FrameEntry>> {
        let mut out = Vec::new();
        for dirent in std::fs::read_dir(&self.root)? {
            let dirent = dirent?;
            if !dirent.file_type()?.is_file() {
                continue;
            }
            let Some(name) = dirent.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            match parse_frame_name(&name) {
                Some(timestamp) => out.push(FrameEntry { name, timestamp }),
                None => tracing::debug!("skipping non-frame file {}", name),
            }
        }
        // Fixed-width stems: lexical order is chronological order.
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    fn load(&self, entry: &FrameEntry) -> image::ImageResult<RgbImage> {
        Ok(image::open(self.path_of(entry))?.to_rgb8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn parses_frame_names() {
        let ts = parse_frame_name("20240131-235958.jpg").unwrap();
        assert_eq!((ts.year(), ts.month(), ts.day()), (2024, 1, 31));
        assert_eq!((ts.hour(), ts.minute(), ts.second()), (23, 59, 58));
        assert!(parse_frame_name("20240131-235958.JPG").is_some());
    }

    #[test]
    fn rejects_non_frame_names() {
        for name in [
            "volumes.csv",
            "20240131-235958.png",
            "20240131-235958",
            "20240131-2359.jpg",
            "20241331-235958.jpg",
            "x20240131-235958.jpg",
            "notes.jpg",
        ] {
            assert!(parse_frame_name(name).is_none(), "{}", name);
        }
    }

    #[test]
    fn directory_listing_is_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "20240101-120005.jpg",
            "20240101-120000.jpg",
            "README.txt",
            "20240101-120003.jpg",
        ] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        std::fs::create_dir(dir.path().join("20240101-120009.jpg")).unwrap();

        let src = DirectorySource::new(dir.path());
        let names: Vec<String> = src.entries().unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(
            names,
            ["20240101-120000.jpg", "20240101-120003.jpg", "20240101-120005.jpg"]
        );
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let src = DirectorySource::new("/definitely/not/a/frames/dir");
        assert!(src.entries().is_err());
    }
}
