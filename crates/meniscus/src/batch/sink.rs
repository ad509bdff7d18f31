//! Diagnostic image sinks.

use std::path::{Path, PathBuf};

use crate::detector::DetectionDebug;

/// Subdirectory for preprocessed crops.
pub const BLUR_DIR: &str = "blur_images";
/// Subdirectory for annotated edge maps.
pub const PROCESSED_DIR: &str = "processed_images";

/// Receives per-container diagnostic images for each frame.
///
/// `container` is 1-based.
pub trait DiagnosticSink {
    /// Whether the batch should spend time producing debug images at all.
    fn wants_debug(&self) -> bool {
        true
    }

    fn record(
        &mut self,
        container: usize,
        frame_name: &str,
        debug: &DetectionDebug,
    ) -> image::ImageResult<()>;
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn wants_debug(&self) -> bool {
        false
    }

    fn record(&mut self, _: usize, _: &str, _: &DetectionDebug) -> image::ImageResult<()> {
        Ok(())
    }
}

/// Writes `blur_images/container{N}/<frame>` and
/// `processed_images/container{N}/<frame>` under a root directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn container_dir(&self, kind: &str, container: usize) -> PathBuf {
        self.root.join(kind).join(format!("container{}", container))
    }

    pub fn blur_path(&self, container: usize, frame_name: &str) -> PathBuf {
        self.container_dir(BLUR_DIR, container).join(frame_name)
    }

    pub fn processed_path(&self, container: usize, frame_name: &str) -> PathBuf {
        self.container_dir(PROCESSED_DIR, container).join(frame_name)
    }
}

impl DiagnosticSink for DirectorySink {
    fn record(
        &mut self,
        container: usize,
        frame_name: &str,
        debug: &DetectionDebug,
    ) -> image::ImageResult<()> {
        let blur = self.blur_path(container, frame_name);
        let processed = self.processed_path(container, frame_name);
        for path in [&blur, &processed] {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
        }
        debug.smoothed.save(&blur)?;
        debug.annotated.save(&processed)?;
        Ok(())
    }
}
