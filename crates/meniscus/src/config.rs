//! Run configuration loaded from JSON.

use std::path::{Path, PathBuf};

use crate::clean::CleanerConfig;
use crate::detector::DetectorConfig;
use crate::volume::NotFoundPolicy;

pub const CONFIG_SCHEMA_V1: &str = "meniscus.config.v1";

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Json(serde_json::Error),
    UnsupportedSchema(String),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "cannot read {}: {}", path.display(), source),
            Self::Json(e) => write!(f, "invalid config JSON: {}", e),
            Self::UnsupportedSchema(found) => write!(
                f,
                "unsupported config schema '{}' (expected '{}')",
                found, CONFIG_SCHEMA_V1
            ),
            Self::Invalid(msg) => write!(f, "invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

/// Everything a batch run needs besides ROIs and calibration.
///
/// Every field is optional in JSON; a missing `schema` is read as the
/// current version.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub schema: String,
    pub detector: DetectorConfig,
    pub cleaner: CleanerConfig,
    pub not_found: NotFoundPolicy,
    /// Keep decoded frames for annotation.
    pub retain_frames: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            schema: CONFIG_SCHEMA_V1.to_string(),
            detector: DetectorConfig::default(),
            cleaner: CleanerConfig::default(),
            not_found: NotFoundPolicy::default(),
            retain_frames: false,
        }
    }
}

impl PipelineConfig {
    /// Fixed 7.0 ceiling and misses read as height 0.
    pub fn legacy() -> Self {
        Self {
            cleaner: CleanerConfig::legacy(),
            not_found: NotFoundPolicy::Zero,
            ..Self::default()
        }
    }

    pub fn from_json_str(data: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(data)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg = Self::from_json_str(&data)?;
        tracing::info!("Loaded config {}", path.display());
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.schema != CONFIG_SCHEMA_V1 {
            return Err(ConfigError::UnsupportedSchema(self.schema.clone()));
        }
        self.detector
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("detector: {}", e)))?;
        self.cleaner
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("cleaner: {}", e)))?;
        Ok(())
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
