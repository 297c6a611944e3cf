//! JSON processing profile with calibration, export and accumulation defaults.

use crate::common::constants::{DEFAULT_CALIBRATION_WIDTH, REFERENCE_CHANNEL};
use crate::domain::ChannelMismatchPolicy;
use crate::export::ExportFormat;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ProcessingConfig {
    pub calibration: CalibrationConfig,
    pub export: ExportConfig,
    pub accumulation: AccumulationConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CalibrationConfig {
    pub edge: Option<String>,
    pub channel: String,
    pub width: f64,
    pub smooth: bool,
    pub shift: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            edge: None,
            channel: REFERENCE_CHANNEL.to_string(),
            width: DEFAULT_CALIBRATION_WIDTH,
            smooth: false,
            shift: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ExportConfig {
    pub format: ExportFormat,
    /// Flux channel the detectors are divided by.
    pub norm: Option<String>,
    pub offset_mono: bool,
    pub name_format: Option<String>,
    pub increment: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AccumulationConfig {
    pub channel_mismatch: ChannelMismatchPolicy,
}

#[derive(Debug, thiserror::Error)]
pub enum ProcessingConfigError {
    #[error("failed to read processing config '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse processing config '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

pub fn load_processing_config(
    config_path: impl AsRef<Path>,
) -> Result<ProcessingConfig, ProcessingConfigError> {
    let config_path = config_path.as_ref();
    let source = fs::read_to_string(config_path).map_err(|source| ProcessingConfigError::Read {
        path: config_path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&source).map_err(|source| ProcessingConfigError::Parse {
        path: config_path.to_path_buf(),
        source,
    })
}
