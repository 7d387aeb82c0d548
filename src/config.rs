//! Configuration loading for an analysis run.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{AnalysisError, Result};

/// Name of the optional per-run configuration file.
pub const CONFIG_FILE: &str = "anomaly-detection.toml";

pub const DEFAULT_MINIMUM_GAP_SECONDS: u64 = 20 * 60;
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Analysis settings. Every key is optional in the file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct AnalysisConfig {
    /// Longest silence between RSSI measurements that is not an anomaly
    pub minimum_gap_seconds: u64,
    /// chrono format of the start and end bounds given on the command line
    pub date_format: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            minimum_gap_seconds: DEFAULT_MINIMUM_GAP_SECONDS,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from a TOML file.
    ///
    /// A missing file gives the defaults; an unreadable or invalid one is an error.
    pub fn load(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            log::debug!("No config at {}, using defaults", config_path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(config_path)
            .map_err(|e| AnalysisError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content).map_err(|e| AnalysisError::Config(format!("Failed to parse config file: {}", e)))
    }

    /// Config path inside a test run folder.
    pub fn config_path_for(run_folder: &Path) -> PathBuf {
        run_folder.join(CONFIG_FILE)
    }

    pub fn minimum_gap_ms(&self) -> i64 {
        i64::try_from(self.minimum_gap_seconds.saturating_mul(1000)).unwrap_or(i64::MAX)
    }
}
