//! Error type for anomaly analysis.

use std::path::PathBuf;
use thiserror::Error;

/// Failures that stop an analysis run.
///
/// Malformed contact rows and unreadable log files are not errors; sources
/// recover from those locally.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Malformed read event {event_index} for device {device}: '{text}' (expected sensor,address,broadcastId)")]
    MalformedReadEvent {
        device: String,
        event_index: u64,
        text: String,
    },

    #[error("Folder '{}' does not exist", .0.display())]
    FolderNotFound(PathBuf),

    #[error("Folder '{}' is a file, not a folder", .0.display())]
    NotAFolder(PathBuf),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
