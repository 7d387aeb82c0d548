//! Anomaly detection over Herald contact-tracing test runs.
//!
//! A test run is a folder of per-device log folders. Each device folder holds
//! `contacts.csv` (timestamped BLE contact events) and `detection.csv` (the
//! device identity and the broadcast ids it saw). Logs are parsed lazily into
//! typed events, devices are correlated across folders by broadcast id and
//! physical address, and detectors scan the correlated run for anomalies such
//! as gaps in RSSI reporting.

pub mod analyzer;
pub mod common;
pub mod config;
pub mod correlator;
pub mod detection;
pub mod error;
pub mod report;

#[cfg(test)]
mod test_support;

pub use config::AnalysisConfig;
pub use correlator::Correlator;
pub use detection::{Anomaly, Detector, RssiGapDetection};
pub use error::{AnalysisError, Result};
pub use report::AnomalyReport;
