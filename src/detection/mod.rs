//! Anomaly detectors and the anomalies they report.

pub mod rssi_gap;

use chrono::{DateTime, Utc};

use crate::analyzer::{EventList, EventSource};
use crate::common::{TestDevice, TestFolder};
use crate::error::Result;

pub use rssi_gap::RssiGapDetection;

/// Analysis over a whole test run within a time window.
pub trait Detector {
    /// Short identifier used in reports.
    fn name(&self) -> &str;

    /// Find anomalies in `test_run` between `start_bound` and `end_bound`.
    fn detect<'a>(
        &'a self,
        test_run: &'a TestFolder,
        start_bound: DateTime<Utc>,
        end_bound: DateTime<Utc>,
    ) -> Result<Vec<Anomaly<'a>>>;

    /// Human-readable description of one of this detector's anomalies.
    fn describe(&self, anomaly: &Anomaly<'_>) -> String;
}

/// A receiver/transmitter problem over `[from, to)`, with supporting events.
pub struct Anomaly<'a> {
    pub detected_by: &'a dyn Detector,
    pub receiver: &'a TestDevice,
    pub transmitter: &'a TestDevice,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub evidence: EventList,
    /// Source the evidence events were parsed from.
    pub evidence_source: &'a dyn EventSource,
}

impl Anomaly<'_> {
    /// Raw text of each evidence event, in evidence order.
    pub fn evidence_texts(&self) -> Vec<String> {
        self.evidence.iter().map(|e| e.text(self.evidence_source)).collect()
    }

    pub fn duration_seconds(&self) -> i64 {
        (self.to - self.from).num_seconds()
    }
}

impl std::fmt::Display for Anomaly<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.detected_by.describe(self))
    }
}

impl std::fmt::Debug for Anomaly<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Anomaly")
            .field("detected_by", &self.detected_by.name())
            .field("receiver", &self.receiver.broadcast_id)
            .field("transmitter", &self.transmitter.broadcast_id)
            .field("from", &self.from)
            .field("to", &self.to)
            .field("evidence", &self.evidence.len())
            .finish()
    }
}
