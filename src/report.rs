//! Serialisable summary of a detection run.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::common::TestDevice;
use crate::detection::{Anomaly, Detector};

pub const NO_ANOMALIES: &str = "No anomalies detected!";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceRef {
    pub broadcast_id: String,
    pub device_type: String,
}

impl From<&TestDevice> for DeviceRef {
    fn from(device: &TestDevice) -> Self {
        Self {
            broadcast_id: device.broadcast_id.clone(),
            device_type: device.device_type.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnomalyEntry {
    pub receiver: DeviceRef,
    pub transmitter: DeviceRef,
    pub from: String,
    pub to: String,
    pub duration_seconds: i64,
    pub description: String,
    pub evidence: Vec<String>,
}

impl From<&Anomaly<'_>> for AnomalyEntry {
    fn from(anomaly: &Anomaly<'_>) -> Self {
        Self {
            receiver: anomaly.receiver.into(),
            transmitter: anomaly.transmitter.into(),
            from: anomaly.from.to_rfc3339(),
            to: anomaly.to.to_rfc3339(),
            duration_seconds: anomaly.duration_seconds(),
            description: anomaly.to_string(),
            evidence: anomaly.evidence_texts(),
        }
    }
}

/// Anomalies found by one detector over one window.
#[derive(Debug, Clone, Serialize)]
pub struct AnomalyReport {
    pub detector: String,
    pub start_bound: String,
    pub end_bound: String,
    pub anomalies: Vec<AnomalyEntry>,
}

impl AnomalyReport {
    pub fn new(
        detector: &dyn Detector,
        start_bound: DateTime<Utc>,
        end_bound: DateTime<Utc>,
        anomalies: &[Anomaly<'_>],
    ) -> Self {
        Self {
            detector: detector.name().to_string(),
            start_bound: start_bound.to_rfc3339(),
            end_bound: end_bound.to_rfc3339(),
            anomalies: anomalies.iter().map(AnomalyEntry::from).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.anomalies.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// One description per line, then the total.
impl std::fmt::Display for AnomalyReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.anomalies.is_empty() {
            return writeln!(f, "{}", NO_ANOMALIES);
        }
        for entry in &self.anomalies {
            writeln!(f, "{}", entry.description)?;
        }
        writeln!(f, "Total anomalies: {}", self.anomalies.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::TestFolder;
    use crate::correlator::Correlator;
    use crate::detection::RssiGapDetection;
    use crate::test_support::{RunFixture, contact_row};
    use chrono::TimeZone;

    fn run() -> RunFixture {
        let run = RunFixture::new();
        run.device(
            "A",
            "Pixel5,android,12,AAAAAA",
            &[
                contact_row("2022-11-29 21:59:00", "BB:BB", 2, "BBBBBB"),
                contact_row("2022-11-29 22:00:00", "BB:BB", 3, "RSSI:-61.0"),
                contact_row("2022-11-29 22:25:00", "BB:BB", 3, "RSSI:-64.0"),
            ],
        );
        run.device("B", "iPhone X,iOS,16.1,BBBBBB", &[]);
        run
    }

    #[test]
    fn test_report_from_detection() {
        let run = run();
        let folder = TestFolder::new(run.path());
        let c = Correlator::new(folder.device_folders());
        let gap = RssiGapDetection::new(&c, 1_200_000);
        let start = Utc.with_ymd_and_hms(2022, 11, 29, 22, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2022, 11, 29, 22, 25, 0).unwrap();

        let anomalies = gap.detect(&folder, start, end).unwrap();
        let report = AnomalyReport::new(&gap, start, end, &anomalies);
        assert_eq!(report.detector, "rssi-gap");
        assert_eq!(report.anomalies.len(), 1);

        let entry = &report.anomalies[0];
        assert_eq!(entry.receiver.broadcast_id, "AAAAAA");
        assert_eq!(entry.transmitter.device_type, "iPhone X");
        assert_eq!(entry.from, "2022-11-29T22:00:00+00:00");
        assert_eq!(entry.duration_seconds, 1500);
        assert_eq!(entry.evidence, vec!["BLE,BB:BB,RSSI:-64.0", "BLE,BB:BB,RSSI:-61.0"]);

        let text = report.to_string();
        assert!(text.starts_with("RSSI Gap detected for device iPhone X by device Pixel5 of length 1500s"));
        assert!(text.ends_with("Total anomalies: 1\n"));

        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["anomalies"][0]["transmitter"]["broadcast_id"], "BBBBBB");
        assert_eq!(json["end_bound"], "2022-11-29T22:25:00+00:00");
    }

    #[test]
    fn test_empty_report() {
        let run = run();
        let folder = TestFolder::new(run.path());
        let c = Correlator::new(folder.device_folders());
        let gap = RssiGapDetection::new(&c, 1_200_000);
        let start = Utc.with_ymd_and_hms(2022, 11, 29, 22, 0, 0).unwrap();

        let anomalies = gap.detect(&folder, start, start).unwrap();
        let report = AnomalyReport::new(&gap, start, start, &anomalies);
        assert!(report.is_empty());
        assert_eq!(report.to_string(), format!("{}\n", NO_ANOMALIES));
    }
}
