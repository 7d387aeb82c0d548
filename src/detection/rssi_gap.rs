//! Detection of gaps in RSSI reporting between device pairs.
//!
//! Each receiver's measurement events are walked in file order. The
//! transmitter of each measurement is resolved from its physical address
//! through the `Correlator`, and the time since that transmitter was last
//! measured by the same receiver is compared with the minimum interval.

use chrono::{DateTime, Utc};

use super::{Anomaly, Detector};
use crate::analyzer::{Event, EventSource, EventType};
use crate::common::TestFolder;
use crate::correlator::Correlator;
use crate::error::Result;

/// Format of the start time in anomaly descriptions.
const DESCRIBE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Flags receiver/transmitter pairs whose RSSI measurements stop for longer
/// than `interval_ms` inside the analysis window.
///
/// `detect` expects the run the correlator was built from. Receivers from
/// another `TestFolder` are matched to correlator devices by identity.
pub struct RssiGapDetection<'c> {
    correlator: &'c Correlator<'c>,
    interval_ms: i64,
}

impl<'c> RssiGapDetection<'c> {
    pub fn new(correlator: &'c Correlator<'c>, minimum_interval_ms: i64) -> Self {
        Self {
            correlator,
            interval_ms: minimum_interval_ms,
        }
    }

    pub fn interval_ms(&self) -> i64 {
        self.interval_ms
    }

    fn exceeds_interval(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> bool {
        (to - from).num_milliseconds() > self.interval_ms
    }

    /// Folder position of the device measured by an RSSI event's text.
    fn transmitter_position(&self, text: &str) -> Result<Option<usize>> {
        match text.split(',').nth(1) {
            Some(address) => self.correlator.position_by_address(address),
            None => Ok(None),
        }
    }
}

impl Detector for RssiGapDetection<'_> {
    fn name(&self) -> &str {
        "rssi-gap"
    }

    fn detect<'a>(
        &'a self,
        test_run: &'a TestFolder,
        start_bound: DateTime<Utc>,
        end_bound: DateTime<Utc>,
    ) -> Result<Vec<Anomaly<'a>>> {
        let transmitters = self.correlator.folders();
        let mut anomalies = Vec::new();
        // Last measurement of each transmitter by the current receiver.
        let mut last_seen: Vec<Option<(Event, &'a dyn EventSource)>> = vec![None; transmitters.len()];

        for receiver_folder in test_run.device_folders() {
            let receiver = receiver_folder.device();
            let receiver_position = self.correlator.position_of(receiver);

            for group in receiver_folder.event_groups() {
                if !group.summary().contains(EventType::ContactMeasure) {
                    continue;
                }
                let source = group.source();
                let mut cursor = source.cursor();
                let mut next = cursor.first_by_type(EventType::ContactMeasure);
                while let Some(event) = next {
                    next = cursor.next_by_type(EventType::ContactMeasure);

                    // Partially mapped runs leave some addresses unresolved.
                    let Some(position) = self.transmitter_position(&event.text(source))? else {
                        continue;
                    };
                    if Some(position) == receiver_position {
                        continue;
                    }
                    let transmitter = transmitters[position].device();

                    let in_window = event.occurred >= start_bound && event.occurred <= end_bound;
                    match last_seen[position] {
                        Some((last, _)) if in_window && self.exceeds_interval(last.occurred, event.occurred) => {
                            anomalies.push(Anomaly {
                                detected_by: self,
                                receiver,
                                transmitter,
                                from: last.occurred,
                                to: event.occurred,
                                evidence: [event, last].into_iter().collect(),
                                evidence_source: source,
                            });
                        }
                        None if in_window && self.exceeds_interval(start_bound, event.occurred) => {
                            // Monitoring start is unknown, so a leading gap is not reported.
                            log::debug!(
                                "First RSSI of {} by {} at {} is beyond the interval from the window start",
                                transmitter.device_type,
                                receiver.device_type,
                                event.occurred
                            );
                        }
                        _ => {}
                    }

                    last_seen[position] = Some((event, source));
                }
            }

            for (position, last) in last_seen.iter_mut().enumerate() {
                let Some((event, source)) = last.take() else {
                    continue;
                };
                if self.exceeds_interval(event.occurred, end_bound) {
                    anomalies.push(Anomaly {
                        detected_by: self,
                        receiver,
                        transmitter: transmitters[position].device(),
                        from: event.occurred,
                        to: end_bound,
                        evidence: [event].into_iter().collect(),
                        evidence_source: source,
                    });
                }
            }
        }

        log::debug!("{} found {} anomalies", self.name(), anomalies.len());
        Ok(anomalies)
    }

    fn describe(&self, anomaly: &Anomaly<'_>) -> String {
        format!(
            "RSSI Gap detected for device {} by device {} of length {}s from {} with {} events as evidence",
            anomaly.transmitter.device_type,
            anomaly.receiver.device_type,
            anomaly.duration_seconds(),
            anomaly.from.format(DESCRIBE_TIME_FORMAT),
            anomaly.evidence.len()
        )
    }
}
