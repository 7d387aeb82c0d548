//! Parser for a device's `detection.csv`.
//!
//! The file is a single header-less line:
//!
//! ```text
//! deviceName,osName,osVersion,ownBroadcastId[,seenBroadcastId]*
//! Pixel5,android,12,ZqFdag,lGxWLg,ql8F4g
//! ```
//!
//! Every seen broadcast id becomes a `DetectionBroadcastIdLoggedBefore` event
//! whose index is its column position in the line.

use chrono::Utc;
use std::cell::Cell;
use std::path::{Path, PathBuf};

use super::line_reader::LineReader;
use super::source::EventSource;
use super::types::{Event, EventGroupSummary, EventList, EventPointer, EventType};
use crate::common::device::{OperatingSystem, TestDevice};

/// Columns before the first seen broadcast id.
const IDENTITY_FIELDS: usize = 4;

/// Parsed `detection.csv`. Parsing happens in `new`.
pub struct DetectionLogSource {
    path: PathBuf,
    elements: Vec<String>,
    device: TestDevice,
    events: EventList,
    summary: EventGroupSummary,
    shared_index: Cell<usize>,
}

impl DetectionLogSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let elements = read_elements(&path);

        let mut device = TestDevice::default();
        let mut events = EventList::new();
        if elements.len() >= IDENTITY_FIELDS {
            device = TestDevice::new(
                &elements[0],
                &elements[3],
                OperatingSystem::from_name(&elements[1]),
                &elements[2],
            );

            let read = Utc::now();
            for index in IDENTITY_FIELDS..elements.len() {
                events.add(Event::new(
                    read,
                    EventType::DetectionBroadcastIdLoggedBefore,
                    EventPointer::single(index as u64),
                ));
            }
        } else {
            log::debug!("{}: {} fields, no device description", path.display(), elements.len());
        }

        let summary = EventGroupSummary::of(&events);
        Self {
            path,
            elements,
            device,
            events,
            summary,
            shared_index: Cell::new(0),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn device_name(&self) -> &str {
        &self.device.device_type
    }

    pub fn os_name(&self) -> &str {
        self.field(1)
    }

    pub fn os_version(&self) -> &str {
        &self.device.os_version
    }

    pub fn own_broadcast_id(&self) -> &str {
        &self.device.broadcast_id
    }

    fn field(&self, index: usize) -> &str {
        if self.elements.len() < IDENTITY_FIELDS {
            return "";
        }
        self.elements.get(index).map(String::as_str).unwrap_or_default()
    }
}

/// Comma-split first line, without trailing empty fields.
fn read_elements(path: &Path) -> Vec<String> {
    let line = match LineReader::open(path).and_then(|mut reader| reader.next_line()) {
        Ok(Some(line)) => line,
        Ok(None) => return Vec::new(),
        Err(e) => {
            log::warn!("Failed to read detection log {}: {}", path.display(), e);
            return Vec::new();
        }
    };

    let mut elements: Vec<String> = line.split(',').map(str::to_string).collect();
    while elements.last().is_some_and(|e| e.is_empty()) {
        elements.pop();
    }
    elements
}

impl EventSource for DetectionLogSource {
    fn summarise(&self) -> EventGroupSummary {
        self.summary.clone()
    }

    fn events(&self) -> &EventList {
        &self.events
    }

    /// Column at `index` in the raw line, or empty if out of range.
    fn text(&self, index: u64) -> String {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.elements.get(i))
            .cloned()
            .unwrap_or_default()
    }

    fn shared_index(&self) -> &Cell<usize> {
        &self.shared_index
    }

    fn device(&self) -> Option<&TestDevice> {
        Some(&self.device)
    }
}
