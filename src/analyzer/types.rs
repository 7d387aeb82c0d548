//! Type definitions for parsed log events.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;

use super::source::EventSource;

/// Kind of a parsed log event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum EventType {
    // Application log lines
    LogDebug,
    LogFault,
    LogInfo,

    // contacts.csv rows
    ContactDetected,
    ContactRead,
    ContactMeasure,
    ContactShare,
    ContactVisit,
    ContactIsHerald,
    ContactDeleted,

    // detection.csv entries
    DetectionBroadcastIdLoggedBefore,
}

/// Provenance of an event inside its owning `EventSource`.
///
/// `start` and `end` are event indices as understood by the source, not
/// necessarily physical file lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventPointer {
    pub start: u64,
    pub end: u64,
}

impl EventPointer {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// Pointer covering a single event index.
    pub fn single(index: u64) -> Self {
        Self::new(index, index)
    }

    /// Raw text for the whole index range, newline joined.
    pub fn text<S: EventSource + ?Sized>(&self, source: &S) -> String {
        (self.start..=self.end).map(|index| source.text(index)).collect::<Vec<_>>().join("\n")
    }
}

/// A timestamped, typed event. Immutable once parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub occurred: DateTime<Utc>,
    pub event_type: EventType,
    pub pointer: EventPointer,
}

impl Event {
    pub fn new(occurred: DateTime<Utc>, event_type: EventType, pointer: EventPointer) -> Self {
        Self {
            occurred,
            event_type,
            pointer,
        }
    }

    /// Raw text for this event, read back from the source that produced it.
    pub fn text<S: EventSource + ?Sized>(&self, source: &S) -> String {
        self.pointer.text(source)
    }
}

/// Ordered list of events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventList {
    events: Vec<Event>,
}

impl EventList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Event at `position`, or `None` past the end.
    pub fn at_index(&self, position: usize) -> Option<&Event> {
        self.events.get(position)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }
}

impl FromIterator<Event> for EventList {
    fn from_iter<I: IntoIterator<Item = Event>>(iter: I) -> Self {
        Self {
            events: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a EventList {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

/// Snapshot of the event types present in one source and how many events it holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventGroupSummary {
    pub types: BTreeSet<EventType>,
    pub event_count: u64,
}

impl EventGroupSummary {
    pub fn new(types: BTreeSet<EventType>, event_count: u64) -> Self {
        Self { types, event_count }
    }

    /// Summary for a source that produced nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Summary derived from a parsed event list.
    pub fn of(events: &EventList) -> Self {
        Self {
            types: events.iter().map(|e| e.event_type).collect(),
            event_count: events.len() as u64,
        }
    }

    pub fn contains(&self, event_type: EventType) -> bool {
        self.types.contains(&event_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_summary_of_events() {
        let at = Utc.with_ymd_and_hms(2022, 11, 29, 22, 21, 0).unwrap();
        let events: EventList = [
            Event::new(at, EventType::ContactRead, EventPointer::single(1)),
            Event::new(at, EventType::ContactMeasure, EventPointer::single(2)),
            Event::new(at, EventType::ContactRead, EventPointer::single(3)),
        ]
        .into_iter()
        .collect();

        let summary = EventGroupSummary::of(&events);
        assert_eq!(summary.event_count, 3);
        assert_eq!(summary.types.len(), 2);
        assert!(summary.contains(EventType::ContactRead));
        assert!(!summary.contains(EventType::ContactDetected));
        assert_eq!(summary.types.iter().next(), Some(&EventType::ContactRead));
    }

    #[test]
    fn test_at_index_past_end() {
        let list = EventList::new();
        assert!(list.at_index(0).is_none());
        assert!(list.is_empty());
    }
}
