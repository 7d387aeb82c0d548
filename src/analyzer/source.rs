//! The `EventSource` capability shared by every log file parser.
//!
//! A source parses its file once, on first demand, into an immutable
//! `EventList`. Traversal happens through an `EventCursor`: either a fresh
//! one from [`EventSource::cursor`], or the single shared cursor behind
//! `first`/`next`/`first_by_type`/`next_by_type`. The shared cursor is one
//! index per source, so typed and untyped calls move the same position.

use std::cell::Cell;

use super::types::{Event, EventGroupSummary, EventList, EventType};
use crate::common::device::TestDevice;

/// Lazily parsed, typed view of a single log file.
pub trait EventSource {
    /// Summary of the parsed file (event types present and event count).
    fn summarise(&self) -> EventGroupSummary;

    /// All events in file order.
    fn events(&self) -> &EventList;

    /// Raw field text for an event index. Independent of any cursor.
    fn text(&self, index: u64) -> String;

    /// Storage for the shared cursor position.
    fn shared_index(&self) -> &Cell<usize>;

    /// Device identity described by this source, if it carries one.
    fn device(&self) -> Option<&TestDevice> {
        None
    }

    /// New cursor positioned before the first event.
    fn cursor(&self) -> EventCursor<'_> {
        EventCursor::new(self.events())
    }

    /// True while the shared cursor sits on an event.
    fn has_event(&self) -> bool {
        let events = self.events();
        !events.is_empty() && self.shared_index().get() < events.len()
    }

    fn first(&self) -> Option<Event> {
        shared_step(self, |cursor| cursor.first())
    }

    fn next(&self) -> Option<Event> {
        shared_step(self, |cursor| cursor.next())
    }

    fn first_by_type(&self, event_type: EventType) -> Option<Event> {
        shared_step(self, |cursor| cursor.first_by_type(event_type))
    }

    fn next_by_type(&self, event_type: EventType) -> Option<Event> {
        shared_step(self, |cursor| cursor.next_by_type(event_type))
    }
}

fn shared_step<S, F>(source: &S, step: F) -> Option<Event>
where
    S: EventSource + ?Sized,
    F: FnOnce(&mut EventCursor<'_>) -> Option<Event>,
{
    let mut cursor = EventCursor::at(source.events(), source.shared_index().get());
    let found = step(&mut cursor);
    source.shared_index().set(cursor.index());
    found
}

/// Position over an `EventList`.
///
/// The index is clamped to the list length once traversal runs off the end.
#[derive(Debug, Clone)]
pub struct EventCursor<'a> {
    events: &'a EventList,
    index: usize,
}

impl<'a> EventCursor<'a> {
    pub fn new(events: &'a EventList) -> Self {
        Self::at(events, 0)
    }

    pub fn at(events: &'a EventList, index: usize) -> Self {
        Self { events, index }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn first(&mut self) -> Option<Event> {
        self.index = 0;
        self.events.at_index(self.index).copied()
    }

    pub fn next(&mut self) -> Option<Event> {
        self.index += 1;
        let found = self.events.at_index(self.index).copied();
        self.clamp();
        found
    }

    pub fn first_by_type(&mut self, event_type: EventType) -> Option<Event> {
        self.index = 0;
        self.find_by_type(event_type)
    }

    pub fn next_by_type(&mut self, event_type: EventType) -> Option<Event> {
        self.index += 1;
        self.find_by_type(event_type)
    }

    /// Advance from the current index to the first event of `event_type`.
    fn find_by_type(&mut self, event_type: EventType) -> Option<Event> {
        while let Some(event) = self.events.at_index(self.index) {
            if event.event_type == event_type {
                return Some(*event);
            }
            self.index += 1;
        }
        self.clamp();
        None
    }

    fn clamp(&mut self) {
        self.index = self.index.min(self.events.len());
    }
}
