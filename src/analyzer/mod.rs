//! Log file parsing into typed event streams.
//!
//! Provides:
//! - The `EventSource` capability with its lazy parse and cursor API
//! - `ContactLogSource` for contacts.csv
//! - `DetectionLogSource` for detection.csv

pub mod contact_log;
pub mod detection_log;
pub mod line_reader;
pub mod source;
pub mod types;

pub use contact_log::ContactLogSource;
pub use detection_log::DetectionLogSource;
pub use source::{EventCursor, EventSource};
pub use types::{Event, EventGroupSummary, EventList, EventPointer, EventType};
