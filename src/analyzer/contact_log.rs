//! Parser for a device's `contacts.csv` log.
//!
//! The header row names the columns; order is not fixed. Each data row yields
//! at most one event, selected by the first marker column that holds its
//! row-type digit:
//!
//! ```text
//! time,sensor,id,detect,read,measure,share,visit,detectHerald,delete,data
//! 2022-11-29 22:21:00,BLE,7B:AC:AC:34:E9:4A,,2,,,,,,lGxWLg
//! 2022-11-29 22:21:04,BLE,7B:AC:AC:34:E9:4A,,,3,,,,,RSSI:-62.0
//! ```
//!
//! Event indices count every line after the header, starting at 1, including
//! rows that are later skipped as malformed.

use chrono::{DateTime, NaiveDateTime, Utc};
use std::cell::{Cell, OnceCell, RefCell};
use std::path::{Path, PathBuf};

use super::line_reader::LineReader;
use super::source::EventSource;
use super::types::{Event, EventGroupSummary, EventList, EventPointer, EventType};

/// Timestamp format of the `time` column (UTC).
pub const CONTACT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Rows with fewer fields are skipped.
const MIN_ROW_FIELDS: usize = 9;

/// Rows with fewer fields cannot be turned back into event text.
const MIN_TEXT_FIELDS: usize = 11;

/// Column positions resolved from the header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ContactColumns {
    time: usize,
    sensor: usize,
    id: usize,
    detect: usize,
    read: usize,
    measure: usize,
    share: usize,
    visit: usize,
    detect_herald: usize,
    delete: usize,
    data: usize,
}

impl ContactColumns {
    /// Resolve every named column, or `None` if any is missing.
    fn from_header(header: &str) -> Option<Self> {
        // Last occurrence wins for duplicated names.
        let position = |name: &str| {
            header
                .split(',')
                .enumerate()
                .filter(|(_, h)| *h == name)
                .map(|(i, _)| i)
                .last()
        };

        Some(Self {
            time: position("time")?,
            sensor: position("sensor")?,
            id: position("id")?,
            detect: position("detect")?,
            read: position("read")?,
            measure: position("measure")?,
            share: position("share")?,
            visit: position("visit")?,
            detect_herald: position("detectHerald")?,
            delete: position("delete")?,
            data: position("data")?,
        })
    }

    /// Event type of a row: the first marker column holding its literal digit.
    fn event_type(&self, fields: &[&str]) -> Option<EventType> {
        let markers = [
            (self.detect, "1", EventType::ContactDetected),
            (self.read, "2", EventType::ContactRead),
            (self.measure, "3", EventType::ContactMeasure),
            (self.share, "4", EventType::ContactShare),
            (self.visit, "5", EventType::ContactVisit),
            (self.detect_herald, "6", EventType::ContactIsHerald),
            (self.delete, "7", EventType::ContactDeleted),
        ];

        markers
            .into_iter()
            .find(|(column, digit, _)| fields.get(*column) == Some(digit))
            .map(|(_, _, event_type)| event_type)
    }

    fn timestamp(&self, fields: &[&str]) -> DateTime<Utc> {
        let raw = fields.get(self.time).copied().unwrap_or_default();
        match NaiveDateTime::parse_from_str(raw, CONTACT_TIME_FORMAT) {
            Ok(naive) => naive.and_utc(),
            Err(e) => {
                log::warn!("Unparseable contact time '{}': {}, using current time", raw, e);
                Utc::now()
            }
        }
    }

    /// `<sensor>,<id>,<data>` for a raw row.
    fn text(&self, line: &str) -> String {
        if line.is_empty() {
            return String::new();
        }
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() < MIN_TEXT_FIELDS {
            log::warn!("Contact row has {} fields, expected {}: {}", fields.len(), MIN_TEXT_FIELDS, line);
            return String::new();
        }
        let field = |column: usize| fields.get(column).copied().unwrap_or_default();
        format!("{},{},{}", field(self.sensor), field(self.id), field(self.data))
    }
}

/// Result of the one-time parse.
#[derive(Debug, Default)]
struct ContactLog {
    columns: Option<ContactColumns>,
    events: EventList,
    summary: EventGroupSummary,
}

impl ContactLog {
    fn read(path: &Path) -> Result<Self, std::io::Error> {
        let mut reader = LineReader::open(path)?;

        let Some(header) = reader.next_line()? else {
            return Ok(Self::default());
        };
        let Some(columns) = ContactColumns::from_header(&header) else {
            log::warn!("{}: header is missing contact columns: {}", path.display(), header);
            return Ok(Self::default());
        };

        let mut events = EventList::new();
        let mut index = 0u64;
        while let Some(line) = reader.next_line()? {
            index += 1;
            let fields: Vec<&str> = line.split(',').collect();
            if fields.len() < MIN_ROW_FIELDS {
                log::debug!("{}: skipping row {} with {} fields", path.display(), index, fields.len());
                continue;
            }

            let timestamp = columns.timestamp(&fields);
            if let Some(event_type) = columns.event_type(&fields) {
                events.add(Event::new(timestamp, event_type, EventPointer::single(index)));
            }
        }

        let summary = EventGroupSummary::of(&events);
        Ok(Self {
            columns: Some(columns),
            events,
            summary,
        })
    }
}

/// Position of the `text()` reader. `index` is the data row held in `line`.
struct TextCursor {
    reader: LineReader,
    index: u64,
    line: Option<String>,
}

impl TextCursor {
    fn open(path: &Path) -> Result<Self, std::io::Error> {
        let mut reader = LineReader::open(path)?;
        reader.next_line()?;
        let line = reader.next_line()?;
        Ok(Self { reader, index: 1, line })
    }

    /// Move forward to row `index`; `None` once the file is exhausted.
    fn seek(&mut self, index: u64) -> Result<Option<&str>, std::io::Error> {
        while self.index < index && self.line.is_some() {
            self.line = self.reader.next_line()?;
            self.index += 1;
        }
        Ok(self.line.as_deref())
    }
}

/// Lazily parsed `contacts.csv`.
pub struct ContactLogSource {
    path: PathBuf,
    parsed: OnceCell<ContactLog>,
    shared_index: Cell<usize>,
    text_cursor: RefCell<Option<TextCursor>>,
}

impl ContactLogSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            parsed: OnceCell::new(),
            shared_index: Cell::new(0),
            text_cursor: RefCell::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parsed(&self) -> &ContactLog {
        self.parsed.get_or_init(|| match ContactLog::read(&self.path) {
            Ok(log) => {
                log::debug!("{}: parsed {} contact events", self.path.display(), log.events.len());
                log
            }
            Err(e) => {
                log::warn!("Failed to read contact log {}: {}", self.path.display(), e);
                ContactLog::default()
            }
        })
    }
}

impl EventSource for ContactLogSource {
    fn summarise(&self) -> EventGroupSummary {
        self.parsed().summary.clone()
    }

    fn events(&self) -> &EventList {
        &self.parsed().events
    }

    fn text(&self, index: u64) -> String {
        let Some(columns) = self.parsed().columns else {
            return String::new();
        };

        let mut cache = self.text_cursor.borrow_mut();
        if cache.as_ref().is_some_and(|cursor| index < cursor.index) {
            *cache = None;
        }
        if cache.is_none() {
            match TextCursor::open(&self.path) {
                Ok(cursor) => *cache = Some(cursor),
                Err(e) => {
                    log::warn!("Failed to reopen contact log {}: {}", self.path.display(), e);
                    return String::new();
                }
            }
        }

        let Some(cursor) = cache.as_mut() else {
            return String::new();
        };
        let text = cursor.seek(index).map(|line| line.map(|l| columns.text(l)).unwrap_or_default());
        match text {
            Ok(text) => text,
            Err(e) => {
                log::warn!("Failed to read contact log {}: {}", self.path.display(), e);
                *cache = None;
                String::new()
            }
        }
    }

    fn shared_index(&self) -> &Cell<usize> {
        &self.shared_index
    }
}
