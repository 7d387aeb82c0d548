//! Sequential line reading for CSV log files.
//!
//! Lines are returned with their terminator stripped. Empty lines are
//! returned too, since callers count every line for event indices. Bytes
//! that are not valid UTF-8 are replaced with U+FFFD, so one bad row
//! never hides the rest of the file.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Buffer size for reading log files (8KB).
const BUFFER_SIZE: usize = 8 * 1024;

/// Forward-only reader over the lines of a log file.
pub struct LineReader {
    reader: BufReader<File>,
    line_buffer: Vec<u8>,
}

impl LineReader {
    /// Open `path` for reading from the first line.
    pub fn open(path: &Path) -> Result<Self, std::io::Error> {
        let file = File::open(path)?;

        Ok(Self {
            reader: BufReader::with_capacity(BUFFER_SIZE, file),
            line_buffer: Vec::with_capacity(512),
        })
    }

    /// Read the next line.
    ///
    /// # Returns
    ///
    /// `Ok(Some(line))` for each line, `Ok(None)` at EOF, `Err` if the read fails.
    pub fn next_line(&mut self) -> Result<Option<String>, std::io::Error> {
        self.line_buffer.clear();

        if self.reader.read_until(b'\n', &mut self.line_buffer)? == 0 {
            return Ok(None);
        }
        let line = String::from_utf8_lossy(&self.line_buffer);
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_reads_lines_including_empty() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "header\r\nfirst\n\nthird").unwrap();

        let mut reader = LineReader::open(file.path()).unwrap();
        assert_eq!(reader.next_line().unwrap().as_deref(), Some("header"));
        assert_eq!(reader.next_line().unwrap().as_deref(), Some("first"));
        assert_eq!(reader.next_line().unwrap().as_deref(), Some(""));
        assert_eq!(reader.next_line().unwrap().as_deref(), Some("third"));
        assert_eq!(reader.next_line().unwrap(), None);
        assert_eq!(reader.next_line().unwrap(), None);
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"before\nRSSI:\xff\xfe\r\nafter\n").unwrap();

        let mut reader = LineReader::open(file.path()).unwrap();
        assert_eq!(reader.next_line().unwrap().as_deref(), Some("before"));
        assert_eq!(reader.next_line().unwrap().as_deref(), Some("RSSI:\u{FFFD}\u{FFFD}"));
        assert_eq!(reader.next_line().unwrap().as_deref(), Some("after"));
        assert_eq!(reader.next_line().unwrap(), None);
    }

    #[test]
    fn test_missing_file() {
        assert!(LineReader::open(Path::new("/definitely/not/here.csv")).is_err());
    }
}
