//! Fixture builders for test run folders.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::common::folder::{CONTACTS_FILE, DETECTION_FILE};

pub const CONTACT_HEADER: &str = "time,sensor,id,detect,read,measure,share,visit,detectHerald,delete,data";

/// Build a contacts.csv row in the standard column order.
///
/// `marker` is the row-type digit 1..=7 (detect..delete), placed in its own column.
pub fn contact_row(time: &str, address: &str, marker: u8, data: &str) -> String {
    let digit = marker.to_string();
    let mut markers = vec![""; 7];
    markers[usize::from(marker) - 1] = &digit;
    format!("{},BLE,{},{},{}", time, address, markers.join(","), data)
}

/// A temporary run folder containing device folders.
pub struct RunFixture {
    pub dir: TempDir,
}

impl RunFixture {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Create a device folder with a detection line and contact rows (header added).
    pub fn device(&self, name: &str, detection: &str, rows: &[String]) -> PathBuf {
        let folder = self.dir.path().join(name);
        fs::create_dir_all(&folder).unwrap();
        fs::write(folder.join(DETECTION_FILE), format!("{}\n", detection)).unwrap();
        let mut contacts = String::from(CONTACT_HEADER);
        contacts.push('\n');
        for row in rows {
            contacts.push_str(row);
            contacts.push('\n');
        }
        fs::write(folder.join(CONTACTS_FILE), contacts).unwrap();
        folder
    }
}
