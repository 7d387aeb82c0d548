//! Test run layout on disk: one run folder holding one folder per device.
//!
//! ```text
//! 2022-12-03-01/
//!   AndroidA40/contacts.csv
//!   AndroidA40/detection.csv
//!   iPhoneX/...
//! ```

use std::cell::{Cell, OnceCell};
use std::fs;
use std::path::{Path, PathBuf};

use super::device::TestDevice;
use crate::analyzer::{ContactLogSource, DetectionLogSource, EventGroupSummary, EventSource};

pub const CONTACTS_FILE: &str = "contacts.csv";
pub const DETECTION_FILE: &str = "detection.csv";

/// One event source and its summary.
pub struct EventGroup {
    source: Box<dyn EventSource>,
}

impl EventGroup {
    pub fn new(source: impl EventSource + 'static) -> Self {
        Self {
            source: Box::new(source),
        }
    }

    pub fn source(&self) -> &dyn EventSource {
        self.source.as_ref()
    }

    /// Summary of the source, parsing it if needed.
    pub fn summary(&self) -> EventGroupSummary {
        self.source.summarise()
    }
}

/// A single device's log folder.
///
/// Both logs are opened lazily. The checking flags control which logs are
/// opened when event groups or the device are first requested.
pub struct DeviceFolder {
    name: String,
    path: PathBuf,
    checking_contacts: Cell<bool>,
    checking_detections: Cell<bool>,
    contacts: OnceCell<EventGroup>,
    detections: OnceCell<EventGroup>,
    undescribed: TestDevice,
}

impl DeviceFolder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        Self {
            name,
            path,
            checking_contacts: Cell::new(true),
            checking_detections: Cell::new(true),
            contacts: OnceCell::new(),
            detections: OnceCell::new(),
            undescribed: TestDevice::default(),
        }
    }

    /// Folder name, e.g. `AndroidA40`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn set_checking_contacts(&self, check: bool) {
        self.checking_contacts.set(check);
    }

    pub fn is_checking_contacts(&self) -> bool {
        self.checking_contacts.get()
    }

    pub fn set_checking_detections(&self, check: bool) {
        self.checking_detections.set(check);
    }

    pub fn is_checking_detections(&self) -> bool {
        self.checking_detections.get()
    }

    fn read_detections(&self) {
        if self.checking_detections.get() {
            self.detections
                .get_or_init(|| EventGroup::new(DetectionLogSource::new(self.path.join(DETECTION_FILE))));
        }
    }

    /// Event groups opened so far, contacts first.
    ///
    /// A group is opened on the first call made while its checking flag is
    /// set; once opened it is always returned.
    pub fn event_groups(&self) -> Vec<&EventGroup> {
        if self.checking_contacts.get() {
            self.contacts
                .get_or_init(|| EventGroup::new(ContactLogSource::new(self.path.join(CONTACTS_FILE))));
        }
        self.read_detections();

        self.contacts.get().into_iter().chain(self.detections.get()).collect()
    }

    /// Device identity from detection.csv, or a blank device if it is not read.
    pub fn device(&self) -> &TestDevice {
        self.read_detections();
        self.detections
            .get()
            .and_then(|group| group.source().device())
            .unwrap_or(&self.undescribed)
    }
}

/// A test run folder, listing device folders on construction.
pub struct TestFolder {
    path: PathBuf,
    folders: Vec<DeviceFolder>,
}

impl TestFolder {
    /// List the subfolders of `path` as device folders, sorted by name.
    ///
    /// An unreadable or missing folder yields no devices.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let folders = match list_subfolders(&path) {
            Ok(mut dirs) => {
                dirs.sort();
                dirs.into_iter().map(DeviceFolder::new).collect()
            }
            Err(e) => {
                log::debug!("Cannot list {}: {}", path.display(), e);
                Vec::new()
            }
        };

        Self { path, folders }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_dir()
    }

    pub fn device_folders(&self) -> &[DeviceFolder] {
        &self.folders
    }

    pub fn device_folder_by_name(&self, name: &str) -> Option<&DeviceFolder> {
        self.folders.iter().find(|f| f.name() == name)
    }
}

fn list_subfolders(path: &Path) -> Result<Vec<PathBuf>, std::io::Error> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        }
    }
    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::EventType;
    use crate::common::device::OperatingSystem;
    use crate::test_support::{RunFixture, contact_row};

    fn fixture() -> RunFixture {
        let run = RunFixture::new();
        run.device(
            "AndroidA40",
            "SM-A405FN,android,29,ZqFdag,lGxWLg,ql8F4g",
            &[
                contact_row("2022-11-29 22:21:00", "7B:AC:AC:34:E9:4A", 1, ""),
                contact_row("2022-11-29 22:21:01", "7B:AC:AC:34:E9:4A", 2, "lGxWLg"),
            ],
        );
        run.device("iPhoneX", "iPhone X,iOS,16.1,ql8F4g,ZqFdag", &[]);
        fs::write(run.path().join("notes.txt"), "not a device").unwrap();
        run
    }

    #[test]
    fn test_lists_device_folders() {
        let run = fixture();
        let folder = TestFolder::new(run.path());
        assert!(folder.exists());
        let names: Vec<&str> = folder.device_folders().iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["AndroidA40", "iPhoneX"]);
        assert!(folder.device_folder_by_name("iPhoneX").is_some());
        assert!(folder.device_folder_by_name("notes.txt").is_none());
    }

    #[test]
    fn test_invalid_folder_has_no_devices() {
        let folder = TestFolder::new("wibble");
        assert!(!folder.exists());
        assert!(folder.device_folders().is_empty());
    }

    #[test]
    fn test_device_from_detections_only() {
        let run = fixture();
        let folder = TestFolder::new(run.path());
        let dv = folder.device_folder_by_name("AndroidA40").unwrap();
        dv.set_checking_contacts(false);
        assert!(dv.is_checking_detections());
        assert!(!dv.is_checking_contacts());

        let device = dv.device();
        assert_eq!(device.os, OperatingSystem::Android);
        assert_eq!(device.os_version, "29");
        assert_eq!(device.broadcast_id, "ZqFdag");
        assert_eq!(device.device_type, "SM-A405FN");

        let groups = dv.event_groups();
        assert_eq!(groups.len(), 1);
        let summary = groups[0].summary();
        assert_eq!(summary.event_count, 2);
        assert_eq!(summary.types.iter().next(), Some(&EventType::DetectionBroadcastIdLoggedBefore));
    }

    #[test]
    fn test_contacts_only() {
        let run = fixture();
        let dv = DeviceFolder::new(run.path().join("AndroidA40"));
        dv.set_checking_detections(false);

        let groups = dv.event_groups();
        assert_eq!(groups.len(), 1);
        assert!(groups[0].summary().contains(EventType::ContactRead));
        assert_eq!(dv.device(), &TestDevice::default());

        // Enabling detections later adds the missing group.
        dv.set_checking_detections(true);
        assert_eq!(dv.event_groups().len(), 2);
        assert_eq!(dv.device().broadcast_id, "ZqFdag");
    }
}
