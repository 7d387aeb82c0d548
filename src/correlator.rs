//! Cross-device correlation for a test run.
//!
//! Devices are linked by the broadcast id each one writes to its own
//! detection.csv. The physical addresses a device was seen under are
//! recovered from the read events in every *other* device's contacts.csv,
//! where each read reports `<sensor>,<address>,<broadcastId>`.
//!
//! Devices are kept in folder order and referred to internally by their
//! position in that list.

use std::cell::OnceCell;
use std::collections::{BTreeSet, HashMap};

use crate::analyzer::{EventList, EventType};
use crate::common::{DeviceFolder, EventGroup, TestDevice};
use crate::error::{AnalysisError, Result};

/// Minimum comma fields in a read event's text.
const READ_EVENT_FIELDS: usize = 3;

pub struct Correlator<'a> {
    folders: &'a [DeviceFolder],
    devices_by_broadcast_id: HashMap<String, usize>,
    /// Addresses per device position, built on first query.
    addresses: OnceCell<Vec<BTreeSet<String>>>,
}

impl<'a> Correlator<'a> {
    /// Open both logs of every folder and index devices by broadcast id.
    pub fn new(folders: &'a [DeviceFolder]) -> Self {
        let mut devices_by_broadcast_id = HashMap::new();
        for (position, folder) in folders.iter().enumerate() {
            folder.set_checking_detections(true);
            folder.set_checking_contacts(true);
            for group in folder.event_groups() {
                group.summary();
            }

            let device = folder.device();
            if device.has_broadcast_id() {
                devices_by_broadcast_id.insert(device.broadcast_id.clone(), position);
            }
        }

        Self {
            folders,
            devices_by_broadcast_id,
            addresses: OnceCell::new(),
        }
    }

    pub fn folders(&self) -> &'a [DeviceFolder] {
        self.folders
    }

    /// Device that writes `broadcast_id` in its own detection log.
    pub fn get_device(&self, broadcast_id: &str) -> Option<&'a TestDevice> {
        self.devices_by_broadcast_id
            .get(broadcast_id)
            .map(|&position| self.folders[position].device())
    }

    /// Position of a device's folder, by identity first and then by equality.
    pub fn position_of(&self, device: &TestDevice) -> Option<usize> {
        self.folders
            .iter()
            .position(|f| std::ptr::eq(f.device(), device))
            .or_else(|| self.folders.iter().position(|f| f.device() == device))
    }

    /// The detection group of `device`: the broadcast ids it logged having seen.
    pub fn get_detections_by_device(&self, device: &TestDevice) -> Option<&'a EventGroup> {
        let folder = &self.folders[self.position_of(device)?];
        folder
            .event_groups()
            .into_iter()
            .find(|group| group.summary().contains(EventType::DetectionBroadcastIdLoggedBefore))
    }

    /// Detection events in every other device's log naming `device`'s broadcast id.
    pub fn get_detections_of_device(&self, device: &TestDevice) -> EventList {
        let own = self.position_of(device);
        let mut matching = EventList::new();

        for (position, folder) in self.folders.iter().enumerate() {
            if Some(position) == own {
                continue;
            }
            for group in folder.event_groups() {
                if !group.summary().contains(EventType::DetectionBroadcastIdLoggedBefore) {
                    continue;
                }
                let source = group.source();
                let mut cursor = source.cursor();
                let mut next = cursor.first_by_type(EventType::DetectionBroadcastIdLoggedBefore);
                while let Some(event) = next {
                    if event.text(source) == device.broadcast_id {
                        matching.add(event);
                    }
                    next = cursor.next_by_type(EventType::DetectionBroadcastIdLoggedBefore);
                }
            }
        }
        matching
    }

    fn addresses(&self) -> Result<&Vec<BTreeSet<String>>> {
        if let Some(addresses) = self.addresses.get() {
            return Ok(addresses);
        }
        let resolved = self.resolve_addresses()?;
        Ok(self.addresses.get_or_init(|| resolved))
    }

    /// Scan every folder's read events once, crediting each observed address
    /// to the device named by the event's broadcast id unless that device is
    /// the reader itself.
    fn resolve_addresses(&self) -> Result<Vec<BTreeSet<String>>> {
        let mut addresses = vec![BTreeSet::new(); self.folders.len()];

        for (reader, folder) in self.folders.iter().enumerate() {
            for group in folder.event_groups() {
                if !group.summary().contains(EventType::ContactRead) {
                    continue;
                }
                let source = group.source();
                let mut cursor = source.cursor();
                let mut next = cursor.first_by_type(EventType::ContactRead);
                while let Some(event) = next {
                    let text = event.text(source);
                    let fields: Vec<&str> = text.split(',').collect();
                    if fields.len() < READ_EVENT_FIELDS {
                        return Err(AnalysisError::MalformedReadEvent {
                            device: folder.name().to_string(),
                            event_index: event.pointer.start,
                            text,
                        });
                    }
                    if let Some(&seen) = self.devices_by_broadcast_id.get(fields[2]) {
                        if seen != reader {
                            addresses[seen].insert(fields[1].to_string());
                        }
                    }
                    next = cursor.next_by_type(EventType::ContactRead);
                }
            }
        }

        log::debug!(
            "Resolved {} addresses for {} devices",
            addresses.iter().map(BTreeSet::len).sum::<usize>(),
            self.folders.len()
        );
        Ok(addresses)
    }

    /// Physical addresses other devices recorded `device` under, or `None` for an unknown device.
    pub fn get_os_addresses_for_device(&self, device: &TestDevice) -> Result<Option<&BTreeSet<String>>> {
        let addresses = self.addresses()?;
        Ok(self.position_of(device).map(|position| &addresses[position]))
    }

    /// Folder position of the first device whose address set contains `address`.
    pub fn position_by_address(&self, address: &str) -> Result<Option<usize>> {
        Ok(self.addresses()?.iter().position(|set| set.contains(address)))
    }

    /// First device seen under `address`. Ties between devices go to the earlier folder.
    pub fn get_device_by_address(&self, address: &str) -> Result<Option<&'a TestDevice>> {
        Ok(self
            .position_by_address(address)?
            .map(|position| self.folders[position].device()))
    }

    /// `<broadcastId>@<address>,` for every known address, for diagnostics.
    pub fn get_os_addresses_map(&self) -> Result<String> {
        let addresses = self.addresses()?;
        let mut map = String::new();
        for (folder, set) in self.folders.iter().zip(addresses) {
            for address in set {
                map.push_str(&format!("{}@{},", folder.device().broadcast_id, address));
            }
        }
        Ok(map)
    }
}
