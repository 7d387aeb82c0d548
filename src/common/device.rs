//! Identity of a device taking part in a test run.

use serde::Serialize;

/// Operating system reported by a test device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum OperatingSystem {
    #[default]
    Unknown,
    #[serde(rename = "iOS")]
    Ios,
    Android,
    Zephyr,
    Windows,
    Linux,
}

impl OperatingSystem {
    /// Map an OS name from detection.csv. Only iOS and Android are recognised.
    pub fn from_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("ios") {
            OperatingSystem::Ios
        } else if name.eq_ignore_ascii_case("android") {
            OperatingSystem::Android
        } else {
            OperatingSystem::Unknown
        }
    }
}

impl std::fmt::Display for OperatingSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperatingSystem::Unknown => write!(f, "Unknown"),
            OperatingSystem::Ios => write!(f, "iOS"),
            OperatingSystem::Android => write!(f, "Android"),
            OperatingSystem::Zephyr => write!(f, "Zephyr"),
            OperatingSystem::Windows => write!(f, "Windows"),
            OperatingSystem::Linux => write!(f, "Linux"),
        }
    }
}

/// A device described by its own detection.csv.
///
/// Devices seen only over Bluetooth are not represented by this type.
/// Two devices are equal when their type string and broadcast id match.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TestDevice {
    /// OS-provided device type, not the folder name.
    pub device_type: String,
    pub broadcast_id: String,
    pub os: OperatingSystem,
    pub os_version: String,
}

impl TestDevice {
    pub fn new(device_type: &str, broadcast_id: &str, os: OperatingSystem, os_version: &str) -> Self {
        Self {
            device_type: device_type.to_string(),
            broadcast_id: broadcast_id.to_string(),
            os,
            os_version: os_version.to_string(),
        }
    }

    pub fn has_broadcast_id(&self) -> bool {
        !self.broadcast_id.is_empty()
    }
}

impl PartialEq for TestDevice {
    fn eq(&self, other: &Self) -> bool {
        self.device_type == other.device_type && self.broadcast_id == other.broadcast_id
    }
}

impl Eq for TestDevice {}

impl std::hash::Hash for TestDevice {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.device_type.hash(state);
        self.broadcast_id.hash(state);
    }
}
