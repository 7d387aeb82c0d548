//! Test devices and the on-disk layout of a test run.

pub mod device;
pub mod folder;

pub use device::{OperatingSystem, TestDevice};
pub use folder::{DeviceFolder, EventGroup, TestFolder};
