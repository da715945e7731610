//! Device identity and sequence-number collaborators.
//!
//! The heartbeat engine stamps every event with the device's identity and a
//! monotonically increasing sequence number. Both are owned elsewhere (the
//! identity by the platform port, the sequence by the persistence layer);
//! this module only defines the seams they are consumed through.

use core::str::FromStr;

use heapless::String;

/// Maximum width of the device serial field.
pub const MAX_SERIAL_LEN: usize = 32;

/// Maximum width of the software version field.
pub const MAX_SOFTWARE_VERSION_LEN: usize = 16;

/// Maximum width of the software type field.
pub const MAX_SOFTWARE_TYPE_LEN: usize = 16;

/// Identity fields stamped onto every serialized event. Treated as opaque
/// immutable strings for the duration of one serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Unique device serial, e.g. a MAC-derived identifier.
    pub serial: String<MAX_SERIAL_LEN>,
    /// Firmware version string, e.g. "1.2.3".
    pub software_version: String<MAX_SOFTWARE_VERSION_LEN>,
    /// Firmware image type, e.g. "main" or "bootloader".
    pub software_type: String<MAX_SOFTWARE_TYPE_LEN>,
}

impl DeviceInfo {
    /// Builds a device info record. Returns `None` if any field exceeds its
    /// declared maximum width.
    pub fn new(serial: &str, software_version: &str, software_type: &str) -> Option<Self> {
        Some(Self {
            serial: String::from_str(serial).ok()?,
            software_version: String::from_str(software_version).ok()?,
            software_type: String::from_str(software_type).ok()?,
        })
    }
}

/// Supplies the device identity on demand.
pub trait DeviceInfoSource {
    fn device_info(&self) -> DeviceInfo;
}

/// Supplies the externally persisted heartbeat sequence number.
///
/// The counter is read once per serialization attempt and never mutated by
/// this crate; the persistence layer advances it when an event is drained.
pub trait SequenceSource {
    fn sequence(&self) -> u32;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_info_within_bounds() {
        let info = DeviceInfo::new("DAABBCCDD", "1.2.3", "main").unwrap();
        assert_eq!(info.serial.as_str(), "DAABBCCDD");
        assert_eq!(info.software_version.as_str(), "1.2.3");
        assert_eq!(info.software_type.as_str(), "main");
    }

    #[test]
    fn test_device_info_rejects_oversized_field() {
        let long = "0123456789012345678901234567890123456789";
        assert!(DeviceInfo::new(long, "1.2.3", "main").is_none());
    }
}
