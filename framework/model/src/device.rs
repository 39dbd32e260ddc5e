use std::fmt;

use serde::{Deserialize, Serialize};

/// A device selected for monitoring.
///
/// The address is the identity of the device. Two targets with the same address are the same
/// device, even if the display names differ.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceTarget {
    pub address: String,
    pub display_name: String,
}

impl DeviceTarget {
    pub fn new(address: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            display_name: display_name.into(),
        }
    }

    /// Name to show for this device, falling back to the address.
    pub fn label(&self) -> &str {
        if self.display_name.trim().is_empty() {
            &self.address
        } else {
            &self.display_name
        }
    }

    pub fn same_device(&self, other: &DeviceTarget) -> bool {
        self.address == other.address
    }
}

impl PartialEq for DeviceTarget {
    fn eq(&self, other: &Self) -> bool {
        self.same_device(other)
    }
}

impl Eq for DeviceTarget {}

impl fmt::Display for DeviceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.label() == self.address {
            write!(f, "{}", self.address)
        } else {
            write!(f, "{} ({})", self.label(), self.address)
        }
    }
}
