use serde::{Deserialize, Serialize};

/// Bytes in one gigabyte, as used for every capacity shown to users.
pub const BYTES_PER_GIGABYTE: f64 = 1024.0 * 1024.0 * 1024.0;

/// Descriptive information about a device, recomputed from every successful poll.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetadata {
    pub operating_system: Option<String>,
    pub cpu_name: Option<String>,
    pub ram_capacity_bytes: Option<f64>,
    pub disk_name: Option<String>,
    pub disk_capacity_bytes: Option<f64>,
    pub disk_usage_percent: Option<f64>,
    /// Description of the network interface, preferably the one whose octet counters are sampled.
    pub interface_name: Option<String>,
    /// Uptime as reported by the device, unparsed.
    pub uptime: Option<String>,
}

impl DerivedMetadata {
    pub fn ram_capacity_gb(&self) -> Option<f64> {
        self.ram_capacity_bytes.map(|bytes| bytes / BYTES_PER_GIGABYTE)
    }

    pub fn disk_capacity_gb(&self) -> Option<f64> {
        self.disk_capacity_bytes.map(|bytes| bytes / BYTES_PER_GIGABYTE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_convert_capacity_to_gigabytes() {
        let metadata = DerivedMetadata {
            ram_capacity_bytes: Some(8.0 * BYTES_PER_GIGABYTE),
            ..Default::default()
        };
        assert_eq!(metadata.ram_capacity_gb(), Some(8.0));
        assert_eq!(metadata.disk_capacity_gb(), None);
    }
}
