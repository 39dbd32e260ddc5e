//! Selection of descriptive fields from a raw snapshot.
//!
//! A snapshot can carry several keys for the same concept, for example one `hrDeviceDescr.<idx>`
//! per hardware device or one `hrProcessorLoad.<idx>` per core. The functions here pick or
//! aggregate among them. All of them are pure, so the same snapshot always gives the same result.

use snmp_monitor_model::{DerivedMetadata, RawSnapshot};

use crate::normalize::{normalize, number};

pub const OS_KEY: &str = "sysDescr";
pub const UPTIME_KEY: &str = "hrSystemUptime";
pub const DEVICE_DESCR_PREFIX: &str = "hrDeviceDescr";
pub const PROCESSOR_LOAD_PREFIX: &str = "hrProcessorLoad";
pub const RAM_STORAGE_PREFIX: &str = "ramStorage";
pub const DISK_STORAGE_PREFIX: &str = "diskStorage";
pub const INTERFACE_DESCR_PREFIX: &str = "ifDescr.";
pub const IN_OCTETS_PREFIX: &str = "ifInOctets.";
pub const OUT_OCTETS_PREFIX: &str = "ifOutOctets.";

/// Device description keys tried before any other `hrDeviceDescr*` key.
const PREFERRED_DESCR_KEYS: [&str; 3] = [
    DEVICE_DESCR_PREFIX,
    "hrDeviceDescr.196608",
    "hrDeviceDescr.1",
];

const CPU_WORDS: [&str; 3] = ["cpu", "processor", "procesador"];

/// Build the full metadata for one snapshot. Fields that cannot be derived are `None`.
pub fn extract_metadata(snapshot: &RawSnapshot) -> DerivedMetadata {
    let disk = Storage::read(snapshot, DISK_STORAGE_PREFIX);
    let ram = Storage::read(snapshot, RAM_STORAGE_PREFIX);

    DerivedMetadata {
        operating_system: snapshot.text(OS_KEY),
        cpu_name: cpu_name(snapshot),
        ram_capacity_bytes: ram.capacity_bytes(),
        disk_name: snapshot.text(&format!("{DISK_STORAGE_PREFIX}Descr")),
        disk_capacity_bytes: disk.capacity_bytes(),
        disk_usage_percent: disk.usage_percent(),
        interface_name: interface_name(snapshot),
        uptime: snapshot.text(UPTIME_KEY),
    }
}

/// Description of the interface whose octet counters are sampled.
///
/// Throughput is read from the first `ifInOctets.<idx>` key, so `ifDescr.<idx>` names it. Without
/// a matching description, the first non-empty `ifDescr.*` reading is used.
pub fn interface_name(snapshot: &RawSnapshot) -> Option<String> {
    let sampled = snapshot
        .with_prefix(IN_OCTETS_PREFIX)
        .next()
        .and_then(|(key, _)| key.strip_prefix(IN_OCTETS_PREFIX))
        .and_then(|index| snapshot.text(&format!("{INTERFACE_DESCR_PREFIX}{index}")));

    sampled.or_else(|| {
        snapshot
            .with_prefix(INTERFACE_DESCR_PREFIX)
            .filter_map(|(_, reading)| reading.value.as_ref())
            .map(|value| value.to_string())
            .find(|text| !text.is_empty())
    })
}

/// Pick the most CPU-like device description.
///
/// Candidates that look like collector error markers are ignored. The first remaining candidate
/// that mentions a CPU wins, otherwise the first remaining candidate.
pub fn cpu_name(snapshot: &RawSnapshot) -> Option<String> {
    let candidates = PREFERRED_DESCR_KEYS
        .iter()
        .filter_map(|key| snapshot.text(key))
        .chain(
            snapshot
                .with_prefix(DEVICE_DESCR_PREFIX)
                .filter_map(|(_, reading)| reading.value.as_ref())
                .map(|value| value.to_string())
                .filter(|text| !text.is_empty()),
        )
        .filter(|text| !is_error_marker(text))
        .collect::<Vec<_>>();

    candidates
        .iter()
        .find(|text| mentions_cpu(text))
        .or_else(|| candidates.first())
        .cloned()
}

/// Whether a reading is a collector error message rather than a value.
pub fn is_error_marker(text: &str) -> bool {
    let lower = text.trim_start().to_lowercase();
    lower.starts_with("error:") || lower.contains("not found") || lower.contains("no such")
}

fn mentions_cpu(text: &str) -> bool {
    let lower = text.to_lowercase();
    CPU_WORDS.iter().any(|word| lower.contains(word))
}

/// Mean of every per-core load reading that lies within `[0, 100]`.
pub fn cpu_load_percent(snapshot: &RawSnapshot) -> Option<f64> {
    let (sum, count) = snapshot
        .with_prefix(PROCESSOR_LOAD_PREFIX)
        .filter_map(|(_, reading)| normalize(reading.value.as_ref()))
        .filter(|load| (0.0..=100.0).contains(load))
        .fold((0.0, 0usize), |(sum, count), load| (sum + load, count + 1));

    (count > 0).then(|| sum / count as f64)
}

/// Memory in use, in percent.
pub fn ram_percent(snapshot: &RawSnapshot) -> Option<f64> {
    Storage::read(snapshot, RAM_STORAGE_PREFIX).usage_percent()
}

/// `used / size * 100`, or `None` when the size is not positive.
pub fn usage_percent(used: Option<f64>, size: Option<f64>) -> Option<f64> {
    let (used, size) = (used?, size?);
    if size > 0.0 {
        Some(used / size * 100.0)
    } else {
        None
    }
}

/// `size * allocation_units`, or `None` when either is unavailable.
pub fn capacity_bytes(size: Option<f64>, allocation_units: Option<f64>) -> Option<f64> {
    Some(size? * allocation_units?)
}

/// The `<prefix>Size`, `<prefix>Used` and `<prefix>AllocationUnits` readings of one storage entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Storage {
    pub size: Option<f64>,
    pub used: Option<f64>,
    pub allocation_units: Option<f64>,
}

impl Storage {
    pub(crate) fn read(snapshot: &RawSnapshot, prefix: &str) -> Self {
        Self {
            size: number(snapshot, &format!("{prefix}Size")),
            used: number(snapshot, &format!("{prefix}Used")),
            allocation_units: number(snapshot, &format!("{prefix}AllocationUnits")),
        }
    }

    fn capacity_bytes(&self) -> Option<f64> {
        capacity_bytes(self.size, self.allocation_units)
    }

    fn usage_percent(&self) -> Option<f64> {
        usage_percent(self.used, self.size)
    }
}
