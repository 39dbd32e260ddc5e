use std::time::Duration;

use snmp_monitor_model::{DerivedMetadata, RawSnapshot};

use crate::metadata::{self, Storage, DISK_STORAGE_PREFIX, IN_OCTETS_PREFIX, OUT_OCTETS_PREFIX};
use crate::normalize::normalize;
use crate::rate::CounterState;

/// The per-tick metric values derived from one snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DerivedReadings {
    pub cpu_percent: Option<f64>,
    pub ram_percent: Option<f64>,
    /// MB/s
    pub disk_activity: Option<f64>,
    /// Mbps
    pub net_throughput: Option<f64>,
}

/// Derives metrics from consecutive snapshots of one device.
///
/// A sampler belongs to exactly one session. It carries the counter baselines between ticks, so a
/// new device must always get a new sampler.
#[derive(Debug, Clone)]
pub struct Sampler {
    elapsed_secs: f64,
    counters: CounterState,
}

impl Sampler {
    /// `interval` is the nominal polling interval used as the elapsed time of every rate.
    pub fn new(interval: Duration) -> Self {
        Self {
            elapsed_secs: interval.as_secs_f64(),
            counters: CounterState::default(),
        }
    }

    pub fn counters(&self) -> &CounterState {
        &self.counters
    }

    /// Derive metadata and readings from the next snapshot, advancing the counter baselines.
    pub fn sample(&mut self, snapshot: &RawSnapshot) -> (DerivedMetadata, DerivedReadings) {
        let metadata = metadata::extract_metadata(snapshot);
        let readings = DerivedReadings {
            cpu_percent: metadata::cpu_load_percent(snapshot),
            ram_percent: metadata::ram_percent(snapshot),
            disk_activity: self.disk_activity(snapshot),
            net_throughput: self.net_throughput(snapshot),
        };
        (metadata, readings)
    }

    fn disk_activity(&mut self, snapshot: &RawSnapshot) -> Option<f64> {
        let disk = Storage::read(snapshot, DISK_STORAGE_PREFIX);
        match (disk.used, disk.allocation_units) {
            (Some(used), Some(units)) => {
                self.counters
                    .disk_activity(used, units, self.elapsed_secs)
            }
            // without both readings the baseline is left where it was
            _ => None,
        }
    }

    fn net_throughput(&mut self, snapshot: &RawSnapshot) -> Option<f64> {
        let in_octets = first_number(snapshot, IN_OCTETS_PREFIX);
        let out_octets = first_number(snapshot, OUT_OCTETS_PREFIX);
        match (in_octets, out_octets) {
            (Some(in_octets), Some(out_octets)) => {
                self.counters
                    .net_throughput(in_octets, out_octets, self.elapsed_secs)
            }
            _ => None,
        }
    }
}

/// Normalized value of the first key, in key order, that starts with `prefix`.
fn first_number(snapshot: &RawSnapshot, prefix: &str) -> Option<f64> {
    snapshot
        .with_prefix(prefix)
        .next()
        .and_then(|(_, reading)| normalize(reading.value.as_ref()))
}

#[cfg(test)]
mod tests {
    use snmp_monitor_model::RawReading;

    use super::*;

    fn snapshot(entries: &[(&str, &str)]) -> RawSnapshot {
        entries
            .iter()
            .map(|(key, value)| (key.to_string(), RawReading::new("1.3.6.1", *value)))
            .collect()
    }

    #[test]
    fn test_should_derive_disk_activity_across_ticks() {
        let mut sampler = Sampler::new(Duration::from_secs(3));

        let (_, first) = sampler.sample(&snapshot(&[
            ("diskStorageUsed", "100"),
            ("diskStorageAllocationUnits", "4096"),
        ]));
        assert_eq!(first.disk_activity, None);

        let (_, second) = sampler.sample(&snapshot(&[
            ("diskStorageUsed", "150"),
            ("diskStorageAllocationUnits", "4096"),
        ]));
        let activity = second.disk_activity.unwrap();
        assert!((activity - (50.0 * 4096.0) / 3.0 / 1_048_576.0).abs() < 1e-12);
    }

    #[test]
    fn test_should_keep_disk_baseline_when_allocation_units_missing() {
        let mut sampler = Sampler::new(Duration::from_secs(3));
        sampler.sample(&snapshot(&[
            ("diskStorageUsed", "100"),
            ("diskStorageAllocationUnits", "4096"),
        ]));

        let (_, readings) = sampler.sample(&snapshot(&[("diskStorageUsed", "999")]));
        assert_eq!(readings.disk_activity, None);
        assert_eq!(sampler.counters().disk.baseline(), Some(100.0));
    }

    #[test]
    fn test_should_sum_interface_octets() {
        let mut sampler = Sampler::new(Duration::from_secs(2));
        sampler.sample(&snapshot(&[
            ("ifInOctets.3", "1000"),
            ("ifOutOctets.3", "1000"),
        ]));
        let (_, readings) = sampler.sample(&snapshot(&[
            ("ifInOctets.3", "251000"),
            ("ifOutOctets.3", "1000"),
        ]));

        // 250000 octets over 2 s is 1 Mbps
        assert!((readings.net_throughput.unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_should_drop_rate_on_interface_counter_reset() {
        let mut sampler = Sampler::new(Duration::from_secs(3));
        sampler.sample(&snapshot(&[
            ("ifInOctets.1", "900000"),
            ("ifOutOctets.1", "900000"),
        ]));
        let (_, readings) = sampler.sample(&snapshot(&[
            ("ifInOctets.1", "10"),
            ("ifOutOctets.1", "10"),
        ]));
        assert_eq!(readings.net_throughput, None);
        assert_eq!(sampler.counters().net.baseline(), Some(20.0));
    }

    #[test]
    fn test_should_leave_missing_fields_unavailable() {
        let mut sampler = Sampler::new(Duration::from_secs(3));
        let (metadata, readings) = sampler.sample(&snapshot(&[
            ("hrProcessorLoad.1", "40"),
            ("hrProcessorLoad.2", "bad"),
            ("hrProcessorLoad.3", "60"),
        ]));

        assert_eq!(readings.cpu_percent, Some(50.0));
        assert_eq!(readings.ram_percent, None);
        assert_eq!(readings.disk_activity, None);
        assert_eq!(readings.net_throughput, None);
        assert_eq!(metadata, DerivedMetadata::default());
    }
}
