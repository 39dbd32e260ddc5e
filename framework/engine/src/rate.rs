/// Bytes per megabyte for disk activity, matching the MB/s figure users expect.
pub const BYTES_PER_MEGABYTE: f64 = 1024.0 * 1024.0;

/// Converts an octet count per second into megabits per second.
pub const OCTETS_TO_MEGABITS: f64 = 8.0 / 1_000_000.0;

/// Rate calculator for one monotonically increasing counter.
///
/// The calculator remembers the last counter value it saw. A counter that goes backwards (device
/// reboot, counter reset or wraparound) produces no rate for that tick and becomes the new
/// baseline, so a negative rate is never reported.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CounterRate {
    previous: Option<f64>,
}

impl CounterRate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next counter value and get the rate since the previous one.
    ///
    /// The result is `(current - previous) * scale / elapsed_secs`. `elapsed_secs` is the nominal
    /// polling interval, not a measured delta.
    pub fn advance(&mut self, current: f64, elapsed_secs: f64, scale: f64) -> Option<f64> {
        let previous = self.previous.replace(current);

        let previous = previous?;
        if current < previous {
            log::debug!("Counter went backwards from {previous} to {current}, re-anchoring");
            return None;
        }
        if elapsed_secs <= 0.0 || !elapsed_secs.is_finite() {
            return None;
        }

        let rate = (current - previous) * scale / elapsed_secs;
        rate.is_finite().then_some(rate)
    }

    /// The last accepted counter value, if any.
    pub fn baseline(&self) -> Option<f64> {
        self.previous
    }
}

/// Counter baselines owned by one monitoring session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CounterState {
    /// Disk storage used, in allocation units.
    pub disk: CounterRate,
    /// Inbound plus outbound octets of the selected interface.
    pub net: CounterRate,
}

impl CounterState {
    /// Disk activity in MB/s from the used allocation units and the allocation unit size.
    pub fn disk_activity(
        &mut self,
        used_units: f64,
        allocation_unit_bytes: f64,
        elapsed_secs: f64,
    ) -> Option<f64> {
        self.disk.advance(
            used_units,
            elapsed_secs,
            allocation_unit_bytes / BYTES_PER_MEGABYTE,
        )
    }

    /// Network throughput in Mbps from the cumulative inbound and outbound octet counters.
    pub fn net_throughput(
        &mut self,
        in_octets: f64,
        out_octets: f64,
        elapsed_secs: f64,
    ) -> Option<f64> {
        self.net
            .advance(in_octets + out_octets, elapsed_secs, OCTETS_TO_MEGABITS)
    }
}
