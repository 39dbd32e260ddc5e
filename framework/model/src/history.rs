use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::LatestValues;

/// Number of samples kept per metric unless configured otherwise.
pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

/// A single timestamped value in a [MetricHistory].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Bounded, time ordered samples for one metric.
///
/// [MetricHistory::push] never modifies the history it is called on. It returns the next history,
/// which holds at most `capacity` samples with the oldest ones dropped first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricHistory {
    capacity: usize,
    samples: Vec<Sample>,
}

impl Default for MetricHistory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl MetricHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            samples: Vec::new(),
        }
    }

    /// Return this history with `value` appended.
    ///
    /// An unavailable value leaves no trace: the result is an unchanged copy, without a
    /// placeholder sample.
    pub fn push(&self, timestamp: DateTime<Utc>, value: Option<f64>) -> MetricHistory {
        let mut next = self.clone();
        let Some(value) = value.filter(|v| v.is_finite()) else {
            return next;
        };

        next.samples.push(Sample { timestamp, value });
        if next.samples.len() > next.capacity {
            let excess = next.samples.len() - next.capacity;
            next.samples.drain(..excess);
        }
        next
    }

    pub fn latest(&self) -> Option<f64> {
        self.samples.last().map(|sample| sample.value)
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// The metrics tracked over time for the selected device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    /// Average processor load, in percent.
    CpuPercent,
    /// Memory in use, in percent.
    RamPercent,
    /// Disk usage growth, in MB/s.
    DiskActivity,
    /// Inbound plus outbound traffic, in Mbps.
    NetThroughput,
}

impl MetricKind {
    pub const ALL: [MetricKind; 4] = [
        MetricKind::CpuPercent,
        MetricKind::RamPercent,
        MetricKind::DiskActivity,
        MetricKind::NetThroughput,
    ];

    pub fn unit(&self) -> &'static str {
        match self {
            MetricKind::CpuPercent | MetricKind::RamPercent => "%",
            MetricKind::DiskActivity => "MB/s",
            MetricKind::NetThroughput => "Mbps",
        }
    }
}

impl FromStr for MetricKind {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cpu_percent" => Ok(MetricKind::CpuPercent),
            "ram_percent" => Ok(MetricKind::RamPercent),
            "disk_activity" => Ok(MetricKind::DiskActivity),
            "net_throughput" => Ok(MetricKind::NetThroughput),
            _ => Err("Unknown metric kind"),
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricKind::CpuPercent => write!(f, "cpu_percent"),
            MetricKind::RamPercent => write!(f, "ram_percent"),
            MetricKind::DiskActivity => write!(f, "disk_activity"),
            MetricKind::NetThroughput => write!(f, "net_throughput"),
        }
    }
}

/// One [MetricHistory] per [MetricKind].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricHistories {
    pub cpu_percent: MetricHistory,
    pub ram_percent: MetricHistory,
    pub disk_activity: MetricHistory,
    pub net_throughput: MetricHistory,
}

impl MetricHistories {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cpu_percent: MetricHistory::with_capacity(capacity),
            ram_percent: MetricHistory::with_capacity(capacity),
            disk_activity: MetricHistory::with_capacity(capacity),
            net_throughput: MetricHistory::with_capacity(capacity),
        }
    }

    pub fn get(&self, kind: MetricKind) -> &MetricHistory {
        match kind {
            MetricKind::CpuPercent => &self.cpu_percent,
            MetricKind::RamPercent => &self.ram_percent,
            MetricKind::DiskActivity => &self.disk_activity,
            MetricKind::NetThroughput => &self.net_throughput,
        }
    }

    /// The last sample of every history.
    pub fn latest(&self) -> LatestValues {
        LatestValues {
            cpu: self.cpu_percent.latest(),
            ram: self.ram_percent.latest(),
            disk_activity: self.disk_activity.latest(),
            net: self.net_throughput.latest(),
        }
    }
}
