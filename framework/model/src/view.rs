use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{DerivedMetadata, DeviceTarget, MetricHistories, RawSnapshot};

/// The last value of every tracked metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatestValues {
    pub cpu: Option<f64>,
    pub ram: Option<f64>,
    pub disk_activity: Option<f64>,
    pub net: Option<f64>,
}

/// Everything a consumer can observe about the monitored device.
///
/// A view is always taken from a single polling cycle: metadata, latest values, histories and the
/// raw readings are never mixed across cycles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentView {
    pub target: Option<DeviceTarget>,
    pub metadata: DerivedMetadata,
    pub latest: LatestValues,
    pub histories: MetricHistories,
    pub last_error: Option<String>,
    pub is_polling: bool,
    /// Polling cycles completed for the current target, successful or not.
    pub cycles: u64,
    /// Readings of the last successful poll.
    pub raw: RawSnapshot,
    /// When the last successful poll was applied.
    pub updated_at: Option<DateTime<Utc>>,
}

impl CurrentView {
    /// View with no device selected.
    pub fn idle(history_capacity: usize) -> Self {
        Self {
            histories: MetricHistories::with_capacity(history_capacity),
            ..Default::default()
        }
    }

    /// Fresh view for a newly selected device, before its first poll.
    pub fn for_target(target: DeviceTarget, history_capacity: usize) -> Self {
        Self {
            target: Some(target),
            ..Self::idle(history_capacity)
        }
    }

    pub fn is_idle(&self) -> bool {
        self.target.is_none()
    }

    /// Whether at least one poll of the current target has succeeded.
    pub fn has_data(&self) -> bool {
        self.updated_at.is_some()
    }
}
