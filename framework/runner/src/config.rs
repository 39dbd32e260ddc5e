use std::time::Duration;

use snmp_monitor_model::DEFAULT_HISTORY_CAPACITY;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Settings for a [crate::session::TargetSession].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub interval: Duration,
    pub history_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl SessionConfig {
    /// Builds a [`SessionConfig`] with the specified polling interval.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Builds a [`SessionConfig`] with the specified number of samples kept per metric.
    pub fn history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        if self.history_capacity == 0 {
            return Err(ConfigError::ZeroHistoryCapacity);
        }
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("The polling interval must be greater than zero")]
    ZeroInterval,
    #[error("The history capacity must be at least one sample")]
    ZeroHistoryCapacity,
}
