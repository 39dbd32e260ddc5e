use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use snmp_monitor_core::prelude::{CycleDiscarded, SessionToken};
use snmp_monitor_engine::{DerivedReadings, Sampler};
use snmp_monitor_model::{CurrentView, DeviceTarget, MetricHistories, RawSnapshot};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::config::SessionConfig;
use crate::source::SnapshotSource;

/// The polling loop of one session.
///
/// Owns the counter baselines and histories of its target. Everything it publishes goes through
/// [Poller::publish], which drops the update once the session token is stale.
pub(crate) struct Poller {
    source: Arc<dyn SnapshotSource>,
    target: DeviceTarget,
    interval: Duration,
    token: SessionToken,
    view: watch::Sender<CurrentView>,
    sampler: Sampler,
    histories: MetricHistories,
    cycle: u64,
}

impl Poller {
    pub(crate) fn new(
        source: Arc<dyn SnapshotSource>,
        target: DeviceTarget,
        config: &SessionConfig,
        token: SessionToken,
        view: watch::Sender<CurrentView>,
    ) -> Self {
        Self {
            source,
            target,
            interval: config.interval,
            token,
            view,
            sampler: Sampler::new(config.interval),
            histories: MetricHistories::with_capacity(config.history_capacity),
            cycle: 0,
        }
    }

    /// Poll immediately, then once per interval, until the session ends.
    pub(crate) async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if let Err(discarded) = self.poll_once().await {
                log::debug!("{discarded}");
                break;
            }
        }
    }

    pub(crate) async fn poll_once(&mut self) -> Result<(), CycleDiscarded> {
        self.cycle += 1;
        self.publish(|view| view.is_polling = true)?;

        log::debug!("Polling {} (cycle {})", self.target, self.cycle);
        let fetched = self.source.fetch(&self.target.address).await;
        match fetched {
            Ok(snapshot) => self.apply_snapshot(snapshot),
            Err(e) => {
                log::warn!("Polling {} failed: {e}", self.target);
                let message = e.to_string();
                self.publish(move |view| {
                    view.last_error = Some(message);
                    view.is_polling = false;
                    view.cycles += 1;
                })
            }
        }
    }

    fn apply_snapshot(&mut self, snapshot: RawSnapshot) -> Result<(), CycleDiscarded> {
        let now = Utc::now();
        let (metadata, readings) = self.sampler.sample(&snapshot);
        let histories = push_readings(&self.histories, now, &readings);
        let latest = histories.latest();

        let published = histories.clone();
        self.publish(move |view| {
            view.metadata = metadata;
            view.latest = latest;
            view.histories = published;
            view.raw = snapshot;
            view.updated_at = Some(now);
            view.last_error = None;
            view.is_polling = false;
            view.cycles += 1;
        })?;

        self.histories = histories;
        Ok(())
    }

    /// Apply `update` to the shared view, atomically with the check that this session is current.
    fn publish(&self, update: impl FnOnce(&mut CurrentView)) -> Result<(), CycleDiscarded> {
        let token = &self.token;
        let applied = self.view.send_if_modified(|view| {
            if !token.is_current() {
                return false;
            }
            update(view);
            true
        });

        if applied {
            Ok(())
        } else {
            Err(CycleDiscarded::new(self.token.epoch(), self.cycle))
        }
    }
}

fn push_readings(
    histories: &MetricHistories,
    timestamp: chrono::DateTime<Utc>,
    readings: &DerivedReadings,
) -> MetricHistories {
    MetricHistories {
        cpu_percent: histories.cpu_percent.push(timestamp, readings.cpu_percent),
        ram_percent: histories.ram_percent.push(timestamp, readings.ram_percent),
        disk_activity: histories
            .disk_activity
            .push(timestamp, readings.disk_activity),
        net_throughput: histories
            .net_throughput
            .push(timestamp, readings.net_throughput),
    }
}
