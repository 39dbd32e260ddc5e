use std::sync::Arc;

use snmp_monitor_core::prelude::SessionEpoch;
use snmp_monitor_model::{CurrentView, DeviceTarget};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::{ConfigError, SessionConfig};
use crate::poller::Poller;
use crate::source::SnapshotSource;

/// Monitors at most one device at a time.
///
/// The session is either idle or active for one [DeviceTarget]. While active, a background task
/// polls the target immediately and then once per interval, publishing a [CurrentView] after
/// every step of a cycle. Changing or clearing the target ends the old polling task and discards
/// any of its results that are still in flight, together with its counters and histories.
///
/// Selecting a target spawns onto the current Tokio runtime, so it must be called from within
/// one. Dropping the session clears it.
///
/// A session is only created from a valid [SessionConfig].
pub struct TargetSession {
    source: Arc<dyn SnapshotSource>,
    config: SessionConfig,
    epoch: SessionEpoch,
    view: watch::Sender<CurrentView>,
    active: Option<ActiveTarget>,
}

struct ActiveTarget {
    target: DeviceTarget,
    task: JoinHandle<()>,
}

impl TargetSession {
    pub fn new(
        source: Arc<dyn SnapshotSource>,
        config: SessionConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let (view, _) = watch::channel(CurrentView::idle(config.history_capacity));
        Ok(Self {
            source,
            config,
            epoch: SessionEpoch::new(),
            view,
            active: None,
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<CurrentView> {
        self.view.subscribe()
    }

    /// A copy of the latest published view.
    pub fn view(&self) -> CurrentView {
        self.view.borrow().clone()
    }

    pub fn active_target(&self) -> Option<&DeviceTarget> {
        self.active.as_ref().map(|active| &active.target)
    }

    /// Start monitoring `target`, replacing any current target.
    ///
    /// Selecting the device that is already being monitored does nothing, so its histories are
    /// kept.
    pub fn select_target(&mut self, target: DeviceTarget) {
        if let Some(active) = &self.active {
            if active.target.same_device(&target) {
                log::debug!("{target} is already being monitored");
                return;
            }
        }

        self.stop();

        let token = self.epoch.begin();
        log::info!("Monitoring {target} (session {})", token.epoch());
        self.view.send_replace(CurrentView::for_target(
            target.clone(),
            self.config.history_capacity,
        ));

        let poller = Poller::new(
            self.source.clone(),
            target.clone(),
            &self.config,
            token,
            self.view.clone(),
        );
        let task = tokio::spawn(poller.run());
        self.active = Some(ActiveTarget { target, task });
    }

    /// Stop monitoring and publish an idle view. Does nothing when already idle.
    pub fn clear_target(&mut self) {
        if self.active.is_none() {
            return;
        }

        self.stop();
        self.view
            .send_replace(CurrentView::idle(self.config.history_capacity));
    }

    fn stop(&mut self) {
        if let Some(active) = self.active.take() {
            self.epoch.invalidate();
            active.task.abort();
            log::info!("Stopped monitoring {}", active.target);
        }
    }
}

impl Drop for TargetSession {
    fn drop(&mut self) {
        self.clear_target();
    }
}
