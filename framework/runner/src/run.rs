use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use snmp_monitor_core::prelude::ShutdownListener;
use snmp_monitor_model::{CurrentView, DeviceTarget};
use tokio::time::{Instant, Interval, MissedTickBehavior};

use crate::cli::MonitorCli;
use crate::config::SessionConfig;
use crate::report::{JsonlReporter, Report, Reporters, TableReporter};
use crate::session::TargetSession;
use crate::shutdown::start_shutdown_listener;
use crate::source::{HttpSnapshotSource, HttpSourceConfig, ReplaySnapshotSource, SnapshotSource};

pub fn run(cli: MonitorCli) -> anyhow::Result<()> {
    let config = SessionConfig::default()
        .interval(Duration::from_secs(cli.interval))
        .history_capacity(cli.history_capacity);
    config.validate().context("Invalid session configuration")?;

    if cli.dwell == Some(0) {
        anyhow::bail!("The dwell time must be greater than zero");
    }

    let source: Arc<dyn SnapshotSource> = match &cli.replay {
        Some(path) => {
            let replay = ReplaySnapshotSource::from_file(path)
                .with_context(|| format!("Failed to load replay file {}", path.display()))?;
            log::info!("Replaying {} snapshots from {}", replay.len(), path.display());
            Arc::new(replay)
        }
        None => {
            let http_config = HttpSourceConfig::new(cli.endpoint.clone())
                .timeout(Duration::from_secs(cli.timeout));
            log::info!("Using the collector at {}", http_config.endpoint);
            Arc::new(HttpSnapshotSource::new(http_config))
        }
    };

    let mut reporters = Reporters::new();
    if !cli.quiet {
        reporters.add(
            TableReporter::stdout()
                .show_raw(cli.show_raw)
                .history(cli.history_metrics()),
        );
    }
    if let Some(path) = &cli.output {
        let reporter = JsonlReporter::from_file(path)
            .with_context(|| format!("Failed to create output file {}", path.display()))?;
        reporters.add(reporter);
    }
    if reporters.is_empty() {
        log::warn!("Running quietly without an output file, views will not be recorded");
    }

    let runtime = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;
    let shutdown_handle = start_shutdown_listener(&runtime);
    let shutdown_listener = shutdown_handle.new_listener();

    // Set a timer to shut down the monitor after the duration has elapsed
    if let Some(duration) = cli.duration {
        let shutdown_handle = shutdown_handle.clone();
        runtime.spawn(async move {
            tokio::time::sleep(Duration::from_secs(duration)).await;
            shutdown_handle.shutdown();
        });
    }

    let devices = cli.device;
    let dwell = cli.dwell.map(Duration::from_secs);
    runtime.block_on(async move {
        let rotation = Rotation::new(devices, dwell)?;
        let mut session =
            TargetSession::new(source, config).context("Invalid session configuration")?;
        monitor(&mut session, rotation, &mut reporters, shutdown_listener).await
    })
}

/// Poll the devices of `rotation` one at a time, reporting each completed cycle, until shutdown.
pub(crate) async fn monitor<R>(
    session: &mut TargetSession,
    mut rotation: Rotation,
    reporter: &mut R,
    mut shutdown_listener: ShutdownListener,
) -> anyhow::Result<()>
where
    R: Report,
    R::Error: std::error::Error + Send + Sync + 'static,
{
    let mut views = session.subscribe();
    session.select_target(rotation.current().clone());

    let mut last_reported = None;
    loop {
        tokio::select! {
            changed = views.changed() => {
                changed.context("Session stopped publishing views")?;
                let view = views.borrow_and_update().clone();
                let Some(cycle) = completed_cycle(&view) else {
                    continue;
                };
                if last_reported.as_ref() != Some(&cycle) {
                    reporter.report(&view).context("Failed to report view")?;
                    last_reported = Some(cycle);
                }
            }
            target = rotation.next_target() => {
                session.select_target(target);
            }
            _ = shutdown_listener.wait_for_shutdown() => {
                log::info!("Stopping the monitor");
                break;
            }
        }
    }

    session.clear_target();
    Ok(())
}

/// Identifies a completed cycle of the view's target, `None` while a cycle is running or before
/// the first one.
fn completed_cycle(view: &CurrentView) -> Option<(String, u64)> {
    let target = view.target.as_ref()?;
    (!view.is_polling && view.cycles > 0).then(|| (target.address.clone(), view.cycles))
}

/// The devices to monitor, and when to move on to the next one.
pub(crate) struct Rotation {
    devices: Vec<DeviceTarget>,
    index: usize,
    timer: Option<Interval>,
}

impl Rotation {
    /// Rotation only happens with a dwell time and more than one device.
    ///
    /// Must be called from within a Tokio runtime when `dwell` is set.
    pub(crate) fn new(devices: Vec<DeviceTarget>, dwell: Option<Duration>) -> anyhow::Result<Self> {
        if devices.is_empty() {
            anyhow::bail!("No devices to monitor");
        }

        let timer = match dwell.filter(|_| devices.len() > 1) {
            Some(dwell) => {
                let start = Instant::now()
                    .checked_add(dwell)
                    .context("The dwell time is too long")?;
                let mut timer = tokio::time::interval_at(start, dwell);
                timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
                Some(timer)
            }
            None => None,
        };

        Ok(Self {
            devices,
            index: 0,
            timer,
        })
    }

    pub(crate) fn current(&self) -> &DeviceTarget {
        &self.devices[self.index]
    }

    /// Wait for the end of the current dwell time. Never completes without rotation.
    pub(crate) async fn next_target(&mut self) -> DeviceTarget {
        match &mut self.timer {
            Some(timer) => {
                timer.tick().await;
                self.index = (self.index + 1) % self.devices.len();
                self.current().clone()
            }
            None => std::future::pending().await,
        }
    }
}
