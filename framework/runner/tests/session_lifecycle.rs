use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt as _;
use snmp_monitor_model::{DeviceTarget, RawReading, RawSnapshot};
use snmp_monitor_runner::prelude::{
    ConfigError, SessionConfig, SnapshotSource, SourceError, TargetSession,
};
use tokio::sync::Semaphore;

/// Serves scripted responses per address. The last response repeats once the script runs out.
///
/// Fetches for a gated address wait until the test releases the gate.
#[derive(Default)]
struct ScriptedSource {
    scripts: Mutex<HashMap<String, VecDeque<Result<RawSnapshot, String>>>>,
    gates: HashMap<String, Arc<Semaphore>>,
    calls: Mutex<HashMap<String, usize>>,
    in_flight: AtomicUsize,
}

impl ScriptedSource {
    fn script(self, address: &str, responses: Vec<Result<RawSnapshot, String>>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(address.to_string(), responses.into());
        self
    }

    fn gated(mut self, address: &str) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        self.gates.insert(address.to_string(), gate.clone());
        (self, gate)
    }

    fn calls(&self, address: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(address)
            .copied()
            .unwrap_or_default()
    }

    fn next_response(&self, address: &str) -> Result<RawSnapshot, SourceError> {
        let mut scripts = self.scripts.lock().unwrap();
        let script = scripts.get_mut(address).expect("No script for address");
        let response = if script.len() > 1 {
            script.pop_front().unwrap()
        } else {
            script.front().cloned().unwrap()
        };
        response.map_err(SourceError::Transport)
    }
}

impl SnapshotSource for ScriptedSource {
    fn fetch<'a>(&'a self, address: &'a str) -> BoxFuture<'a, Result<RawSnapshot, SourceError>> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(address.to_string())
            .or_default() += 1;

        async move {
            if let Some(gate) = self.gates.get(address) {
                self.in_flight.fetch_add(1, Ordering::SeqCst);
                let _permit = gate.acquire().await.unwrap();
                self.in_flight.fetch_sub(1, Ordering::SeqCst);
            }
            self.next_response(address)
        }
        .boxed()
    }
}

fn snapshot(entries: &[(&str, &str)]) -> RawSnapshot {
    entries
        .iter()
        .map(|(key, value)| (key.to_string(), RawReading::new("1.3.6.1", *value)))
        .collect()
}

fn device_a() -> DeviceTarget {
    DeviceTarget::new("192.168.1.10", "nas")
}

fn device_b() -> DeviceTarget {
    DeviceTarget::new("192.168.1.20", "router")
}

async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn poll_immediately_and_grow_histories() {
    let source = Arc::new(ScriptedSource::default().script(
        &device_a().address,
        vec![
            Ok(snapshot(&[
                ("hrProcessorLoad.1", "40"),
                ("hrProcessorLoad.2", "bad"),
                ("hrProcessorLoad.3", "60"),
                ("diskStorageUsed", "100"),
                ("diskStorageAllocationUnits", "4096"),
            ])),
            Ok(snapshot(&[
                ("hrProcessorLoad.1", "20"),
                ("diskStorageUsed", "150"),
                ("diskStorageAllocationUnits", "4096"),
            ])),
        ],
    ));
    let mut session = TargetSession::new(source.clone(), SessionConfig::default()).unwrap();
    let mut views = session.subscribe();
    assert!(session.view().is_idle());

    session.select_target(device_a());
    assert_eq!(session.active_target(), Some(&device_a()));

    let first = views
        .wait_for(|view| view.cycles == 1)
        .await
        .unwrap()
        .clone();
    assert_eq!(first.latest.cpu, Some(50.0));
    assert_eq!(first.latest.disk_activity, None);
    assert!(first.last_error.is_none());
    assert!(!first.is_polling);

    let second = views
        .wait_for(|view| view.cycles == 2)
        .await
        .unwrap()
        .clone();
    assert_eq!(second.histories.cpu_percent.len(), 2);
    assert_eq!(second.latest.cpu, Some(20.0));
    let activity = second.latest.disk_activity.unwrap();
    assert!((activity - 0.065).abs() < 0.001);
    assert_eq!(second.histories.disk_activity.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn keep_last_data_when_poll_fails() {
    let source = Arc::new(ScriptedSource::default().script(
        &device_a().address,
        vec![
            Ok(snapshot(&[
                ("sysDescr", "Linux nas"),
                ("hrProcessorLoad.1", "35"),
            ])),
            Err("connection refused".to_string()),
        ],
    ));
    let mut session = TargetSession::new(source, SessionConfig::default()).unwrap();
    let mut views = session.subscribe();
    session.select_target(device_a());

    let failed = views
        .wait_for(|view| view.last_error.is_some())
        .await
        .unwrap()
        .clone();
    assert_eq!(
        failed.last_error.as_deref(),
        Some("Could not reach the collector: connection refused")
    );
    assert!(!failed.is_polling);
    assert_eq!(failed.latest.cpu, Some(35.0));
    assert_eq!(failed.histories.cpu_percent.len(), 1);
    assert_eq!(failed.metadata.operating_system.as_deref(), Some("Linux nas"));
    assert!(!failed.raw.is_empty());

    // the timer keeps running after a failure
    let retried = views
        .wait_for(|view| view.cycles >= 3)
        .await
        .unwrap()
        .clone();
    assert!(retried.last_error.is_some());
    assert_eq!(retried.histories.cpu_percent.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn discard_in_flight_result_of_previous_target() {
    let (source, gate) = ScriptedSource::default()
        .script(
            &device_a().address,
            vec![Ok(snapshot(&[
                ("hrProcessorLoad.1", "90"),
                ("ifInOctets.1", "1000"),
                ("ifOutOctets.1", "1000"),
            ]))],
        )
        .script(
            &device_b().address,
            vec![Ok(snapshot(&[
                ("hrProcessorLoad.1", "10"),
                ("ifInOctets.1", "5"),
                ("ifOutOctets.1", "5"),
            ]))],
        )
        .gated(&device_a().address);
    let source = Arc::new(source);

    let mut session = TargetSession::new(source.clone(), SessionConfig::default()).unwrap();
    let mut views = session.subscribe();

    session.select_target(device_a());
    views.wait_for(|view| view.is_polling).await.unwrap();
    assert_eq!(source.calls(&device_a().address), 1);
    assert_eq!(source.in_flight.load(Ordering::SeqCst), 1);

    session.select_target(device_b());
    let view = session.view();
    assert_eq!(view.target, Some(device_b()));
    assert!(!view.has_data());

    let first_b = views
        .wait_for(|view| view.cycles == 1)
        .await
        .unwrap()
        .clone();
    assert_eq!(first_b.target, Some(device_b()));
    assert_eq!(first_b.latest.cpu, Some(10.0));

    // the polling task of device A was aborted together with its pending fetch
    gate.add_permits(1);
    settle().await;

    let view = session.view();
    assert_eq!(view.target, Some(device_b()));
    assert_eq!(view.latest.cpu, Some(10.0));
    assert_eq!(view.histories.cpu_percent.len(), 1);
    assert!(view.last_error.is_none());

    // the network baseline of device B was never touched by device A's counters
    let second_b = views
        .wait_for(|view| view.cycles == 2)
        .await
        .unwrap()
        .clone();
    assert_eq!(second_b.latest.net, Some(0.0));
    assert_eq!(second_b.histories.cpu_percent.len(), 2);
    assert_eq!(source.calls(&device_a().address), 1);
}

#[tokio::test(start_paused = true)]
async fn ignore_selecting_the_active_target() {
    let source = Arc::new(ScriptedSource::default().script(
        &device_a().address,
        vec![Ok(snapshot(&[("hrProcessorLoad.1", "5")]))],
    ));
    let mut session = TargetSession::new(source.clone(), SessionConfig::default()).unwrap();
    let mut views = session.subscribe();

    session.select_target(device_a());
    views.wait_for(|view| view.cycles == 1).await.unwrap();

    session.select_target(DeviceTarget::new("192.168.1.10", "renamed"));
    settle().await;

    let view = session.view();
    assert_eq!(view.cycles, 1);
    assert_eq!(view.histories.cpu_percent.len(), 1);
    assert_eq!(source.calls(&device_a().address), 1);
}

#[tokio::test(start_paused = true)]
async fn clear_target_returns_to_idle() {
    let source = Arc::new(ScriptedSource::default().script(
        &device_a().address,
        vec![Ok(snapshot(&[("hrProcessorLoad.1", "5")]))],
    ));
    let mut session = TargetSession::new(
        source.clone(),
        SessionConfig::default().interval(Duration::from_secs(1)),
    )
    .unwrap();
    let mut views = session.subscribe();

    // clearing while idle does nothing
    session.clear_target();
    assert!(!views.has_changed().unwrap());

    session.select_target(device_a());
    views.wait_for(|view| view.cycles == 1).await.unwrap();

    session.clear_target();
    assert!(session.active_target().is_none());
    let view = views.borrow_and_update().clone();
    assert!(view.is_idle());
    assert!(!view.has_data());
    assert!(view.histories.cpu_percent.is_empty());

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(!views.has_changed().unwrap());
    assert_eq!(source.calls(&device_a().address), 1);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_session_stops_polling() {
    let source = Arc::new(ScriptedSource::default().script(
        &device_a().address,
        vec![Ok(snapshot(&[("hrProcessorLoad.1", "5")]))],
    ));
    let mut session = TargetSession::new(source.clone(), SessionConfig::default()).unwrap();
    let mut views = session.subscribe();
    session.select_target(device_a());
    views.wait_for(|view| view.cycles == 1).await.unwrap();

    drop(session);
    assert!(views.borrow().is_idle());

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(source.calls(&device_a().address), 1);
}

#[tokio::test(start_paused = true)]
async fn reject_invalid_configuration() {
    let source = Arc::new(ScriptedSource::default().script(
        &device_a().address,
        vec![Ok(snapshot(&[("hrProcessorLoad.1", "5")]))],
    ));

    let err = TargetSession::new(
        source.clone(),
        SessionConfig::default().interval(Duration::ZERO),
    )
    .err();
    assert_eq!(err, Some(ConfigError::ZeroInterval));

    let err = TargetSession::new(source.clone(), SessionConfig::default().history_capacity(0)).err();
    assert_eq!(err, Some(ConfigError::ZeroHistoryCapacity));

    assert_eq!(source.calls(&device_a().address), 0);
}
