use std::path::PathBuf;

use clap::Parser;
use snmp_monitor_model::{DeviceTarget, MetricKind, DEFAULT_HISTORY_CAPACITY};
use url::Url;

/// Longest interval, timeout or dwell time accepted on the command line, one day.
const MAX_SECONDS: u64 = 24 * 60 * 60;

#[derive(Debug, Parser)]
#[command(about, long_about = None)]
pub struct MonitorCli {
    /// Base URL of the SNMP collector API
    #[arg(long, env = "SNMP_MONITOR_ENDPOINT", default_value = "http://127.0.0.1:8000")]
    pub endpoint: Url,

    /// A device to monitor, in the format `ADDRESS[=NAME]`. For example `--device 192.168.1.20=nas`.
    ///
    /// You can specify multiple devices by using the flag multiple times. Only one device is polled
    /// at a time. With more than one device, use `--dwell` to rotate between them.
    #[arg(long, short, value_parser = parse_device, required = true)]
    pub device: Vec<DeviceTarget>,

    /// Seconds between two polls of the selected device
    #[arg(
        long,
        default_value_t = 3,
        value_parser = clap::value_parser!(u64).range(1..=MAX_SECONDS)
    )]
    pub interval: u64,

    /// Number of samples kept per metric
    #[arg(long, default_value_t = DEFAULT_HISTORY_CAPACITY)]
    pub history_capacity: usize,

    /// Seconds to wait for the collector before a poll fails
    #[arg(
        long,
        default_value_t = 10,
        value_parser = clap::value_parser!(u64).range(1..=MAX_SECONDS)
    )]
    pub timeout: u64,

    /// Replay snapshots recorded as JSON Lines instead of calling the collector.
    ///
    /// Once every recorded snapshot has been served, further polls fail. Combine with `--duration`
    /// to stop after the replay.
    #[arg(long)]
    pub replay: Option<PathBuf>,

    /// Append every completed view to this file as JSON Lines
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// The number of seconds to run for. Runs until stopped with Ctrl-C when not set.
    #[arg(long)]
    pub duration: Option<u64>,

    /// Seconds to monitor each device before moving on to the next one
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=MAX_SECONDS))]
    pub dwell: Option<u64>,

    /// Summarise the kept samples of these metrics after every poll.
    ///
    /// Takes a comma separated list of `cpu_percent`, `ram_percent`, `disk_activity` and
    /// `net_throughput`. Without a value, every metric is summarised.
    #[arg(long, num_args = 0.., value_delimiter = ',')]
    pub history: Option<Vec<MetricKind>>,

    /// Print the raw readings of every successful poll
    #[arg(long, default_value = "false")]
    pub show_raw: bool,

    /// Do not print views to the terminal
    #[arg(long, short, default_value = "false")]
    pub quiet: bool,
}

impl MonitorCli {
    /// The metrics to summarise, in the order they were requested.
    pub fn history_metrics(&self) -> Vec<MetricKind> {
        match &self.history {
            Some(metrics) if metrics.is_empty() => MetricKind::ALL.to_vec(),
            Some(metrics) => metrics.clone(),
            None => Vec::new(),
        }
    }
}

fn parse_device(s: &str) -> anyhow::Result<DeviceTarget> {
    let (address, name) = match s.split_once('=') {
        Some((address, name)) => (address.trim(), name.trim()),
        None => (s.trim(), ""),
    };

    if address.is_empty() {
        anyhow::bail!("No address specified for device");
    }

    Ok(DeviceTarget::new(address, name))
}
