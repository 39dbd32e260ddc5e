use std::fs::File;
use std::io::{self, Write};

use snmp_monitor_model::{CurrentView, MetricHistories, MetricKind, RawSnapshot};
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// A trait for reporting views published by a session.
pub trait Report {
    type Error;

    /// Report one completed polling cycle.
    fn report(&mut self, view: &CurrentView) -> Result<(), Self::Error>;
}

/// Forwards every view to each of its reporters in turn.
#[derive(Default)]
pub struct Reporters {
    reporters: Vec<Box<dyn Report<Error = io::Error>>>,
}

impl Reporters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<R>(&mut self, reporter: R)
    where
        R: Report<Error = io::Error> + 'static,
    {
        self.reporters.push(Box::new(reporter));
    }

    pub fn is_empty(&self) -> bool {
        self.reporters.is_empty()
    }
}

impl Report for Reporters {
    type Error = io::Error;

    fn report(&mut self, view: &CurrentView) -> Result<(), Self::Error> {
        for reporter in &mut self.reporters {
            reporter.report(view)?;
        }
        Ok(())
    }
}

#[derive(Tabled)]
struct StatRow {
    #[tabled(rename = "Metric")]
    metric: &'static str,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Details")]
    details: String,
}

#[derive(Tabled)]
struct HistoryRow {
    #[tabled(rename = "History")]
    metric: String,
    #[tabled(rename = "Samples")]
    samples: String,
    #[tabled(rename = "Min")]
    min: String,
    #[tabled(rename = "Mean")]
    mean: String,
    #[tabled(rename = "Max")]
    max: String,
}

#[derive(Tabled)]
struct RawRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "OID")]
    oid: String,
    #[tabled(rename = "Value")]
    value: String,
}

/// Prints every completed cycle as a table of stat cards.
pub struct TableReporter<W>
where
    W: Write,
{
    writer: W,
    show_raw: bool,
    history: Vec<MetricKind>,
}

impl<W> TableReporter<W>
where
    W: Write,
{
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            show_raw: false,
            history: Vec::new(),
        }
    }

    /// Also summarise the kept samples of these metrics.
    pub fn history(mut self, metrics: Vec<MetricKind>) -> Self {
        self.history = metrics;
        self
    }

    /// Also print every raw reading of the last successful poll.
    pub fn show_raw(mut self, show_raw: bool) -> Self {
        self.show_raw = show_raw;
        self
    }
}

impl TableReporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W> Report for TableReporter<W>
where
    W: Write,
{
    type Error = io::Error;

    fn report(&mut self, view: &CurrentView) -> Result<(), Self::Error> {
        let Some(target) = &view.target else {
            return writeln!(self.writer, "No device selected");
        };

        match view.updated_at {
            Some(updated_at) => writeln!(
                self.writer,
                "{target} at {}",
                updated_at.format("%Y-%m-%d %H:%M:%S UTC")
            )?,
            None => writeln!(self.writer, "{target} (no data yet)")?,
        }
        if let Some(error) = &view.last_error {
            writeln!(self.writer, "Last poll failed: {error}")?;
        }

        let mut table = Table::new(stat_rows(view));
        table.with(Style::modern());
        writeln!(self.writer, "{table}")?;

        if !self.history.is_empty() {
            let mut table = Table::new(history_rows(&view.histories, &self.history));
            table.with(Style::modern());
            writeln!(self.writer, "{table}")?;
        }

        if self.show_raw && !view.raw.is_empty() {
            let mut table = Table::new(raw_rows(&view.raw));
            table.with(Style::modern());
            writeln!(self.writer, "{table}")?;
        }

        self.writer.flush()
    }
}

fn stat_rows(view: &CurrentView) -> Vec<StatRow> {
    let metadata = &view.metadata;
    vec![
        StatRow {
            metric: "CPU",
            value: format_value(view.latest.cpu, 1, "%"),
            details: text_or_dash(metadata.cpu_name.as_deref()),
        },
        StatRow {
            metric: "RAM",
            value: format_value(view.latest.ram, 1, "%"),
            details: format_gigabytes(metadata.ram_capacity_gb()),
        },
        StatRow {
            metric: "Disk usage",
            value: format_value(metadata.disk_usage_percent, 1, "%"),
            details: format!(
                "{} {}",
                text_or_dash(metadata.disk_name.as_deref()),
                format_gigabytes(metadata.disk_capacity_gb())
            ),
        },
        StatRow {
            metric: "Disk activity",
            value: format_value(view.latest.disk_activity, 1, "MB/s"),
            details: String::new(),
        },
        StatRow {
            metric: "Network",
            value: format_value(view.latest.net, 2, "Mbps"),
            details: text_or_dash(metadata.interface_name.as_deref()),
        },
        StatRow {
            metric: "System",
            value: text_or_dash(metadata.operating_system.as_deref()),
            details: format!("uptime {}", text_or_dash(metadata.uptime.as_deref())),
        },
    ]
}

fn history_rows(histories: &MetricHistories, metrics: &[MetricKind]) -> Vec<HistoryRow> {
    metrics
        .iter()
        .map(|&kind| {
            let history = histories.get(kind);
            let values = history.samples().iter().map(|sample| sample.value);
            let min = values.clone().reduce(f64::min);
            let max = values.clone().reduce(f64::max);
            let mean = (!history.is_empty()).then(|| values.sum::<f64>() / history.len() as f64);

            let decimals = decimals(kind);
            HistoryRow {
                metric: kind.to_string(),
                samples: format!("{}/{}", history.len(), history.capacity()),
                min: format_value(min, decimals, kind.unit()),
                mean: format_value(mean, decimals, kind.unit()),
                max: format_value(max, decimals, kind.unit()),
            }
        })
        .collect()
}

fn decimals(kind: MetricKind) -> usize {
    match kind {
        MetricKind::NetThroughput => 2,
        _ => 1,
    }
}

fn raw_rows(raw: &RawSnapshot) -> Vec<RawRow> {
    raw.iter()
        .map(|(key, reading)| RawRow {
            key: key.to_string(),
            oid: reading.source_identifier.clone(),
            value: reading
                .value
                .as_ref()
                .map(|value| value.to_string())
                .unwrap_or_else(|| "--".to_string()),
        })
        .collect()
}

/// `--` when the value is unavailable.
pub fn format_value(value: Option<f64>, decimals: usize, unit: &str) -> String {
    match value {
        Some(value) => format!("{value:.decimals$} {unit}"),
        None => "--".to_string(),
    }
}

pub fn format_gigabytes(value: Option<f64>) -> String {
    format_value(value, 1, "GB")
}

fn text_or_dash(text: Option<&str>) -> String {
    text.unwrap_or("--").to_string()
}

/// Writes every completed cycle as one JSON line.
pub struct JsonlReporter<W>
where
    W: Write,
{
    writer: W,
}

impl<W> JsonlReporter<W>
where
    W: Write,
{
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl JsonlReporter<File> {
    /// Creates a new [`JsonlReporter`] writing to a new file at the specified path.
    pub fn from_file<P>(path: P) -> Result<Self, io::Error>
    where
        P: AsRef<std::path::Path>,
    {
        let file = File::create(path)?;
        Ok(Self::new(file))
    }
}

impl<W> Report for JsonlReporter<W>
where
    W: Write,
{
    type Error = io::Error;

    fn report(&mut self, view: &CurrentView) -> Result<(), Self::Error> {
        serde_json::to_writer(&mut self.writer, view)?;
        writeln!(self.writer)?;
        self.writer.flush()
    }
}
