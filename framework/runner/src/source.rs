use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::Deserialize;
use snmp_monitor_model::{JsonlError, JsonlReader, RawSnapshot};
use url::Url;

/// Where raw snapshots come from.
///
/// A fetch is a single request for every reading the collector has for one device address. The
/// source never interprets the readings.
pub trait SnapshotSource: Send + Sync + 'static {
    fn fetch<'a>(&'a self, address: &'a str) -> BoxFuture<'a, Result<RawSnapshot, SourceError>>;
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Could not reach the collector: {0}")]
    Transport(String),
    #[error("Collector responded with status {status}: {detail}")]
    Status { status: u16, detail: String },
    #[error("Collector sent a malformed snapshot: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Invalid collector URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Replay finished after {0} snapshots")]
    ReplayExhausted(usize),
}

#[derive(Debug, Clone)]
pub struct HttpSourceConfig {
    pub endpoint: Url,
    pub timeout: Duration,
}

impl HttpSourceConfig {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Fetches snapshots from the collector's HTTP API.
pub struct HttpSnapshotSource {
    config: HttpSourceConfig,
    agent: ureq::Agent,
}

impl HttpSnapshotSource {
    pub fn new(config: HttpSourceConfig) -> Self {
        let agent = ureq::config::Config::builder()
            .timeout_global(Some(config.timeout))
            .http_status_as_error(false)
            .build()
            .new_agent();

        Self { config, agent }
    }
}

impl SnapshotSource for HttpSnapshotSource {
    fn fetch<'a>(&'a self, address: &'a str) -> BoxFuture<'a, Result<RawSnapshot, SourceError>> {
        async move {
            let url = snapshot_url(&self.config.endpoint, address)?;
            log::debug!("Fetching snapshot from {url}");

            let agent = self.agent.clone();
            tokio::task::spawn_blocking(move || fetch_blocking(&agent, url.as_str()))
                .await
                .map_err(|e| SourceError::Transport(format!("Fetch task failed: {e}")))?
        }
        .boxed()
    }
}

fn fetch_blocking(agent: &ureq::Agent, url: &str) -> Result<RawSnapshot, SourceError> {
    let mut response = agent
        .get(url)
        .header("Accept", "application/json")
        .call()
        .map_err(|e| SourceError::Transport(e.to_string()))?;

    let status = response.status();
    let body = response
        .body_mut()
        .read_to_string()
        .map_err(|e| SourceError::Transport(e.to_string()))?;

    if !status.is_success() {
        return Err(SourceError::Status {
            status: status.as_u16(),
            detail: error_detail(&body),
        });
    }

    Ok(RawSnapshot::from_json(&body)?)
}

/// `{endpoint}/api/snmp/?ip={address}&format=json`
///
/// The endpoint is treated as a base URL, so a path prefix needs a trailing slash to be kept.
pub(crate) fn snapshot_url(endpoint: &Url, address: &str) -> Result<Url, SourceError> {
    let mut url = endpoint.join("api/snmp/")?;
    url.query_pairs_mut()
        .append_pair("ip", address)
        .append_pair("format", "json");
    Ok(url)
}

/// The collector reports failures as `{"detail": "..."}`. Anything else is passed through as is.
pub(crate) fn error_detail(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        detail: serde_json::Value,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(detail),
        }) => detail,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) if body.trim().is_empty() => "no details provided".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

/// Serves snapshots recorded as JSON Lines, one collector payload per line.
///
/// Snapshots are served in file order regardless of the requested address. Once all of them have
/// been served, every fetch fails with [SourceError::ReplayExhausted].
#[derive(Debug)]
pub struct ReplaySnapshotSource {
    snapshots: Vec<RawSnapshot>,
    next: Mutex<usize>,
}

impl ReplaySnapshotSource {
    pub fn new(snapshots: Vec<RawSnapshot>) -> Self {
        Self {
            snapshots,
            next: Mutex::new(0),
        }
    }

    pub fn from_file<P>(path: P) -> Result<Self, JsonlError>
    where
        P: AsRef<Path>,
    {
        let snapshots = JsonlReader::default().parse_from_file(path)?;
        Ok(Self::new(snapshots))
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    fn next_snapshot(&self) -> Result<RawSnapshot, SourceError> {
        let mut next = self
            .next
            .lock()
            .map_err(|_| SourceError::Transport("Replay state was poisoned".to_string()))?;

        let snapshot = self
            .snapshots
            .get(*next)
            .cloned()
            .ok_or(SourceError::ReplayExhausted(self.snapshots.len()))?;
        *next += 1;
        Ok(snapshot)
    }
}

impl SnapshotSource for ReplaySnapshotSource {
    fn fetch<'a>(&'a self, address: &'a str) -> BoxFuture<'a, Result<RawSnapshot, SourceError>> {
        log::trace!("Replaying snapshot for {address}");
        let result = self.next_snapshot();
        async move { result }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;

    #[test]
    fn test_should_build_snapshot_url() {
        let endpoint = Url::parse("http://127.0.0.1:8000").unwrap();
        let url = snapshot_url(&endpoint, "192.168.1.20").unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:8000/api/snmp/?ip=192.168.1.20&format=json"
        );

        let endpoint = Url::parse("https://monitor.lan/backend/").unwrap();
        let url = snapshot_url(&endpoint, "10.0.0.1").unwrap();
        assert_eq!(
            url.as_str(),
            "https://monitor.lan/backend/api/snmp/?ip=10.0.0.1&format=json"
        );
    }

    #[test]
    fn test_should_extract_collector_error_detail() {
        assert_eq!(
            error_detail(r#"{"detail": "No response from 10.0.0.9"}"#),
            "No response from 10.0.0.9"
        );
        assert_eq!(error_detail(r#"{"detail": ["bad ip"]}"#), r#"["bad ip"]"#);
        assert_eq!(error_detail("Bad Gateway\n"), "Bad Gateway");
        assert_eq!(error_detail(""), "no details provided");
    }

    #[test]
    fn test_should_describe_status_error() {
        let err = SourceError::Status {
            status: 504,
            detail: "SNMP timeout".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Collector responded with status 504: SNMP timeout"
        );
    }

    #[tokio::test]
    async fn test_should_replay_snapshots_in_order() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"hrProcessorLoad.1": {{"OID": "1.3.6.1.2.1.25.3.3.1.2.1", "Valor": 10}}}}"#
        )
        .unwrap();
        writeln!(
            file,
            r#"{{"Data": {{"hrProcessorLoad.1": {{"OID": "1.3.6.1.2.1.25.3.3.1.2.1", "Valor": 20}}}}}}"#
        )
        .unwrap();

        let source = ReplaySnapshotSource::from_file(file.path()).unwrap();
        assert_eq!(source.len(), 2);

        let first = source.fetch("10.0.0.1").await.unwrap();
        let second = source.fetch("10.0.0.1").await.unwrap();
        assert_eq!(
            first.value("hrProcessorLoad.1").map(|v| v.to_string()),
            Some("10".to_string())
        );
        assert_eq!(
            second.value("hrProcessorLoad.1").map(|v| v.to_string()),
            Some("20".to_string())
        );

        match source.fetch("10.0.0.1").await {
            Err(SourceError::ReplayExhausted(2)) => {}
            other => panic!("Expected exhausted replay, got {other:?}"),
        }
    }
}
