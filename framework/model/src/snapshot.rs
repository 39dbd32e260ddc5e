use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// A raw value as reported by the collector, either a JSON number or a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            RawValue::Number(n) => write!(f, "{n}"),
            RawValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Number(value as f64)
    }
}

/// One reading from a raw snapshot.
///
/// The collector names the fields `OID` and `Valor`, which is also how they are written back out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawReading {
    /// The object identifier the value was read from.
    #[serde(rename = "OID", alias = "source_identifier", default)]
    pub source_identifier: String,
    #[serde(rename = "Valor", alias = "value", default)]
    pub value: Option<RawValue>,
}

impl RawReading {
    pub fn new(source_identifier: impl Into<String>, value: impl Into<RawValue>) -> Self {
        Self {
            source_identifier: source_identifier.into(),
            value: Some(value.into()),
        }
    }

    pub fn missing(source_identifier: impl Into<String>) -> Self {
        Self {
            source_identifier: source_identifier.into(),
            value: None,
        }
    }
}

/// The full set of readings returned by one poll of one device.
///
/// Keys are kept sorted so that every selection made over the snapshot is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RawSnapshot {
    readings: BTreeMap<String, RawReading>,
}

/// The collector either returns the readings directly or wraps them in a `Data` object.
#[derive(Deserialize)]
#[serde(untagged)]
enum SnapshotPayload {
    Wrapped {
        #[serde(rename = "Data")]
        data: BTreeMap<String, RawReading>,
    },
    Bare(BTreeMap<String, RawReading>),
}

impl<'de> Deserialize<'de> for RawSnapshot {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let readings = match SnapshotPayload::deserialize(deserializer)? {
            SnapshotPayload::Wrapped { data } => data,
            SnapshotPayload::Bare(readings) => readings,
        };
        Ok(Self { readings })
    }
}

impl RawSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a collector payload.
    pub fn from_json(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }

    /// Builder style insert, used when assembling a snapshot by hand.
    pub fn with_reading(mut self, key: impl Into<String>, reading: RawReading) -> Self {
        self.readings.insert(key.into(), reading);
        self
    }

    pub fn get(&self, key: &str) -> Option<&RawReading> {
        self.readings.get(key)
    }

    pub fn value(&self, key: &str) -> Option<&RawValue> {
        self.get(key).and_then(|reading| reading.value.as_ref())
    }

    /// The value at `key` as text, `None` if absent or empty.
    pub fn text(&self, key: &str) -> Option<String> {
        self.value(key)
            .map(|value| value.to_string())
            .filter(|text| !text.is_empty())
    }

    /// All readings whose key starts with `prefix`, in key order.
    pub fn with_prefix<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a RawReading)> + 'a {
        self.readings
            .range::<str, _>((std::ops::Bound::Included(prefix), std::ops::Bound::Unbounded))
            .take_while(move |(key, _)| key.starts_with(prefix))
            .map(|(key, reading)| (key.as_str(), reading))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawReading)> {
        self.readings
            .iter()
            .map(|(key, reading)| (key.as_str(), reading))
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

impl FromIterator<(String, RawReading)> for RawSnapshot {
    fn from_iter<T: IntoIterator<Item = (String, RawReading)>>(iter: T) -> Self {
        Self {
            readings: iter.into_iter().collect(),
        }
    }
}
