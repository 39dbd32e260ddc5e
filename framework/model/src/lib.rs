//! Data model shared by the SNMP monitor crates.
//!
//! Everything in here is plain data. The values are produced by the engine and the runner and are
//! handed to consumers as read-only clones of a [CurrentView].

mod device;
mod history;
mod jsonl;
mod metadata;
mod snapshot;
mod view;

pub use device::DeviceTarget;
pub use history::{MetricHistories, MetricHistory, MetricKind, Sample, DEFAULT_HISTORY_CAPACITY};
pub use jsonl::{JsonlError, JsonlReader};
pub use metadata::{DerivedMetadata, BYTES_PER_GIGABYTE};
pub use snapshot::{RawReading, RawSnapshot, RawValue};
pub use view::{CurrentView, LatestValues};
