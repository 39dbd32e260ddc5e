//! Turns raw snapshots into derived metrics.
//!
//! Nothing in this crate performs I/O. The [Sampler] keeps the counter baselines for one session
//! and every other function is pure, so the selection policies can be tested in isolation.

pub mod metadata;
pub mod normalize;
pub mod rate;
mod sampler;

pub use metadata::extract_metadata;
pub use normalize::normalize;
pub use rate::{CounterRate, CounterState};
pub use sampler::{DerivedReadings, Sampler};
