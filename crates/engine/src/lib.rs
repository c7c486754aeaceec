//! Queue-drain engine: the per-trigger processing cycle and failure classification.

pub mod classify;
pub mod processor;

pub use processor::{CycleOutcome, JobProcessor};
