//! Metrics sink: the trainer's side channel to experiment trackers
//!
//! The trainer never depends on a concrete tracker. It emits
//! [`SinkEntry`] values through a [`SinkManager`]; with no sinks registered
//! nothing happens.

mod jsonl;
mod manager;
mod memory;
mod progress;
mod traits;

pub use jsonl::JsonLinesSink;
pub use manager::SinkManager;
pub use memory::MemorySink;
pub use progress::ProgressSink;
pub use traits::{keys, MetricsSink, NoopSink, SinkEntry, TrainSummary};
