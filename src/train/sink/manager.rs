//! Sink manager for dispatching metrics to multiple sinks

use super::traits::{MetricsSink, SinkEntry, TrainSummary};
use crate::error::Result;

/// Manages multiple sinks and dispatches entries
#[derive(Default)]
pub struct SinkManager {
    sinks: Vec<Box<dyn MetricsSink>>,
}

impl SinkManager {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    /// Add a sink
    pub fn add<S: MetricsSink + 'static>(&mut self, sink: S) {
        self.sinks.push(Box::new(sink));
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Names of the registered sinks, in dispatch order
    pub fn names(&self) -> Vec<&'static str> {
        self.sinks.iter().map(|s| s.name()).collect()
    }

    /// Send an entry to every sink, stopping at the first failure
    pub fn log(&mut self, entry: &SinkEntry) -> Result<()> {
        for sink in &mut self.sinks {
            sink.log(entry)?;
        }
        Ok(())
    }

    pub fn on_train_end(&mut self, summary: &TrainSummary) -> Result<()> {
        for sink in &mut self.sinks {
            sink.on_train_end(summary)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for SinkManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkManager").field("sinks", &self.names()).finish()
    }
}
