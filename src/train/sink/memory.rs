//! In-memory sink

use super::traits::{MetricsSink, SinkEntry, TrainSummary};
use crate::error::Result;
use std::cell::RefCell;
use std::rc::Rc;

/// Sink that keeps every entry in memory
///
/// Clones share storage, so a handle kept outside the trainer sees what the
/// registered copy received.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    entries: Rc<RefCell<Vec<SinkEntry>>>,
    summary: Rc<RefCell<Option<TrainSummary>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All entries received so far
    pub fn entries(&self) -> Vec<SinkEntry> {
        self.entries.borrow().clone()
    }

    /// Values of `key` in arrival order
    pub fn series(&self, key: &str) -> Vec<f32> {
        self.entries.borrow().iter().filter_map(|e| e.get(key)).collect()
    }

    pub fn summary(&self) -> Option<TrainSummary> {
        *self.summary.borrow()
    }
}

impl MetricsSink for MemorySink {
    fn log(&mut self, entry: &SinkEntry) -> Result<()> {
        self.entries.borrow_mut().push(entry.clone());
        Ok(())
    }

    fn on_train_end(&mut self, summary: &TrainSummary) -> Result<()> {
        *self.summary.borrow_mut() = Some(*summary);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "MemorySink"
    }
}
