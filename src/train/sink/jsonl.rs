//! JSON-lines file sink

use super::traits::{MetricsSink, SinkEntry, TrainSummary};
use crate::error::Result;
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Sink writing one JSON object per entry
///
/// Each line holds `epoch`, `step` (null for epoch summaries),
/// `global_step`, `elapsed_secs` and the metric keys. Non-finite values are
/// written as `null`.
#[derive(Debug)]
pub struct JsonLinesSink {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl JsonLinesSink {
    /// Create (or truncate) the output file
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let writer = BufWriter::new(File::create(&path)?);
        Ok(Self { path, writer })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_object(&mut self, object: Map<String, Value>) -> Result<()> {
        serde_json::to_writer(&mut self.writer, &Value::Object(object))?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }
}

impl MetricsSink for JsonLinesSink {
    fn log(&mut self, entry: &SinkEntry) -> Result<()> {
        let mut object = Map::new();
        object.insert("epoch".to_string(), entry.epoch.into());
        object.insert("step".to_string(), entry.step.into());
        object.insert("global_step".to_string(), entry.global_step.into());
        object.insert("elapsed_secs".to_string(), entry.elapsed_secs.into());
        for &(key, value) in &entry.values {
            object.insert(key.to_string(), value.into());
        }
        self.write_object(object)
    }

    fn on_train_end(&mut self, summary: &TrainSummary) -> Result<()> {
        let mut object = Map::new();
        object.insert("event".to_string(), "train_end".into());
        object.insert("epochs".to_string(), summary.epochs.into());
        object.insert("best_epoch".to_string(), summary.best_epoch.into());
        object.insert("min_val".to_string(), summary.min_val.into());
        object.insert("elapsed_secs".to_string(), summary.elapsed_secs.into());
        self.write_object(object)?;
        self.writer.flush()?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "JsonLinesSink"
    }
}
