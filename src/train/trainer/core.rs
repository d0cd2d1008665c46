//! Core Trainer struct and basic methods

use crate::optim::{LRScheduler, Optimizer, StepDecayLR};
use crate::train::sink::{MetricsSink, SinkEntry, SinkManager};
use crate::train::{PerturbationLoss, TrainConfig};
use crate::error::Result;
use std::time::Instant;

/// Trainer owning the optimizer, LR schedule and metrics sinks
///
/// The model is borrowed per call, so the same trainer state (optimizer
/// moments, schedule position) follows the model across epochs.
pub struct Trainer {
    pub(crate) config: TrainConfig,

    pub(crate) loss: PerturbationLoss,

    pub(crate) optimizer: Box<dyn Optimizer>,

    /// Step-wise learning-rate decay, advanced once per epoch
    pub(crate) scheduler: StepDecayLR,

    pub(crate) sinks: SinkManager,

    /// Optimizer steps since the last `train` call started
    pub(crate) global_step: usize,

    /// Current epoch (1-indexed); 0 outside of `train`
    pub(crate) epoch: usize,

    pub(crate) start_time: Option<Instant>,
}

impl Trainer {
    /// Create a trainer with the optimizer and schedule described by `config`
    ///
    /// Fails with `Error::Configuration` when `config` does not pass
    /// [`TrainConfig::validate`].
    pub fn new(config: TrainConfig, loss: PerturbationLoss) -> Result<Self> {
        config.validate()?;
        let optimizer = config.optimizer.build(config.lr, config.weight_decay);
        let scheduler = StepDecayLR::new(config.lr, config.lr_decay_step_size, config.lr_decay_factor);
        Ok(Self {
            config,
            loss,
            optimizer,
            scheduler,
            sinks: SinkManager::new(),
            global_step: 0,
            epoch: 0,
            start_time: None,
        })
    }

    /// Register a metrics sink
    pub fn add_sink<S: MetricsSink + 'static>(&mut self, sink: S) {
        self.sinks.add(sink);
    }

    pub fn sinks(&self) -> &SinkManager {
        &self.sinks
    }

    /// Learning rate the optimizer will use for the next step
    pub fn lr(&self) -> f32 {
        self.optimizer.lr()
    }

    /// Learning rate prescribed by the schedule
    pub fn scheduled_lr(&self) -> f32 {
        self.scheduler.get_lr()
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    pub fn loss(&self) -> &PerturbationLoss {
        &self.loss
    }

    pub fn global_step(&self) -> usize {
        self.global_step
    }

    pub(crate) fn elapsed_secs(&self) -> f64 {
        self.start_time.map_or(0.0, |t| t.elapsed().as_secs_f64())
    }

    /// Send values to every sink under the current epoch and step
    pub(crate) fn emit(&mut self, step: Option<usize>, values: Vec<(&'static str, f32)>) -> Result<()> {
        if self.sinks.is_empty() {
            return Ok(());
        }
        let entry = SinkEntry {
            epoch: self.epoch,
            step,
            global_step: self.global_step,
            elapsed_secs: self.elapsed_secs(),
            values,
        };
        self.sinks.log(&entry)
    }
}
