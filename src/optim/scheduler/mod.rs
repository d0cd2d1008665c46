//! Learning rate schedulers

mod step_decay;


pub use step_decay::StepDecayLR;

/// Learning rate scheduler trait
pub trait LRScheduler {
    /// Get the current learning rate
    fn get_lr(&self) -> f32;

    /// Step the scheduler (called once per epoch)
    fn step(&mut self);
}
