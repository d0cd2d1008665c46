//! Perturbation data: batches of cell graphs and the JSON dataset reader

mod batch;
mod dataset;

pub use batch::PertBatch;
pub use dataset::{DataLoaders, PertDataset, Split};
