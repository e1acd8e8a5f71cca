/// Data loading modules for drag training
pub mod dataset;
pub mod loader;
pub mod split;

pub use dataset::{DatasetMetadata, DragDataset, Sample};
pub use loader::TensorDataLoader;
pub use split::{Partition, SplitData};

use candle_core::{Result, Tensor};

/// Generic data loader trait
pub trait BatchDataLoader {
    /// Get next batch of (geometry, target) tensors
    fn next_batch(&mut self) -> Result<Option<(Tensor, Tensor)>>;

    /// Reset loader for new epoch
    fn reset(&mut self);

    /// Get total number of batches
    fn num_batches(&self) -> usize;
}
