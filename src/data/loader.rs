/// Mini-batch loader over a stacked partition
use candle_core::{Device, Result, Tensor};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::split::Partition;

/// Data loader yielding (geometry, target) batches from device tensors
pub struct TensorDataLoader {
    geometries: Tensor,
    targets: Tensor,
    batch_size: usize,
    current_idx: usize,
    indices: Vec<u32>,
    shuffle: bool,
    rng: StdRng,
}

impl TensorDataLoader {
    /// Create new data loader
    ///
    /// Shuffling, when enabled, draws from an RNG seeded with `seed`, so
    /// epoch orders are reproducible.
    pub fn new(
        partition: &Partition,
        batch_size: usize,
        shuffle: bool,
        seed: u64,
        device: &Device,
    ) -> Result<Self> {
        let (geometries, targets) = partition.to_tensors(device)?;
        Ok(Self::from_tensors(geometries, targets, batch_size, shuffle, seed))
    }

    /// Create from already stacked tensors sharing a leading dimension
    pub fn from_tensors(
        geometries: Tensor,
        targets: Tensor,
        batch_size: usize,
        shuffle: bool,
        seed: u64,
    ) -> Self {
        let num_samples = geometries.dims().first().copied().unwrap_or(0);
        let mut indices: Vec<u32> = (0..num_samples as u32).collect();
        let mut rng = StdRng::seed_from_u64(seed);

        if shuffle {
            indices.shuffle(&mut rng);
        }

        Self {
            geometries,
            targets,
            batch_size: batch_size.max(1),
            current_idx: 0,
            indices,
            shuffle,
            rng,
        }
    }

    /// Get next batch (geometries, targets)
    pub fn next_batch(&mut self) -> Result<Option<(Tensor, Tensor)>> {
        if self.current_idx >= self.indices.len() {
            return Ok(None);
        }

        let end_idx = (self.current_idx + self.batch_size).min(self.indices.len());
        let batch_indices = &self.indices[self.current_idx..end_idx];
        self.current_idx = end_idx;

        let index = Tensor::new(batch_indices, self.geometries.device())?;
        let geometries = self.geometries.index_select(&index, 0)?;
        let targets = self.targets.index_select(&index, 0)?;

        Ok(Some((geometries, targets)))
    }

    /// Reset loader for new epoch
    pub fn reset(&mut self) {
        self.current_idx = 0;

        if self.shuffle {
            self.indices.shuffle(&mut self.rng);
        }
    }

    /// Get number of batches
    pub fn num_batches(&self) -> usize {
        (self.indices.len() + self.batch_size - 1) / self.batch_size
    }

    /// Get number of samples
    pub fn num_samples(&self) -> usize {
        self.indices.len()
    }
}

impl super::BatchDataLoader for TensorDataLoader {
    fn next_batch(&mut self) -> Result<Option<(Tensor, Tensor)>> {
        TensorDataLoader::next_batch(self)
    }

    fn reset(&mut self) {
        TensorDataLoader::reset(self)
    }

    fn num_batches(&self) -> usize {
        TensorDataLoader::num_batches(self)
    }
}
