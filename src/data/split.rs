/// Train/test partitioning and stacking into batched arrays
use candle_core::{Device, Tensor};
use ndarray::{stack, Array2, Array4, ArrayView1, ArrayView2, Axis};

use super::dataset::{DragDataset, Sample};

/// Stacked geometries and targets of one partition
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    /// [n, height, width, 1]
    pub geometries: Array4<f32>,
    /// [n, 1]
    pub targets: Array2<f32>,
}

impl Partition {
    /// Stack samples along a new leading axis
    ///
    /// An empty sample slice is a stacking error, as is a sample without a
    /// drag value.
    pub fn stack(samples: &[Sample]) -> crate::Result<Self> {
        let geometry_views: Vec<ArrayView2<f32>> =
            samples.iter().map(|s| s.geometry.view()).collect();
        let geometries = stack(Axis(0), &geometry_views)?.insert_axis(Axis(3));

        let target_views = samples
            .iter()
            .map(|s| {
                let len = s.drag.len();
                if len == 0 {
                    return Err(crate::DragError::Data(
                        "Sample has an empty drag vector".to_string(),
                    ));
                }
                Ok(s.drag.slice(ndarray::s![len - 1..]))
            })
            .collect::<crate::Result<Vec<ArrayView1<f32>>>>()?;
        let targets = stack(Axis(0), &target_views)?;

        Ok(Self { geometries, targets })
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.geometries.len_of(Axis(0))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Per-sample geometry shape (height, width, channels)
    pub fn sample_shape(&self) -> (usize, usize, usize) {
        let (_, h, w, c) = self.geometries.dim();
        (h, w, c)
    }

    /// Convert to (geometry [n, h, w, 1], target [n, 1]) tensors
    pub fn to_tensors(&self, device: &Device) -> candle_core::Result<(Tensor, Tensor)> {
        let geometries = self.geometries.as_standard_layout();
        let targets = self.targets.as_standard_layout();

        let geometry_data = geometries.as_slice().unwrap_or_default().to_vec();
        let target_data = targets.as_slice().unwrap_or_default().to_vec();

        let geometry_tensor = Tensor::from_vec(geometry_data, self.geometries.dim(), device)?;
        let target_tensor = Tensor::from_vec(target_data, self.targets.dim(), device)?;

        Ok((geometry_tensor, target_tensor))
    }
}

/// Train and test partitions of one dataset
#[derive(Debug, Clone, PartialEq)]
pub struct SplitData {
    pub train: Partition,
    pub test: Partition,
}

impl SplitData {
    /// Split at the dataset's split line and stack both partitions
    ///
    /// Train covers `[0, split)`, test covers `[split, N - 1)`: the final
    /// sample is never used.
    pub fn from_dataset(dataset: &DragDataset) -> crate::Result<Self> {
        let (train_range, test_range) = split_ranges(dataset.len(), dataset.split_line());
        let samples = dataset.samples();

        log::debug!("Split ranges: train={:?}, test={:?}", train_range, test_range);

        let train = Partition::stack(&samples[train_range])?;
        let test = Partition::stack(&samples[test_range])?;

        Ok(Self { train, test })
    }

    /// Shape summary printed before training
    pub fn describe(&self) -> String {
        let (h, w, c) = self.train.sample_shape();
        format!(
            "geometry shape: ({}, {}, {})\ndrag shape: ({},)\n{}  train samples\n{}  test samples",
            h,
            w,
            c,
            self.train.targets.ncols(),
            self.train.len(),
            self.test.len()
        )
    }
}

/// Index ranges for the train prefix and the test suffix (last sample dropped)
///
/// Bounds are clamped, so out-of-range split lines give empty ranges rather
/// than panics.
pub fn split_ranges(
    len: usize,
    split_line: usize,
) -> (std::ops::Range<usize>, std::ops::Range<usize>) {
    let test_end = len.saturating_sub(1);
    let train_end = split_line.min(len);
    let test_start = split_line.min(test_end);
    (0..train_end, test_start..test_end)
}
