/// End-to-end run: split, train, evaluate, report
use candle_core::Device;
use std::io::Write;

use crate::data::{DragDataset, SplitData, TensorDataLoader};
use crate::report::{GeometryRenderer, Reporter};
use crate::training::{History, Trainer, TrainingConfig};
use crate::ModelConfig;

/// Outcome of one run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub history: History,
    /// Aggregate test-set mean squared error
    pub test_mse: f32,
    /// Per-test-sample predictions, in input order
    pub predictions: Vec<f32>,
    pub num_train: usize,
    pub num_test: usize,
}

/// Train on the dataset's train prefix and report on its test suffix
///
/// All user-facing text goes to `out`; one figure per test sample goes to
/// `renderer`. Any failure ends the run.
pub fn run<W: Write>(
    dataset: &DragDataset,
    model_config: ModelConfig,
    training_config: TrainingConfig,
    device: &Device,
    renderer: &mut dyn GeometryRenderer,
    out: &mut W,
) -> crate::Result<RunSummary> {
    // get train and test split
    let split = SplitData::from_dataset(dataset)?;
    writeln!(out, "{}", split.describe())?;

    let (height, width, _) = split.train.sample_shape();

    let mut loader = TensorDataLoader::new(
        &split.train,
        training_config.batch_size,
        training_config.shuffle,
        training_config.seed,
        device,
    )?;
    let (test_geometries, test_targets) = split.test.to_tensors(device)?;
    log::info!(
        "Train loader: {} samples in {} batches",
        loader.num_samples(),
        loader.num_batches()
    );

    log::info!("Initializing trainer...");
    let mut trainer = Trainer::new(model_config, training_config, (height, width), device.clone())?;
    log::info!(
        "Model parameters: {} (input {:?})",
        trainer.num_parameters(),
        trainer.model().input_hw()
    );

    let history = trainer.fit(&mut loader, (&test_geometries, &test_targets), out)?;

    let test_mse = trainer.evaluate(&test_geometries, &test_targets)?;
    let predictions = trainer.predict(&test_geometries)?;
    let predicted_rows = predictions.to_vec2::<f32>()?;
    let target_rows = test_targets.to_vec2::<f32>()?;

    let mut reporter = Reporter::new(out, renderer);
    reporter.aggregate(test_mse)?;
    reporter.samples(split.test.geometries.view(), &target_rows, &predicted_rows)?;

    Ok(RunSummary {
        history,
        test_mse,
        predictions: predicted_rows.into_iter().flatten().collect(),
        num_train: split.train.len(),
        num_test: split.test.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Sample;
    use ndarray::{Array, Array1, ArrayView2};

    struct NullRenderer(usize);

    impl GeometryRenderer for NullRenderer {
        fn render(&mut self, _index: usize, _geometry: ArrayView2<f32>) -> crate::Result<()> {
            self.0 += 1;
            Ok(())
        }
    }

    fn tiny_dataset() -> DragDataset {
        // 3 train + 2 test + 1 dropped
        let samples = (0..6)
            .map(|i| {
                let radius = 1.0 + i as f32 * 0.5;
                let geometry = Array::from_shape_fn((8, 8), |(r, c)| {
                    let (dr, dc) = (r as f32 - 3.5, c as f32 - 3.5);
                    if dr * dr + dc * dc <= radius * radius { 1.0 } else { 0.0 }
                });
                Sample::new(geometry, Array1::from(vec![0.0, radius * 0.1]))
            })
            .collect();
        DragDataset::from_samples(samples, 3).unwrap()
    }

    #[test]
    fn test_one_epoch_run() -> crate::Result<()> {
        let training_config = TrainingConfig {
            num_epochs: 1,
            ..Default::default()
        };
        let mut renderer = NullRenderer(0);
        let mut out = Vec::new();

        let summary = run(
            &tiny_dataset(),
            ModelConfig::default(),
            training_config,
            &Device::Cpu,
            &mut renderer,
            &mut out,
        )?;

        assert_eq!(summary.num_train, 3);
        assert_eq!(summary.num_test, 2);
        assert!(summary.test_mse.is_finite());
        assert_eq!(summary.predictions.len(), 2);
        assert_eq!(summary.history.len(), 1);
        assert_eq!(renderer.0, 2);

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("geometry shape: (8, 8, 1)\ndrag shape: (1,)\n3  train samples\n2  test samples\n"));
        assert!(text.contains("Epoch 1/1 - loss: "));
        assert!(text.contains("Average Mean Squared Error: "));
        assert_eq!(text.matches("geometry in plot").count(), 2);
        Ok(())
    }

    #[test]
    fn test_nan_target_propagates_to_metrics() -> crate::Result<()> {
        let mut samples = tiny_dataset().samples().to_vec();
        samples[1].drag[1] = f32::NAN;
        let dataset = DragDataset::from_samples(samples, 3)?;

        let training_config = TrainingConfig {
            num_epochs: 2,
            ..Default::default()
        };
        let mut renderer = NullRenderer(0);
        let mut out = Vec::new();

        let summary = run(
            &dataset,
            ModelConfig::default(),
            training_config,
            &Device::Cpu,
            &mut renderer,
            &mut out,
        )?;

        assert!(summary.test_mse.is_nan());
        assert_eq!(summary.history.len(), 2);
        assert!(summary.history.epochs.iter().all(|m| m.loss.is_nan()));
        assert_eq!(renderer.0, 2);

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Epoch 1/2 - loss: NaN"));
        assert!(text.contains("Average Mean Squared Error: NaN"));
        Ok(())
    }

    #[test]
    fn test_empty_test_partition_fails() {
        let samples = tiny_dataset().samples().to_vec();
        let dataset = DragDataset::from_samples(samples, 5).unwrap();
        let mut renderer = NullRenderer(0);
        let mut out = Vec::new();

        let result = run(
            &dataset,
            ModelConfig::default(),
            TrainingConfig::default(),
            &Device::Cpu,
            &mut renderer,
            &mut out,
        );
        assert!(result.is_err());
        assert_eq!(renderer.0, 0);
    }
}
