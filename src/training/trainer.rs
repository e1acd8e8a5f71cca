/// Training loop for DragPredictor
use candle_core::{DType, Device, Tensor};
use candle_nn::{loss, AdamW, Optimizer, ParamsAdamW, VarBuilder, VarMap};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::Write;

use super::history::{EpochMetrics, History};
use crate::data::BatchDataLoader;
use crate::models::init::seeded_init;
use crate::{DragPredictor, ModelConfig};

/// Training configuration
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TrainingConfig {
    /// Number of passes over the training partition
    pub num_epochs: usize,
    /// Batch size
    pub batch_size: usize,
    /// Adam learning rate (fixed, no schedule)
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub eps: f64,
    /// Seed for weight init, shuffling and dropout
    pub seed: u64,
    /// Shuffle the training order every epoch
    pub shuffle: bool,
    /// Write one progress line per epoch
    pub verbose: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            num_epochs: 100,
            batch_size: 32,
            learning_rate: 1e-4,
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-7,
            seed: 42,
            shuffle: true,
            verbose: true,
        }
    }
}

impl TrainingConfig {
    /// Validate configuration
    pub fn validate(&self) -> crate::Result<()> {
        if self.num_epochs == 0 {
            return Err(crate::DragError::Config(
                "num_epochs must be > 0".to_string(),
            ));
        }

        if self.batch_size == 0 {
            return Err(crate::DragError::Config(
                "batch_size must be > 0".to_string(),
            ));
        }

        if self.learning_rate.is_nan() || self.learning_rate <= 0.0 {
            return Err(crate::DragError::Config(format!(
                "learning_rate must be > 0, got {}",
                self.learning_rate
            )));
        }

        Ok(())
    }
}

/// Trainer for DragPredictor
///
/// Owns the model weights; they are mutated only through `train_step`.
pub struct Trainer {
    model: DragPredictor,
    varmap: VarMap,
    optimizer: AdamW,
    config: TrainingConfig,
    device: Device,
    rng: StdRng,
    step: usize,
}

impl Trainer {
    /// Create new trainer for `height x width` geometry masks
    pub fn new(
        model_config: ModelConfig,
        training_config: TrainingConfig,
        input_hw: (usize, usize),
        device: Device,
    ) -> crate::Result<Self> {
        training_config.validate()?;

        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let model = DragPredictor::new(model_config, input_hw.0, input_hw.1, vb)?;
        seeded_init(&varmap, training_config.seed)?;

        // Plain Adam: AdamW without weight decay
        let optimizer_params = ParamsAdamW {
            lr: training_config.learning_rate,
            beta1: training_config.beta1,
            beta2: training_config.beta2,
            eps: training_config.eps,
            weight_decay: 0.0,
        };
        let optimizer = AdamW::new(varmap.all_vars(), optimizer_params)?;

        // Dropout stream kept apart from the init and shuffle streams
        let rng = StdRng::seed_from_u64(training_config.seed.wrapping_add(1));

        Ok(Self {
            model,
            varmap,
            optimizer,
            config: training_config,
            device,
            rng,
            step: 0,
        })
    }

    pub fn model(&self) -> &DragPredictor {
        &self.model
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Optimizer steps taken so far
    pub fn step(&self) -> usize {
        self.step
    }

    /// Number of learned parameters
    pub fn num_parameters(&self) -> usize {
        self.varmap
            .all_vars()
            .iter()
            .map(|v| crate::utils::count_parameters(v.as_tensor()))
            .sum()
    }

    /// Training step on one batch, returns the batch loss
    pub fn train_step(&mut self, geometries: &Tensor, targets: &Tensor) -> crate::Result<f32> {
        let predictions = self.model.forward_train(geometries, &mut self.rng)?;

        log::trace!("Predictions shape: {:?}", predictions.dims());

        let loss = loss::mse(&predictions, targets)?;
        let loss_val = loss.to_scalar::<f32>()?;

        // Backward pass + parameter update
        self.optimizer.backward_step(&loss)?;
        self.step += 1;

        Ok(loss_val)
    }

    /// Train for one epoch, returns the sample-weighted mean loss
    pub fn train_epoch(&mut self, dataloader: &mut impl BatchDataLoader) -> crate::Result<f32> {
        let mut total_loss = 0.0f64;
        let mut num_samples = 0usize;

        dataloader.reset();

        while let Some((geometries, targets)) = dataloader.next_batch()? {
            let batch_size = geometries.dim(0)?;
            let loss = self.train_step(&geometries, &targets)?;
            total_loss += loss as f64 * batch_size as f64;
            num_samples += batch_size;

            log::trace!("Step {}: batch loss={:.6}", self.step, loss);
        }

        Ok((total_loss / num_samples as f64) as f32)
    }

    /// Mean squared error over all samples (inference mode, no shuffling)
    pub fn evaluate(&self, geometries: &Tensor, targets: &Tensor) -> crate::Result<f32> {
        let num_samples = geometries.dim(0)?;
        let predictions = self.predict(geometries)?;

        let squared_error = predictions
            .sub(targets)?
            .sqr()?
            .sum_all()?
            .to_dtype(DType::F64)?
            .to_scalar::<f64>()?;

        Ok((squared_error / num_samples as f64) as f32)
    }

    /// Per-sample predictions [n, 1] in input order
    pub fn predict(&self, geometries: &Tensor) -> crate::Result<Tensor> {
        let num_samples = geometries.dim(0)?;
        let mut outputs = Vec::with_capacity(num_samples.div_ceil(self.config.batch_size));

        let mut start = 0;
        while start < num_samples {
            let len = self.config.batch_size.min(num_samples - start);
            let batch = geometries.narrow(0, start, len)?;
            outputs.push(self.model.forward(&batch)?);
            start += len;
        }

        if outputs.is_empty() {
            return Ok(Tensor::zeros((0, 1), DType::F32, &self.device)?);
        }

        Ok(Tensor::cat(&outputs, 0)?)
    }

    /// Full training loop with validation after every epoch
    ///
    /// NaN or infinite losses are not detected; they show up in the
    /// recorded metrics.
    pub fn fit(
        &mut self,
        dataloader: &mut impl BatchDataLoader,
        validation: (&Tensor, &Tensor),
        out: &mut impl Write,
    ) -> crate::Result<History> {
        let num_epochs = self.config.num_epochs;
        log::info!("Starting training for {} epochs", num_epochs);
        log::info!("Total batches per epoch: {}", dataloader.num_batches());

        let mut history = History::default();

        for epoch in 1..=num_epochs {
            let loss = self.train_epoch(dataloader)?;
            let val_loss = self.evaluate(validation.0, validation.1)?;

            let metrics = EpochMetrics {
                epoch,
                loss,
                val_loss,
            };

            log::debug!(
                "Epoch {} complete: loss={:.6}, val_loss={:.6}, step={}",
                epoch,
                loss,
                val_loss,
                self.step
            );

            if self.config.verbose {
                writeln!(out, "{}", metrics.progress_line(num_epochs))?;
            }

            history.push(metrics);
        }

        log::info!("Training complete!");

        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::TensorDataLoader;

    fn tiny_config(num_epochs: usize) -> TrainingConfig {
        TrainingConfig {
            num_epochs,
            batch_size: 2,
            verbose: true,
            ..Default::default()
        }
    }

    fn tiny_data(n: usize) -> candle_core::Result<(Tensor, Tensor)> {
        let device = Device::Cpu;
        let geometries = Tensor::rand(0f32, 1.0, (n, 8, 8, 1), &device)?;
        let targets = geometries.mean_keepdim(1)?.mean_keepdim(2)?.reshape((n, 1))?;
        Ok((geometries, targets))
    }

    #[test]
    fn test_training_config_validation() {
        assert!(TrainingConfig::default().validate().is_ok());
        assert!(tiny_config(0).validate().is_err());

        let mut config = TrainingConfig::default();
        config.learning_rate = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_train_step_updates_weights() -> crate::Result<()> {
        let mut trainer = Trainer::new(ModelConfig::default(), tiny_config(1), (8, 8), Device::Cpu)?;
        let (geometries, targets) = tiny_data(4)?;

        let before = trainer.predict(&geometries)?.to_vec2::<f32>()?;
        let loss = trainer.train_step(&geometries, &targets)?;
        let after = trainer.predict(&geometries)?.to_vec2::<f32>()?;

        assert!(loss.is_finite());
        assert_eq!(trainer.step(), 1);
        assert_ne!(before, after);
        Ok(())
    }

    #[test]
    fn test_fit_writes_one_line_per_epoch() -> crate::Result<()> {
        let mut trainer = Trainer::new(ModelConfig::default(), tiny_config(3), (8, 8), Device::Cpu)?;
        let (geometries, targets) = tiny_data(5)?;
        let (val_geometries, val_targets) = tiny_data(2)?;
        let mut loader = TensorDataLoader::from_tensors(geometries, targets, 2, true, 0);

        let mut out = Vec::new();
        let history = trainer.fit(&mut loader, (&val_geometries, &val_targets), &mut out)?;

        assert_eq!(history.len(), 3);
        assert_eq!(trainer.step(), 9);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.lines().last().unwrap().starts_with("Epoch 3/3 - loss: "));
        Ok(())
    }

    #[test]
    fn test_evaluate_matches_manual_mse() -> crate::Result<()> {
        let trainer = Trainer::new(ModelConfig::default(), tiny_config(1), (8, 8), Device::Cpu)?;
        let (geometries, targets) = tiny_data(5)?;

        let predictions = trainer.predict(&geometries)?;
        assert_eq!(predictions.dims(), &[5, 1]);

        let manual = loss::mse(&predictions, &targets)?.to_scalar::<f32>()?;
        let evaluated = trainer.evaluate(&geometries, &targets)?;
        assert!((manual - evaluated).abs() < 1e-5);
        Ok(())
    }

    #[test]
    fn test_same_seed_same_weights() -> crate::Result<()> {
        let (geometries, _) = tiny_data(3)?;
        let a = Trainer::new(ModelConfig::default(), tiny_config(1), (8, 8), Device::Cpu)?;
        let b = Trainer::new(ModelConfig::default(), tiny_config(1), (8, 8), Device::Cpu)?;

        assert_eq!(
            a.predict(&geometries)?.to_vec2::<f32>()?,
            b.predict(&geometries)?.to_vec2::<f32>()?
        );
        assert_eq!(a.num_parameters(), a.model().num_parameters());
        Ok(())
    }
}
