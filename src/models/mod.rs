/// Drag predictor model implementation
use candle_core::{Module, Result, Tensor};
use candle_nn::{Linear, VarBuilder};
use rand::Rng;

use crate::config::ModelConfig;
use crate::layers::{ConvBlock, SeededDropout};

pub mod init;

/// Convolutional regressor from a geometry mask to a scalar drag value
///
/// Input: NHWC geometry batch [batch, height, width, channels].
/// Output: [batch, 1] drag predictions (linear activation).
pub struct DragPredictor {
    config: ModelConfig,
    blocks: Vec<ConvBlock>,
    dense: Linear,
    dropout: SeededDropout,
    output: Linear,
    input_hw: (usize, usize),
}

impl DragPredictor {
    /// Create new model for `height x width` inputs
    ///
    /// # Arguments
    /// * `config` - Model configuration
    /// * `height`, `width` - Spatial size of the geometry masks
    /// * `vb` - VarBuilder for parameter initialization
    pub fn new(config: ModelConfig, height: usize, width: usize, vb: VarBuilder) -> crate::Result<Self> {
        config.validate()?;

        let flat = config.flattened_features(height, width);
        if flat == 0 {
            return Err(crate::DragError::Config(format!(
                "Input {}x{} vanishes after {} pooling stages",
                height,
                width,
                config.num_blocks()
            )));
        }

        let mut blocks = Vec::with_capacity(config.num_blocks());
        let mut in_channels = config.in_channels;
        for (i, &out_channels) in config.block_channels.iter().enumerate() {
            blocks.push(ConvBlock::new(
                in_channels,
                out_channels,
                vb.pp(format!("block_{}", i)),
            )?);
            in_channels = out_channels;
        }

        let dense = candle_nn::linear(flat, config.dense_units, vb.pp("dense"))?;
        let output = candle_nn::linear(config.dense_units, 1, vb.pp("output"))?;
        let dropout = SeededDropout::new(config.dropout);

        Ok(Self {
            config,
            blocks,
            dense,
            dropout,
            output,
            input_hw: (height, width),
        })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Spatial size the model was built for
    pub fn input_hw(&self) -> (usize, usize) {
        self.input_hw
    }

    /// Convolutional stack and hidden dense layer: [batch, h, w, c] -> [batch, dense_units]
    fn hidden(&self, x: &Tensor) -> Result<Tensor> {
        // NHWC -> NCHW
        let mut x = x.permute((0, 3, 1, 2))?.contiguous()?;

        let last = self.blocks.len() - 1;
        for (i, block) in self.blocks.iter().enumerate() {
            let features = block.features(&x)?;
            x = if i < last || self.config.flatten_pooled {
                ConvBlock::pool(&features)?
            } else {
                features
            };
        }

        let flat = x.flatten_from(1)?;
        self.dense.forward(&flat)?.relu()
    }

    /// Inference forward pass (dropout inactive)
    pub fn forward(&self, x: &Tensor) -> Result<Tensor> {
        let hidden = self.hidden(x)?;
        self.output.forward(&hidden)
    }

    /// Training forward pass; dropout masks are drawn from `rng`
    pub fn forward_train<R: Rng>(&self, x: &Tensor, rng: &mut R) -> Result<Tensor> {
        let hidden = self.hidden(x)?;
        let hidden = self.dropout.forward_train(&hidden, rng)?;
        self.output.forward(&hidden)
    }

    /// Number of learned parameters
    pub fn num_parameters(&self) -> usize {
        let (h, w) = self.input_hw;
        let mut total = 0;
        let mut in_channels = self.config.in_channels;
        for &out in &self.config.block_channels {
            total += in_channels * out * 9 + out;
            total += out * out * 9 + out;
            in_channels = out;
        }
        let flat = self.config.flattened_features(h, w);
        total += flat * self.config.dense_units + self.config.dense_units;
        total += self.config.dense_units + 1;
        total
    }
}

impl Module for DragPredictor {
    fn forward(&self, x: &Tensor) -> Result<Tensor> {
        DragPredictor::forward(self, x)
    }
}
