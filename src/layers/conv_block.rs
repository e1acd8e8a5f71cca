/// Convolutional downsampling block
use candle_core::{Module, Result, Tensor};
use candle_nn::{Conv2d, Conv2dConfig, VarBuilder};

/// Two same-padded 3x3 convolutions with ReLU, then 2x2 max pooling
///
/// Operates on NCHW tensors.
pub struct ConvBlock {
    conv1: Conv2d,
    conv2: Conv2d,
}

impl ConvBlock {
    /// Create new block
    ///
    /// # Arguments
    /// * `in_channels` - Channels of the incoming activations
    /// * `out_channels` - Channels produced by both convolutions
    /// * `vb` - VarBuilder for parameter initialization
    pub fn new(in_channels: usize, out_channels: usize, vb: VarBuilder) -> Result<Self> {
        // padding 1 keeps 3x3 outputs at the input size
        let config = Conv2dConfig {
            padding: 1,
            ..Default::default()
        };

        let conv1 = candle_nn::conv2d(in_channels, out_channels, 3, config, vb.pp("conv1"))?;
        let conv2 = candle_nn::conv2d(out_channels, out_channels, 3, config, vb.pp("conv2"))?;

        Ok(Self { conv1, conv2 })
    }

    /// Convolution stage only: [batch, in, h, w] -> [batch, out, h, w]
    pub fn features(&self, x: &Tensor) -> Result<Tensor> {
        let x = self.conv1.forward(x)?.relu()?;
        self.conv2.forward(&x)?.relu()
    }

    /// Max pool of `features`: [batch, out, h, w] -> [batch, out, h/2, w/2]
    pub fn pool(features: &Tensor) -> Result<Tensor> {
        features.max_pool2d(2)
    }
}

impl Module for ConvBlock {
    fn forward(&self, x: &Tensor) -> Result<Tensor> {
        Self::pool(&self.features(x)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device};
    use candle_nn::VarMap;

    #[test]
    fn test_conv_block_shapes() -> Result<()> {
        let device = Device::Cpu;
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);

        let block = ConvBlock::new(1, 4, vb)?;

        let x = Tensor::randn(0f32, 1.0, (2, 1, 8, 6), &device)?;
        assert_eq!(block.features(&x)?.dims(), &[2, 4, 8, 6]);
        assert_eq!(block.forward(&x)?.dims(), &[2, 4, 4, 3]);

        Ok(())
    }

    #[test]
    fn test_pool_floors_odd_sizes() -> Result<()> {
        let device = Device::Cpu;
        let x = Tensor::ones((1, 2, 5, 3), DType::F32, &device)?;
        assert_eq!(ConvBlock::pool(&x)?.dims(), &[1, 2, 2, 1]);
        Ok(())
    }

    #[test]
    fn test_features_are_non_negative() -> Result<()> {
        let device = Device::Cpu;
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);

        let block = ConvBlock::new(1, 3, vb)?;
        let x = Tensor::randn(0f32, 1.0, (1, 1, 4, 4), &device)?;
        let min = block.features(&x)?.flatten_all()?.min(0)?.to_scalar::<f32>()?;
        assert!(min >= 0.0);

        Ok(())
    }
}
