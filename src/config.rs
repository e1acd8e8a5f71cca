/// Configuration for the drag predictor network
///
/// Describes the fixed convolutional topology: one block per entry in
/// `block_channels`, each block being two same-padded 3x3 convolutions with
/// ReLU followed by a 2x2 max pool, then a dense head.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ModelConfig {
    /// Channels of the input geometry mask
    pub in_channels: usize,

    /// Output channels of each convolutional block
    pub block_channels: Vec<usize>,

    /// Width of the hidden dense layer
    pub dense_units: usize,

    /// Dropout probability after the hidden dense layer (training only)
    pub dropout: f32,

    /// Flatten the last block's pooled output instead of its convolution output.
    ///
    /// When false the head reads the last block's activations before pooling,
    /// so inputs down to `2^(blocks-1)` pixels per side stay valid.
    pub flatten_pooled: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            in_channels: 1,
            block_channels: vec![4, 8, 16, 64],
            dense_units: 512,
            dropout: 0.5,
            flatten_pooled: false,
        }
    }
}

impl ModelConfig {
    /// Validate configuration
    pub fn validate(&self) -> crate::Result<()> {
        if self.in_channels == 0 {
            return Err(crate::DragError::Config(
                "in_channels must be > 0".to_string(),
            ));
        }

        if self.block_channels.is_empty() {
            return Err(crate::DragError::Config(
                "block_channels must name at least one block".to_string(),
            ));
        }

        if self.block_channels.iter().any(|&c| c == 0) {
            return Err(crate::DragError::Config(format!(
                "block_channels must all be > 0, got {:?}",
                self.block_channels
            )));
        }

        if self.dense_units == 0 {
            return Err(crate::DragError::Config(
                "dense_units must be > 0".to_string(),
            ));
        }

        if !(0.0..1.0).contains(&self.dropout) {
            return Err(crate::DragError::Config(format!(
                "Invalid dropout: {}. Must be in [0, 1)",
                self.dropout
            )));
        }

        Ok(())
    }

    /// Number of convolutional blocks
    pub fn num_blocks(&self) -> usize {
        self.block_channels.len()
    }

    /// Spatial size reaching the flatten layer for an `height x width` input
    pub fn head_spatial(&self, height: usize, width: usize) -> (usize, usize) {
        let pools = if self.flatten_pooled {
            self.num_blocks()
        } else {
            self.num_blocks().saturating_sub(1)
        };
        // max pooling floors odd sizes
        (height >> pools, width >> pools)
    }

    /// Input width of the hidden dense layer for an `height x width` input
    pub fn flattened_features(&self, height: usize, width: usize) -> usize {
        let (h, w) = self.head_spatial(height, width);
        let channels = self.block_channels.last().copied().unwrap_or(0);
        h * w * channels
    }
}
