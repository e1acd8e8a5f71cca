/// Neural network layer primitives
///
/// Building blocks for the drag predictor:
/// - Convolutional downsampling blocks (conv-relu x2, max pool)
/// - Dropout with a caller-owned RNG

pub mod conv_block;
pub mod dropout;

pub use conv_block::ConvBlock;
pub use dropout::SeededDropout;
