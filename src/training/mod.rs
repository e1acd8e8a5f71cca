/// Training infrastructure for the drag predictor

// Optimizer is candle-nn's AdamW with zero weight decay (plain Adam)
pub mod history;
pub mod trainer;

pub use history::{EpochMetrics, History};
pub use trainer::{Trainer, TrainingConfig};
