//! Drag predictor - convolutional drag regression in Rust
//!
//! Fits a small convolutional network that maps a rasterized 2D geometry
//! mask to a scalar drag value.
//!
//! # Pipeline
//!
//! - **Dataset**: geometry masks and drag vectors loaded from `.npy` files
//! - **Split**: ordered train prefix / test suffix, stacked into NHWC arrays
//! - **Model**: four conv blocks (4→8→16→64 channels) and a dense head
//! - **Training**: Adam on mean squared error with per-epoch validation
//! - **Report**: aggregate test error plus per-sample true/predicted values
//!
//! # Example
//!
//! ```ignore
//! use drag_predictor::{DragDataset, ModelConfig, pipeline};
//! use drag_predictor::report::TerminalRenderer;
//! use drag_predictor::training::TrainingConfig;
//!
//! let dataset = DragDataset::from_directory("../data")?;
//! let mut renderer = TerminalRenderer::stdio();
//! let summary = pipeline::run(
//!     &dataset,
//!     ModelConfig::default(),
//!     TrainingConfig::default(),
//!     &candle_core::Device::Cpu,
//!     &mut renderer,
//!     &mut std::io::stdout(),
//! )?;
//! ```

pub mod config;
pub mod data;
pub mod layers;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod training;
pub mod utils;

// Re-export commonly used items
pub use config::ModelConfig;
pub use data::{DragDataset, Sample};
pub use models::DragPredictor;

/// Library error types
#[derive(Debug, thiserror::Error)]
pub enum DragError {
    #[error("Candle error: {0}")]
    Candle(#[from] candle_core::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Dataset error: {0}")]
    Data(String),

    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("NumPy read error: {0}")]
    Npy(#[from] ndarray_npy::ReadNpyError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DragError>;
