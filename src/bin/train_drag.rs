/// Drag predictor training - fit the convnet on ../data and report on the test split
use drag_predictor::report::TerminalRenderer;
use drag_predictor::training::TrainingConfig;
use drag_predictor::utils::select_device;
use drag_predictor::{pipeline, DragDataset, ModelConfig};

fn main() -> anyhow::Result<()> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("=== Drag Predictor - Training ===");

    // Device setup - Try CUDA first, fallback to CPU
    let device = select_device()?;
    log::info!("Using device: {:?}", device);

    let data_path = "../data";
    let dataset = DragDataset::from_directory(data_path)?;

    log::info!("Dataset loaded:");
    log::info!("  - Total samples: {}", dataset.len());
    log::info!("  - Split line: {}", dataset.split_line());
    log::info!("  - Description: {}", dataset.metadata().description);

    let model_config = ModelConfig::default();
    let training_config = TrainingConfig::default();

    log::info!("Model configuration: {:?}", model_config);
    log::info!("Training configuration:");
    log::info!("  - Epochs: {}", training_config.num_epochs);
    log::info!("  - Batch size: {}", training_config.batch_size);
    log::info!("  - Learning rate: {:.6}", training_config.learning_rate);
    log::info!("  - Seed: {}", training_config.seed);

    let mut renderer = TerminalRenderer::stdio();
    let mut stdout = std::io::stdout();

    let summary = pipeline::run(
        &dataset,
        model_config,
        training_config,
        &device,
        &mut renderer,
        &mut stdout,
    )?;

    if let Some(best) = summary.history.best_val() {
        log::info!(
            "Best validation MSE {:.6} at epoch {}",
            best.val_loss,
            best.epoch
        );
    }
    log::info!("=== Training Complete ===");

    Ok(())
}
