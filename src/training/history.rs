/// Per-epoch training metrics

/// Metrics recorded after one epoch
///
/// The loss is mean squared error, so the tracked MSE metric equals it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochMetrics {
    /// 1-based epoch number
    pub epoch: usize,
    /// Sample-weighted mean training loss
    pub loss: f32,
    /// Loss on the validation partition after the epoch
    pub val_loss: f32,
}

impl EpochMetrics {
    pub fn mse(&self) -> f32 {
        self.loss
    }

    pub fn val_mse(&self) -> f32 {
        self.val_loss
    }

    /// Progress line written in verbose mode
    pub fn progress_line(&self, num_epochs: usize) -> String {
        format!(
            "Epoch {}/{} - loss: {:.4} - mse: {:.4} - val_loss: {:.4} - val_mse: {:.4}",
            self.epoch,
            num_epochs,
            self.loss,
            self.mse(),
            self.val_loss,
            self.val_mse()
        )
    }
}

/// Metrics of a full `fit` run, in epoch order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    pub epochs: Vec<EpochMetrics>,
}

impl History {
    pub fn push(&mut self, metrics: EpochMetrics) {
        self.epochs.push(metrics);
    }

    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }

    pub fn last(&self) -> Option<&EpochMetrics> {
        self.epochs.last()
    }

    /// Epoch with the lowest validation loss (NaN epochs never win)
    pub fn best_val(&self) -> Option<&EpochMetrics> {
        self.epochs
            .iter()
            .filter(|m| !m.val_loss.is_nan())
            .min_by(|a, b| a.val_loss.total_cmp(&b.val_loss))
    }
}
