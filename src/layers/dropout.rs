/// Dropout driven by a caller-supplied RNG
use candle_core::{Result, Tensor};
use rand::Rng;

/// Inverted dropout: zeroes activations with probability `p` and scales the
/// survivors by `1 / (1 - p)`, so inference needs no rescaling.
#[derive(Debug, Clone, Copy)]
pub struct SeededDropout {
    p: f32,
}

impl SeededDropout {
    pub fn new(p: f32) -> Self {
        Self { p }
    }

    /// Apply during training; the mask is drawn from `rng`
    pub fn forward_train<R: Rng>(&self, x: &Tensor, rng: &mut R) -> Result<Tensor> {
        if self.p <= 0.0 {
            return Ok(x.clone());
        }

        let scale = 1.0 / (1.0 - self.p);
        let mask: Vec<f32> = (0..x.elem_count())
            .map(|_| if rng.gen::<f32>() < self.p { 0.0 } else { scale })
            .collect();
        let mask = Tensor::from_vec(mask, x.dims(), x.device())?.to_dtype(x.dtype())?;

        x.mul(&mask)
    }
}
