/// Seeded weight initialization
///
/// candle's CPU RNG cannot be seeded, so freshly built variables are
/// overwritten here from a `StdRng`: Glorot-uniform kernels and zero biases.
use candle_core::{Result, Tensor};
use candle_nn::VarMap;
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Glorot/Xavier uniform bound for a kernel shape
///
/// Linear kernels are [out, in]; conv kernels are [out, in, kh, kw] and
/// count the receptive field in both fans.
pub fn glorot_limit(dims: &[usize]) -> f64 {
    let receptive: usize = dims.iter().skip(2).product();
    let (fan_out, fan_in) = match dims {
        [out, inp, ..] => (out * receptive, inp * receptive),
        [n] => (*n, *n),
        [] => (1, 1),
    };
    (6.0 / (fan_in + fan_out) as f64).sqrt()
}

/// Re-initialize every variable in `varmap` from `seed`
///
/// Variables are visited in name order so the result does not depend on
/// hash map iteration.
pub fn seeded_init(varmap: &VarMap, seed: u64) -> Result<()> {
    let mut rng = StdRng::seed_from_u64(seed);

    let data = varmap
        .data()
        .lock()
        .map_err(|e| candle_core::Error::Msg(format!("VarMap lock poisoned: {}", e)))?;
    let mut names: Vec<&String> = data.keys().collect();
    names.sort();

    for name in names {
        let var = &data[name];
        let dims = var.dims().to_vec();

        let values = if name.ends_with("bias") {
            Tensor::zeros(dims.as_slice(), var.dtype(), var.device())?
        } else {
            let limit = glorot_limit(&dims);
            let dist = Uniform::new_inclusive(-limit as f32, limit as f32);
            let count: usize = dims.iter().product();
            let samples: Vec<f32> = (0..count).map(|_| dist.sample(&mut rng)).collect();
            Tensor::from_vec(samples, dims.as_slice(), var.device())?.to_dtype(var.dtype())?
        };

        var.set(&values)?;
    }

    Ok(())
}
