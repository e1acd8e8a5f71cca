/// Utility functions for drag training
use candle_core::{Device, Result, Tensor};

/// Calculate the number of parameters in a tensor
pub fn count_parameters(tensor: &Tensor) -> usize {
    tensor.dims().iter().product()
}

/// CUDA device 0 when available, CPU otherwise
pub fn select_device() -> Result<Device> {
    if candle_core::utils::cuda_is_available() {
        Device::new_cuda(0)
    } else {
        Ok(Device::Cpu)
    }
}

/// Format a single-value drag array the way it is reported, e.g. `[0.25]`
pub fn format_drag(values: &[f32]) -> String {
    let parts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    format!("[{}]", parts.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::DType;

    #[test]
    fn test_count_parameters() -> Result<()> {
        let t = Tensor::zeros((4, 1, 3, 3), DType::F32, &Device::Cpu)?;
        assert_eq!(count_parameters(&t), 36);
        Ok(())
    }

    #[test]
    fn test_format_drag() {
        assert_eq!(format_drag(&[0.25]), "[0.25]");
        assert_eq!(format_drag(&[1.0, -2.5]), "[1 -2.5]");
        assert_eq!(format_drag(&[f32::NAN]), "[NaN]");
    }
}
