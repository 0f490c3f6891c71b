//! Backend selection
//!
//! NdArray (CPU) is the default; the `cuda` feature switches the whole
//! pipeline to the CUDA backend.

use burn::backend::Autodiff;
use burn::tensor::backend::Backend;

#[cfg(feature = "cuda")]
pub type DefaultBackend = burn_cuda::Cuda;

#[cfg(all(not(feature = "cuda"), feature = "ndarray"))]
pub type DefaultBackend = burn_ndarray::NdArray;

#[cfg(all(not(feature = "cuda"), not(feature = "ndarray")))]
compile_error!("Enable either the `ndarray` (or `cpu`) or the `cuda` feature");

/// Backend used for fitting; gradients are tracked
pub type TrainingBackend = Autodiff<DefaultBackend>;

/// Device type of the selected backend
pub type DefaultDevice = <DefaultBackend as Backend>::Device;

pub fn default_device() -> DefaultDevice {
    DefaultDevice::default()
}

/// Human-readable backend name for the run banner
pub fn backend_name() -> &'static str {
    #[cfg(feature = "cuda")]
    {
        "CUDA (GPU)"
    }

    #[cfg(all(not(feature = "cuda"), feature = "ndarray"))]
    {
        "NdArray (CPU)"
    }
}

#[cfg(all(test, feature = "ndarray", not(feature = "cuda")))]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_backend_is_default() {
        assert_eq!(backend_name(), "NdArray (CPU)");
        let _device = default_device();
    }
}
