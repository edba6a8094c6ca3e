//! libtorch runtime
//!
//! Runs a TorchScript export of the pretrained model through `tch`. Models
//! are looked up as `<model_dir>/<model_id>.pt`, so `facebook/VGGT-1B`
//! resolves to `models/facebook/VGGT-1B.pt` with the default directory.
//!
//! tch only exposes CUDA autocast with its default half dtype. Float16 runs
//! f32 weights under autocast; BFloat16 casts the weights and the input batch
//! to bf16 and runs without autocast.

use std::path::{Path, PathBuf};

use tch::{CModule, IValue, Kind, NoGradGuard, Tensor};
use tracing::{debug, info};

use super::{InferenceModel, ModelProvider, Runtime};
use crate::backend::{resolve_device, BackendConfig, Device, Precision};
use crate::dataset::ImageBatch;
use crate::utils::error::{ProfileError, Result};

fn to_tch_device(device: Device) -> tch::Device {
    match device {
        Device::Cpu => tch::Device::Cpu,
        Device::Cuda(id) => tch::Device::Cuda(id),
    }
}

/// Number of CUDA devices libtorch can see
pub fn cuda_device_count() -> usize {
    if tch::Cuda::is_available() {
        tch::Cuda::device_count().max(0) as usize
    } else {
        0
    }
}

/// libtorch runtime on one device
#[derive(Debug)]
pub struct TorchRuntime {
    device: Device,
    precision: Precision,
}

impl TorchRuntime {
    /// Resolve the configured device against the visible CUDA devices
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let device = resolve_device(config.device, cuda_device_count(), config.allow_cpu_fallback)?;
        let precision = config.precision.effective_for(device);
        info!("libtorch runtime on {} ({})", device, precision);

        Ok(Self { device, precision })
    }

    pub fn tch_device(&self) -> tch::Device {
        to_tch_device(self.device)
    }

    /// Element kind of the weights and the input batch
    fn weight_kind(&self) -> Kind {
        match self.precision {
            Precision::BFloat16 => Kind::BFloat16,
            Precision::Float32 | Precision::Float16 => Kind::Float,
        }
    }
}

impl Runtime for TorchRuntime {
    type Tensor = Tensor;
    type NoGradGuard = NoGradGuard;

    fn device(&self) -> Device {
        self.device
    }

    fn precision(&self) -> Precision {
        self.precision
    }

    fn upload(&self, batch: &ImageBatch) -> Result<Tensor> {
        let [images, channels, height, width] = batch.shape();
        let tensor = Tensor::f_from_slice(batch.data())
            .and_then(|t| {
                t.f_view([images as i64, channels as i64, height as i64, width as i64])
            })
            .map_err(|e| ProfileError::Device(format!("Failed to build image tensor: {}", e)))?;

        debug!("Uploading image batch {:?} to {}", batch.shape(), self.device);
        Ok(tensor
            .to_device(self.tch_device())
            .to_kind(self.weight_kind()))
    }

    fn no_grad(&self) -> NoGradGuard {
        tch::no_grad_guard()
    }

    fn autocast<T, F: FnOnce() -> T>(&self, precision: Precision, f: F) -> T {
        match precision {
            Precision::Float16 if self.device.is_cuda() => tch::autocast(true, f),
            _ => f(),
        }
    }

    fn synchronize(&self) -> Result<()> {
        if let Device::Cuda(id) = self.device {
            tch::Cuda::synchronize(id as i64);
        }
        Ok(())
    }
}

/// A loaded TorchScript module
pub struct TorchScriptModel {
    module: CModule,
}

impl InferenceModel<Tensor> for TorchScriptModel {
    type Output = IValue;

    fn forward(&self, images: &Tensor) -> Result<IValue> {
        self.module
            .forward_is(&[IValue::Tensor(images.shallow_clone())])
            .map_err(|e| ProfileError::Inference(e.to_string()))
    }
}

/// Loads TorchScript exports from a local model directory
#[derive(Debug, Clone)]
pub struct TorchScriptProvider {
    model_dir: PathBuf,
}

impl TorchScriptProvider {
    pub fn new<P: AsRef<Path>>(model_dir: P) -> Self {
        Self {
            model_dir: model_dir.as_ref().to_path_buf(),
        }
    }

    /// File the export of `model_id` is expected at
    pub fn model_path(&self, model_id: &str) -> PathBuf {
        self.model_dir.join(format!("{}.pt", model_id))
    }
}

impl ModelProvider<TorchRuntime> for TorchScriptProvider {
    type Model = TorchScriptModel;

    fn load(&self, model_id: &str, runtime: &TorchRuntime) -> Result<TorchScriptModel> {
        let path = self.model_path(model_id);
        if !path.is_file() {
            return Err(ProfileError::Model(format!(
                "no TorchScript export of '{}' at {:?}",
                model_id, path
            )));
        }

        info!("Loading {} from {:?}", model_id, path);
        let mut module = CModule::load_on_device(&path, runtime.tch_device())
            .map_err(|e| ProfileError::Model(format!("Failed to load {:?}: {}", path, e)))?;
        module.set_eval();

        if runtime.weight_kind() != Kind::Float {
            module.to(runtime.tch_device(), runtime.weight_kind(), false);
        }

        Ok(TorchScriptModel { module })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_path_layout() {
        let provider = TorchScriptProvider::new("models");
        assert_eq!(
            provider.model_path("facebook/VGGT-1B"),
            PathBuf::from("models/facebook/VGGT-1B.pt")
        );
    }

    #[test]
    fn test_missing_export_is_model_error() {
        let runtime = TorchRuntime::new(&BackendConfig {
            device: Device::Cpu,
            ..Default::default()
        })
        .unwrap();
        let provider = TorchScriptProvider::new("no/such/models");

        let err = provider.load("facebook/VGGT-1B", &runtime).err().unwrap();
        assert!(matches!(err, ProfileError::Model(_)));
    }

    #[test]
    fn test_cpu_runtime_uploads_batch() {
        let runtime = TorchRuntime::new(&BackendConfig {
            device: Device::Cpu,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(runtime.precision(), Precision::Float32);

        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("a.png");
        image::RgbImage::from_pixel(64, 48, image::Rgb([10, 20, 30]))
            .save(&path)
            .unwrap();
        let batch = crate::dataset::load_and_preprocess_images(
            &[path],
            crate::dataset::PreprocessMode::Crop,
            518,
        )
        .unwrap();

        let tensor = runtime.upload(&batch).unwrap();
        assert_eq!(tensor.size(), vec![1, 3, 392, 518]);
        assert!(runtime.synchronize().is_ok());
    }
}
