//! Backend selection - device and numeric precision
//!
//! The profiling target is a CUDA accelerator running in bfloat16. There is
//! no silent CPU fallback: a missing CUDA device is an error unless the caller
//! opts in with `allow_cpu_fallback`.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::utils::error::{ProfileError, Result};

/// Execution device
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    /// Host CPU
    Cpu,
    /// CUDA device by ordinal
    Cuda(usize),
}

impl Default for Device {
    fn default() -> Self {
        Device::Cuda(0)
    }
}

impl Device {
    /// Whether this is an accelerator device
    pub fn is_cuda(&self) -> bool {
        matches!(self, Device::Cuda(_))
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Cuda(id) => write!(f, "cuda:{}", id),
        }
    }
}

/// Floating point precision used for the forward pass
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    /// Full single precision
    Float32,
    /// bfloat16, supported by Ampere-class accelerators (A40, A100)
    #[default]
    BFloat16,
    /// IEEE half precision
    Float16,
}

impl Precision {
    /// Whether this is a reduced-precision format
    pub fn is_reduced(&self) -> bool {
        !matches!(self, Precision::Float32)
    }

    /// Precision actually usable on `device`
    ///
    /// Reduced precision is only honoured on CUDA; the CPU path runs in f32.
    pub fn effective_for(self, device: Device) -> Precision {
        match device {
            Device::Cuda(_) => self,
            Device::Cpu if self.is_reduced() => {
                warn!("{} is not used on the CPU, running in float32", self);
                Precision::Float32
            }
            Device::Cpu => self,
        }
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precision::Float32 => write!(f, "float32"),
            Precision::BFloat16 => write!(f, "bfloat16"),
            Precision::Float16 => write!(f, "float16"),
        }
    }
}

/// Backend configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BackendConfig {
    /// Requested device
    pub device: Device,
    /// Requested precision
    pub precision: Precision,
    /// Run on the CPU when the requested CUDA device is missing
    pub allow_cpu_fallback: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            device: Device::default(),
            precision: Precision::default(),
            allow_cpu_fallback: false,
        }
    }
}

/// Resolve the requested device against the number of visible CUDA devices
pub fn resolve_device(
    requested: Device,
    cuda_device_count: usize,
    allow_cpu_fallback: bool,
) -> Result<Device> {
    match requested {
        Device::Cpu => {
            info!("Using CPU device");
            Ok(Device::Cpu)
        }
        Device::Cuda(id) if id < cuda_device_count => {
            info!("Using CUDA device {} of {}", id, cuda_device_count);
            Ok(requested)
        }
        Device::Cuda(id) if allow_cpu_fallback => {
            warn!(
                "CUDA device {} requested but {} visible, falling back to CPU",
                id, cuda_device_count
            );
            Ok(Device::Cpu)
        }
        Device::Cuda(id) => Err(ProfileError::Device(format!(
            "CUDA device {} is not available ({} device(s) visible)",
            id, cuda_device_count
        ))),
    }
}
