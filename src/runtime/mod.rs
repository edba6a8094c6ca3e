//! Accelerator runtime and model seams
//!
//! The driver only needs a handful of operations from the tensor runtime:
//! move the image batch to the device, disable gradient tracking for a scope,
//! run a closure under reduced-precision autocast, and wait for all queued
//! device work. The pretrained model is an opaque `InferenceModel` produced
//! by a `ModelProvider`.
//!
//! The libtorch implementation lives in `torch` behind the `libtorch`
//! feature.

#[cfg(feature = "libtorch")]
pub mod torch;

use crate::backend::{Device, Precision};
use crate::dataset::ImageBatch;
use crate::utils::error::Result;

/// Tensor runtime bound to one device
pub trait Runtime {
    /// Device-resident tensor type
    type Tensor;

    /// Keeps gradient tracking disabled until dropped
    type NoGradGuard;

    /// Device all work is issued to
    fn device(&self) -> Device;

    /// Precision the forward pass runs in
    fn precision(&self) -> Precision;

    /// Copy a preprocessed batch to the device
    fn upload(&self, batch: &ImageBatch) -> Result<Self::Tensor>;

    /// Disable gradient tracking for the lifetime of the guard
    fn no_grad(&self) -> Self::NoGradGuard;

    /// Run `f` with automatic mixed precision for `precision`
    fn autocast<T, F: FnOnce() -> T>(&self, precision: Precision, f: F) -> T;

    /// Block until all work queued on the device has completed
    fn synchronize(&self) -> Result<()>;
}

/// A pretrained model ready for inference
pub trait InferenceModel<T> {
    /// Whatever the model returns, opaque to the driver
    type Output;

    fn forward(&self, images: &T) -> Result<Self::Output>;
}

/// Instantiates pretrained models by identifier
pub trait ModelProvider<R: Runtime> {
    type Model: InferenceModel<R::Tensor>;

    /// Load `model_id` onto the runtime's device, in evaluation mode and at
    /// the runtime's precision
    fn load(&self, model_id: &str, runtime: &R) -> Result<Self::Model>;
}
