//! # VGGT Profile
//!
//! A small driver for profiling inference of the pretrained VGGT-1B model.
//! It loads the model and a directory of images, runs a few warm-up passes,
//! then runs one pass inside a named profiling region bounded by two full
//! device synchronization barriers, so an attached tracer (Nsight Systems)
//! captures exactly the steady-state forward pass.
//!
//! ## Modules
//!
//! - `backend`: device and numeric precision selection
//! - `config`: the profiling configuration and its defaults
//! - `dataset`: image enumeration and preprocessing into one batch
//! - `runtime`: the accelerator seam (upload, no-grad, autocast, barrier) and model loading
//! - `profiling`: named annotation regions as scoped guards
//! - `inference`: the warm-up / measured-run driver and its timing report
//! - `utils`: error types and logging setup
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use vggt_profile::runtime::torch::{TorchRuntime, TorchScriptProvider};
//! use vggt_profile::{run_profile, ProfileConfig, TracingProfiler};
//!
//! let config = ProfileConfig::default();
//! let runtime = TorchRuntime::new(&config.backend)?;
//! let provider = TorchScriptProvider::new(&config.model_dir);
//! let outcome = run_profile(&config, &runtime, &provider, &TracingProfiler::new())?;
//! println!("{}", outcome.report.summary());
//! ```

pub mod backend;
pub mod config;
pub mod dataset;
pub mod inference;
pub mod profiling;
pub mod runtime;
pub mod utils;

pub use backend::{resolve_device, BackendConfig, Device, Precision};
pub use config::ProfileConfig;
pub use dataset::{collect_image_paths, load_and_preprocess_images, ImageBatch, PreprocessMode};
pub use inference::driver::{run_profile, InferenceSession, ProfileOutcome};
pub use inference::report::{WarmupStats, ProfileReport, Timer};
pub use profiling::{RangeGuard, Region, RegionColor, RegionProfiler, TracingProfiler};
pub use runtime::{InferenceModel, ModelProvider, Runtime};
pub use utils::error::{ProfileError, Result};

/// Identifier of the pretrained model this driver profiles
pub const DEFAULT_MODEL_ID: &str = "facebook/VGGT-1B";

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
