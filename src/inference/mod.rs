//! Inference module: the profiling driver and its timing report
//!
//! This module provides:
//! - The warm-up / measured-run driver around one forward routine
//! - Wall-clock timings of the warm-up passes and of the measured window
//!
//! ## Measured Window
//!
//! The measured pass is bracketed by two full device synchronization
//! barriers. Wall time is taken from the first barrier returning to the
//! second barrier returning, so it covers all device work of that pass and
//! nothing queued before it.

pub mod driver;
pub mod report;

// Re-export main types for convenience
pub use driver::{run_profile, InferenceSession, ProfileOutcome};
pub use report::{DeviceInfo, WarmupStats, ProfileReport, Timer};

/// Banner printed before the warm-up passes
pub const WARMUP_MESSAGE: &str = "Warming up...";

/// Banner printed before the measured pass
pub const PROFILED_RUN_MESSAGE: &str = "Starting profiled run...";
