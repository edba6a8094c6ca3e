//! Utilities module for error handling and logging
//!
//! This module provides:
//! - The crate error type and `Result` alias
//! - Structured logging setup with tracing

pub mod error;
pub mod logging;

// Re-export main types for convenience
pub use error::{ProfileError, Result};
pub use logging::{init_logging, LogConfig, LogLevel};
