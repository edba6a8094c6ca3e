//! Error Handling Module
//!
//! Defines the error type for the profiling driver.
//! Uses thiserror for ergonomic error definitions.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for profiling operations
#[derive(Error, Debug)]
pub enum ProfileError {
    /// Error loading or decoding an image
    #[error("Failed to load image at '{0}': {1}")]
    ImageLoadError(PathBuf, String),

    /// The image directory holds no file with an accepted extension
    #[error("No images with extensions {extensions:?} found in '{dir}'")]
    NoImages { dir: PathBuf, extensions: Vec<String> },

    /// Error loading the pretrained model
    #[error("Model error: {0}")]
    Model(String),

    /// Error running the forward pass
    #[error("Inference error: {0}")]
    Inference(String),

    /// Device/hardware error
    #[error("Device error: {0}")]
    Device(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Path not found
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),
}

/// Convenience Result type for profiling operations
pub type Result<T> = std::result::Result<T, ProfileError>;
