//! Profiling configuration
//!
//! Every constant of the profiling run lives here with its default: the model
//! identifier, the image directory and accepted extensions, the number of
//! warm-up passes, the annotation region, device and precision. A JSON file
//! may override any subset of fields.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::backend::BackendConfig;
use crate::dataset::{PreprocessMode, TARGET_SIZE};
use crate::profiling::{Region, RegionColor};
use crate::utils::error::{ProfileError, Result};
use crate::DEFAULT_MODEL_ID;

/// Default image directory, relative to the working directory
pub const DEFAULT_IMAGE_DIR: &str = "examples/chair";

/// Default directory holding exported TorchScript models
pub const DEFAULT_MODEL_DIR: &str = "models";

/// Default number of warm-up passes before the profiled pass
pub const DEFAULT_WARMUP_ITERATIONS: usize = 3;

/// Default name of the annotated region, as shown in the trace timeline
pub const DEFAULT_REGION_NAME: &str = "VGGT_Aggregator";

/// Filename suffixes accepted by default (matched case-sensitively)
pub const DEFAULT_IMAGE_EXTENSIONS: [&str; 3] = [".png", ".JPG", ".jpeg"];

/// Configuration for one profiling run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProfileConfig {
    /// Pretrained model identifier
    pub model_id: String,

    /// Directory the model provider resolves `model_id` against
    pub model_dir: PathBuf,

    /// Directory holding the input images
    pub image_dir: PathBuf,

    /// Accepted filename suffixes, matched case-sensitively
    pub image_extensions: Vec<String>,

    /// How images are brought to the model resolution
    pub preprocess_mode: PreprocessMode,

    /// Target side length in pixels (a multiple of the 14 px patch size)
    pub target_size: u32,

    /// Number of warm-up passes, results discarded
    pub warmup_iterations: usize,

    /// Device and precision
    pub backend: BackendConfig,

    /// Annotation region wrapped around every forward pass
    pub region: Region,

    /// Where to write the JSON report (none by default)
    pub report_path: Option<PathBuf>,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            model_id: DEFAULT_MODEL_ID.to_string(),
            model_dir: PathBuf::from(DEFAULT_MODEL_DIR),
            image_dir: PathBuf::from(DEFAULT_IMAGE_DIR),
            image_extensions: DEFAULT_IMAGE_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
            preprocess_mode: PreprocessMode::default(),
            target_size: TARGET_SIZE,
            warmup_iterations: DEFAULT_WARMUP_ITERATIONS,
            backend: BackendConfig::default(),
            region: Region::new(DEFAULT_REGION_NAME, RegionColor::Blue),
            report_path: None,
        }
    }
}

impl ProfileConfig {
    /// Load a configuration from a JSON file; missing fields keep their defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ProfileError::PathNotFound(path.to_path_buf()));
        }

        info!("Loading profile configuration from {:?}", path);
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.model_id.trim().is_empty() {
            return Err(ProfileError::Config("model_id must not be empty".to_string()));
        }

        if self.image_extensions.is_empty() {
            return Err(ProfileError::Config(
                "image_extensions must list at least one suffix".to_string(),
            ));
        }

        if self.image_extensions.iter().any(|e| e.is_empty()) {
            return Err(ProfileError::Config(
                "image_extensions must not contain an empty suffix".to_string(),
            ));
        }

        if self.target_size == 0 || self.target_size % 14 != 0 {
            return Err(ProfileError::Config(format!(
                "target_size must be a positive multiple of 14, got {}",
                self.target_size
            )));
        }

        if self.region.name.trim().is_empty() {
            return Err(ProfileError::Config(
                "region name must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Device, Precision};
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_profiling_script() {
        let config = ProfileConfig::default();
        assert_eq!(config.model_id, "facebook/VGGT-1B");
        assert_eq!(config.image_dir, PathBuf::from("examples/chair"));
        assert_eq!(config.image_extensions, vec![".png", ".JPG", ".jpeg"]);
        assert_eq!(config.warmup_iterations, 3);
        assert_eq!(config.target_size, 518);
        assert_eq!(config.backend.device, Device::Cuda(0));
        assert_eq!(config.backend.precision, Precision::BFloat16);
        assert_eq!(config.region.name, "VGGT_Aggregator");
        assert_eq!(config.region.color, RegionColor::Blue);
        assert!(config.report_path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_target_size() {
        let config = ProfileConfig {
            target_size: 500,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ProfileError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_empty_extensions() {
        let config = ProfileConfig {
            image_extensions: Vec::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("profile.json");
        std::fs::write(
            &path,
            r#"{ "image_dir": "data/kitchen", "warmup_iterations": 5,
                 "backend": { "precision": "float16" } }"#,
        )
        .unwrap();

        let config = ProfileConfig::from_file(&path).unwrap();
        assert_eq!(config.image_dir, PathBuf::from("data/kitchen"));
        assert_eq!(config.warmup_iterations, 5);
        assert_eq!(config.backend.precision, Precision::Float16);
        assert_eq!(config.backend.device, Device::Cuda(0));
        assert_eq!(config.model_id, "facebook/VGGT-1B");
    }

    #[test]
    fn test_missing_file() {
        let err = ProfileConfig::from_file("does/not/exist.json").unwrap_err();
        assert!(matches!(err, ProfileError::PathNotFound(_)));
    }
}
