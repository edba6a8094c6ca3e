//! Dataset module for the profiling image batch
//!
//! This module provides:
//! - Enumeration of image files in a directory (suffix filter, sorted by name)
//! - Preprocessing of those files into one `[S, 3, H, W]` batch at model resolution
//!
//! ## Resolution
//!
//! VGGT consumes images whose sides are multiples of its 14 px patch size.
//! In `Crop` mode the width is scaled to 518 px and the height follows the
//! aspect ratio, centre-cropped when it would exceed 518 px. In `Pad` mode the
//! longer side is scaled to 518 px and the image is padded with white to a
//! square.

pub mod loader;
pub mod preprocess;

// Re-export main types for convenience
pub use loader::collect_image_paths;
pub use preprocess::{load_and_preprocess_images, ImageBatch, PreprocessMode};

/// Model input resolution in pixels
pub const TARGET_SIZE: u32 = 518;

/// Vision transformer patch size in pixels
pub const PATCH_SIZE: u32 = 14;

/// Fill value for padded pixels (white in `[0, 1]` space)
pub const PAD_VALUE: f32 = 1.0;
