//! Image preprocessing into a model-ready batch
//!
//! Each image is decoded, composited onto white if it carries an alpha
//! channel, resized with bicubic filtering so that its sides are multiples of
//! the patch size, scaled to `[0, 1]` and laid out channel-first. The images
//! are stacked in input order into one contiguous `[S, 3, H, W]` buffer.

use std::path::{Path, PathBuf};

use image::{imageops::FilterType, ColorType, DynamicImage, ImageReader, RgbImage};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{PAD_VALUE, PATCH_SIZE};
use crate::utils::error::{ProfileError, Result};

/// How an image is brought to the target resolution
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PreprocessMode {
    /// Width becomes the target size, height follows the aspect ratio and is
    /// centre-cropped if it exceeds the target size
    #[default]
    Crop,
    /// Longer side becomes the target size, the result is padded to a square
    Pad,
}

/// A batch of preprocessed images, `[S, 3, H, W]` in row-major order
#[derive(Debug, Clone)]
pub struct ImageBatch {
    paths: Vec<PathBuf>,
    data: Vec<f32>,
    shape: [usize; 4],
}

impl ImageBatch {
    /// Number of images in the batch
    pub fn len(&self) -> usize {
        self.shape[0]
    }

    /// Whether the batch holds no image
    pub fn is_empty(&self) -> bool {
        self.shape[0] == 0
    }

    /// Batch shape as `[images, channels, height, width]`
    pub fn shape(&self) -> [usize; 4] {
        self.shape
    }

    /// Image height in pixels
    pub fn height(&self) -> usize {
        self.shape[2]
    }

    /// Image width in pixels
    pub fn width(&self) -> usize {
        self.shape[3]
    }

    /// Flat pixel buffer
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Source paths, in batch order
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Pixels of the `index`-th image in CHW layout
    pub fn image(&self, index: usize) -> &[f32] {
        let stride = self.shape[1] * self.shape[2] * self.shape[3];
        &self.data[index * stride..(index + 1) * stride]
    }
}

/// One image in CHW layout
struct ChwImage {
    data: Vec<f32>,
    height: usize,
    width: usize,
}

impl ChwImage {
    fn from_rgb(rgb: &RgbImage) -> Self {
        let (width, height) = rgb.dimensions();
        let num_pixels = (width * height) as usize;
        let mut data = vec![0.0f32; 3 * num_pixels];

        for (i, pixel) in rgb.pixels().enumerate() {
            data[i] = pixel[0] as f32 / 255.0;
            data[num_pixels + i] = pixel[1] as f32 / 255.0;
            data[2 * num_pixels + i] = pixel[2] as f32 / 255.0;
        }

        Self {
            data,
            height: height as usize,
            width: width as usize,
        }
    }

    /// Keep `rows` rows starting at `top`
    fn crop_rows(self, top: usize, rows: usize) -> Self {
        let plane = self.height * self.width;
        let mut data = Vec::with_capacity(3 * rows * self.width);
        for c in 0..3 {
            let start = c * plane + top * self.width;
            data.extend_from_slice(&self.data[start..start + rows * self.width]);
        }

        Self {
            data,
            height: rows,
            width: self.width,
        }
    }

    /// Centre the image on a `height x width` canvas filled with `PAD_VALUE`
    fn pad_to(self, height: usize, width: usize) -> Self {
        if self.height == height && self.width == width {
            return self;
        }

        let top = (height - self.height) / 2;
        let left = (width - self.width) / 2;
        let mut data = vec![PAD_VALUE; 3 * height * width];

        for c in 0..3 {
            for y in 0..self.height {
                let src = c * self.height * self.width + y * self.width;
                let dst = c * height * width + (top + y) * width + left;
                data[dst..dst + self.width].copy_from_slice(&self.data[src..src + self.width]);
            }
        }

        Self {
            data,
            height,
            width,
        }
    }
}

/// Scale `length` and round to the nearest multiple of the patch size
///
/// Ties round to even, so 2.5 patches become 2.
fn round_to_patch(length: u32, scale: f64) -> u32 {
    let patches = (length as f64 * scale / PATCH_SIZE as f64).round_ties_even();
    patches as u32 * PATCH_SIZE
}

/// Size `(width, height)` an image is resized to before any crop or pad
pub fn resized_dims(width: u32, height: u32, mode: PreprocessMode, target: u32) -> Result<(u32, u32)> {
    if width == 0 || height == 0 {
        return Err(ProfileError::InvalidInput(format!(
            "image has an empty dimension: {}x{}",
            width, height
        )));
    }

    let dims = match mode {
        PreprocessMode::Crop => (target, round_to_patch(height, target as f64 / width as f64)),
        PreprocessMode::Pad if width >= height => {
            (target, round_to_patch(height, target as f64 / width as f64))
        }
        PreprocessMode::Pad => (round_to_patch(width, target as f64 / height as f64), target),
    };

    if dims.0 == 0 || dims.1 == 0 {
        return Err(ProfileError::InvalidInput(format!(
            "a {}x{} image is too elongated for a {} px target",
            width, height, target
        )));
    }

    Ok(dims)
}

/// Decode an image as RGB, compositing RGBA images onto white
fn load_rgb(path: &Path) -> Result<RgbImage> {
    let img = ImageReader::open(path)
        .map_err(|e| ProfileError::ImageLoadError(path.to_path_buf(), e.to_string()))?
        .with_guessed_format()
        .map_err(|e| ProfileError::ImageLoadError(path.to_path_buf(), e.to_string()))?
        .decode()
        .map_err(|e| ProfileError::ImageLoadError(path.to_path_buf(), e.to_string()))?;

    if matches!(
        img.color(),
        ColorType::Rgba8 | ColorType::Rgba16 | ColorType::Rgba32F
    ) {
        return Ok(composite_on_white(&img));
    }

    Ok(img.to_rgb8())
}

fn composite_on_white(img: &DynamicImage) -> RgbImage {
    let rgba = img.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let p = rgba.get_pixel(x, y);
        let alpha = p[3] as f32 / 255.0;
        let blend = |c: u8| (c as f32 * alpha + 255.0 * (1.0 - alpha)).round() as u8;
        image::Rgb([blend(p[0]), blend(p[1]), blend(p[2])])
    })
}

fn preprocess_one(path: &Path, mode: PreprocessMode, target: u32) -> Result<ChwImage> {
    let rgb = load_rgb(path)?;
    let (width, height) = rgb.dimensions();
    let (new_width, new_height) = resized_dims(width, height, mode, target)?;

    let resized = image::imageops::resize(&rgb, new_width, new_height, FilterType::CatmullRom);
    let mut chw = ChwImage::from_rgb(&resized);

    let target = target as usize;
    match mode {
        PreprocessMode::Crop if chw.height > target => {
            let top = (chw.height - target) / 2;
            chw = chw.crop_rows(top, target);
        }
        PreprocessMode::Pad => {
            chw = chw.pad_to(target, target);
        }
        PreprocessMode::Crop => {}
    }

    debug!(
        "Preprocessed {:?}: {}x{} -> {}x{}",
        path, width, height, chw.width, chw.height
    );
    Ok(chw)
}

/// Load and preprocess `paths` into one batch, in the given order
///
/// Fails on an empty path list. When the images end up with different sizes
/// every image is padded with white to the largest height and width.
pub fn load_and_preprocess_images(
    paths: &[PathBuf],
    mode: PreprocessMode,
    target: u32,
) -> Result<ImageBatch> {
    if paths.is_empty() {
        return Err(ProfileError::InvalidInput(
            "at least one image is required".to_string(),
        ));
    }

    info!("Preprocessing {} image(s) ({:?} mode, {} px)", paths.len(), mode, target);

    let images = paths
        .iter()
        .map(|path| preprocess_one(path, mode, target))
        .collect::<Result<Vec<_>>>()?;

    let max_height = images.iter().map(|i| i.height).max().unwrap_or(0);
    let max_width = images.iter().map(|i| i.width).max().unwrap_or(0);

    let uniform = images
        .iter()
        .all(|i| i.height == max_height && i.width == max_width);
    if !uniform {
        warn!(
            "Images have different shapes, padding all of them to {}x{}",
            max_width, max_height
        );
    }

    let mut data = Vec::with_capacity(images.len() * 3 * max_height * max_width);
    for image in images {
        data.extend(image.pad_to(max_height, max_width).data);
    }

    Ok(ImageBatch {
        paths: paths.to_vec(),
        data,
        shape: [paths.len(), 3, max_height, max_width],
    })
}
