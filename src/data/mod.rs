use crate::render::PixelBuffer;
use image::imageops::{self, FilterType};
use log::{info, warn};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("Failed to read or decode image '{path}': {source}")]
    Decode {
        path: String,
        source: image::ImageError,
    },
    #[error("Image '{0}' has no pixels")]
    EmptyImage(String),
    #[error("Target size must be at least 1x1, got {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
}

/// Loads the target image as straight RGBA and resizes it to `width` x `height`.
///
/// # Arguments
/// * `path` - Any format the `image` crate can decode
/// * `width`, `height` - The canvas size the renderer paints at
///
/// # Returns
/// * `Result<PixelBuffer, DataError>` - A buffer of exactly the requested shape
pub fn load_target(path: &Path, width: u32, height: u32) -> Result<PixelBuffer, DataError> {
    if width == 0 || height == 0 {
        return Err(DataError::InvalidSize { width, height });
    }
    let display = path.display().to_string();
    let decoded = image::open(path).map_err(|source| DataError::Decode {
        path: display.clone(),
        source,
    })?;
    let rgba = decoded.to_rgba8();
    if rgba.width() == 0 || rgba.height() == 0 {
        return Err(DataError::EmptyImage(display));
    }
    info!(
        "Loaded target '{}' ({}x{}), canvas {}x{}",
        display,
        rgba.width(),
        rgba.height(),
        width,
        height
    );
    if aspect_differs(rgba.dimensions(), (width, height)) {
        warn!("Target aspect ratio differs from the canvas, the image will be stretched");
    }

    let resized = if rgba.dimensions() == (width, height) {
        rgba
    } else {
        imageops::resize(&rgba, width, height, FilterType::CatmullRom)
    };
    PixelBuffer::from_raw(width, height, resized.into_raw())
        .ok_or(DataError::InvalidSize { width, height })
}

/// Cross-multiplied in `u64`, so large sources and canvases cannot overflow.
fn aspect_differs(source: (u32, u32), canvas: (u32, u32)) -> bool {
    u64::from(source.0) * u64::from(canvas.1) != u64::from(source.1) * u64::from(canvas.0)
}
