use std::path::Path;

use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::image::Image;

use super::image_io_error::ImageIoError;

/// True when `path` has one of the known image extensions (case-insensitive).
pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

/// Decodes an image file into an RGBA [`Image`].
pub struct ImageFileReader;

impl ImageFileReader {
    pub fn new() -> Self {
        Self
    }

    pub fn read(&self, path: &Path) -> Result<Image, ImageIoError> {
        if !is_image_path(path) {
            return Err(ImageIoError::UnsupportedExtension(path.to_path_buf()));
        }
        let rgba = image::open(path)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        log::debug!("Read {}x{} image from {}", width, height, path.display());
        Ok(Image::new(rgba.into_raw(), width, height, 4))
    }
}

impl Default for ImageFileReader {
    fn default() -> Self {
        Self::new()
    }
}
