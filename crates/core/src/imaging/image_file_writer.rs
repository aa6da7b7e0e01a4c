use std::path::Path;

use image::ColorType;

use crate::shared::image::Image;

use super::image_io_error::ImageIoError;

/// Encodes an [`Image`] to a file; the format follows the extension.
pub struct ImageFileWriter;

impl ImageFileWriter {
    pub fn new() -> Self {
        Self
    }

    pub fn write(&self, path: &Path, image: &Image) -> Result<(), ImageIoError> {
        let color = match image.channels() {
            1 => ColorType::L8,
            2 => ColorType::La8,
            3 => ColorType::Rgb8,
            4 => ColorType::Rgba8,
            other => return Err(ImageIoError::UnsupportedChannels(other)),
        };
        if image.as_ndarray().is_none() {
            return Err(ImageIoError::MalformedImage {
                width: image.width(),
                height: image.height(),
                channels: image.channels(),
            });
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        image::save_buffer(path, image.data(), image.width(), image.height(), color)?;
        log::debug!("Wrote {} to {}", image.id(), path.display());
        Ok(())
    }
}

impl Default for ImageFileWriter {
    fn default() -> Self {
        Self::new()
    }
}
