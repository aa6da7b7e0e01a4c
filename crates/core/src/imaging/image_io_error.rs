use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImageIoError {
    #[error("unsupported image file extension: {0}")]
    UnsupportedExtension(PathBuf),
    #[error("cannot encode images with {0} channels")]
    UnsupportedChannels(u8),
    #[error("pixel buffer does not match {width}x{height}x{channels}")]
    MalformedImage { width: u32, height: u32, channels: u8 },
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Codec(#[from] image::ImageError),
}
