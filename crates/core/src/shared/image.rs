use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use ndarray::ArrayView3;

static NEXT_IMAGE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of an [`Image`].
///
/// Two images with equal pixels are still different images; the result
/// cache is scoped by identity, not by content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageId(u64);

impl ImageId {
    fn next() -> Self {
        Self(NEXT_IMAGE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "image#{}", self.0)
    }
}

/// An 8-bit, tightly packed, row-major pixel buffer.
///
/// Pixel data is immutable once constructed. Blur results are always new
/// `Image`s, so an `Arc<Image>` can be handed to any thread.
pub struct Image {
    id: ImageId,
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
}

impl Image {
    /// Wraps raw pixel bytes. The layout is not validated here; the blur
    /// kernel reports malformed buffers as processing errors.
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8) -> Self {
        Self {
            id: ImageId::next(),
            data,
            width,
            height,
            channels,
        }
    }

    /// Solid-colour image, handy for tests and demos. A layout too large to
    /// address gets an empty buffer, which the kernel rejects.
    pub fn filled(width: u32, height: u32, channels: u8, value: u8) -> Self {
        let layout = PixelLayout {
            width: width as usize,
            height: height as usize,
            channels: channels as usize,
        };
        let len = layout.byte_len().unwrap_or(0);
        Self::new(vec![value; len], width, height, channels)
    }

    pub fn id(&self) -> ImageId {
        self.id
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn layout(&self) -> PixelLayout {
        PixelLayout {
            width: self.width as usize,
            height: self.height as usize,
            channels: self.channels as usize,
        }
    }

    /// Returns `None` when the buffer length does not match the dimensions.
    pub fn as_ndarray(&self) -> Option<ArrayView3<'_, u8>> {
        ArrayView3::from_shape(
            (
                self.height as usize,
                self.width as usize,
                self.channels as usize,
            ),
            &self.data,
        )
        .ok()
    }
}

/// Cloning copies the pixels but mints a fresh identity.
impl Clone for Image {
    fn clone(&self) -> Self {
        Self::new(self.data.clone(), self.width, self.height, self.channels)
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Image")
            .field("id", &self.id)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("channels", &self.channels)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// Dimensions of a pixel buffer as seen by the convolution primitive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelLayout {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
}

impl PixelLayout {
    /// `None` when the layout does not fit in the address space.
    pub fn byte_len(&self) -> Option<usize> {
        self.width
            .checked_mul(self.height)?
            .checked_mul(self.channels)
    }
}
