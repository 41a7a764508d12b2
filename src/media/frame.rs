use image::{ImageBuffer, Rgb, RgbImage};

/// Represents a single raw video frame
///
/// A thin wrapper around an RGB buffer at the source's native resolution.
/// Frames are stored unmirrored; the compositor flips them for self-view.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoFrame {
    buffer: RgbImage,
}

impl VideoFrame {
    /// Create a new frame from an RGB image buffer
    pub fn new(buffer: RgbImage) -> Self {
        Self { buffer }
    }

    /// Create a new frame with the given dimensions filled with the specified color
    pub fn new_filled(width: u32, height: u32, color: [u8; 3]) -> Self {
        let buffer = ImageBuffer::from_fn(width, height, |_, _| Rgb(color));
        Self { buffer }
    }

    /// Create a frame from raw RGB bytes
    pub fn from_rgb_bytes(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        ImageBuffer::from_raw(width, height, data).map(|buffer| Self { buffer })
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.buffer.dimensions()
    }

    /// Get a pixel at the given coordinates (returns RGB array)
    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 3] {
        self.buffer.get_pixel(x, y).0
    }

    /// Get the underlying image buffer
    pub fn as_image(&self) -> &RgbImage {
        &self.buffer
    }
}
