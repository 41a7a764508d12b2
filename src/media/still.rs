use std::path::PathBuf;

use image::RgbImage;
use tracing::debug;

use crate::error::{AcquisitionError, CaptureError};
use crate::media::{CaptureProfile, MediaSource, VideoFrame};

/// Camera-less media source
///
/// Streams either a still image at its native size or a synthetic test
/// pattern at the requested profile size. The pattern's hue advances on every
/// grab so consecutive shots are distinguishable.
pub struct StillSource {
    image: Option<PathBuf>,
    stream: Option<RgbImage>,
    grabs: u32,
}

impl StillSource {
    /// Stream a still image file
    pub fn from_image<P: Into<PathBuf>>(path: P) -> Self {
        Self { image: Some(path.into()), stream: None, grabs: 0 }
    }

    /// Stream a generated color pattern
    pub fn test_pattern() -> Self {
        Self { image: None, stream: None, grabs: 0 }
    }

    fn pattern(width: u32, height: u32, hue: f32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            let shade = 0.55 + 0.4 * (x as f32 / width.max(1) as f32);
            let band = if (y / 16) % 2 == 0 { 0.9 } else { 0.75 };
            image::Rgb(hsv_to_rgb(hue, 0.6, shade * band))
        })
    }
}

impl MediaSource for StillSource {
    fn name(&self) -> &str {
        if self.image.is_some() {
            "still image"
        } else {
            "test pattern"
        }
    }

    fn acquire(&mut self, profile: &CaptureProfile) -> Result<(), AcquisitionError> {
        let frame = match &self.image {
            Some(path) => image::open(path)
                .map_err(|e| AcquisitionError::NoDevice {
                    reason: format!("{}: {}", path.display(), e),
                })?
                .to_rgb8(),
            None => Self::pattern(profile.width, profile.height, 0.0),
        };
        debug!("{} acquired at {}x{}", self.name(), frame.width(), frame.height());
        self.stream = Some(frame);
        Ok(())
    }

    fn release(&mut self) {
        self.stream = None;
    }

    fn is_active(&self) -> bool {
        self.stream.is_some()
    }

    fn resolution(&self) -> Option<(u32, u32)> {
        self.stream.as_ref().map(|s| s.dimensions())
    }

    fn grab(&mut self) -> Result<VideoFrame, CaptureError> {
        let stream = self.stream.as_ref().ok_or(CaptureError::NoStream)?;
        self.grabs += 1;

        if self.image.is_some() {
            return Ok(VideoFrame::new(stream.clone()));
        }
        let hue = (self.grabs as f32 * 47.0) % 360.0;
        Ok(VideoFrame::new(Self::pattern(stream.width(), stream.height(), hue)))
    }
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> [u8; 3] {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    [
        ((r + m) * 255.0) as u8,
        ((g + m) * 255.0) as u8,
        ((b + m) * 255.0) as u8,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_pattern_uses_profile_size() {
        let mut source = StillSource::test_pattern();
        assert!(matches!(source.grab(), Err(CaptureError::NoStream)));

        source.acquire(&CaptureProfile::new(64, 48, 30)).unwrap();
        let first = source.grab().unwrap();
        let second = source.grab().unwrap();
        assert_eq!(first.dimensions(), (64, 48));
        assert_ne!(first, second);

        source.release();
        assert!(!source.is_active());
    }

    #[test]
    fn test_image_keeps_native_size() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("me.png");
        RgbImage::from_pixel(30, 20, image::Rgb([10, 20, 30])).save(&path).unwrap();

        let mut source = StillSource::from_image(&path);
        source.acquire(&CaptureProfile::new(1280, 720, 30)).unwrap();
        assert_eq!(source.resolution(), Some((30, 20)));
        assert_eq!(source.grab().unwrap().get_pixel(0, 0), [10, 20, 30]);
    }

    #[test]
    fn test_missing_image_is_no_device() {
        let mut source = StillSource::from_image("/nope/me.png");
        let result = source.acquire(&CaptureProfile::new(640, 480, 30));
        assert!(matches!(result, Err(AcquisitionError::NoDevice { .. })));
    }
}
