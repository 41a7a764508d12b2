//! # Media Source
//!
//! Owns the live video stream and hands out raw frames. Sources are acquired
//! with a preferred capture profile and retried once with a reduced profile
//! when the platform rejects it.

mod frame;
mod still;

#[cfg(feature = "camera")]
mod camera;

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{AcquisitionError, CaptureError};

pub use frame::VideoFrame;
pub use still::StillSource;

#[cfg(feature = "camera")]
pub use camera::CameraSource;

/// Requested stream capabilities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureProfile {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl CaptureProfile {
    pub const fn new(width: u32, height: u32, fps: u32) -> Self {
        Self { width, height, fps }
    }
}

impl fmt::Display for CaptureProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}@{}", self.width, self.height, self.fps)
    }
}

/// A live frame producer
///
/// Only the media source mutates stream state; everything else reads frames.
pub trait MediaSource {
    /// Human-readable source name for logs
    fn name(&self) -> &str;

    /// Open the stream with the requested profile
    fn acquire(&mut self, profile: &CaptureProfile) -> Result<(), AcquisitionError>;

    /// Stop the stream and free the device
    fn release(&mut self);

    /// Whether a stream is currently open
    fn is_active(&self) -> bool;

    /// Native frame size of the open stream
    fn resolution(&self) -> Option<(u32, u32)>;

    /// Grab the current frame
    fn grab(&mut self) -> Result<VideoFrame, CaptureError>;
}

/// Acquire `source` with `preferred`, falling back once to `fallback`
///
/// Any rejection of the preferred profile is retried once with the fallback,
/// except a permission denial: it applies to every profile and is returned
/// as-is without a second device request.
pub fn acquire_with_fallback(
    source: &mut dyn MediaSource,
    preferred: &CaptureProfile,
    fallback: &CaptureProfile,
) -> Result<(u32, u32), AcquisitionError> {
    let result = match source.acquire(preferred) {
        Ok(()) => Ok(()),
        Err(e @ AcquisitionError::PermissionDenied { .. }) => Err(e),
        Err(e) => {
            warn!("{}: preferred profile {} rejected ({}), retrying with {}", source.name(), preferred, e, fallback);
            source.acquire(fallback)
        }
    };
    result?;

    let resolution = source.resolution().ok_or_else(|| AcquisitionError::StreamFailed {
        reason: "stream opened without a resolution".to_string(),
    })?;
    info!("📷 {} streaming at {}x{}", source.name(), resolution.0, resolution.1);
    Ok(resolution)
}
