// Live webcam source backed by nokhwa. Only built with the `camera` feature.

use nokhwa::{
    pixel_format::RgbFormat,
    utils::{CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution},
    Camera, NokhwaError,
};
use tracing::debug;

use crate::error::{AcquisitionError, CaptureError};
use crate::media::{CaptureProfile, MediaSource, VideoFrame};

/// Physical camera at a device index
pub struct CameraSource {
    index: u32,
    cam: Option<Camera>,
}

impl CameraSource {
    pub fn new(index: u32) -> Self {
        Self { index, cam: None }
    }
}

fn classify(e: NokhwaError, profile: &CaptureProfile) -> AcquisitionError {
    match e {
        NokhwaError::OpenDeviceError(..) => AcquisitionError::NoDevice { reason: e.to_string() },
        NokhwaError::OpenStreamError(ref msg) if msg.to_lowercase().contains("permission") => {
            AcquisitionError::PermissionDenied { reason: e.to_string() }
        }
        NokhwaError::SetPropertyError { .. } | NokhwaError::GetPropertyError { .. } => {
            AcquisitionError::ProfileRejected { profile: profile.to_string() }
        }
        other => AcquisitionError::StreamFailed { reason: other.to_string() },
    }
}

impl MediaSource for CameraSource {
    fn name(&self) -> &str {
        "camera"
    }

    fn acquire(&mut self, profile: &CaptureProfile) -> Result<(), AcquisitionError> {
        self.release();

        let fmt = CameraFormat::new(
            Resolution::new(profile.width, profile.height),
            FrameFormat::YUYV,
            profile.fps,
        );
        let req = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(fmt));

        let mut cam = Camera::new(CameraIndex::Index(self.index), req).map_err(|e| classify(e, profile))?;
        cam.open_stream().map_err(|e| classify(e, profile))?;

        let actual = cam.resolution();
        debug!("camera {} negotiated {}x{}", self.index, actual.width(), actual.height());
        self.cam = Some(cam);
        Ok(())
    }

    fn release(&mut self) {
        if let Some(mut cam) = self.cam.take() {
            if let Err(e) = cam.stop_stream() {
                debug!("camera stop_stream failed: {}", e);
            }
        }
    }

    fn is_active(&self) -> bool {
        self.cam.as_ref().is_some_and(|c| c.is_stream_open())
    }

    fn resolution(&self) -> Option<(u32, u32)> {
        self.cam.as_ref().map(|c| {
            let r = c.resolution();
            (r.width(), r.height())
        })
    }

    fn grab(&mut self) -> Result<VideoFrame, CaptureError> {
        let cam = self.cam.as_mut().ok_or(CaptureError::NoStream)?;

        let frame = cam
            .frame()
            .map_err(|e| CaptureError::FrameUnavailable { reason: format!("fetch frame: {e}") })?;
        let rgb = frame
            .decode_image::<RgbFormat>()
            .map_err(|e| CaptureError::FrameUnavailable { reason: format!("decode RGB: {e}") })?;

        Ok(VideoFrame::new(rgb))
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        self.release();
    }
}
