//! # Export Pipeline
//!
//! Renders the session's photos into a single strip image, encodes it and
//! hands it to a destination: a saved file, a share directory or a remote
//! relay endpoint.
//!
//! Every artifact is checked against a minimum size before hand-off so that a
//! truncated encode is never delivered.

mod pipeline;
mod strip;
mod transport;

use std::io::Cursor;

use chrono::{DateTime, Utc};
use image::{codecs::jpeg::JpegEncoder, DynamicImage, ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::error::ExportError;

pub use pipeline::{send_with_retry, ExportPipeline, RelayMode};
pub use strip::{StripLayout, StripRenderer};
pub use transport::{build_caption, FileSink, HttpRelay, RelayReceipt, ShareSink};

#[cfg(test)]
pub(crate) use transport::test_server;

/// Encoding of the exported strip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Png,
    Jpeg,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpg",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Jpeg => "image/jpeg",
        }
    }
}

/// Encoded strip ready for hand-off
#[derive(Debug, Clone)]
pub struct Artifact {
    bytes: Vec<u8>,
    format: ExportFormat,
    created_at: DateTime<Utc>,
}

impl Artifact {
    /// Wrap already-encoded bytes
    pub fn from_bytes(bytes: Vec<u8>, format: ExportFormat, created_at: DateTime<Utc>) -> Self {
        Self { bytes, format, created_at }
    }

    /// Encode `image` with `format`
    pub fn encode(image: &RgbaImage, format: ExportFormat, jpeg_quality: u8) -> Result<Self, ExportError> {
        let failed = |e: image::ImageError| ExportError::EncodingFailed { reason: e.to_string() };
        let mut bytes = Vec::new();

        match format {
            ExportFormat::Png => {
                image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).map_err(failed)?;
            }
            ExportFormat::Jpeg => {
                // JPEG has no alpha channel
                let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
                let encoder = JpegEncoder::new_with_quality(&mut bytes, jpeg_quality.clamp(1, 100));
                rgb.write_with_encoder(encoder).map_err(failed)?;
            }
        }

        Ok(Self::from_bytes(bytes, format, Utc::now()))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn format(&self) -> ExportFormat {
        self.format
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Reject artifacts too small to be a complete image
    pub fn verify(&self, minimum: usize) -> Result<(), ExportError> {
        if self.bytes.len() < minimum {
            return Err(ExportError::Incomplete { size: self.bytes.len(), minimum });
        }
        Ok(())
    }
}
