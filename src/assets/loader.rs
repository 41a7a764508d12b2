use std::path::Path;
use std::time::Duration;

use image::RgbaImage;
use tokio::task;
use tracing::debug;

use crate::error::AssetError;

/// Fetches and decodes decorative images
///
/// References are either `http(s)://` URLs or filesystem paths.
pub struct AssetLoader {
    client: reqwest::Client,
}

impl AssetLoader {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client }
    }

    pub fn is_remote(reference: &str) -> bool {
        reference.starts_with("http://") || reference.starts_with("https://")
    }

    /// Fetch the raw bytes behind `reference`
    pub async fn fetch(&self, reference: &str) -> Result<Vec<u8>, AssetError> {
        let failed = |reason: String| AssetError::LoadFailed { key: reference.to_string(), reason };

        if Self::is_remote(reference) {
            let response = self
                .client
                .get(reference)
                .send()
                .await
                .map_err(|e| failed(e.to_string()))?
                .error_for_status()
                .map_err(|e| failed(e.to_string()))?;
            let bytes = response.bytes().await.map_err(|e| failed(e.to_string()))?;
            Ok(bytes.to_vec())
        } else {
            tokio::fs::read(Path::new(reference))
                .await
                .map_err(|e| failed(e.to_string()))
        }
    }

    /// Fetch and decode `reference` into an RGBA buffer
    pub async fn load(&self, reference: &str) -> Result<RgbaImage, AssetError> {
        let bytes = self.fetch(reference).await?;
        debug!("Decoding asset {} ({} bytes)", reference, bytes.len());

        let key = reference.to_string();
        task::spawn_blocking(move || decode(&key, &bytes))
            .await
            .map_err(|e| AssetError::DecodeFailed {
                key: reference.to_string(),
                reason: format!("decoder task failed: {}", e),
            })?
    }
}

impl Default for AssetLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode encoded image bytes into RGBA
pub fn decode(key: &str, bytes: &[u8]) -> Result<RgbaImage, AssetError> {
    image::load_from_memory(bytes)
        .map(|img| img.to_rgba8())
        .map_err(|e| AssetError::DecodeFailed { key: key.to_string(), reason: e.to_string() })
}
