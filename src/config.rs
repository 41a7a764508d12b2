use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    error::{ConfigError, Result},
    export::ExportFormat,
    media::CaptureProfile,
};

/// Main configuration for the Love Booth
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Countdown and shot sequencing
    pub capture: CaptureConfig,

    /// Camera acquisition profiles
    pub camera: CameraConfig,

    /// Per-capture compositing settings
    pub compositor: CompositorConfig,

    /// Strip rendering and local delivery
    pub export: ExportConfig,

    /// Remote relay endpoint and policy
    pub relay: RelayConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|_| ConfigError::ParseFailed { path: path.display().to_string() })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string()
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.capture.validate()?;
        self.camera.validate()?;
        self.compositor.validate()?;
        self.export.validate()?;
        self.relay.validate()?;
        Ok(())
    }
}

fn invalid(key: &str, value: impl ToString) -> ConfigError {
    ConfigError::InvalidValue { key: key.to_string(), value: value.to_string() }
}

/// Countdown timing and shot count
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Number of photos in one strip
    pub target_photos: u32,

    /// First countdown value shown before each shot
    pub countdown_start: u32,

    /// Duration of one countdown tick (ms)
    pub tick_ms: u64,

    /// Delay between reaching zero and the shutter (ms)
    pub settle_ms: u64,

    /// Pause after a shot before the next countdown (ms)
    pub pause_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            target_photos: 4,
            countdown_start: 3,
            tick_ms: 1000,
            settle_ms: 800,
            pause_ms: 1500,
        }
    }
}

impl CaptureConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }

    fn validate(&self) -> Result<()> {
        if self.target_photos == 0 {
            return Err(invalid("capture.target_photos", self.target_photos).into());
        }

        if self.tick_ms == 0 {
            return Err(invalid("capture.tick_ms", self.tick_ms).into());
        }

        if self.settle_ms >= self.tick_ms {
            return Err(invalid(
                "capture.settle_ms",
                format!("{} (must be shorter than tick_ms {})", self.settle_ms, self.tick_ms),
            )
            .into());
        }

        Ok(())
    }
}

/// Camera acquisition settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Device index (0 = default camera)
    pub device_index: u32,

    /// Profile requested first
    pub preferred: CaptureProfile,

    /// Reduced profile requested when the preferred one is rejected
    pub fallback: CaptureProfile,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device_index: 0,
            preferred: CaptureProfile::new(1280, 720, 30),
            fallback: CaptureProfile::new(640, 480, 15),
        }
    }
}

impl CameraConfig {
    fn validate(&self) -> Result<()> {
        for (key, profile) in [("camera.preferred", &self.preferred), ("camera.fallback", &self.fallback)] {
            if profile.width == 0 || profile.height == 0 || profile.fps == 0 {
                return Err(invalid(key, profile).into());
            }
        }
        Ok(())
    }
}

/// Compositor settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositorConfig {
    /// Opacity of the tiled frame overlay (0.0-1.0)
    pub frame_opacity: f32,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self { frame_opacity: 0.3 }
    }
}

impl CompositorConfig {
    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.frame_opacity) {
            return Err(invalid("compositor.frame_opacity", self.frame_opacity).into());
        }
        Ok(())
    }
}

/// Strip rendering and local delivery settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Product name used in saved file names
    pub product_name: String,

    /// Directory for saved strips
    pub output_dir: PathBuf,

    /// Output encoding
    pub format: ExportFormat,

    /// JPEG quality (1-100), used when `format = "jpeg"`
    pub jpeg_quality: u8,

    /// Scale factor applied to strip layout units
    pub pixel_ratio: u32,

    /// Artifacts smaller than this are treated as corrupt
    pub min_artifact_bytes: usize,

    /// Directory receiving the shared file
    pub share_dir: PathBuf,

    /// Program launched with the shared file path (e.g. `xdg-open`)
    pub share_command: Option<String>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            product_name: "love-booth".to_string(),
            output_dir: PathBuf::from("."),
            format: ExportFormat::Png,
            jpeg_quality: 90,
            pixel_ratio: 2,
            min_artifact_bytes: 1000,
            share_dir: std::env::temp_dir().join("love-booth-share"),
            share_command: None,
        }
    }
}

impl ExportConfig {
    fn validate(&self) -> Result<()> {
        if self.product_name.trim().is_empty() {
            return Err(ConfigError::MissingKey { key: "export.product_name".to_string() }.into());
        }

        if self.pixel_ratio == 0 || self.pixel_ratio > 8 {
            return Err(invalid("export.pixel_ratio", self.pixel_ratio).into());
        }

        if self.format == ExportFormat::Jpeg && (self.jpeg_quality == 0 || self.jpeg_quality > 100) {
            return Err(invalid("export.jpeg_quality", self.jpeg_quality).into());
        }

        Ok(())
    }
}

/// Remote relay settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Multipart POST endpoint; relay is disabled when absent
    pub endpoint: Option<String>,

    /// Relay once automatically when a session completes
    pub auto_relay: bool,

    /// Attempts for a user-triggered relay
    pub max_attempts: u32,

    /// Delay between user-triggered attempts (ms)
    pub retry_backoff_ms: u64,

    /// Connect timeout for the HTTP client (s)
    pub connect_timeout_secs: u64,

    /// Name of the binary form field
    pub file_field: String,

    /// File name attached to the binary field
    pub file_name: String,

    /// Name of the caption form field
    pub caption_field: String,

    /// Caption template; `{effect}`, `{frame}` and `{count}` are substituted
    pub caption_template: String,

    /// Additional text fields sent with every relay
    pub extra_fields: Vec<(String, String)>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            auto_relay: false,
            max_attempts: 3,
            retry_backoff_ms: 1000,
            connect_timeout_secs: 30,
            file_field: "photo".to_string(),
            file_name: "love-strip.png".to_string(),
            caption_field: "caption".to_string(),
            caption_template: "Love Booth Capture!\nEffect: {effect}\nFrame: {frame}\nPhotos: {count}"
                .to_string(),
            extra_fields: Vec::new(),
        }
    }
}

impl RelayConfig {
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    fn validate(&self) -> Result<()> {
        if let Some(endpoint) = &self.endpoint {
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                return Err(invalid("relay.endpoint", endpoint).into());
            }
        }

        if self.max_attempts == 0 {
            return Err(invalid("relay.max_attempts", self.max_attempts).into());
        }

        if self.file_field.is_empty() || self.caption_field.is_empty() {
            return Err(ConfigError::MissingKey { key: "relay.file_field/caption_field".to_string() }.into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("booth.toml");

        let mut original_config = Config::default();
        original_config.relay.endpoint = Some("https://relay.example.com/upload".to_string());
        original_config.relay.extra_fields = vec![("chat_id".to_string(), "-100".to_string())];
        original_config.export.format = ExportFormat::Jpeg;

        original_config.save_to_file(&file_path).unwrap();
        let loaded_config = Config::from_file(&file_path).unwrap();

        assert_eq!(original_config.capture.target_photos, loaded_config.capture.target_photos);
        assert_eq!(original_config.relay.endpoint, loaded_config.relay.endpoint);
        assert_eq!(original_config.relay.extra_fields, loaded_config.relay.extra_fields);
        assert_eq!(loaded_config.export.format, ExportFormat::Jpeg);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str("[capture]\ntarget_photos = 6\n").unwrap();
        assert_eq!(config.capture.target_photos, 6);
        assert_eq!(config.capture.countdown_start, 3);
        assert_eq!(config.export.min_artifact_bytes, 1000);
    }

    #[test]
    fn test_invalid_capture_timing() {
        let mut config = Config::default();
        config.capture.settle_ms = 2000;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.capture.target_photos = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_relay_endpoint() {
        let mut config = Config::default();
        config.relay.endpoint = Some("ftp://example.com".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file() {
        let result = Config::from_file("/definitely/not/here.toml");
        assert!(result.is_err());
    }
}
