use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use tracing::{debug, info};

use crate::config::RelayConfig;
use crate::error::TransportError;
use crate::export::{Artifact, ExportFormat};

/// Saves artifacts as `<product>-<unix millis>.<ext>` in a directory
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
    product_name: String,
}

impl FileSink {
    pub fn new<P: Into<PathBuf>>(dir: P, product_name: &str) -> Self {
        Self { dir: dir.into(), product_name: product_name.to_string() }
    }

    /// File name this sink gives `artifact`
    pub fn file_name(&self, artifact: &Artifact) -> String {
        format!(
            "{}-{}.{}",
            self.product_name,
            artifact.created_at().timestamp_millis(),
            artifact.format().extension()
        )
    }

    pub async fn save(&self, artifact: &Artifact) -> Result<PathBuf, TransportError> {
        let path = self.dir.join(self.file_name(artifact));
        write_file(&path, artifact.bytes()).await?;
        info!("💾 Saved strip to {}", path.display());
        Ok(path)
    }
}

/// Hands artifacts to the platform share mechanism
///
/// The artifact is written as `love.<ext>` into the share directory, then the
/// configured opener (if any) is launched with the file path.
#[derive(Debug, Clone)]
pub struct ShareSink {
    dir: PathBuf,
    command: Option<String>,
}

impl ShareSink {
    pub fn new<P: Into<PathBuf>>(dir: P, command: Option<String>) -> Self {
        Self { dir: dir.into(), command }
    }

    pub async fn share(&self, artifact: &Artifact) -> Result<PathBuf, TransportError> {
        let path = self.dir.join(format!("love.{}", artifact.format().extension()));
        write_file(&path, artifact.bytes()).await?;

        if let Some(command) = &self.command {
            debug!("Launching share command: {} {}", command, path.display());
            let status = tokio::process::Command::new(command)
                .arg(&path)
                .status()
                .await
                .map_err(|e| TransportError::ShareFailed { reason: format!("{}: {}", command, e) })?;

            if !status.success() {
                return Err(TransportError::ShareFailed {
                    reason: format!("{} exited with {}", command, status),
                });
            }
        }

        info!("📤 Shared strip via {}", path.display());
        Ok(path)
    }
}

async fn write_file(path: &Path, bytes: &[u8]) -> Result<(), TransportError> {
    let failed = |e: std::io::Error| TransportError::WriteFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    };

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(failed)?;
    }
    tokio::fs::write(path, bytes).await.map_err(failed)
}

/// Successful relay response
#[derive(Debug, Clone)]
pub struct RelayReceipt {
    pub status: u16,
    pub body: serde_json::Value,
}

/// Posts artifacts to a remote endpoint as multipart form data
#[derive(Debug, Clone)]
pub struct HttpRelay {
    client: reqwest::Client,
    endpoint: String,
    file_field: String,
    file_name: String,
    caption_field: String,
    extra_fields: Vec<(String, String)>,
}

impl HttpRelay {
    pub fn new(config: &RelayConfig) -> Result<Self, TransportError> {
        let endpoint = config.endpoint.clone().ok_or(TransportError::NotConfigured)?;
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| TransportError::Network { reason: format!("Failed to build HTTP client: {}", e) })?;

        Ok(Self {
            client,
            endpoint,
            file_field: config.file_field.clone(),
            file_name: config.file_name.clone(),
            caption_field: config.caption_field.clone(),
            extra_fields: config.extra_fields.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Attachment name: the configured name with the artifact's extension
    pub fn attachment_name(&self, format: ExportFormat) -> String {
        Path::new(&self.file_name)
            .with_extension(format.extension())
            .to_string_lossy()
            .into_owned()
    }

    /// One POST attempt
    pub async fn send(&self, artifact: &Artifact, caption: &str) -> Result<RelayReceipt, TransportError> {
        let part = Part::bytes(artifact.bytes().to_vec())
            .file_name(self.attachment_name(artifact.format()))
            .mime_str(artifact.format().mime_type())
            .map_err(|e| TransportError::Network { reason: e.to_string() })?;

        let mut form = Form::new()
            .part(self.file_field.clone(), part)
            .text(self.caption_field.clone(), caption.to_string());
        for (name, value) in &self.extra_fields {
            form = form.text(name.clone(), value.clone());
        }

        debug!("Relaying {} bytes to {}", artifact.len(), self.endpoint);
        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| TransportError::Network { reason: e.to_string() })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| TransportError::Network { reason: e.to_string() })?;
        let body: Option<serde_json::Value> = serde_json::from_str(&text).ok();

        if !status.is_success() {
            let description = body
                .as_ref()
                .and_then(|b| b.get("description"))
                .and_then(|d| d.as_str())
                .map(str::to_string)
                .or_else(|| status.canonical_reason().map(str::to_string))
                .unwrap_or_else(|| "unknown error".to_string());
            return Err(TransportError::Status { status: status.as_u16(), description });
        }

        let body = body.ok_or_else(|| TransportError::InvalidResponse {
            reason: format!("expected JSON, got {} bytes", text.len()),
        })?;
        Ok(RelayReceipt { status: status.as_u16(), body })
    }
}

/// Fill the caption template
pub fn build_caption(template: &str, effect: &str, frame: &str, count: usize) -> String {
    template
        .replace("{effect}", effect)
        .replace("{frame}", frame)
        .replace("{count}", &count.to_string())
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::ExportFormat;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::Ordering;
    use tempfile::tempdir;

    fn artifact(size: usize) -> Artifact {
        let at = Utc.timestamp_millis_opt(1_707_900_000_000).unwrap();
        Artifact::from_bytes(vec![7; size], ExportFormat::Png, at)
    }

    fn relay_config(endpoint: &str) -> RelayConfig {
        RelayConfig { endpoint: Some(endpoint.to_string()), ..RelayConfig::default() }
    }

    #[tokio::test]
    async fn test_file_sink_naming() {
        let dir = tempdir().unwrap();
        let sink = FileSink::new(dir.path().join("strips"), "love-booth");

        let path = sink.save(&artifact(2048)).await.unwrap();
        assert_eq!(path.file_name().unwrap(), "love-booth-1707900000000.png");
        assert_eq!(std::fs::read(&path).unwrap().len(), 2048);
    }

    #[tokio::test]
    async fn test_share_sink_writes_fixed_name() {
        let dir = tempdir().unwrap();
        let sink = ShareSink::new(dir.path(), None);

        let path = sink.share(&artifact(1500)).await.unwrap();
        assert_eq!(path, dir.path().join("love.png"));
    }

    #[tokio::test]
    async fn test_share_command_failure_is_reported() {
        let dir = tempdir().unwrap();
        let sink = ShareSink::new(dir.path(), Some("/definitely/not/an/opener".to_string()));

        let result = sink.share(&artifact(1500)).await;
        assert!(matches!(result, Err(TransportError::ShareFailed { .. })));
    }

    #[test]
    fn test_relay_requires_endpoint() {
        let result = HttpRelay::new(&RelayConfig::default());
        assert!(matches!(result, Err(TransportError::NotConfigured)));
    }

    #[test]
    fn test_attachment_name_follows_format() {
        let relay = HttpRelay::new(&relay_config("http://127.0.0.1:9/upload")).unwrap();
        assert_eq!(relay.attachment_name(ExportFormat::Png), "love-strip.png");
        assert_eq!(relay.attachment_name(ExportFormat::Jpeg), "love-strip.jpg");
    }

    #[test]
    fn test_caption_template() {
        let caption = build_caption(&RelayConfig::default().caption_template, "Dreamy", "Sweet Pink", 4);
        assert_eq!(caption, "Love Booth Capture!\nEffect: Dreamy\nFrame: Sweet Pink\nPhotos: 4");
    }

    #[tokio::test]
    async fn test_relay_success_parses_json() {
        let (url, hits) = test_server::serve(200, r#"{"ok":true,"result":{"message_id":42}}"#).await;
        let relay = HttpRelay::new(&relay_config(&url)).unwrap();

        let receipt = relay.send(&artifact(5000), "hello").await.unwrap();
        assert_eq!(receipt.status, 200);
        assert_eq!(receipt.body["result"]["message_id"], 42);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_relay_error_status_maps_description() {
        let (url, _) = test_server::serve(400, r#"{"ok":false,"description":"Bad Request: chat not found"}"#).await;
        let relay = HttpRelay::new(&relay_config(&url)).unwrap();

        let err = relay.send(&artifact(5000), "hello").await.unwrap_err();
        assert_eq!(
            err,
            TransportError::Status { status: 400, description: "Bad Request: chat not found".to_string() }
        );
    }

    #[tokio::test]
    async fn test_relay_non_json_success_is_invalid() {
        let (url, _) = test_server::serve(200, "plain text").await;
        let relay = HttpRelay::new(&relay_config(&url)).unwrap();

        let err = relay.send(&artifact(5000), "hello").await.unwrap_err();
        assert!(matches!(err, TransportError::InvalidResponse { .. }));
    }
}
