use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::assets::AssetCache;
use crate::compositor::Compositor;
use crate::config::{ExportConfig, RelayConfig};
use crate::effects::EffectRegistry;
use crate::error::{Result, TransportError};
use crate::export::{build_caption, Artifact, FileSink, HttpRelay, RelayReceipt, ShareSink, StripLayout, StripRenderer};
use crate::session::Session;

/// Who asked for a relay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayMode {
    /// Fired once when a session completes; never retried
    Automatic,
    /// Requested by the user; retried with backoff
    Manual,
}

/// Strip rendering plus the three delivery destinations
pub struct ExportPipeline {
    export: ExportConfig,
    relay_config: RelayConfig,
    strip: StripRenderer,
    files: FileSink,
    share: ShareSink,
    relay: Option<Arc<HttpRelay>>,
}

impl ExportPipeline {
    pub fn new(export: &ExportConfig, relay_config: &RelayConfig) -> Self {
        let relay = match HttpRelay::new(relay_config) {
            Ok(relay) => Some(Arc::new(relay)),
            Err(TransportError::NotConfigured) => None,
            Err(e) => {
                warn!("Relay disabled: {}", e);
                None
            }
        };

        Self {
            export: export.clone(),
            relay_config: relay_config.clone(),
            strip: StripRenderer::new(StripLayout::new(export.pixel_ratio)),
            files: FileSink::new(&export.output_dir, &export.product_name),
            share: ShareSink::new(&export.share_dir, export.share_command.clone()),
            relay,
        }
    }

    pub fn relay_enabled(&self) -> bool {
        self.relay.is_some()
    }

    /// Whether a completed session should be relayed without being asked
    pub fn auto_relay_enabled(&self) -> bool {
        self.relay_config.auto_relay && self.relay.is_some()
    }

    pub fn relay_handle(&self) -> Option<Arc<HttpRelay>> {
        self.relay.clone()
    }

    pub fn strip(&self) -> &StripRenderer {
        &self.strip
    }

    /// Render and encode the session's strip with its current choices
    ///
    /// Every asset the scene references is awaited first; failures are
    /// skipped by the compositor. The artifact is size-checked before it is
    /// returned.
    pub async fn render(
        &self,
        session: &Session,
        compositor: &Compositor,
        assets: &mut AssetCache,
        effects: &EffectRegistry,
    ) -> Result<Artifact> {
        let scene = session.scene();
        let references = scene.asset_references();
        let ready = assets.ensure_loaded(references.iter().copied()).await;
        if ready < references.len() {
            warn!("{} of {} decorative assets unavailable for export", references.len() - ready, references.len());
        }

        let effect = effects.resolve(session.effect())?;
        let image = self
            .strip
            .render(session.photos.as_slice(), &scene, compositor, assets, effect.as_ref())?;

        let artifact = Artifact::encode(&image, self.export.format, self.export.jpeg_quality)?;
        artifact.verify(self.export.min_artifact_bytes)?;
        info!(
            "🎞️  Exported {}x{} strip ({} photos, {} KB)",
            image.width(),
            image.height(),
            session.photos.len(),
            artifact.len() / 1024
        );
        Ok(artifact)
    }

    /// Caption sent with a relay
    pub fn caption(&self, session: &Session, effects: &EffectRegistry) -> String {
        let frame = session.frame().map(|f| f.name.as_str()).unwrap_or("None");
        build_caption(
            &self.relay_config.caption_template,
            &effects.display_name(session.effect()),
            frame,
            session.photos.len(),
        )
    }

    pub async fn save(&self, artifact: &Artifact) -> Result<PathBuf> {
        artifact.verify(self.export.min_artifact_bytes)?;
        Ok(self.files.save(artifact).await?)
    }

    pub async fn share(&self, artifact: &Artifact) -> Result<PathBuf> {
        artifact.verify(self.export.min_artifact_bytes)?;
        Ok(self.share.share(artifact).await?)
    }

    /// Relay `artifact` under the retry policy of `mode`
    pub async fn relay(&self, artifact: &Artifact, caption: &str, mode: RelayMode) -> Result<RelayReceipt> {
        artifact.verify(self.export.min_artifact_bytes)?;
        let relay = self.relay.as_ref().ok_or(TransportError::NotConfigured)?;

        let attempts = match mode {
            RelayMode::Automatic => 1,
            RelayMode::Manual => self.relay_config.max_attempts,
        };
        Ok(send_with_retry(relay, artifact, caption, attempts, self.relay_config.retry_backoff()).await?)
    }
}

/// Send with up to `attempts` tries, sleeping `backoff` between them
pub async fn send_with_retry(
    relay: &HttpRelay,
    artifact: &Artifact,
    caption: &str,
    attempts: u32,
    backoff: Duration,
) -> std::result::Result<RelayReceipt, TransportError> {
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match relay.send(artifact, caption).await {
            Ok(receipt) => {
                info!("💌 Relayed strip to {} (attempt {}/{})", relay.endpoint(), attempt, attempts);
                return Ok(receipt);
            }
            Err(e) if attempt < attempts => {
                warn!("Relay attempt {}/{} failed: {}", attempt, attempts, e);
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
            Err(e) => {
                warn!("Relay failed after {} attempt(s): {}", attempt, e);
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CaptureConfig;
    use crate::error::{BoothError, ExportError};
    use crate::export::test_server;
    use crate::export::ExportFormat;
    use crate::media::{MediaSource, StillSource};
    use crate::session::CapturedPhoto;
    use chrono::Utc;
    use std::sync::atomic::Ordering;
    use tempfile::tempdir;

    fn export_config(dir: &std::path::Path) -> ExportConfig {
        ExportConfig {
            output_dir: dir.join("out"),
            share_dir: dir.join("share"),
            pixel_ratio: 1,
            ..ExportConfig::default()
        }
    }

    fn relay_config(endpoint: &str) -> RelayConfig {
        RelayConfig { endpoint: Some(endpoint.to_string()), retry_backoff_ms: 0, ..RelayConfig::default() }
    }

    fn session_with_photos(n: usize) -> Session {
        let mut session = Session::new(&CaptureConfig::default());
        let mut source = StillSource::test_pattern();
        source.acquire(&crate::media::CaptureProfile::new(160, 120, 30)).unwrap();
        for i in 0..n {
            let frame = source.grab().unwrap();
            let image = Compositor::default().render(&frame, &session.scene(), &AssetCache::new());
            session.photos.push(CapturedPhoto::new(i + 1, Utc::now(), image, frame)).unwrap();
        }
        session
    }

    fn big_artifact() -> Artifact {
        Artifact::from_bytes(vec![1; 50_000], ExportFormat::Png, Utc::now())
    }

    #[tokio::test]
    async fn test_render_save_and_share() {
        let dir = tempdir().unwrap();
        let pipeline = ExportPipeline::new(&export_config(dir.path()), &RelayConfig::default());
        let session = session_with_photos(2);

        let mut assets = AssetCache::new();
        let artifact = pipeline
            .render(&session, &Compositor::default(), &mut assets, &EffectRegistry::new())
            .await
            .unwrap();
        assert!(artifact.len() >= 1000);

        let saved = pipeline.save(&artifact).await.unwrap();
        assert!(saved.starts_with(dir.path().join("out")));
        let decoded = image::open(&saved).unwrap();
        assert_eq!(decoded.width(), 320);

        let shared = pipeline.share(&artifact).await.unwrap();
        assert_eq!(shared, dir.path().join("share").join("love.png"));
    }

    #[tokio::test]
    async fn test_export_is_repeatable() {
        let dir = tempdir().unwrap();
        let pipeline = ExportPipeline::new(&export_config(dir.path()), &RelayConfig::default());
        let mut session = session_with_photos(1);
        session.set_effect("noir");

        let mut assets = AssetCache::new();
        let effects = EffectRegistry::new();
        let first = pipeline.render(&session, &Compositor::default(), &mut assets, &effects).await.unwrap();
        let second = pipeline.render(&session, &Compositor::default(), &mut assets, &effects).await.unwrap();
        assert_eq!(first.bytes(), second.bytes());
    }

    #[tokio::test]
    async fn test_small_artifact_never_handed_off() {
        let dir = tempdir().unwrap();
        let pipeline = ExportPipeline::new(&export_config(dir.path()), &RelayConfig::default());
        let tiny = Artifact::from_bytes(vec![0; 400], ExportFormat::Png, Utc::now());

        let err = pipeline.save(&tiny).await.unwrap_err();
        assert!(matches!(err, BoothError::Export(ExportError::Incomplete { size: 400, minimum: 1000 })));
        assert!(!dir.path().join("out").exists());

        assert!(pipeline.share(&tiny).await.is_err());
        assert!(!dir.path().join("share").exists());
    }

    #[tokio::test]
    async fn test_empty_session_has_nothing_to_export() {
        let dir = tempdir().unwrap();
        let pipeline = ExportPipeline::new(&export_config(dir.path()), &RelayConfig::default());
        let session = session_with_photos(0);

        let result = pipeline
            .render(&session, &Compositor::default(), &mut AssetCache::new(), &EffectRegistry::new())
            .await;
        assert!(matches!(result, Err(BoothError::Export(ExportError::NothingToExport))));
    }

    #[tokio::test]
    async fn test_manual_relay_retries() {
        let dir = tempdir().unwrap();
        let (url, hits) = test_server::serve(500, r#"{"ok":false,"description":"Internal"}"#).await;
        let pipeline = ExportPipeline::new(&export_config(dir.path()), &relay_config(&url));

        let err = pipeline.relay(&big_artifact(), "caption", RelayMode::Manual).await.unwrap_err();
        assert!(matches!(err, BoothError::Transport(TransportError::Status { status: 500, .. })));
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_automatic_relay_does_not_retry() {
        let dir = tempdir().unwrap();
        let (url, hits) = test_server::serve(500, r#"{"ok":false,"description":"Internal"}"#).await;
        let pipeline = ExportPipeline::new(&export_config(dir.path()), &relay_config(&url));

        assert!(pipeline.relay(&big_artifact(), "caption", RelayMode::Automatic).await.is_err());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_relay_without_endpoint() {
        let dir = tempdir().unwrap();
        let pipeline = ExportPipeline::new(&export_config(dir.path()), &RelayConfig::default());
        assert!(!pipeline.relay_enabled());
        assert!(!pipeline.auto_relay_enabled());

        let err = pipeline.relay(&big_artifact(), "caption", RelayMode::Manual).await.unwrap_err();
        assert!(matches!(err, BoothError::Transport(TransportError::NotConfigured)));
    }

    #[test]
    fn test_caption_uses_display_names() {
        let dir = tempdir().unwrap();
        let pipeline = ExportPipeline::new(&export_config(dir.path()), &RelayConfig::default());
        let mut session = session_with_photos(3);
        session.set_effect("glow");

        let caption = pipeline.caption(&session, &EffectRegistry::new());
        assert_eq!(caption, "Love Booth Capture!\nEffect: Dreamy\nFrame: None\nPhotos: 3");
    }
}
