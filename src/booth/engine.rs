use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::{
    assets::AssetCache,
    audio::{Cue, CuePlayer},
    capture::{CaptureState, Command, Timer, Transition},
    catalog::Catalog,
    compositor::Compositor,
    config::{CameraConfig, Config},
    effects::EffectRegistry,
    error::{BoothError, Result, TransportError},
    export::{send_with_retry, Artifact, ExportPipeline, RelayMode, RelayReceipt},
    media::{acquire_with_fallback, MediaSource},
    session::{CapturedPhoto, RelayStatus, Session},
    stickers::StickerStyle,
};

/// Notifications published while the booth runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoothEvent {
    /// Countdown display changed; `None` hides it
    Countdown(Option<u32>),
    /// Audible countdown tick
    Tick(u32),
    PhotoCaptured { current: usize, target: usize },
    /// Capture fired with no stream; nothing was appended
    CaptureSkipped,
    AcquisitionFailed(String),
    Finished { count: usize },
    /// Strip rendered; `path` is set when it was written somewhere
    Exported { path: Option<PathBuf>, bytes: usize },
    ExportFailed(String),
    Relay(RelayStatus),
    SessionReset,
}

/// Requests accepted by [`BoothEngine::run`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    Start,
    Reset,
    SelectFrame(Option<String>),
    SelectBackground(Option<String>),
    ToggleSticker(String),
    SetStickerStyle(StickerStyle),
    SetEffect(String),
    Save,
    Share,
    Relay,
    Shutdown,
}

/// Result of a relay running in the background
#[derive(Debug)]
struct RelayOutcome {
    epoch: u64,
    /// Relay generation the upload belongs to
    seq: u64,
    result: std::result::Result<RelayReceipt, TransportError>,
}

/// Runs a booth session end to end
///
/// The engine owns every stateful part of the booth and executes the
/// commands produced by the capture machine:
/// 1. Acquisition - open the media source on the first start
/// 2. Countdown - arm one timer at a time and publish countdown values
/// 3. Capture - grab, compose and append a photo per countdown
/// 4. Export - render the strip and hand it to a sink or the relay
///
/// All state changes happen on the task that drives the engine; only relay
/// uploads run as spawned tasks and report back through a channel.
pub struct BoothEngine {
    session: Session,
    catalog: Catalog,
    camera: CameraConfig,
    source: Box<dyn MediaSource>,
    assets: AssetCache,
    compositor: Compositor,
    effects: EffectRegistry,
    export: ExportPipeline,
    cues: Box<dyn CuePlayer>,
    pending: Option<(Instant, Timer)>,
    relay_seq: u64,
    events: mpsc::UnboundedSender<BoothEvent>,
    relay_tx: mpsc::UnboundedSender<RelayOutcome>,
    relay_rx: mpsc::UnboundedReceiver<RelayOutcome>,
}

impl BoothEngine {
    /// Create an engine and the receiver for its events
    pub fn new(
        config: &Config,
        catalog: Catalog,
        source: Box<dyn MediaSource>,
        cues: Box<dyn CuePlayer>,
    ) -> (Self, mpsc::UnboundedReceiver<BoothEvent>) {
        let (events, event_rx) = mpsc::unbounded_channel();
        let (relay_tx, relay_rx) = mpsc::unbounded_channel();

        let engine = Self {
            session: Session::new(&config.capture),
            catalog,
            camera: config.camera.clone(),
            source,
            assets: AssetCache::new(),
            compositor: Compositor::new(config.compositor.frame_opacity),
            effects: EffectRegistry::new(),
            export: ExportPipeline::new(&config.export, &config.relay),
            cues,
            pending: None,
            relay_seq: 0,
            events,
            relay_tx,
            relay_rx,
        };
        (engine, event_rx)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn effects(&self) -> &EffectRegistry {
        &self.effects
    }

    pub fn state(&self) -> CaptureState {
        self.session.machine.state()
    }

    pub fn source_active(&self) -> bool {
        self.source.is_active()
    }

    /// Kind and deadline of the armed timer, if any
    pub fn pending_timer(&self) -> Option<(Instant, Timer)> {
        self.pending
    }

    /// Load every decorative asset the catalog references
    pub async fn preload_assets(&mut self) -> usize {
        let references = self.catalog.asset_references();
        self.assets.preload(&references).await
    }

    // ==========================================
    // DECORATION CHOICES
    // ==========================================

    pub async fn select_frame(&mut self, id: Option<&str>) -> Result<()> {
        let frame = match id {
            Some(id) => Some(self.catalog.frame(id)?.clone()),
            None => None,
        };
        if let Some(reference) = frame.as_ref().and_then(|f| f.visual.asset()) {
            self.assets.ensure_loaded([reference]).await;
        }
        debug!("Frame: {}", frame.as_ref().map(|f| f.name.as_str()).unwrap_or("none"));
        self.session.set_frame(frame);
        Ok(())
    }

    pub async fn select_background(&mut self, id: Option<&str>) -> Result<()> {
        let background = match id {
            Some(id) => Some(self.catalog.background(id)?.clone()),
            None => None,
        };
        if let Some(reference) = background.as_ref().and_then(|b| b.visual.asset()) {
            self.assets.ensure_loaded([reference]).await;
        }
        self.session.set_background(background);
        Ok(())
    }

    /// Activate or deactivate a sticker; returns whether it is now active
    pub async fn toggle_sticker(&mut self, id: &str) -> Result<bool> {
        let sticker = self.catalog.sticker(id)?.clone();
        self.assets.ensure_loaded([sticker.image.as_str()]).await;
        Ok(self.session.toggle_sticker(sticker))
    }

    pub fn set_sticker_style(&mut self, style: StickerStyle) {
        self.session.set_style(style);
    }

    pub fn set_effect(&mut self, id: &str) -> Result<()> {
        self.effects.resolve(id)?;
        self.session.set_effect(id);
        Ok(())
    }

    // ==========================================
    // CAPTURE FLOW
    // ==========================================

    /// Begin a capture run, acquiring the media source if needed
    pub async fn start(&mut self) -> Result<()> {
        if self.state() != CaptureState::Idle {
            debug!("start ignored while {}", self.state());
            return Ok(());
        }

        if !self.source.is_active() {
            if let Err(e) = acquire_with_fallback(self.source.as_mut(), &self.camera.preferred, &self.camera.fallback) {
                warn!("Camera acquisition failed: {}", e);
                self.emit(BoothEvent::AcquisitionFailed(e.to_string()));
                return Err(e.into());
            }
        }

        self.session.clear();
        info!("💘 Starting capture of {} photos", self.session.photos.target());
        let transition = self.session.machine.start();
        self.execute(transition).await;
        Ok(())
    }

    /// Abandon the session and free the stream and every photo
    pub async fn reset(&mut self) {
        let transition = self.session.machine.reset();
        self.execute(transition).await;
        self.source.release();
        info!("↩️  Session reset");
        self.emit(BoothEvent::SessionReset);
    }

    /// Run one capture cycle to completion; returns the number of photos taken
    pub async fn shoot(&mut self) -> Result<usize> {
        self.start().await?;
        while let Some((deadline, _)) = self.pending {
            sleep_until(deadline).await;
            self.fire_timer().await;
        }
        Ok(self.session.photos.len())
    }

    /// Drive the booth from a control channel until shutdown
    pub async fn run(&mut self, mut controls: mpsc::Receiver<Control>) {
        loop {
            let deadline = self.pending.map(|(deadline, _)| deadline);
            tokio::select! {
                control = controls.recv() => match control {
                    Some(Control::Shutdown) | None => break,
                    Some(control) => self.handle(control).await,
                },
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.fire_timer().await;
                }
                Some(outcome) = self.relay_rx.recv() => {
                    self.finish_relay(outcome);
                }
            }
        }
        self.source.release();
        debug!("Booth loop stopped");
    }

    /// Apply the result of the next background relay
    pub async fn await_auto_relay(&mut self) -> Option<RelayStatus> {
        if self.session.relay_status() != &RelayStatus::Syncing {
            return None;
        }
        self.settle_background_relay().await;
        Some(self.session.relay_status().clone())
    }

    /// Wait until no background relay is in flight
    ///
    /// Returns the receipt when the background upload succeeded.
    async fn settle_background_relay(&mut self) -> Option<RelayReceipt> {
        while self.session.relay_status() == &RelayStatus::Syncing {
            let outcome = self.relay_rx.recv().await?;
            if let Some(receipt) = self.finish_relay(outcome) {
                return Some(receipt);
            }
        }
        None
    }

    async fn handle(&mut self, control: Control) {
        let result = match control {
            Control::Start => self.start().await,
            Control::Reset => {
                self.reset().await;
                Ok(())
            }
            Control::SelectFrame(id) => self.select_frame(id.as_deref()).await,
            Control::SelectBackground(id) => self.select_background(id.as_deref()).await,
            Control::ToggleSticker(id) => self.toggle_sticker(&id).await.map(|_| ()),
            Control::SetStickerStyle(style) => {
                self.set_sticker_style(style);
                Ok(())
            }
            Control::SetEffect(id) => self.set_effect(&id),
            Control::Save => self.save().await.map(|_| ()),
            Control::Share => self.share().await.map(|_| ()),
            Control::Relay => self.relay().await.map(|_| ()),
            Control::Shutdown => Ok(()),
        };

        if let Err(e) = result {
            warn!("{}", e.user_message());
        }
    }

    async fn fire_timer(&mut self) {
        let Some((_, timer)) = self.pending.take() else {
            return;
        };
        let transition = self.session.machine.timer_elapsed(timer);
        self.execute(transition).await;
    }

    async fn execute(&mut self, transition: Transition) {
        let mut queue: VecDeque<Command> = transition.commands.into();

        while let Some(command) = queue.pop_front() {
            match command {
                Command::Schedule { delay, timer } => {
                    self.pending = Some((Instant::now() + delay, timer));
                }
                Command::Countdown(value) => self.emit(BoothEvent::Countdown(value)),
                Command::Beep(value) => {
                    self.cues.play(Cue::Beep);
                    self.emit(BoothEvent::Tick(value));
                }
                Command::Capture => queue.extend(self.capture().commands),
                Command::Finished => {
                    let count = self.session.photos.len();
                    info!("🎉 Captured all {} photos", count);
                    self.emit(BoothEvent::Finished { count });
                    self.auto_relay().await;
                }
                Command::CancelTimers => self.pending = None,
                Command::ReleasePhotos => self.session.clear(),
            }
        }
    }

    fn capture(&mut self) -> Transition {
        let frame = match self.source.grab() {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Capture skipped: {}", e);
                self.emit(BoothEvent::CaptureSkipped);
                return self.session.machine.capture_skipped();
            }
        };

        let image = self.compositor.render(&frame, &self.session.scene(), &self.assets);
        let ordinal = self.session.photos.len() + 1;
        let photo = CapturedPhoto::new(ordinal, Utc::now(), image, frame);

        match self.session.photos.push(photo) {
            Ok(current) => {
                self.cues.play(Cue::Shutter);
                debug!("📸 Photo {}/{}", current, self.session.photos.target());
                self.emit(BoothEvent::PhotoCaptured { current, target: self.session.photos.target() });
                self.session.machine.photo_captured()
            }
            Err(e) => {
                warn!("Capture dropped: {}", e);
                self.emit(BoothEvent::CaptureSkipped);
                self.session.machine.capture_skipped()
            }
        }
    }

    // ==========================================
    // EXPORT AND DELIVERY
    // ==========================================

    async fn render_strip(&mut self) -> Result<Artifact> {
        let result = self
            .export
            .render(&self.session, &self.compositor, &mut self.assets, &self.effects)
            .await;
        if let Err(e) = &result {
            self.emit(BoothEvent::ExportFailed(e.user_message()));
        }
        result
    }

    /// Render the strip with the session's current choices
    pub async fn export(&mut self) -> Result<Artifact> {
        let artifact = self.render_strip().await?;
        self.emit(BoothEvent::Exported { path: None, bytes: artifact.len() });
        Ok(artifact)
    }

    /// Render and save the strip to the output directory
    pub async fn save(&mut self) -> Result<PathBuf> {
        let artifact = self.render_strip().await?;
        let path = self.delivered(self.export.save(&artifact).await, artifact.len())?;
        Ok(path)
    }

    /// Render the strip and hand it to the share destination
    pub async fn share(&mut self) -> Result<PathBuf> {
        let artifact = self.render_strip().await?;
        let path = self.delivered(self.export.share(&artifact).await, artifact.len())?;
        Ok(path)
    }

    /// User-requested relay with retries
    pub async fn relay(&mut self) -> Result<RelayReceipt> {
        if !self.export.relay_enabled() {
            return Err(TransportError::NotConfigured.into());
        }

        // The automatic upload already carries this strip
        if let Some(receipt) = self.settle_background_relay().await {
            debug!("Manual relay satisfied by the automatic upload");
            return Ok(receipt);
        }

        let artifact = self.render_strip().await?;
        let caption = self.export.caption(&self.session, &self.effects);
        self.relay_seq += 1;
        self.set_relay_status(RelayStatus::Syncing);

        match self.export.relay(&artifact, &caption, RelayMode::Manual).await {
            Ok(receipt) => {
                self.cues.play(Cue::Success);
                self.set_relay_status(RelayStatus::Success);
                Ok(receipt)
            }
            Err(e) => {
                self.set_relay_status(RelayStatus::Error(e.user_message()));
                Err(e)
            }
        }
    }

    /// Fire the single automatic relay of a completed session
    async fn auto_relay(&mut self) {
        if !self.export.auto_relay_enabled() || !self.session.claim_auto_relay() {
            return;
        }
        let Some(relay) = self.export.relay_handle() else {
            return;
        };

        let artifact = match self.render_strip().await {
            Ok(artifact) => artifact,
            Err(e) => {
                warn!("Automatic relay skipped: {}", e);
                return;
            }
        };
        let caption = self.export.caption(&self.session, &self.effects);
        let epoch = self.session.machine.epoch();
        self.relay_seq += 1;
        let seq = self.relay_seq;
        let outcomes = self.relay_tx.clone();
        self.set_relay_status(RelayStatus::Syncing);

        tokio::spawn(async move {
            let result = send_with_retry(&relay, &artifact, &caption, 1, Duration::ZERO).await;
            let _ = outcomes.send(RelayOutcome { epoch, seq, result });
        });
    }

    /// Apply a background result unless a reset or a newer relay superseded it
    fn finish_relay(&mut self, outcome: RelayOutcome) -> Option<RelayReceipt> {
        if outcome.epoch != self.session.machine.epoch() {
            debug!("Dropping relay result from a reset session");
            return None;
        }
        if outcome.seq != self.relay_seq {
            debug!("Dropping relay result {} superseded by {}", outcome.seq, self.relay_seq);
            return None;
        }
        match outcome.result {
            Ok(receipt) => {
                self.cues.play(Cue::Success);
                self.set_relay_status(RelayStatus::Success);
                Some(receipt)
            }
            Err(e) => {
                self.set_relay_status(RelayStatus::Error(BoothError::from(e).user_message()));
                None
            }
        }
    }

    fn delivered(&self, result: Result<PathBuf>, bytes: usize) -> Result<PathBuf> {
        match result {
            Ok(path) => {
                self.emit(BoothEvent::Exported { path: Some(path.clone()), bytes });
                Ok(path)
            }
            Err(e) => {
                self.emit(BoothEvent::ExportFailed(e.user_message()));
                Err(e)
            }
        }
    }

    fn set_relay_status(&mut self, status: RelayStatus) {
        self.session.set_relay_status(status.clone());
        self.emit(BoothEvent::Relay(status));
    }

    fn emit(&self, event: BoothEvent) {
        // Nobody listening is fine
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CaptureConfig, ExportConfig, RelayConfig};
    use crate::error::{AcquisitionError, CaptureError, ConfigError};
    use crate::export::test_server;
    use crate::media::{CaptureProfile, StillSource, VideoFrame};
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::atomic::Ordering;
    use tempfile::{tempdir, TempDir};

    /// Cue player whose history survives being boxed
    #[derive(Clone, Default)]
    struct SharedCues(Rc<RefCell<Vec<Cue>>>);

    impl CuePlayer for SharedCues {
        fn play(&mut self, cue: Cue) {
            self.0.borrow_mut().push(cue);
        }
    }

    /// Opens fine but never delivers a frame
    struct DeadSource {
        open: bool,
        deny: bool,
    }

    impl MediaSource for DeadSource {
        fn name(&self) -> &str {
            "dead"
        }

        fn acquire(&mut self, _profile: &CaptureProfile) -> std::result::Result<(), AcquisitionError> {
            if self.deny {
                return Err(AcquisitionError::PermissionDenied { reason: "blocked".to_string() });
            }
            self.open = true;
            Ok(())
        }

        fn release(&mut self) {
            self.open = false;
        }

        fn is_active(&self) -> bool {
            self.open
        }

        fn resolution(&self) -> Option<(u32, u32)> {
            self.open.then_some((64, 48))
        }

        fn grab(&mut self) -> std::result::Result<VideoFrame, CaptureError> {
            Err(CaptureError::NoStream)
        }
    }

    fn config(dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.camera.preferred = CaptureProfile::new(160, 120, 30);
        config.camera.fallback = CaptureProfile::new(80, 60, 15);
        config.export = ExportConfig {
            output_dir: dir.path().join("out"),
            share_dir: dir.path().join("share"),
            pixel_ratio: 1,
            ..ExportConfig::default()
        };
        config
    }

    /// Short real-time timings for tests that talk to a socket
    fn fast(mut config: Config, endpoint: &str, auto_relay: bool) -> Config {
        config.capture = CaptureConfig { tick_ms: 10, settle_ms: 2, pause_ms: 2, ..CaptureConfig::default() };
        config.relay = RelayConfig {
            endpoint: Some(endpoint.to_string()),
            auto_relay,
            max_attempts: 2,
            retry_backoff_ms: 0,
            ..RelayConfig::default()
        };
        config
    }

    fn engine(config: &Config) -> (BoothEngine, mpsc::UnboundedReceiver<BoothEvent>, SharedCues) {
        let cues = SharedCues::default();
        let (engine, events) = BoothEngine::new(
            config,
            Catalog::builtin(),
            Box::new(StillSource::test_pattern()),
            Box::new(cues.clone()),
        );
        (engine, events, cues)
    }

    fn drain(events: &mut mpsc::UnboundedReceiver<BoothEvent>) -> Vec<BoothEvent> {
        let mut all = Vec::new();
        while let Ok(event) = events.try_recv() {
            all.push(event);
        }
        all
    }

    #[tokio::test(start_paused = true)]
    async fn test_shoot_captures_full_set() {
        let dir = tempdir().unwrap();
        let (mut engine, mut events, cues) = engine(&config(&dir));

        let started = Instant::now();
        let count = engine.shoot().await.unwrap();
        assert_eq!(count, 4);
        assert_eq!(engine.state(), CaptureState::Done);
        assert!(engine.pending_timer().is_none());

        // 4 x (3 ticks + settle) + 3 pauses
        assert_eq!(started.elapsed(), Duration::from_millis(4 * (3000 + 800) + 3 * 1500));

        let events = drain(&mut events);
        let captured: Vec<usize> = events
            .iter()
            .filter_map(|e| match e {
                BoothEvent::PhotoCaptured { current, target: 4 } => Some(*current),
                _ => None,
            })
            .collect();
        assert_eq!(captured, vec![1, 2, 3, 4]);
        assert_eq!(events.last(), Some(&BoothEvent::Finished { count: 4 }));
        assert_eq!(&events[..4], &[
            BoothEvent::Countdown(Some(3)),
            BoothEvent::Tick(3),
            BoothEvent::Countdown(Some(2)),
            BoothEvent::Tick(2),
        ]);

        let cues = cues.0.borrow();
        assert_eq!(cues.iter().filter(|c| **c == Cue::Beep).count(), 12);
        assert_eq!(cues.iter().filter(|c| **c == Cue::Shutter).count(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_capture_without_frames_returns_to_idle() {
        let dir = tempdir().unwrap();
        let (mut engine, mut events) = BoothEngine::new(
            &config(&dir),
            Catalog::builtin(),
            Box::new(DeadSource { open: false, deny: false }),
            Box::new(SharedCues::default()),
        );

        assert_eq!(engine.shoot().await.unwrap(), 0);
        assert_eq!(engine.state(), CaptureState::Idle);
        assert!(drain(&mut events).contains(&BoothEvent::CaptureSkipped));
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquisition_failure_stays_idle() {
        let dir = tempdir().unwrap();
        let (mut engine, mut events) = BoothEngine::new(
            &config(&dir),
            Catalog::builtin(),
            Box::new(DeadSource { open: false, deny: true }),
            Box::new(SharedCues::default()),
        );

        let err = engine.start().await.unwrap_err();
        assert!(matches!(err, BoothError::Acquisition(AcquisitionError::PermissionDenied { .. })));
        assert_eq!(engine.state(), CaptureState::Idle);
        assert!(engine.pending_timer().is_none());
        assert!(matches!(drain(&mut events).as_slice(), [BoothEvent::AcquisitionFailed(_)]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_mid_countdown() {
        let dir = tempdir().unwrap();
        let (mut engine, mut events, _) = engine(&config(&dir));
        let (controls, rx) = mpsc::channel(8);

        let script = async move {
            controls.send(Control::Start).await.unwrap();
            tokio::time::sleep(Duration::from_millis(1500)).await;
            controls.send(Control::Reset).await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
            controls.send(Control::Shutdown).await.unwrap();
        };
        tokio::join!(engine.run(rx), script);

        assert_eq!(engine.state(), CaptureState::Idle);
        assert!(engine.session().photos.is_empty());
        assert!(!engine.source_active());

        let events = drain(&mut events);
        assert!(events.contains(&BoothEvent::SessionReset));
        assert!(!events.iter().any(|e| matches!(e, BoothEvent::PhotoCaptured { .. })));
        // Nothing below 2 was shown before the reset
        assert!(!events.contains(&BoothEvent::Countdown(Some(1))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_save_and_share_strip() {
        let dir = tempdir().unwrap();
        let (mut engine, mut events, _) = engine(&config(&dir));
        engine.select_frame(Some("soft-pink")).await.unwrap();
        engine.set_effect("vintage").unwrap();
        engine.shoot().await.unwrap();
        drain(&mut events);

        let saved = engine.save().await.unwrap();
        assert!(saved.starts_with(dir.path().join("out")));
        assert!(saved.file_name().unwrap().to_string_lossy().starts_with("love-booth-"));

        let shared = engine.share().await.unwrap();
        assert_eq!(shared, dir.path().join("share").join("love.png"));

        let events = drain(&mut events);
        assert!(matches!(&events[0], BoothEvent::Exported { path: Some(p), .. } if *p == saved));
    }

    #[tokio::test(start_paused = true)]
    async fn test_export_before_capture_fails() {
        let dir = tempdir().unwrap();
        let (mut engine, mut events, _) = engine(&config(&dir));

        assert!(engine.export().await.is_err());
        assert!(matches!(drain(&mut events).as_slice(), [BoothEvent::ExportFailed(_)]));
    }

    #[tokio::test]
    async fn test_unknown_choices_are_rejected() {
        let dir = tempdir().unwrap();
        let (mut engine, _, _) = engine(&config(&dir));

        let err = engine.select_frame(Some("glitter")).await.unwrap_err();
        assert!(matches!(err, BoothError::Config(ConfigError::UnknownOption { .. })));
        assert!(engine.set_effect("sepia-max").is_err());
        assert_eq!(engine.session().effect(), "none");

        engine.select_background(Some("starlight")).await.unwrap();
        assert_eq!(engine.session().background().unwrap().name, "Midnight Love");
    }

    #[tokio::test]
    async fn test_auto_relay_fires_once() {
        let dir = tempdir().unwrap();
        let (url, hits) = test_server::serve(200, r#"{"ok":true}"#).await;
        let (mut engine, _, cues) = engine(&fast(config(&dir), &url, true));

        engine.shoot().await.unwrap();
        assert_eq!(engine.session().relay_status(), &RelayStatus::Syncing);
        assert_eq!(engine.await_auto_relay().await, Some(RelayStatus::Success));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(cues.0.borrow().last(), Some(&Cue::Success));

        // Nothing else was scheduled
        assert_eq!(engine.await_auto_relay().await, None);
    }

    #[tokio::test]
    async fn test_auto_relay_off_by_default() {
        let dir = tempdir().unwrap();
        let (url, hits) = test_server::serve(200, r#"{"ok":true}"#).await;
        let (mut engine, _, _) = engine(&fast(config(&dir), &url, false));

        engine.shoot().await.unwrap();
        assert_eq!(engine.session().relay_status(), &RelayStatus::Idle);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_manual_relay_failure_sets_error() {
        let dir = tempdir().unwrap();
        let (url, hits) = test_server::serve(502, r#"{"ok":false,"description":"Bad Gateway"}"#).await;
        let (mut engine, mut events, _) = engine(&fast(config(&dir), &url, false));

        engine.shoot().await.unwrap();
        drain(&mut events);
        assert!(engine.relay().await.is_err());
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(engine.session().relay_status(), &RelayStatus::Error("Sync failed: Bad Gateway".to_string()));

        let statuses: Vec<BoothEvent> =
            drain(&mut events).into_iter().filter(|e| matches!(e, BoothEvent::Relay(_))).collect();
        assert_eq!(statuses.len(), 2);
        assert_eq!(statuses[0], BoothEvent::Relay(RelayStatus::Syncing));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_after_full_set_frees_everything() {
        let dir = tempdir().unwrap();
        let (mut engine, mut events, _) = engine(&config(&dir));

        assert_eq!(engine.shoot().await.unwrap(), 4);
        assert_eq!(engine.session().photos.len(), 4);
        assert!(engine.source_active());

        engine.reset().await;
        assert!(engine.session().photos.is_empty());
        assert_eq!(engine.state(), CaptureState::Idle);
        assert!(!engine.source_active());
        assert_eq!(engine.session().relay_status(), &RelayStatus::Idle);
        assert!(engine.pending_timer().is_none());
        assert_eq!(drain(&mut events).last(), Some(&BoothEvent::SessionReset));

        // A fresh session starts normally after the reset
        engine.start().await.unwrap();
        assert_eq!(engine.state(), CaptureState::Counting(3));
        assert!(engine.source_active());
        assert!(engine.pending_timer().is_some());
    }

    #[tokio::test]
    async fn test_manual_relay_reuses_pending_auto_upload() {
        let dir = tempdir().unwrap();
        let (url, hits) = test_server::serve(200, r#"{"ok":true}"#).await;
        let (mut engine, _, _) = engine(&fast(config(&dir), &url, true));

        engine.shoot().await.unwrap();
        assert_eq!(engine.session().relay_status(), &RelayStatus::Syncing);

        engine.relay().await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(engine.session().relay_status(), &RelayStatus::Success);

        // The automatic result was consumed, nothing is left to overwrite the status
        assert_eq!(engine.await_auto_relay().await, None);
        assert_eq!(engine.session().relay_status(), &RelayStatus::Success);
    }

    #[tokio::test]
    async fn test_manual_relay_retries_after_failed_auto_upload() {
        let dir = tempdir().unwrap();
        let (url, hits) = test_server::serve(503, r#"{"ok":false,"description":"Unavailable"}"#).await;
        let (mut engine, _, _) = engine(&fast(config(&dir), &url, true));

        engine.shoot().await.unwrap();
        assert!(engine.relay().await.is_err());

        // One automatic attempt, then the manual attempts
        assert_eq!(hits.load(Ordering::SeqCst), 3);
        assert_eq!(engine.session().relay_status(), &RelayStatus::Error("Sync failed: Unavailable".to_string()));
    }

    #[test]
    fn test_superseded_relay_outcome_is_dropped() {
        let dir = tempdir().unwrap();
        let (mut engine, _, cues) = engine(&config(&dir));
        let epoch = engine.session().machine.epoch();
        let failure = || Err(TransportError::Network { reason: "late".to_string() });

        engine.relay_seq = 2;
        engine.set_relay_status(RelayStatus::Success);

        assert!(engine.finish_relay(RelayOutcome { epoch, seq: 1, result: failure() }).is_none());
        assert_eq!(engine.session().relay_status(), &RelayStatus::Success);

        assert!(engine.finish_relay(RelayOutcome { epoch: epoch + 1, seq: 2, result: failure() }).is_none());
        assert_eq!(engine.session().relay_status(), &RelayStatus::Success);

        engine.finish_relay(RelayOutcome { epoch, seq: 2, result: failure() });
        assert!(matches!(engine.session().relay_status(), RelayStatus::Error(_)));
        assert!(cues.0.borrow().is_empty());
    }
}
