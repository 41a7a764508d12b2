//! # Session
//!
//! Everything one booth visit accumulates: the captured photos, the current
//! decoration choices, the selected effect and the relay status.

use std::fmt;

use chrono::{DateTime, Utc};
use image::RgbaImage;

use crate::capture::CaptureMachine;
use crate::catalog::{BackgroundOption, FrameOption, StickerOption};
use crate::compositor::Scene;
use crate::config::CaptureConfig;
use crate::error::CaptureError;
use crate::media::VideoFrame;
use crate::stickers::StickerStyle;

/// One composed capture
#[derive(Debug, Clone)]
pub struct CapturedPhoto {
    /// `<unix millis>-<ordinal>`
    id: String,
    taken_at: DateTime<Utc>,
    /// Composed image as shown to the user at capture time
    pub image: RgbaImage,
    /// Raw frame the image was composed from
    pub source: VideoFrame,
}

impl CapturedPhoto {
    pub fn new(ordinal: usize, taken_at: DateTime<Utc>, image: RgbaImage, source: VideoFrame) -> Self {
        Self { id: format!("{}-{}", taken_at.timestamp_millis(), ordinal), taken_at, image, source }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// Ordered photos of a session, capped at the target count
#[derive(Debug, Clone)]
pub struct PhotoSet {
    photos: Vec<CapturedPhoto>,
    target: usize,
}

impl PhotoSet {
    pub fn new(target: usize) -> Self {
        Self { photos: Vec::with_capacity(target), target }
    }

    /// Append in capture order; refused once the target is reached
    pub fn push(&mut self, photo: CapturedPhoto) -> Result<usize, CaptureError> {
        if self.is_full() {
            return Err(CaptureError::SetFull { target: self.target });
        }
        self.photos.push(photo);
        Ok(self.photos.len())
    }

    pub fn is_full(&self) -> bool {
        self.photos.len() >= self.target
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    pub fn target(&self) -> usize {
        self.target
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CapturedPhoto> {
        self.photos.iter()
    }

    pub fn as_slice(&self) -> &[CapturedPhoto] {
        &self.photos
    }

    /// Drop every buffer
    pub fn clear(&mut self) {
        self.photos.clear();
        self.photos.shrink_to_fit();
    }
}

/// Outcome of the most recent relay, as shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RelayStatus {
    #[default]
    Idle,
    Syncing,
    Success,
    Error(String),
}

impl fmt::Display for RelayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayStatus::Idle => f.write_str("idle"),
            RelayStatus::Syncing => f.write_str("syncing"),
            RelayStatus::Success => f.write_str("success"),
            RelayStatus::Error(reason) => write!(f, "error: {}", reason),
        }
    }
}

/// State of one booth visit
#[derive(Debug)]
pub struct Session {
    pub photos: PhotoSet,
    pub machine: CaptureMachine,
    frame: Option<FrameOption>,
    background: Option<BackgroundOption>,
    stickers: Vec<StickerOption>,
    style: StickerStyle,
    effect: String,
    relay_status: RelayStatus,
    auto_relayed: bool,
}

impl Session {
    pub fn new(config: &CaptureConfig) -> Self {
        Self {
            photos: PhotoSet::new(config.target_photos as usize),
            machine: CaptureMachine::new(config),
            frame: None,
            background: None,
            stickers: Vec::new(),
            style: StickerStyle::default(),
            effect: "none".to_string(),
            relay_status: RelayStatus::Idle,
            auto_relayed: false,
        }
    }

    /// Current decoration choices as a render scene
    pub fn scene(&self) -> Scene<'_> {
        Scene {
            background: self.background.as_ref(),
            frame: self.frame.as_ref(),
            stickers: &self.stickers,
            style: self.style,
        }
    }

    pub fn frame(&self) -> Option<&FrameOption> {
        self.frame.as_ref()
    }

    pub fn set_frame(&mut self, frame: Option<FrameOption>) {
        self.frame = frame;
    }

    pub fn background(&self) -> Option<&BackgroundOption> {
        self.background.as_ref()
    }

    pub fn set_background(&mut self, background: Option<BackgroundOption>) {
        self.background = background;
    }

    pub fn stickers(&self) -> &[StickerOption] {
        &self.stickers
    }

    /// Add a sticker at the end; returns false if its id is already active
    pub fn add_sticker(&mut self, sticker: StickerOption) -> bool {
        if self.stickers.iter().any(|s| s.id == sticker.id) {
            return false;
        }
        self.stickers.push(sticker);
        true
    }

    /// Remove a sticker by id; the remaining order is kept
    pub fn remove_sticker(&mut self, id: &str) -> bool {
        let before = self.stickers.len();
        self.stickers.retain(|s| s.id != id);
        self.stickers.len() != before
    }

    /// Add the sticker if absent, remove it if present
    pub fn toggle_sticker(&mut self, sticker: StickerOption) -> bool {
        if self.remove_sticker(&sticker.id) {
            false
        } else {
            self.add_sticker(sticker)
        }
    }

    pub fn style(&self) -> StickerStyle {
        self.style
    }

    pub fn set_style(&mut self, style: StickerStyle) {
        self.style = style;
    }

    pub fn effect(&self) -> &str {
        &self.effect
    }

    pub fn set_effect(&mut self, effect: impl Into<String>) {
        self.effect = effect.into();
    }

    pub fn relay_status(&self) -> &RelayStatus {
        &self.relay_status
    }

    pub fn set_relay_status(&mut self, status: RelayStatus) {
        self.relay_status = status;
    }

    /// Claim the single automatic relay of this session
    ///
    /// Returns true exactly once between resets.
    pub fn claim_auto_relay(&mut self) -> bool {
        if self.auto_relayed {
            return false;
        }
        self.auto_relayed = true;
        true
    }

    /// Drop photos and relay state; decoration choices are kept
    pub fn clear(&mut self) {
        self.photos.clear();
        self.relay_status = RelayStatus::Idle;
        self.auto_relayed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn photo(ordinal: usize) -> CapturedPhoto {
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        CapturedPhoto::new(ordinal, at, RgbaImage::new(4, 3), VideoFrame::new_filled(4, 3, [0, 0, 0]))
    }

    fn sticker(id: &str) -> StickerOption {
        StickerOption { id: id.to_string(), image: format!("{}.png", id), name: id.to_string() }
    }

    #[test]
    fn test_photo_id_format() {
        assert_eq!(photo(2).id(), "1700000000123-2");
    }

    #[test]
    fn test_photo_set_caps_at_target() {
        let mut set = PhotoSet::new(2);
        assert_eq!(set.push(photo(1)).unwrap(), 1);
        assert_eq!(set.push(photo(2)).unwrap(), 2);
        assert!(set.is_full());
        assert_eq!(set.push(photo(3)), Err(CaptureError::SetFull { target: 2 }));
        assert_eq!(set.len(), 2);
        assert_eq!(set.as_slice()[1].id(), "1700000000123-2");
    }

    #[test]
    fn test_stickers_are_an_ordered_set() {
        let mut session = Session::new(&CaptureConfig::default());
        assert!(session.add_sticker(sticker("heart")));
        assert!(session.add_sticker(sticker("star")));
        assert!(!session.add_sticker(sticker("heart")));
        assert!(session.add_sticker(sticker("kiss")));

        let ids: Vec<&str> = session.stickers().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["heart", "star", "kiss"]);

        assert!(!session.toggle_sticker(sticker("star")));
        let ids: Vec<&str> = session.stickers().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["heart", "kiss"]);
        assert_eq!(session.scene().stickers.len(), 2);
    }

    #[test]
    fn test_auto_relay_latch_resets_with_session() {
        let mut session = Session::new(&CaptureConfig::default());
        assert!(session.claim_auto_relay());
        assert!(!session.claim_auto_relay());

        session.set_relay_status(RelayStatus::Error("offline".to_string()));
        session.clear();
        assert_eq!(session.relay_status(), &RelayStatus::Idle);
        assert!(session.claim_auto_relay());
    }
}
