//! # Audio Cues
//!
//! Short feedback sounds for the countdown, the shutter and a successful
//! relay. Cues are logged by default; the `sound` feature plays them as sine
//! tones through `rodio`.

pub mod cues;

pub use cues::{Cue, CuePlayer, LogCues};

#[cfg(feature = "sound")]
pub use cues::ToneCues;
