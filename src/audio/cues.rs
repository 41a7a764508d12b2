use std::fmt;
use std::time::Duration;

use tracing::{debug, info};

/// Audible feedback points of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cue {
    /// Countdown tick above zero
    Beep,
    /// Photo taken
    Shutter,
    /// Strip relayed
    Success,
}

impl Cue {
    /// Tone sequence as (frequency Hz, duration)
    pub fn tones(&self) -> &'static [(f32, Duration)] {
        const BEEP: [(f32, Duration); 1] = [(880.0, Duration::from_millis(120))];
        const SHUTTER: [(f32, Duration); 2] = [
            (1400.0, Duration::from_millis(40)),
            (700.0, Duration::from_millis(60)),
        ];
        const SUCCESS: [(f32, Duration); 3] = [
            (523.25, Duration::from_millis(110)),
            (659.25, Duration::from_millis(110)),
            (783.99, Duration::from_millis(180)),
        ];

        match self {
            Cue::Beep => &BEEP,
            Cue::Shutter => &SHUTTER,
            Cue::Success => &SUCCESS,
        }
    }
}

impl fmt::Display for Cue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cue::Beep => f.write_str("beep"),
            Cue::Shutter => f.write_str("shutter"),
            Cue::Success => f.write_str("success"),
        }
    }
}

/// Something that can play cues
///
/// Playback must not block the caller.
pub trait CuePlayer {
    fn play(&mut self, cue: Cue);
}

/// Records cues in the log instead of playing them
#[derive(Debug, Default)]
pub struct LogCues {
    played: Vec<Cue>,
}

impl LogCues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every cue played so far
    pub fn played(&self) -> &[Cue] {
        &self.played
    }
}

impl CuePlayer for LogCues {
    fn play(&mut self, cue: Cue) {
        match cue {
            Cue::Success => info!("🔔 {}", cue),
            _ => debug!("🔔 {}", cue),
        }
        self.played.push(cue);
    }
}

#[cfg(feature = "sound")]
pub use tone::ToneCues;

#[cfg(feature = "sound")]
mod tone {
    use rodio::{source::SineWave, OutputStream, OutputStreamHandle, Source};
    use tracing::warn;

    use super::{Cue, CuePlayer};
    use crate::error::{BoothError, Result};

    /// Sine-tone cues on the default output device
    pub struct ToneCues {
        // Dropping the stream silences the device
        _stream: OutputStream,
        handle: OutputStreamHandle,
    }

    impl ToneCues {
        pub fn new() -> Result<Self> {
            let (stream, handle) = OutputStream::try_default()
                .map_err(|e| BoothError::generic(format!("No audio output: {}", e)))?;
            Ok(Self { _stream: stream, handle })
        }
    }

    impl CuePlayer for ToneCues {
        fn play(&mut self, cue: Cue) {
            let mut delay = std::time::Duration::ZERO;
            for &(frequency, duration) in cue.tones() {
                let tone = SineWave::new(frequency)
                    .take_duration(duration)
                    .amplify(0.2)
                    .delay(delay);
                if let Err(e) = self.handle.play_raw(tone) {
                    warn!("Failed to play {} cue: {}", cue, e);
                    return;
                }
                delay += duration;
            }
        }
    }
}
