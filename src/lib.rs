//! # Love Booth
//!
//! A countdown photobooth: capture a burst of selfies, decorate them with
//! frames, backgrounds and stickers, and export a single photo strip.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use love_booth::{
//!     audio::LogCues,
//!     catalog::Catalog,
//!     config::Config,
//!     media::StillSource,
//!     BoothEngine,
//! };
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> anyhow::Result<()> {
//! let config = Config::default();
//! let (mut booth, _events) = BoothEngine::new(
//!     &config,
//!     Catalog::builtin(),
//!     Box::new(StillSource::test_pattern()),
//!     Box::new(LogCues::new()),
//! );
//!
//! booth.select_frame(Some("soft-pink")).await?;
//! booth.set_effect("glow")?;
//! booth.shoot().await?;
//! booth.save().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`capture`] - Countdown and capture state machine
//! - [`compositor`] - Layered rendering of one captured frame
//! - [`stickers`] - Deterministic sticker placement
//! - [`effects`] - Post-capture looks applied at export
//! - [`export`] - Strip rendering, encoding and delivery
//! - [`booth`] - Engine that runs a session end to end
//! - [`config`] - Configuration management

pub mod assets;
pub mod audio;
pub mod booth;
pub mod capture;
pub mod catalog;
pub mod compositor;
pub mod config;
pub mod effects;
pub mod error;
pub mod export;
pub mod media;
pub mod session;
pub mod stickers;

// Re-export commonly used types for convenience
pub use crate::{
    booth::{BoothEngine, BoothEvent, Control},
    catalog::Catalog,
    config::Config,
    effects::{Effect, EffectRegistry},
    error::{BoothError, Result},
    session::Session,
};
