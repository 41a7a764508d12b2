//! # Booth Engine
//!
//! Ties the capture machine to a media source, the compositor, the export
//! pipeline and the cue player. The engine runs on a single task: timers,
//! control requests and background relay results are multiplexed in one
//! `select!` loop.

pub mod engine;

pub use engine::{BoothEngine, BoothEvent, Control};
