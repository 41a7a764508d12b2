//! # Asset Cache
//!
//! Preloads frame, background and sticker images into ready-to-draw buffers,
//! keyed by their catalog reference, with explicit pending/ready/failed state.

mod cache;
mod loader;

pub use cache::{AssetCache, AssetState};
pub use loader::{decode, AssetLoader};
