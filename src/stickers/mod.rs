//! # Sticker Layout Engine
//!
//! Expands one active sticker into the placements drawn by the compositor.
//! Layouts are pure functions of `(sticker index, style, canvas size)`; the
//! `chaos` style is a seeded formula rather than a random generator so that
//! every render of the same session is reproducible.
//!
//! ## Styles
//!
//! - **single**: one anchor, chosen by sticker index
//! - **burst**: every anchor
//! - **chaos**: six seeded scatter positions with rotation
//! - **border**: sixteen small stickers tracing the edges
//! - **corners**: three stickers clustered in each corner

pub mod layout;

pub use layout::{
    layout, HorizontalAnchor, Placement, ResolvedPlacement, StickerStyle, VerticalAnchor,
    DEFAULT_SCALE,
};
