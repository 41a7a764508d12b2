//! # Photo Effect System
//!
//! Post-capture looks applied to every photo of a strip at export time.
//! Each effect is a chain of CSS-style filter primitives, optionally
//! followed by a decorative overlay.
//!
//! ## Built-in Effects
//!
//! - **Dreamy** (`glow`): brighter, softer, slightly blurred
//! - **Cupid** (`kiss`), **Rose Tint**, **Passion**: warm pink grades
//! - **Vintage**, **Noir**, **Warm Glow**: classic print looks
//! - **Hearts**, **Sparkle**, **Cupid Sparkle**: overlays on a light grade
//!
//! ## Usage
//!
//! ```rust,no_run
//! use love_booth::effects::{Effect, EffectRegistry};
//!
//! let registry = EffectRegistry::new();
//! let noir = registry.get("noir").unwrap();
//!
//! let mut photo = image::RgbaImage::new(640, 480);
//! noir.apply(&mut photo).unwrap();
//! ```

pub mod filter;
pub mod overlay;
pub mod preset;
pub mod registry;
pub mod traits;

pub use filter::{apply_chain, FilterOp};
pub use overlay::Overlay;
pub use preset::FilterEffect;
pub use registry::EffectRegistry;
pub use traits::Effect;
