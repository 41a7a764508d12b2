use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Default sticker size as a fraction of the canvas's shorter side
pub const DEFAULT_SCALE: f32 = 0.15;

const BORDER_SCALE: f32 = 0.10;
const CHAOS_ITERATIONS: u64 = 6;

/// Placement algorithm shared by every active sticker in a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StickerStyle {
    #[default]
    Single,
    Burst,
    Chaos,
    Border,
    Corners,
}

impl StickerStyle {
    pub const ALL: [StickerStyle; 5] = [
        StickerStyle::Single,
        StickerStyle::Burst,
        StickerStyle::Chaos,
        StickerStyle::Border,
        StickerStyle::Corners,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            StickerStyle::Single => "single",
            StickerStyle::Burst => "burst",
            StickerStyle::Chaos => "chaos",
            StickerStyle::Border => "border",
            StickerStyle::Corners => "corners",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            StickerStyle::Single => "One sticker per decal, rotating through seven anchors",
            StickerStyle::Burst => "Every decal stamped at all seven anchors",
            StickerStyle::Chaos => "Six seeded scatter positions with rotation",
            StickerStyle::Border => "Sixteen small decals tracing the edges",
            StickerStyle::Corners => "Three decals clustered in each corner",
        }
    }
}

impl fmt::Display for StickerStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StickerStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StickerStyle::ALL
            .into_iter()
            .find(|style| style.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown sticker style '{}'", s))
    }
}

/// Horizontal anchor: which sticker edge the fraction of canvas width is measured to
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HorizontalAnchor {
    Left(f32),
    Right(f32),
    Center(f32),
}

/// Vertical anchor: which sticker edge the fraction of canvas height is measured to
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VerticalAnchor {
    Top(f32),
    Bottom(f32),
    Center(f32),
}

/// One sticker stamp produced by the layout engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub horizontal: HorizontalAnchor,
    pub vertical: VerticalAnchor,
    /// Fraction of the canvas's shorter side
    pub scale: f32,
    /// Clockwise rotation in degrees
    pub rotation: f32,
    /// Sticker box size in pixels (`scale` times the shorter side)
    pub size: f32,
}

/// Placement converted to canvas pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedPlacement {
    pub center_x: f32,
    pub center_y: f32,
    pub width: f32,
    pub height: f32,
    pub rotation: f32,
}

impl Placement {
    /// Resolve the anchors for a sticker box of `width` x `height` pixels
    pub fn resolve(&self, canvas_width: u32, canvas_height: u32, width: f32, height: f32) -> ResolvedPlacement {
        let cw = canvas_width as f32;
        let ch = canvas_height as f32;

        let center_x = match self.horizontal {
            HorizontalAnchor::Left(f) => f * cw + width / 2.0,
            HorizontalAnchor::Right(f) => cw - f * cw - width / 2.0,
            HorizontalAnchor::Center(f) => f * cw,
        };
        let center_y = match self.vertical {
            VerticalAnchor::Top(f) => f * ch + height / 2.0,
            VerticalAnchor::Bottom(f) => ch - f * ch - height / 2.0,
            VerticalAnchor::Center(f) => f * ch,
        };

        ResolvedPlacement { center_x, center_y, width, height, rotation: self.rotation }
    }
}

use HorizontalAnchor as H;
use VerticalAnchor as V;

/// Anchor table: bottom-left, top-right, top-left, bottom-right, top-center, mid-left, mid-right
const ANCHORS: [(HorizontalAnchor, VerticalAnchor, f32); 7] = [
    (H::Left(0.05), V::Bottom(0.05), -12.0),
    (H::Right(0.05), V::Top(0.05), 12.0),
    (H::Left(0.05), V::Top(0.05), -8.0),
    (H::Right(0.05), V::Bottom(0.05), 8.0),
    (H::Center(0.5), V::Top(0.03), 0.0),
    (H::Left(0.03), V::Center(0.5), -5.0),
    (H::Right(0.03), V::Center(0.5), 5.0),
];

const EDGE_INSET: f32 = 0.02;
const EDGE_STOPS: [f32; 3] = [0.25, 0.5, 0.75];

/// Per-corner cluster: (horizontal offset, vertical offset, scale, rotation)
const CORNER_CLUSTER: [(f32, f32, f32, f32); 3] = [
    (0.02, 0.02, 0.12, -15.0),
    (0.14, 0.04, 0.08, 20.0),
    (0.04, 0.14, 0.08, -25.0),
];

/// Expand sticker number `sticker_index` into its placements for the given style
///
/// The output order is the draw order.
pub fn layout(sticker_index: usize, style: StickerStyle, canvas_width: u32, canvas_height: u32) -> Vec<Placement> {
    let shorter = canvas_width.min(canvas_height) as f32;
    let place = |horizontal, vertical, scale: f32, rotation: f32| Placement {
        horizontal,
        vertical,
        scale,
        rotation,
        size: scale * shorter,
    };

    match style {
        StickerStyle::Single => {
            let (h, v, rotation) = ANCHORS[sticker_index % ANCHORS.len()];
            vec![place(h, v, DEFAULT_SCALE, rotation)]
        }
        StickerStyle::Burst => ANCHORS
            .iter()
            .map(|&(h, v, rotation)| place(h, v, DEFAULT_SCALE, rotation))
            .collect(),
        StickerStyle::Chaos => (0..CHAOS_ITERATIONS)
            .map(|iteration| {
                let seed = (sticker_index as u64 + 1) * (iteration + 1);
                let top = ((seed * 17) % 80 + 5) as f32 / 100.0;
                let left = ((seed * 23) % 80 + 5) as f32 / 100.0;
                let rotation = ((seed * 45) % 360) as f32;
                let scale = 0.08 + (seed % 5) as f32 * 0.02;
                place(H::Left(left), V::Top(top), scale, rotation)
            })
            .collect(),
        StickerStyle::Border => {
            let edge_positions = || {
                std::iter::once(H::Left(EDGE_INSET))
                    .chain(EDGE_STOPS.iter().map(|&f| H::Center(f)))
                    .chain(std::iter::once(H::Right(EDGE_INSET)))
            };

            let top = edge_positions().map(|h| (h, V::Top(EDGE_INSET)));
            let bottom = edge_positions().map(|h| (h, V::Bottom(EDGE_INSET)));
            let left = EDGE_STOPS.iter().map(|&f| (H::Left(EDGE_INSET), V::Center(f)));
            let right = EDGE_STOPS.iter().map(|&f| (H::Right(EDGE_INSET), V::Center(f)));

            top.chain(bottom)
                .chain(left)
                .chain(right)
                .enumerate()
                .map(|(i, (h, v))| {
                    let rotation = if i % 2 == 0 { -10.0 } else { 10.0 };
                    place(h, v, BORDER_SCALE, rotation)
                })
                .collect()
        }
        StickerStyle::Corners => {
            let mut placements = Vec::with_capacity(12);
            for (mirror_x, mirror_y) in [(false, false), (true, false), (false, true), (true, true)] {
                for &(dx, dy, scale, rotation) in &CORNER_CLUSTER {
                    let h = if mirror_x { H::Right(dx) } else { H::Left(dx) };
                    let v = if mirror_y { V::Bottom(dy) } else { V::Top(dy) };
                    let rotation = if mirror_x != mirror_y { -rotation } else { rotation };
                    placements.push(place(h, v, scale, rotation));
                }
            }
            placements
        }
    }
}
