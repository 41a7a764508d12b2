//! # Compositor
//!
//! Produces one composited image from a raw video frame and the session's
//! decoration choices. Layers, back to front: background, mirrored video,
//! frame overlay, stickers.
//!
//! Rendering is synchronous and only reads the asset cache; any asset that is
//! not ready is skipped for that render.

pub mod raster;

use image::{imageops, imageops::FilterType, Rgba, RgbaImage};
use tracing::debug;

use crate::assets::AssetCache;
use crate::catalog::{BackgroundOption, FrameOption, StickerOption, Visual};
use crate::media::VideoFrame;
use crate::stickers::{layout, StickerStyle};

/// Default opacity of the frame overlay layer
pub const DEFAULT_FRAME_OPACITY: f32 = 0.3;

/// Decoration choices for a single render
#[derive(Debug, Clone, Copy)]
pub struct Scene<'a> {
    pub background: Option<&'a BackgroundOption>,
    pub frame: Option<&'a FrameOption>,
    pub stickers: &'a [StickerOption],
    pub style: StickerStyle,
}

impl<'a> Scene<'a> {
    /// Scene with nothing but the video layer
    pub fn plain() -> Self {
        Self { background: None, frame: None, stickers: &[], style: StickerStyle::default() }
    }

    /// Asset references this scene will try to draw
    pub fn asset_references(&self) -> Vec<&'a str> {
        let mut refs: Vec<&'a str> = Vec::new();
        if let Some(asset) = self.background.and_then(|b| b.visual.asset()) {
            refs.push(asset);
        }
        if let Some(asset) = self.frame.and_then(|f| f.visual.asset()) {
            refs.push(asset);
        }
        for sticker in self.stickers {
            if !refs.contains(&sticker.image.as_str()) {
                refs.push(sticker.image.as_str());
            }
        }
        refs
    }
}

/// Layered renderer for captured frames
#[derive(Debug, Clone)]
pub struct Compositor {
    frame_opacity: f32,
}

impl Compositor {
    pub fn new(frame_opacity: f32) -> Self {
        Self { frame_opacity: frame_opacity.clamp(0.0, 1.0) }
    }

    pub fn frame_opacity(&self) -> f32 {
        self.frame_opacity
    }

    /// Render `frame` with `scene` at the frame's native size
    pub fn render(&self, frame: &VideoFrame, scene: &Scene<'_>, assets: &AssetCache) -> RgbaImage {
        let (width, height) = frame.dimensions();
        let mut canvas = RgbaImage::new(width, height);

        if let Some(background) = scene.background {
            draw_visual(&mut canvas, &background.visual, assets, 1.0, false);
        }

        draw_mirrored_video(&mut canvas, frame);

        if let Some(overlay) = scene.frame {
            draw_visual(&mut canvas, &overlay.visual, assets, self.frame_opacity, true);
        }

        draw_stickers(&mut canvas, scene, assets);
        canvas
    }
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_OPACITY)
    }
}

/// Draw a frame or background visual
///
/// Overlays always tile their texture; backgrounds tile only when `repeat` is set.
pub(crate) fn draw_visual(canvas: &mut RgbaImage, visual: &Visual, assets: &AssetCache, opacity: f32, overlay: bool) {
    match visual {
        Visual::Color(color) => raster::fill(canvas, *color, opacity),
        Visual::Texture { source, repeat } => match assets.get(source) {
            Ok(texture) if *repeat || overlay => raster::tile(canvas, texture, opacity),
            Ok(texture) => {
                let covered = raster::cover(texture, canvas.width(), canvas.height());
                raster::draw_at(canvas, &covered, 0, 0, opacity);
            }
            Err(e) => debug!("Skipping texture layer: {}", e),
        },
    }
}

/// Mirror the frame horizontally and stretch it over the whole canvas
fn draw_mirrored_video(canvas: &mut RgbaImage, frame: &VideoFrame) {
    let (width, height) = canvas.dimensions();
    let source = frame.as_image();

    let mut mirrored = imageops::flip_horizontal(source);
    if mirrored.dimensions() != (width, height) {
        mirrored = imageops::resize(&mirrored, width, height, FilterType::Triangle);
    }

    for (x, y, pixel) in mirrored.enumerate_pixels() {
        let [r, g, b] = pixel.0;
        raster::blend_over(canvas.get_pixel_mut(x, y), Rgba([r, g, b, 255]), 1.0);
    }
}

fn draw_stickers(canvas: &mut RgbaImage, scene: &Scene<'_>, assets: &AssetCache) {
    let (width, height) = canvas.dimensions();

    for (index, sticker) in scene.stickers.iter().enumerate() {
        let image = match assets.get(&sticker.image) {
            Ok(image) => image,
            Err(e) => {
                debug!("Skipping sticker {}: {}", sticker.id, e);
                continue;
            }
        };

        for placement in layout(index, scene.style, width, height) {
            let Some(sprite) = raster::fit_longest_side(image, placement.size) else {
                continue;
            };
            let resolved = placement.resolve(width, height, sprite.width() as f32, sprite.height() as f32);
            raster::draw_rotated(canvas, &sprite, resolved.center_x, resolved.center_y, resolved.rotation);
        }
    }
}
