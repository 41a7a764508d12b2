use image::{Rgba, RgbaImage};
use rayon::prelude::*;
use tracing::debug;

use crate::assets::AssetCache;
use crate::compositor::{draw_visual, raster, Compositor, Scene};
use crate::effects::Effect;
use crate::error::{ExportError, Result};
use crate::session::CapturedPhoto;

const WHITE: [u8; 4] = [255, 255, 255, 255];
const DIVIDER: [u8; 4] = [249, 168, 212, 77];
const EMBLEM: [u8; 4] = [236, 72, 153, 255];

/// Strip geometry in layout units (multiplied by the pixel ratio)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StripLayout {
    pub width: u32,
    pub border: u32,
    pub padding: u32,
    /// White mat around each photo
    pub mat: u32,
    /// Vertical gap between slots and before the footer
    pub gap: u32,
    pub footer_height: u32,
    pub divider: u32,
    pub pixel_ratio: u32,
}

impl StripLayout {
    pub fn new(pixel_ratio: u32) -> Self {
        Self {
            width: 320,
            border: 10,
            padding: 20,
            mat: 6,
            gap: 16,
            footer_height: 60,
            divider: 2,
            pixel_ratio: pixel_ratio.max(1),
        }
    }

    fn px(&self, units: u32) -> u32 {
        units * self.pixel_ratio
    }

    /// Outer size of one 4:3 slot, mat included
    pub fn slot_size(&self) -> (u32, u32) {
        let width = self.px(self.width - 2 * self.border - 2 * self.padding);
        (width, width * 3 / 4)
    }

    /// Photo area inside the mat
    pub fn photo_size(&self) -> (u32, u32) {
        let (w, h) = self.slot_size();
        let mat = self.px(self.mat);
        (w - 2 * mat, h - 2 * mat)
    }

    /// Pixel size of a strip holding `photos` photos
    pub fn canvas_size(&self, photos: usize) -> (u32, u32) {
        let (_, slot_h) = self.slot_size();
        let n = photos as u32;
        let height = self.px(2 * self.border + 2 * self.padding + self.footer_height)
            + n * slot_h
            + n * self.px(self.gap);
        (self.px(self.width), height)
    }

    /// Top-left corner of slot `index`
    fn slot_origin(&self, index: usize) -> (u32, u32) {
        let (_, slot_h) = self.slot_size();
        let x = self.px(self.border + self.padding);
        let y = self.px(self.border + self.padding) + index as u32 * (slot_h + self.px(self.gap));
        (x, y)
    }
}

impl Default for StripLayout {
    fn default() -> Self {
        Self::new(2)
    }
}

/// Assembles captured photos into a vertical strip
#[derive(Debug, Clone)]
pub struct StripRenderer {
    layout: StripLayout,
}

impl StripRenderer {
    pub fn new(layout: StripLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &StripLayout {
        &self.layout
    }

    /// Re-render, grade and place every photo
    ///
    /// Each photo is composed again from its source frame with `scene`, then
    /// `effect` is applied. Photos are processed in parallel.
    pub fn render(
        &self,
        photos: &[CapturedPhoto],
        scene: &Scene<'_>,
        compositor: &Compositor,
        assets: &AssetCache,
        effect: &dyn Effect,
    ) -> Result<RgbaImage> {
        if photos.is_empty() {
            return Err(ExportError::NothingToExport.into());
        }

        let (photo_w, photo_h) = self.layout.photo_size();
        let graded: Vec<RgbaImage> = photos
            .par_iter()
            .map(|photo| -> Result<RgbaImage> {
                let mut image = compositor.render(&photo.source, scene, assets);
                if !effect.is_identity() {
                    effect.apply(&mut image)?;
                }
                Ok(raster::cover(&image, photo_w, photo_h))
            })
            .collect::<Result<Vec<_>>>()?;

        let (width, height) = self.layout.canvas_size(photos.len());
        debug!("Strip {}x{} with {} photos, effect {}", width, height, photos.len(), effect.id());
        let mut canvas = RgbaImage::from_pixel(width, height, Rgba(WHITE));

        self.draw_chrome(&mut canvas, scene, assets);

        let mat = self.layout.px(self.layout.mat);
        let (slot_w, slot_h) = self.layout.slot_size();
        for (index, image) in graded.iter().enumerate() {
            let (x, y) = self.layout.slot_origin(index);
            raster::fill_rect(&mut canvas, x as i64, y as i64, slot_w, slot_h, WHITE);
            raster::draw_at(&mut canvas, image, (x + mat) as i64, (y + mat) as i64, 1.0);
        }

        self.draw_footer(&mut canvas);
        Ok(canvas)
    }

    /// Accent border plus the frame visual as the strip background
    fn draw_chrome(&self, canvas: &mut RgbaImage, scene: &Scene<'_>, assets: &AssetCache) {
        let (width, height) = canvas.dimensions();
        let border = self.layout.px(self.layout.border);

        let Some(frame) = scene.frame else {
            return;
        };
        raster::fill(canvas, frame.accent, 1.0);

        let inner_w = width.saturating_sub(2 * border);
        let inner_h = height.saturating_sub(2 * border);
        let mut inner = RgbaImage::from_pixel(inner_w, inner_h, Rgba(WHITE));
        draw_visual(&mut inner, &frame.visual, assets, 1.0, false);
        raster::draw_at(canvas, &inner, border as i64, border as i64, 1.0);
    }

    /// Dashed divider and a small heart emblem
    fn draw_footer(&self, canvas: &mut RgbaImage) {
        let l = &self.layout;
        let (width, height) = canvas.dimensions();
        let footer_top = height - l.px(l.border + l.padding + l.footer_height);
        let left = l.px(l.border + l.padding);
        let right = width - left;

        let dash = l.px(6);
        let space = l.px(4);
        let mut x = left;
        while x < right {
            let len = dash.min(right - x);
            raster::fill_rect(canvas, x as i64, footer_top as i64, len, l.px(l.divider), DIVIDER);
            x += dash + space;
        }

        let emblem = l.px(18) as f32;
        let cy = footer_top as f32 + l.px(l.footer_height) as f32 / 2.0;
        raster::fill_heart(canvas, width as f32 / 2.0, cy, emblem, 0.0, EMBLEM, 1.0);
    }
}

impl Default for StripRenderer {
    fn default() -> Self {
        Self::new(StripLayout::default())
    }
}
