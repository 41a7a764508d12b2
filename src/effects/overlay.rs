use image::RgbaImage;

use crate::compositor::raster;
use crate::effects::filter::REFERENCE_WIDTH;

/// Decoration drawn on top of a filtered photo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    /// Faint pink wash in overlay blend mode
    Rose,
    /// Three small light dots
    Sparkle,
    /// Two pink/white dots
    CupidSparkle,
    /// Two translucent hearts
    Hearts,
}

/// Distance along one axis, in reference-width pixels or as a fraction
#[derive(Debug, Clone, Copy)]
enum Offset {
    /// From the left/top edge
    Start(f32),
    /// From the right/bottom edge
    End(f32),
    /// Fraction of the side
    Fraction(f32),
}

#[derive(Debug, Clone, Copy)]
enum Shape {
    Dot,
    /// Heart rotated by the given degrees
    Heart(f32),
}

#[derive(Debug, Clone, Copy)]
struct Mark {
    x: Offset,
    y: Offset,
    size: f32,
    color: [u8; 4],
    shape: Shape,
}

const ROSE: [u8; 3] = [236, 72, 153];
const ROSE_OPACITY: f32 = 0.1;
const HEARTS_OPACITY: f32 = 0.4;

const SPARKLE: [Mark; 3] = [
    Mark { x: Offset::Start(16.0), y: Offset::Start(8.0), size: 4.0, color: [255, 255, 255, 255], shape: Shape::Dot },
    Mark { x: Offset::End(32.0), y: Offset::Start(40.0), size: 6.0, color: [254, 249, 195, 255], shape: Shape::Dot },
    Mark { x: Offset::Start(40.0), y: Offset::End(24.0), size: 4.0, color: [255, 255, 255, 255], shape: Shape::Dot },
];

const CUPID_SPARKLE: [Mark; 2] = [
    Mark { x: Offset::Fraction(0.25), y: Offset::Start(16.0), size: 6.0, color: [251, 207, 232, 255], shape: Shape::Dot },
    Mark { x: Offset::Fraction(1.0 / 3.0), y: Offset::Fraction(0.75), size: 6.0, color: [255, 255, 255, 255], shape: Shape::Dot },
];

const HEARTS: [Mark; 2] = [
    Mark { x: Offset::Start(8.0), y: Offset::Start(8.0), size: 12.0, color: [220, 20, 60, 255], shape: Shape::Heart(0.0) },
    Mark { x: Offset::End(24.0), y: Offset::End(16.0), size: 14.0, color: [255, 105, 180, 255], shape: Shape::Heart(12.0) },
];

impl Overlay {
    pub fn apply(&self, image: &mut RgbaImage) {
        match self {
            Overlay::Rose => overlay_blend(image, ROSE, ROSE_OPACITY),
            Overlay::Sparkle => draw_marks(image, &SPARKLE, 1.0),
            Overlay::CupidSparkle => draw_marks(image, &CUPID_SPARKLE, 1.0),
            Overlay::Hearts => draw_marks(image, &HEARTS, HEARTS_OPACITY),
        }
    }
}

/// Photoshop-style "overlay" blend of a flat color, mixed in at `opacity`
fn overlay_blend(image: &mut RgbaImage, color: [u8; 3], opacity: f32) {
    for pixel in image.pixels_mut() {
        for i in 0..3 {
            let b = pixel[i] as f32 / 255.0;
            let s = color[i] as f32 / 255.0;
            let blended = if b <= 0.5 { 2.0 * b * s } else { 1.0 - 2.0 * (1.0 - b) * (1.0 - s) };
            let out = b + (blended - b) * opacity;
            pixel[i] = (out * 255.0).round().clamp(0.0, 255.0) as u8;
        }
    }
}

fn draw_marks(image: &mut RgbaImage, marks: &[Mark], opacity: f32) {
    let (width, height) = (image.width() as f32, image.height() as f32);
    let unit = width / REFERENCE_WIDTH;

    let resolve = |offset: Offset, side: f32, size: f32| match offset {
        Offset::Start(px) => px * unit + size / 2.0,
        Offset::End(px) => side - px * unit - size / 2.0,
        Offset::Fraction(f) => f * side + size / 2.0,
    };

    for mark in marks {
        let size = (mark.size * unit).max(1.0);
        let cx = resolve(mark.x, width, size);
        let cy = resolve(mark.y, height, size);
        match mark.shape {
            Shape::Dot => raster::fill_circle(image, cx, cy, size / 2.0, mark.color, opacity),
            Shape::Heart(rotation) => raster::fill_heart(image, cx, cy, size, rotation, mark.color, opacity),
        }
    }
}
