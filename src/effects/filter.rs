//! # Filter Primitives
//!
//! Color filter primitives with CSS filter semantics. The color-matrix
//! coefficients follow W3C Filter Effects Module Level 1; ops apply in order
//! with clamping after every step.

use image::{imageops, RgbaImage};

/// Image width that CSS lengths (blur radius) are expressed against
pub const REFERENCE_WIDTH: f32 = 248.0;

/// One filter primitive
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterOp {
    /// Multiply every channel (1.0 = unchanged)
    Brightness(f32),
    /// Scale distance from mid-grey (1.0 = unchanged)
    Contrast(f32),
    /// Saturation factor (1.0 = unchanged, 0.0 = grey)
    Saturate(f32),
    /// Sepia amount 0..1
    Sepia(f32),
    /// Grayscale amount 0..1
    Grayscale(f32),
    /// Hue rotation in degrees
    HueRotate(f32),
    /// Gaussian blur radius in reference-width pixels
    Blur(f32),
}

type Matrix = [[f32; 3]; 3];

impl FilterOp {
    pub fn is_identity(&self) -> bool {
        match *self {
            FilterOp::Brightness(a) | FilterOp::Contrast(a) | FilterOp::Saturate(a) => a == 1.0,
            FilterOp::Sepia(a) | FilterOp::Grayscale(a) => a <= 0.0,
            FilterOp::HueRotate(deg) => deg % 360.0 == 0.0,
            FilterOp::Blur(r) => r <= 0.0,
        }
    }

    /// Per-pixel form of this op; `None` for neighbourhood ops
    fn pixel_fn(&self) -> Option<PixelOp> {
        let op = match *self {
            FilterOp::Brightness(a) => PixelOp::Linear { slope: a, intercept: 0.0 },
            FilterOp::Contrast(a) => PixelOp::Linear { slope: a, intercept: 0.5 - 0.5 * a },
            FilterOp::Saturate(s) => PixelOp::Matrix(saturate_matrix(s.max(0.0))),
            FilterOp::Grayscale(a) => PixelOp::Matrix(grayscale_matrix(a.clamp(0.0, 1.0))),
            FilterOp::Sepia(a) => PixelOp::Matrix(sepia_matrix(a.clamp(0.0, 1.0))),
            FilterOp::HueRotate(deg) => PixelOp::Matrix(hue_rotate_matrix(deg)),
            FilterOp::Blur(_) => return None,
        };
        Some(op)
    }
}

#[derive(Debug, Clone, Copy)]
enum PixelOp {
    Linear { slope: f32, intercept: f32 },
    Matrix(Matrix),
}

impl PixelOp {
    fn apply(&self, c: [f32; 3]) -> [f32; 3] {
        let out = match self {
            PixelOp::Linear { slope, intercept } => c.map(|v| v * slope + intercept),
            PixelOp::Matrix(m) => [
                m[0][0] * c[0] + m[0][1] * c[1] + m[0][2] * c[2],
                m[1][0] * c[0] + m[1][1] * c[1] + m[1][2] * c[2],
                m[2][0] * c[0] + m[2][1] * c[1] + m[2][2] * c[2],
            ],
        };
        out.map(|v| v.clamp(0.0, 1.0))
    }
}

fn saturate_matrix(s: f32) -> Matrix {
    [
        [0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s],
    ]
}

fn grayscale_matrix(amount: f32) -> Matrix {
    let s = 1.0 - amount;
    [
        [0.2126 + 0.7874 * s, 0.7152 - 0.7152 * s, 0.0722 - 0.0722 * s],
        [0.2126 - 0.2126 * s, 0.7152 + 0.2848 * s, 0.0722 - 0.0722 * s],
        [0.2126 - 0.2126 * s, 0.7152 - 0.7152 * s, 0.0722 + 0.9278 * s],
    ]
}

fn sepia_matrix(amount: f32) -> Matrix {
    let s = 1.0 - amount;
    [
        [0.393 + 0.607 * s, 0.769 - 0.769 * s, 0.189 - 0.189 * s],
        [0.349 - 0.349 * s, 0.686 + 0.314 * s, 0.168 - 0.168 * s],
        [0.272 - 0.272 * s, 0.534 - 0.534 * s, 0.131 + 0.869 * s],
    ]
}

fn hue_rotate_matrix(degrees: f32) -> Matrix {
    let (sin, cos) = degrees.to_radians().sin_cos();
    [
        [
            0.213 + cos * 0.787 - sin * 0.213,
            0.715 - cos * 0.715 - sin * 0.715,
            0.072 - cos * 0.072 + sin * 0.928,
        ],
        [
            0.213 - cos * 0.213 + sin * 0.143,
            0.715 + cos * 0.285 + sin * 0.140,
            0.072 - cos * 0.072 - sin * 0.283,
        ],
        [
            0.213 - cos * 0.213 - sin * 0.787,
            0.715 - cos * 0.715 + sin * 0.715,
            0.072 + cos * 0.928 + sin * 0.072,
        ],
    ]
}

/// Apply a filter chain in order
///
/// Consecutive per-pixel ops are fused into one pass; blur flushes the run.
pub fn apply_chain(image: &mut RgbaImage, ops: &[FilterOp]) {
    let mut run: Vec<PixelOp> = Vec::new();

    for op in ops.iter().filter(|op| !op.is_identity()) {
        match op.pixel_fn() {
            Some(pixel_op) => run.push(pixel_op),
            None => {
                apply_pixel_run(image, &run);
                run.clear();
                if let FilterOp::Blur(radius) = op {
                    apply_blur(image, *radius);
                }
            }
        }
    }
    apply_pixel_run(image, &run);
}

fn apply_pixel_run(image: &mut RgbaImage, run: &[PixelOp]) {
    if run.is_empty() {
        return;
    }
    for pixel in image.pixels_mut() {
        let mut c = [pixel[0] as f32 / 255.0, pixel[1] as f32 / 255.0, pixel[2] as f32 / 255.0];
        for op in run {
            c = op.apply(c);
        }
        for i in 0..3 {
            pixel[i] = (c[i] * 255.0).round() as u8;
        }
    }
}

fn apply_blur(image: &mut RgbaImage, radius: f32) {
    let sigma = radius * image.width() as f32 / REFERENCE_WIDTH;
    if sigma < 0.05 {
        return;
    }
    *image = imageops::blur(image, sigma);
}
