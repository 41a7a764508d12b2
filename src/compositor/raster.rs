//! Pixel-level drawing primitives used by the compositor and the strip renderer.
//!
//! All buffers are straight-alpha RGBA8.

use image::{imageops, imageops::FilterType, Rgba, RgbaImage};

/// Source-over blend of `src` onto `dst` with an extra opacity factor
pub fn blend_over(dst: &mut Rgba<u8>, src: Rgba<u8>, opacity: f32) {
    let sa = (src[3] as f32 / 255.0) * opacity.clamp(0.0, 1.0);
    if sa <= 0.0 {
        return;
    }
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        *dst = Rgba([0, 0, 0, 0]);
        return;
    }

    for i in 0..3 {
        let sc = src[i] as f32;
        let dc = dst[i] as f32;
        let c = (sc * sa + dc * da * (1.0 - sa)) / out_a;
        dst[i] = c.round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}

/// Fill every pixel with `color`, blended over what is there
pub fn fill(canvas: &mut RgbaImage, color: [u8; 4], opacity: f32) {
    for pixel in canvas.pixels_mut() {
        blend_over(pixel, Rgba(color), opacity);
    }
}

/// Fill a rectangle with an opaque or translucent color
pub fn fill_rect(canvas: &mut RgbaImage, x: i64, y: i64, width: u32, height: u32, color: [u8; 4]) {
    let (cw, ch) = (canvas.width() as i64, canvas.height() as i64);
    let x0 = x.clamp(0, cw);
    let y0 = y.clamp(0, ch);
    let x1 = (x + width as i64).clamp(0, cw);
    let y1 = (y + height as i64).clamp(0, ch);

    for py in y0..y1 {
        for px in x0..x1 {
            blend_over(canvas.get_pixel_mut(px as u32, py as u32), Rgba(color), 1.0);
        }
    }
}

/// Filled circle, used for overlay dots
pub fn fill_circle(canvas: &mut RgbaImage, cx: f32, cy: f32, radius: f32, color: [u8; 4], opacity: f32) {
    let x0 = (cx - radius).floor().max(0.0) as u32;
    let y0 = (cy - radius).floor().max(0.0) as u32;
    let x1 = ((cx + radius).ceil().max(0.0) as u32).min(canvas.width());
    let y1 = ((cy + radius).ceil().max(0.0) as u32).min(canvas.height());

    for y in y0..y1 {
        for x in x0..x1 {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            if dx * dx + dy * dy <= radius * radius {
                blend_over(canvas.get_pixel_mut(x, y), Rgba(color), opacity);
            }
        }
    }
}

/// Filled heart of roughly `size` pixels, rotated clockwise by `degrees`
pub fn fill_heart(canvas: &mut RgbaImage, cx: f32, cy: f32, size: f32, degrees: f32, color: [u8; 4], opacity: f32) {
    // Implicit curve (x² + y² - 1)³ - x²y³ <= 0 spans about 2.3 units across
    let unit = size / 2.3;
    if unit <= 0.0 {
        return;
    }
    let (sin, cos) = degrees.to_radians().sin_cos();
    let reach = size * 0.75;
    let x0 = (cx - reach).floor().max(0.0) as u32;
    let y0 = (cy - reach).floor().max(0.0) as u32;
    let x1 = ((cx + reach).ceil().max(0.0) as u32).min(canvas.width());
    let y1 = ((cy + reach).ceil().max(0.0) as u32).min(canvas.height());

    for y in y0..y1 {
        for x in x0..x1 {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            let u = (dx * cos + dy * sin) / unit;
            let v = -(-dx * sin + dy * cos) / unit + 0.1;
            let r = u * u + v * v - 1.0;
            if r * r * r - u * u * v * v * v <= 0.0 {
                blend_over(canvas.get_pixel_mut(x, y), Rgba(color), opacity);
            }
        }
    }
}

/// Repeat `texture` across the whole canvas starting at the origin
pub fn tile(canvas: &mut RgbaImage, texture: &RgbaImage, opacity: f32) {
    let (tw, th) = texture.dimensions();
    if tw == 0 || th == 0 {
        return;
    }
    for (x, y, pixel) in canvas.enumerate_pixels_mut() {
        blend_over(pixel, *texture.get_pixel(x % tw, y % th), opacity);
    }
}

/// Scale `image` uniformly so it covers `width` x `height`, cropping the overflow around the center
pub fn cover(image: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    let (iw, ih) = image.dimensions();
    if iw == 0 || ih == 0 || width == 0 || height == 0 {
        return RgbaImage::new(width, height);
    }

    let scale = (width as f32 / iw as f32).max(height as f32 / ih as f32);
    let sw = ((iw as f32 * scale).ceil() as u32).max(width);
    let sh = ((ih as f32 * scale).ceil() as u32).max(height);
    let scaled = if (sw, sh) == (iw, ih) {
        image.clone()
    } else {
        imageops::resize(image, sw, sh, FilterType::Triangle)
    };

    let ox = (sw - width) / 2;
    let oy = (sh - height) / 2;
    imageops::crop_imm(&scaled, ox, oy, width, height).to_image()
}

/// Blend `image` onto the canvas with its top-left corner at (`x`, `y`)
pub fn draw_at(canvas: &mut RgbaImage, image: &RgbaImage, x: i64, y: i64, opacity: f32) {
    let (cw, ch) = (canvas.width() as i64, canvas.height() as i64);
    for (ix, iy, src) in image.enumerate_pixels() {
        let px = x + ix as i64;
        let py = y + iy as i64;
        if px < 0 || py < 0 || px >= cw || py >= ch {
            continue;
        }
        blend_over(canvas.get_pixel_mut(px as u32, py as u32), *src, opacity);
    }
}

/// Draw `sprite` rotated by `degrees` (clockwise) about its own center, centered at (`cx`, `cy`)
///
/// Destination pixels are inverse-mapped into the sprite and bilinearly sampled.
pub fn draw_rotated(canvas: &mut RgbaImage, sprite: &RgbaImage, cx: f32, cy: f32, degrees: f32) {
    let (sw, sh) = sprite.dimensions();
    if sw == 0 || sh == 0 {
        return;
    }

    let theta = degrees.to_radians();
    let (sin, cos) = theta.sin_cos();
    let half_w = sw as f32 / 2.0;
    let half_h = sh as f32 / 2.0;

    // Axis-aligned bounds of the rotated sprite
    let extent_x = half_w * cos.abs() + half_h * sin.abs();
    let extent_y = half_w * sin.abs() + half_h * cos.abs();
    let x0 = (cx - extent_x).floor().max(0.0) as u32;
    let y0 = (cy - extent_y).floor().max(0.0) as u32;
    let x1 = ((cx + extent_x).ceil().max(0.0) as u32).min(canvas.width());
    let y1 = ((cy + extent_y).ceil().max(0.0) as u32).min(canvas.height());

    for y in y0..y1 {
        for x in x0..x1 {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            // Inverse rotation back into sprite space
            let sx = dx * cos + dy * sin + half_w;
            let sy = -dx * sin + dy * cos + half_h;
            if let Some(src) = sample_bilinear(sprite, sx, sy) {
                blend_over(canvas.get_pixel_mut(x, y), src, 1.0);
            }
        }
    }
}

/// Bilinear sample at continuous coordinates (pixel centers at +0.5); `None` outside the image
fn sample_bilinear(image: &RgbaImage, x: f32, y: f32) -> Option<Rgba<u8>> {
    let (w, h) = image.dimensions();
    if x < 0.0 || y < 0.0 || x >= w as f32 || y >= h as f32 {
        return None;
    }

    let fx = (x - 0.5).max(0.0);
    let fy = (y - 0.5).max(0.0);
    let ix = (fx.floor() as u32).min(w - 1);
    let iy = (fy.floor() as u32).min(h - 1);
    let ix1 = (ix + 1).min(w - 1);
    let iy1 = (iy + 1).min(h - 1);
    let tx = fx - ix as f32;
    let ty = fy - iy as f32;

    let p00 = image.get_pixel(ix, iy);
    let p10 = image.get_pixel(ix1, iy);
    let p01 = image.get_pixel(ix, iy1);
    let p11 = image.get_pixel(ix1, iy1);

    // Interpolate premultiplied values so transparent texels do not bleed color
    let mut premul = [0.0f32; 4];
    for (p, weight) in [
        (p00, (1.0 - tx) * (1.0 - ty)),
        (p10, tx * (1.0 - ty)),
        (p01, (1.0 - tx) * ty),
        (p11, tx * ty),
    ] {
        let a = p[3] as f32 / 255.0;
        for i in 0..3 {
            premul[i] += p[i] as f32 * a * weight;
        }
        premul[3] += a * weight;
    }

    if premul[3] <= 0.0 {
        return Some(Rgba([0, 0, 0, 0]));
    }
    let mut out = [0u8; 4];
    for i in 0..3 {
        out[i] = (premul[i] / premul[3]).round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (premul[3] * 255.0).round().clamp(0.0, 255.0) as u8;
    Some(Rgba(out))
}

/// Resize `image` so its longer side equals `size`, keeping aspect ratio
pub fn fit_longest_side(image: &RgbaImage, size: f32) -> Option<RgbaImage> {
    let (w, h) = image.dimensions();
    let longest = w.max(h);
    if longest == 0 || size < 1.0 {
        return None;
    }
    let scale = size / longest as f32;
    let nw = ((w as f32 * scale).round() as u32).max(1);
    let nh = ((h as f32 * scale).round() as u32).max(1);
    Some(imageops::resize(image, nw, nh, FilterType::Triangle))
}
