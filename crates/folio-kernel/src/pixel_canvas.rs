//! Software RGBA rasterizer.
//!
//! Implements `Canvas` with straight-alpha source-over blending on an RGBA8
//! buffer. Used by the preview tool and by tests that need to inspect pixels.

use folio_common::CanvasSize;
use glam::Vec2;

use crate::canvas::Canvas;
use crate::particle::Rgba;

/// Fully transparent pixel.
const TRANSPARENT: [u8; 4] = [0, 0, 0, 0];

/// Largest width or height a canvas is allocated with.
pub const MAX_DIMENSION: u32 = 8192;

/// RGBA8 pixel buffer that can be drawn on like a 2D context.
#[derive(Debug, Clone)]
pub struct PixelCanvas {
    width: u32,
    height: u32,
    pixels: Vec<[u8; 4]>,
}

impl PixelCanvas {
    /// Creates a transparent canvas. Each side is clamped to
    /// `1..=MAX_DIMENSION`.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let width = width.clamp(1, MAX_DIMENSION);
        let height = height.clamp(1, MAX_DIMENSION);
        Self {
            width,
            height,
            pixels: vec![TRANSPARENT; width as usize * height as usize],
        }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Reads one pixel. Out-of-range coordinates return transparent.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        if x >= self.width || y >= self.height {
            return TRANSPARENT;
        }
        self.pixels[self.index(x, y)]
    }

    /// Raw RGBA8 bytes, row-major.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Number of pixels with non-zero alpha.
    #[must_use]
    pub fn lit_pixels(&self) -> usize {
        self.pixels.iter().filter(|p| p[3] > 0).count()
    }

    fn blend(&mut self, x: i64, y: i64, color: Rgba) {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return;
        }
        let index = self.index(x as u32, y as u32);
        self.pixels[index] = source_over(self.pixels[index], color);
    }

    /// Pixel range covering `[lo, hi]` on one axis, clipped to the surface.
    fn span(lo: f32, hi: f32, limit: u32) -> (i64, i64) {
        let start = (lo.floor() as i64).max(0);
        let end = (hi.ceil() as i64).min(i64::from(limit) - 1);
        (start, end)
    }
}

impl Canvas for PixelCanvas {
    fn size(&self) -> CanvasSize {
        CanvasSize::from_pixels(self.width, self.height)
    }

    fn resize(&mut self, size: CanvasSize) {
        let width = size.pixel_width().clamp(1, MAX_DIMENSION);
        let height = size.pixel_height().clamp(1, MAX_DIMENSION);
        if (width, height) != (self.width, self.height) {
            *self = Self::new(width, height);
        }
    }

    fn clear(&mut self) {
        self.pixels.fill(TRANSPARENT);
    }

    fn fill_all(&mut self, color: Rgba) {
        for pixel in &mut self.pixels {
            *pixel = source_over(*pixel, color);
        }
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
        if radius.is_nan() || radius <= 0.0 || !center.is_finite() {
            return;
        }
        let (x0, x1) = Self::span(center.x - radius, center.x + radius, self.width);
        let (y0, y1) = Self::span(center.y - radius, center.y + radius, self.height);

        let radius_sq = radius * radius;
        let mut hit = false;
        for y in y0..=y1 {
            for x in x0..=x1 {
                let pixel_center = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                if pixel_center.distance_squared(center) <= radius_sq {
                    self.blend(x, y, color);
                    hit = true;
                }
            }
        }

        // Sub-pixel dots still cover the pixel they sit in.
        if !hit {
            self.blend(center.x.floor() as i64, center.y.floor() as i64, color);
        }
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, width: f32, color: Rgba) {
        if !from.is_finite() || !to.is_finite() {
            return;
        }
        let half = (width * 0.5).max(0.5);
        let (x0, x1) = Self::span(from.x.min(to.x) - half, from.x.max(to.x) + half, self.width);
        let (y0, y1) = Self::span(from.y.min(to.y) - half, from.y.max(to.y) + half, self.height);

        for y in y0..=y1 {
            for x in x0..=x1 {
                let pixel_center = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                if distance_to_segment(pixel_center, from, to) <= half {
                    self.blend(x, y, color);
                }
            }
        }
    }
}

/// Straight-alpha source-over of `src` onto `dst`.
fn source_over(dst: [u8; 4], src: Rgba) -> [u8; 4] {
    let src_alpha = src[3].clamp(0.0, 1.0);
    if src_alpha <= 0.0 {
        return dst;
    }
    let dst_alpha = f32::from(dst[3]) / 255.0;
    let out_alpha = src_alpha + dst_alpha * (1.0 - src_alpha);

    let mut out = [0u8; 4];
    for channel in 0..3 {
        let s = src[channel].clamp(0.0, 1.0);
        let d = f32::from(dst[channel]) / 255.0;
        let value = (s * src_alpha + d * dst_alpha * (1.0 - src_alpha)) / out_alpha;
        out[channel] = to_byte(value);
    }
    out[3] = to_byte(out_alpha);
    out
}

fn to_byte(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn distance_to_segment(point: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let length_sq = ab.length_squared();
    if length_sq <= f32::EPSILON {
        return point.distance(a);
    }
    let t = ((point - a).dot(ab) / length_sq).clamp(0.0, 1.0);
    point.distance(a + ab * t)
}
