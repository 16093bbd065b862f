//! Canvas-space geometry.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Size of a drawing surface in canvas pixels.
///
/// Both dimensions are at least 1.0; smaller inputs are clamped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasSize {
    /// Width in pixels
    pub width: f32,
    /// Height in pixels
    pub height: f32,
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self::new(1280.0, 720.0)
    }
}

impl CanvasSize {
    /// Creates a canvas size, clamping each side to at least one pixel.
    #[must_use]
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: sanitize(width),
            height: sanitize(height),
        }
    }

    /// Creates a canvas size from integer pixel dimensions.
    #[must_use]
    pub fn from_pixels(width: u32, height: u32) -> Self {
        Self::new(width as f32, height as f32)
    }

    /// Width rounded to whole pixels.
    #[must_use]
    pub fn pixel_width(&self) -> u32 {
        self.width.round().max(1.0) as u32
    }

    /// Height rounded to whole pixels.
    #[must_use]
    pub fn pixel_height(&self) -> u32 {
        self.height.round().max(1.0) as u32
    }

    /// Surface area in square pixels.
    #[must_use]
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Center point of the surface.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }

    /// Checks if a point lies within `[0, width] x [0, height]` (edges inclusive).
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= 0.0 && point.x <= self.width && point.y >= 0.0 && point.y <= self.height
    }

    /// Clamps a point into the surface bounds.
    #[must_use]
    pub fn clamp(&self, point: Vec2) -> Vec2 {
        Vec2::new(point.x.clamp(0.0, self.width), point.y.clamp(0.0, self.height))
    }
}

fn sanitize(value: f32) -> f32 {
    if value.is_finite() {
        value.max(1.0)
    } else {
        1.0
    }
}
