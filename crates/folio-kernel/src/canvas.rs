//! 2D drawing surface abstraction.
//!
//! `Canvas` is the small subset of a browser 2D context the backdrops use.
//! `DrawList` records calls so a web host can replay them on a real context.

use folio_common::CanvasSize;
use glam::Vec2;
use serde::Serialize;

use crate::particle::Rgba;

/// A 2D drawing surface.
pub trait Canvas {
    /// Current surface size.
    fn size(&self) -> CanvasSize;

    /// Changes the surface size. Contents are discarded.
    fn resize(&mut self, size: CanvasSize);

    /// Wipes the surface to transparent.
    fn clear(&mut self);

    /// Alpha-blends `color` over the whole surface.
    fn fill_all(&mut self, color: Rgba);

    /// Fills a circle.
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba);

    /// Strokes a straight line.
    fn stroke_line(&mut self, from: Vec2, to: Vec2, width: f32, color: Rgba);
}

/// One recorded drawing call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    /// `clearRect` over the full surface.
    Clear,
    /// Full-surface `fillRect` with alpha.
    FillAll {
        /// Fill color.
        color: Rgba,
    },
    /// `arc` + `fill`.
    Circle {
        /// Center point.
        center: Vec2,
        /// Radius.
        radius: f32,
        /// Fill color.
        color: Rgba,
    },
    /// `moveTo` + `lineTo` + `stroke`.
    Line {
        /// Start point.
        from: Vec2,
        /// End point.
        to: Vec2,
        /// Stroke width.
        width: f32,
        /// Stroke color.
        color: Rgba,
    },
}

/// Canvas that records draw commands instead of rasterizing.
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    size: CanvasSize,
    commands: Vec<DrawCommand>,
}

impl DrawList {
    /// Creates an empty list for a surface of `size`.
    #[must_use]
    pub fn new(size: CanvasSize) -> Self {
        Self {
            size,
            commands: Vec::new(),
        }
    }

    /// Recorded commands, oldest first.
    #[must_use]
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Takes the recorded commands, leaving the list empty.
    pub fn take(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Number of recorded commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Checks if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Number of recorded circles.
    #[must_use]
    pub fn circle_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Circle { .. }))
            .count()
    }

    /// Number of recorded lines.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Line { .. }))
            .count()
    }
}

impl Canvas for DrawList {
    fn size(&self) -> CanvasSize {
        self.size
    }

    fn resize(&mut self, size: CanvasSize) {
        self.size = size;
        self.commands.clear();
    }

    fn clear(&mut self) {
        self.commands.push(DrawCommand::Clear);
    }

    fn fill_all(&mut self, color: Rgba) {
        self.commands.push(DrawCommand::FillAll { color });
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
        self.commands.push(DrawCommand::Circle {
            center,
            radius,
            color,
        });
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, width: f32, color: Rgba) {
        self.commands.push(DrawCommand::Line {
            from,
            to,
            width,
            color,
        });
    }
}
