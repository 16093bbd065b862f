//! # Folio Kernel
//!
//! Particle field engine behind every animated backdrop on the site.
//!
//! This crate provides:
//! - A single parameterized particle field (`ParticleField`)
//! - Strategy parameters for count, boundary, interaction, life and drawing
//! - A 2D canvas abstraction with a recording and a software implementation
//! - The per-frame loop that bridges a field to its host runtime
//! - Named presets for each backdrop on the site
//! - Device tier detection and event throttling
//!
//! ## Frame Model
//!
//! Every field is a leaf: it owns its canvas, its particle pool and its frame
//! request handle. The host calls back once per display frame; the loop steps,
//! renders and asks for the next frame. Unmounting stops asking.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod canvas;
pub mod config;
pub mod field;
pub mod frame_loop;
pub mod particle;
pub mod performance;
pub mod pixel_canvas;
pub mod presets;
pub mod render;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::canvas::*;
    pub use crate::config::*;
    pub use crate::field::*;
    pub use crate::frame_loop::*;
    pub use crate::particle::*;
    pub use crate::performance::*;
    pub use crate::pixel_canvas::*;
    pub use crate::presets::*;
    pub use crate::render::*;
}

pub use prelude::*;
