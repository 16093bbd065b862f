//! # Folio Common
//!
//! Common types shared by the Folio crates.
//!
//! This crate provides:
//! - Canvas geometry (`CanvasSize`)
//! - ID types (`FieldId`, `ProjectId`, `DayKey`)
//! - Common error types
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod coords;
pub mod error;
pub mod ids;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::coords::*;
    pub use crate::error::*;
    pub use crate::ids::*;
}

pub use prelude::*;
