//! # Folio Tools
//!
//! Development tools for the Folio backdrops.
//!
//! This crate provides:
//! - Offline rendering of any preset to PNG frames (`preview`)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod preview;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::preview::*;
}

pub use prelude::*;
