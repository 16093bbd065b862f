//! # Folio Preview
//!
//! Renders frames of a backdrop preset to PNG files.
//!
//! Usage: `folio-preview <preset> [frames] [out_dir] [width] [height]`

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

use anyhow::Result;
use folio_tools::{render_preview, PreviewOptions};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Main entry point.
fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("folio=info".parse()?))
        .init();

    let options = PreviewOptions::from_args(std::env::args().skip(1))?;
    let written = render_preview(&options)?;

    if let Some(last) = written.last() {
        info!("Last frame: {}", last.display());
    }
    Ok(())
}
