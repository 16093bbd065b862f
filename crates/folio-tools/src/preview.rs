//! Offline preset previews.
//!
//! Runs a preset through the real frame loop on the software rasterizer and
//! writes each frame as a PNG, so backdrops can be checked without a browser.
//! A synthetic pointer circles the canvas center and presses once, so
//! interaction and bursts show up in the output.

use std::f32::consts::TAU;
use std::path::{Path, PathBuf};
use std::time::Duration;

use folio_common::CanvasSize;
use folio_kernel::{
    DeviceProfile, FieldLoop, ManualHost, ParticleField, PixelCanvas, Preset, UnknownPreset,
    MAX_DIMENSION,
};
use glam::Vec2;
use image::{ImageFormat, RgbaImage};
use thiserror::Error;
use tracing::{debug, info};

/// Usage line for the preview binary.
pub const USAGE: &str = "folio-preview <preset> [frames] [out_dir] [width] [height]";

/// Simulated time between frames.
const FRAME_TIME: Duration = Duration::from_millis(16);

/// Frame on which the synthetic pointer presses.
const PRESS_FRAME: u32 = 10;

/// Preview errors.
#[derive(Debug, Error)]
pub enum PreviewError {
    /// Missing or malformed command-line argument
    #[error("Invalid argument {name}: {reason}\nusage: {USAGE}")]
    Argument {
        /// Argument name
        name: &'static str,
        /// What was wrong
        reason: String,
    },

    /// Preset name not recognized
    #[error(transparent)]
    Preset(#[from] UnknownPreset),

    /// Pixel buffer did not match the image size
    #[error("Pixel buffer does not match {width}x{height}")]
    Buffer {
        /// Image width
        width: u32,
        /// Image height
        height: u32,
    },

    /// PNG encoding failed
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Output directory could not be created
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// What to render and where.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewOptions {
    /// Preset to render
    pub preset: Preset,
    /// Number of frames to write
    pub frames: u32,
    /// Output directory
    pub out_dir: PathBuf,
    /// Canvas width in pixels
    pub width: u32,
    /// Canvas height in pixels
    pub height: u32,
    /// Field seed
    pub seed: u64,
}

impl PreviewOptions {
    /// Default options for `preset`.
    #[must_use]
    pub fn new(preset: Preset) -> Self {
        Self {
            preset,
            frames: 60,
            out_dir: PathBuf::from("preview"),
            width: 800,
            height: 600,
            seed: 42,
        }
    }

    /// Parses `<preset> [frames] [out_dir] [width] [height]`.
    pub fn from_args<I, S>(args: I) -> Result<Self, PreviewError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut args = args.into_iter();
        let preset = args
            .next()
            .ok_or_else(|| PreviewError::Argument {
                name: "preset",
                reason: "missing".to_string(),
            })?
            .as_ref()
            .parse::<Preset>()?;

        let mut options = Self::new(preset);
        if let Some(frames) = args.next() {
            options.frames = parse_positive("frames", frames.as_ref(), u32::MAX)?;
        }
        if let Some(out_dir) = args.next() {
            options.out_dir = PathBuf::from(out_dir.as_ref());
        }
        if let Some(width) = args.next() {
            options.width = parse_positive("width", width.as_ref(), MAX_DIMENSION)?;
        }
        if let Some(height) = args.next() {
            options.height = parse_positive("height", height.as_ref(), MAX_DIMENSION)?;
        }
        Ok(options)
    }

    fn size(&self) -> CanvasSize {
        CanvasSize::from_pixels(self.width, self.height)
    }
}

fn parse_positive(name: &'static str, value: &str, max: u32) -> Result<u32, PreviewError> {
    match value.parse::<u32>() {
        Ok(0) => Err(PreviewError::Argument {
            name,
            reason: "must be at least 1".to_string(),
        }),
        Ok(n) if n > max => Err(PreviewError::Argument {
            name,
            reason: format!("must be at most {max}"),
        }),
        Ok(n) => Ok(n),
        Err(e) => Err(PreviewError::Argument {
            name,
            reason: format!("{value:?}: {e}"),
        }),
    }
}

/// Renders the preview and returns the written file paths, in frame order.
pub fn render_preview(options: &PreviewOptions) -> Result<Vec<PathBuf>, PreviewError> {
    std::fs::create_dir_all(&options.out_dir)?;

    let size = options.size();
    let config = options.preset.config(&DeviceProfile::default());
    let field = ParticleField::with_seed(config, options.seed);
    let mut field_loop = FieldLoop::mount_field(ManualHost::new(), field, size);
    let mut canvas = PixelCanvas::new(options.width, options.height);

    info!(
        "Rendering {} frames of {} at {}x{}",
        options.frames,
        options.preset,
        options.width,
        options.height
    );

    let mut written = Vec::with_capacity(options.frames as usize);
    for frame in 0..options.frames {
        let now = FRAME_TIME * frame;
        field_loop.on_pointer_move(pointer_at(size, frame), now);
        if frame == PRESS_FRAME {
            field_loop.on_pointer_down(pointer_at(size, frame));
        } else if frame == PRESS_FRAME + 2 {
            field_loop.on_pointer_up();
        }

        // Fire whatever the loop asked for, like a display refresh would.
        for _ in field_loop.host_mut().take_frames() {
            field_loop.on_frame(Some(&mut canvas));
        }

        let path = options.out_dir.join(format!("frame_{frame:04}.png"));
        save_png(&canvas, &path)?;
        debug!("Wrote {} ({} particles)", path.display(), field_loop.field().len());
        written.push(path);
    }

    field_loop.unmount();
    info!("Wrote {} frames to {}", written.len(), options.out_dir.display());
    Ok(written)
}

/// Synthetic pointer position for `frame`: a slow circle around the center.
fn pointer_at(size: CanvasSize, frame: u32) -> Vec2 {
    let radius = size.width.min(size.height) * 0.25;
    let angle = frame as f32 * TAU / 120.0;
    size.center() + Vec2::from_angle(angle) * radius
}

/// Encodes a canvas as PNG.
pub fn save_png(canvas: &PixelCanvas, path: &Path) -> Result<(), PreviewError> {
    let (width, height) = (canvas.width(), canvas.height());
    let image = RgbaImage::from_raw(width, height, canvas.as_bytes().to_vec())
        .ok_or(PreviewError::Buffer { width, height })?;
    image.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}
