//! Strategy parameters for a particle field.
//!
//! Every backdrop on the site is one `FieldConfig` value; the engine itself
//! has no per-backdrop code.

use folio_common::CanvasSize;
use serde::{Deserialize, Serialize};

use crate::particle::Rgba;

/// Hard cap on the pool size, bursts included.
pub const MAX_FIELD_PARTICLES: usize = 2048;

/// How many particles a field keeps alive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParticleCount {
    /// Fixed pool size.
    Fixed {
        /// Number of particles.
        count: usize,
    },
    /// One particle per `area_per_particle` square pixels, capped at `max`.
    ByArea {
        /// Square pixels per particle.
        area_per_particle: f32,
        /// Upper bound.
        max: usize,
    },
}

impl Default for ParticleCount {
    fn default() -> Self {
        Self::Fixed { count: 25 }
    }
}

impl ParticleCount {
    /// Resolves the target pool size for a canvas.
    #[must_use]
    pub fn resolve(&self, size: CanvasSize) -> usize {
        let count = match *self {
            Self::Fixed { count } => count,
            Self::ByArea {
                area_per_particle,
                max,
            } => {
                let per = area_per_particle.max(1.0);
                ((size.area() / per).floor() as usize).min(max)
            },
        };
        count.min(MAX_FIELD_PARTICLES)
    }
}

/// What happens when a particle crosses a canvas edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BoundaryPolicy {
    /// Flip the velocity component, scale it by `restitution`, clamp into bounds.
    Reflect {
        /// Speed kept after a bounce (1.0 = perfectly elastic).
        restitution: f32,
    },
    /// Teleport to the opposite edge.
    Wrap,
}

impl Default for BoundaryPolicy {
    fn default() -> Self {
        Self::Reflect { restitution: 1.0 }
    }
}

/// Direction of the pointer force.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionMode {
    /// Pull particles toward the pointer.
    Attract,
    /// Push particles away from the pointer.
    #[default]
    Repel,
}

impl InteractionMode {
    /// Returns the opposite mode.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Attract => Self::Repel,
            Self::Repel => Self::Attract,
        }
    }
}

/// Radius and strength of a pointer force.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerForce {
    /// Interaction radius in pixels.
    pub radius: f32,
    /// Impulse at zero distance, in pixels per frame.
    pub strength: f32,
}

/// Pointer interaction settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    /// Initial mode.
    pub mode: InteractionMode,
    /// Force while the pointer hovers.
    pub force: PointerForce,
    /// Force while the pointer is pressed, if different.
    #[serde(default)]
    pub pressed: Option<PointerForce>,
    /// Whether the host may toggle attract/repel (space bar on the site).
    #[serde(default)]
    pub togglable: bool,
}

/// How particle life is modelled.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LifeModel {
    /// Particles never die.
    #[default]
    Immortal,
    /// Particles spawn with life in `[min, max]` and lose `decay` per frame.
    Finite {
        /// Minimum initial life, in frames.
        min: f32,
        /// Maximum initial life, in frames.
        max: f32,
        /// Life lost per frame.
        decay: f32,
    },
}

/// Initial velocity distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpawnVelocity {
    /// Each component uniform in `[-max_speed, max_speed]`.
    Uniform {
        /// Per-axis speed bound.
        max_speed: f32,
    },
    /// Random heading with speed uniform in `[min_speed, max_speed]`.
    Radial {
        /// Minimum speed.
        min_speed: f32,
        /// Maximum speed.
        max_speed: f32,
    },
}

impl Default for SpawnVelocity {
    fn default() -> Self {
        Self::Uniform { max_speed: 0.2 }
    }
}

/// Shape used to draw each particle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawStyle {
    /// Filled circle.
    #[default]
    Dot,
    /// Short line along the velocity with a bright core.
    Streak,
}

/// What happens to the previous frame before drawing.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Background {
    /// Wipe to transparent.
    #[default]
    Clear,
    /// Paint a translucent fill so old frames leave trails.
    Fade {
        /// Fill color (alpha ignored).
        color: Rgba,
        /// Fill opacity.
        alpha: f32,
    },
}

/// Constellation lines between nearby particles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Connections {
    /// Particles closer than this are linked.
    pub max_distance: f32,
    /// Line alpha at zero distance.
    pub max_alpha: f32,
    /// Chance per particle per frame of drawing its links.
    pub probability: f32,
    /// Draw at most one link (to the nearest neighbour) per sampled particle.
    pub nearest_only: bool,
    /// Line width in pixels.
    pub line_width: f32,
    /// Fixed line color, alpha ignored. `None` draws links in the particle's
    /// own color, its alpha included.
    #[serde(default)]
    pub color: Option<Rgba>,
}

/// Particles spawned radially from a pointer press.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Burst {
    /// Particles per press.
    pub count: usize,
    /// Minimum outward speed.
    pub min_speed: f32,
    /// Maximum outward speed.
    pub max_speed: f32,
    /// Size range of burst particles.
    pub size: (f32, f32),
}

/// What a field does with its pool when the canvas is resized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeBehavior {
    /// Throw the pool away and seed a new one.
    #[default]
    Reseed,
    /// Keep particles, clamp them into the new bounds and top up or trim.
    Keep,
}

/// Throttle windows for host events, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventThrottle {
    /// Minimum gap between pointer-move updates.
    pub pointer_ms: u64,
    /// Minimum gap between resize updates.
    pub resize_ms: u64,
}

/// Complete parameter set for one particle field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// Pool size.
    pub count: ParticleCount,
    /// Edge behavior.
    pub boundary: BoundaryPolicy,
    /// Pointer force, if any.
    pub interaction: Option<Interaction>,
    /// Velocity multiplier per frame, in (0, 1].
    pub damping: f32,
    /// Life model.
    pub life: LifeModel,
    /// Initial velocity distribution.
    pub spawn: SpawnVelocity,
    /// Size range.
    pub size: (f32, f32),
    /// Colors new particles pick from.
    pub palette: Vec<Rgba>,
    /// Particle shape.
    pub draw: DrawStyle,
    /// Frame clearing.
    pub background: Background,
    /// Constellation lines.
    pub connections: Option<Connections>,
    /// Press bursts.
    pub burst: Option<Burst>,
    /// Resize handling.
    pub on_resize: ResizeBehavior,
    /// Host event throttling.
    pub event_throttle: Option<EventThrottle>,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            count: ParticleCount::default(),
            boundary: BoundaryPolicy::default(),
            interaction: None,
            damping: 1.0,
            life: LifeModel::Immortal,
            spawn: SpawnVelocity::default(),
            size: (2.0, 2.0),
            palette: vec![[1.0, 1.0, 1.0, 1.0]],
            draw: DrawStyle::Dot,
            background: Background::Clear,
            connections: None,
            burst: None,
            on_resize: ResizeBehavior::Reseed,
            event_throttle: None,
        }
    }
}

impl FieldConfig {
    /// Clamps every parameter into its usable range.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        self.damping = clamp_or(self.damping, f32::EPSILON, 1.0, 1.0);

        if let BoundaryPolicy::Reflect { restitution } = &mut self.boundary {
            *restitution = clamp_or(*restitution, 0.0, 1.0, 1.0);
        }

        if let Some(interaction) = &mut self.interaction {
            sanitize_force(&mut interaction.force);
            if let Some(pressed) = &mut interaction.pressed {
                sanitize_force(pressed);
            }
        }

        if let LifeModel::Finite { min, max, decay } = &mut self.life {
            *min = clamp_or(*min, f32::EPSILON, f32::MAX, 1.0);
            *max = clamp_or(*max, *min, f32::MAX, *min);
            *decay = clamp_or(*decay, f32::EPSILON, f32::MAX, 1.0);
        }

        match &mut self.spawn {
            SpawnVelocity::Uniform { max_speed } => {
                *max_speed = clamp_or(*max_speed, 0.0, f32::MAX, 0.0);
            },
            SpawnVelocity::Radial {
                min_speed,
                max_speed,
            } => {
                *min_speed = clamp_or(*min_speed, 0.0, f32::MAX, 0.0);
                *max_speed = clamp_or(*max_speed, *min_speed, f32::MAX, *min_speed);
            },
        }

        self.size = sanitize_range(self.size);

        if self.palette.is_empty() {
            self.palette.push([1.0, 1.0, 1.0, 1.0]);
        }

        if let Some(connections) = &mut self.connections {
            connections.max_distance = clamp_or(connections.max_distance, 0.0, f32::MAX, 0.0);
            connections.max_alpha = clamp_or(connections.max_alpha, 0.0, 1.0, 0.0);
            connections.probability = clamp_or(connections.probability, 0.0, 1.0, 0.0);
            connections.line_width = clamp_or(connections.line_width, 0.1, 16.0, 1.0);
        }

        if let Some(burst) = &mut self.burst {
            burst.min_speed = clamp_or(burst.min_speed, 0.0, f32::MAX, 0.0);
            burst.max_speed = clamp_or(burst.max_speed, burst.min_speed, f32::MAX, burst.min_speed);
            burst.size = sanitize_range(burst.size);
        }

        self
    }

    /// Checks whether the field reacts to pointer presses.
    #[must_use]
    pub fn wants_press_events(&self) -> bool {
        self.burst.is_some()
            || self
                .interaction
                .is_some_and(|interaction| interaction.pressed.is_some())
    }
}

fn sanitize_force(force: &mut PointerForce) {
    force.radius = clamp_or(force.radius, f32::EPSILON, f32::MAX, 1.0);
    force.strength = clamp_or(force.strength, 0.0, f32::MAX, 0.0);
}

fn sanitize_range((min, max): (f32, f32)) -> (f32, f32) {
    let min = clamp_or(min, 0.0, f32::MAX, 1.0);
    let max = clamp_or(max, min, f32::MAX, min);
    (min, max)
}

fn clamp_or(value: f32, lo: f32, hi: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(lo, hi)
    } else {
        fallback
    }
}
