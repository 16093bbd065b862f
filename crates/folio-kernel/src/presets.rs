//! Named field configurations, one per backdrop on the site.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::config::{
    Background, BoundaryPolicy, Burst, Connections, DrawStyle, EventThrottle, FieldConfig,
    Interaction, InteractionMode, LifeModel, ParticleCount, PointerForce, ResizeBehavior,
    SpawnVelocity,
};
use crate::particle::Rgba;
use crate::performance::{DeviceProfile, PerformanceTier};

/// A backdrop on the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Preset {
    /// Landing hero section.
    Hero,
    /// About section.
    About,
    /// Contact section.
    Contact,
    /// Skills section.
    Skills,
    /// Projects section.
    Projects,
    /// Full-page streaks drawn toward the pointer.
    Bullet,
    /// Neon constellation with press bursts.
    Cyberpunk,
    /// Lightweight overlay sized by device tier.
    OptimizedBullet,
}

/// Returned when a preset name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown preset: {0}")]
pub struct UnknownPreset(pub String);

impl Preset {
    /// Every preset, in page order.
    pub const ALL: [Self; 8] = [
        Self::Hero,
        Self::About,
        Self::Contact,
        Self::Skills,
        Self::Projects,
        Self::Bullet,
        Self::Cyberpunk,
        Self::OptimizedBullet,
    ];

    /// Stable lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Hero => "hero",
            Self::About => "about",
            Self::Contact => "contact",
            Self::Skills => "skills",
            Self::Projects => "projects",
            Self::Bullet => "bullet",
            Self::Cyberpunk => "cyberpunk",
            Self::OptimizedBullet => "optimized_bullet",
        }
    }

    /// Checks whether this is a full-page overlay rather than a section backdrop.
    #[must_use]
    pub const fn is_overlay(self) -> bool {
        matches!(self, Self::Bullet | Self::Cyberpunk | Self::OptimizedBullet)
    }

    /// Builds the field config for this preset on `device`.
    #[must_use]
    pub fn config(self, device: &DeviceProfile) -> FieldConfig {
        match self {
            Self::Hero => section(0.2, rgba(0, 200, 255, 0.5)),
            Self::About | Self::Contact | Self::Skills | Self::Projects => {
                section(0.15, rgba(56, 189, 248, 0.5))
            },
            Self::Bullet => bullet(),
            Self::Cyberpunk => cyberpunk(),
            Self::OptimizedBullet => optimized_bullet(device),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = UnknownPreset;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|preset| preset.name() == normalized)
            .ok_or_else(|| UnknownPreset(s.to_string()))
    }
}

fn rgba(r: u8, g: u8, b: u8, a: f32) -> Rgba {
    [
        f32::from(r) / 255.0,
        f32::from(g) / 255.0,
        f32::from(b) / 255.0,
        a,
    ]
}

/// Slow drifting dots behind a page section.
fn section(speed: f32, color: Rgba) -> FieldConfig {
    FieldConfig {
        count: ParticleCount::Fixed { count: 25 },
        boundary: BoundaryPolicy::Reflect { restitution: 1.0 },
        spawn: SpawnVelocity::Uniform { max_speed: speed },
        size: (2.0, 2.0),
        palette: vec![color],
        on_resize: ResizeBehavior::Reseed,
        ..Default::default()
    }
}

fn bullet() -> FieldConfig {
    FieldConfig {
        count: ParticleCount::Fixed { count: 50 },
        boundary: BoundaryPolicy::Reflect { restitution: 0.8 },
        interaction: Some(Interaction {
            mode: InteractionMode::Attract,
            force: PointerForce {
                radius: 100.0,
                strength: 0.1,
            },
            pressed: None,
            togglable: false,
        }),
        damping: 0.99,
        life: LifeModel::Finite {
            min: 60.0,
            max: 180.0,
            decay: 1.0,
        },
        spawn: SpawnVelocity::Radial {
            min_speed: 1.0,
            max_speed: 4.0,
        },
        size: (1.0, 3.0),
        palette: vec![[0.256, 0.864, 0.580, 1.0]],
        draw: DrawStyle::Streak,
        background: Background::Fade {
            color: rgba(15, 15, 30, 1.0),
            alpha: 0.1,
        },
        on_resize: ResizeBehavior::Keep,
        ..Default::default()
    }
}

fn cyberpunk() -> FieldConfig {
    FieldConfig {
        count: ParticleCount::ByArea {
            area_per_particle: 15_000.0,
            max: 100,
        },
        boundary: BoundaryPolicy::Wrap,
        interaction: Some(Interaction {
            mode: InteractionMode::Repel,
            force: PointerForce {
                radius: 150.0,
                strength: 0.5,
            },
            pressed: Some(PointerForce {
                radius: 200.0,
                strength: 1.5,
            }),
            togglable: true,
        }),
        damping: 0.99,
        life: LifeModel::Finite {
            min: 255.0,
            max: 255.0,
            decay: 0.5,
        },
        spawn: SpawnVelocity::Uniform { max_speed: 1.0 },
        size: (1.0, 4.0),
        palette: vec![
            rgba(121, 193, 167, 0.8),
            rgba(144, 212, 145, 0.8),
            rgba(79, 172, 254, 0.8),
            rgba(168, 85, 247, 0.8),
            rgba(255, 255, 255, 0.6),
        ],
        draw: DrawStyle::Dot,
        background: Background::Fade {
            color: rgba(15, 15, 30, 1.0),
            alpha: 0.05,
        },
        connections: Some(Connections {
            max_distance: 100.0,
            max_alpha: 0.3,
            probability: 1.0,
            nearest_only: false,
            line_width: 1.0,
            color: None,
        }),
        burst: Some(Burst {
            count: 20,
            min_speed: 3.0,
            max_speed: 8.0,
            size: (2.0, 6.0),
        }),
        on_resize: ResizeBehavior::Keep,
        ..Default::default()
    }
}

fn optimized_bullet(device: &DeviceProfile) -> FieldConfig {
    FieldConfig {
        count: ParticleCount::Fixed {
            count: PerformanceTier::particle_budget(device),
        },
        boundary: BoundaryPolicy::Wrap,
        damping: 1.0,
        life: LifeModel::Finite {
            min: 50.0,
            max: 150.0,
            decay: 1.0,
        },
        spawn: SpawnVelocity::Uniform { max_speed: 1.0 },
        size: (1.0, 1.0),
        palette: vec![rgba(121, 193, 167, 0.6)],
        connections: Some(Connections {
            max_distance: 100.0,
            max_alpha: 0.3,
            probability: 0.05,
            nearest_only: true,
            line_width: 0.5,
            color: Some(rgba(121, 193, 167, 1.0)),
        }),
        on_resize: ResizeBehavior::Keep,
        event_throttle: Some(EventThrottle {
            pointer_ms: 50,
            resize_ms: 250,
        }),
        ..Default::default()
    }
}
