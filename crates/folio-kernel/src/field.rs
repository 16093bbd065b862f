//! The particle field engine.
//!
//! A `ParticleField` owns a pool of particles and advances it one frame per
//! `step`. All randomness comes from the field's own `fastrand::Rng`, so a
//! seeded field replays exactly.

use std::f32::consts::TAU;

use folio_common::CanvasSize;
use glam::Vec2;
use tracing::debug;

use crate::config::{
    BoundaryPolicy, FieldConfig, InteractionMode, LifeModel, PointerForce, ResizeBehavior,
    SpawnVelocity, MAX_FIELD_PARTICLES,
};
use crate::particle::{Lifetime, Particle};

/// Velocity change a pointer applies to a particle at `position`.
///
/// Zero outside `force.radius` and at the pointer itself. Inside, the impulse
/// has magnitude `strength * (radius - d) / radius` and points away from the
/// pointer when repelling, toward it when attracting.
#[must_use]
pub fn interaction_impulse(
    position: Vec2,
    pointer: Vec2,
    mode: InteractionMode,
    force: PointerForce,
) -> Vec2 {
    let offset = position - pointer;
    let distance = offset.length();
    if distance >= force.radius || distance <= f32::EPSILON {
        return Vec2::ZERO;
    }

    let falloff = (force.radius - distance) / force.radius;
    let away = offset / distance;
    let impulse = away * falloff * force.strength;
    match mode {
        InteractionMode::Repel => impulse,
        InteractionMode::Attract => -impulse,
    }
}

/// Pool of particles advanced once per display frame.
#[derive(Debug, Clone)]
pub struct ParticleField {
    config: FieldConfig,
    size: CanvasSize,
    particles: Vec<Particle>,
    target_count: usize,
    mode: InteractionMode,
    pressed: bool,
    rng: fastrand::Rng,
}

impl ParticleField {
    /// Creates an empty field seeded from system entropy.
    #[must_use]
    pub fn new(config: FieldConfig) -> Self {
        Self::with_rng(config, fastrand::Rng::new())
    }

    /// Creates an empty field with a fixed seed.
    #[must_use]
    pub fn with_seed(config: FieldConfig, seed: u64) -> Self {
        Self::with_rng(config, fastrand::Rng::with_seed(seed))
    }

    fn with_rng(config: FieldConfig, rng: fastrand::Rng) -> Self {
        let config = config.sanitized();
        let mode = config
            .interaction
            .map_or(InteractionMode::default(), |interaction| interaction.mode);
        Self {
            config,
            size: CanvasSize::default(),
            particles: Vec::new(),
            target_count: 0,
            mode,
            pressed: false,
            rng,
        }
    }

    /// Populates the pool with `count` random particles inside `size`.
    pub fn initialize(&mut self, size: CanvasSize, count: usize) {
        self.size = size;
        self.target_count = count.min(MAX_FIELD_PARTICLES);
        self.particles.clear();
        self.particles.reserve(self.target_count);
        for _ in 0..self.target_count {
            let particle = self.spawn();
            self.particles.push(particle);
        }
    }

    /// Populates the pool with the count the config resolves for `size`.
    pub fn initialize_from_config(&mut self, size: CanvasSize) {
        let count = self.config.count.resolve(size);
        self.initialize(size, count);
    }

    /// Advances every particle by one frame.
    ///
    /// Order per particle: integrate, pointer impulse, friction, boundary,
    /// life decay. Dead particles are then recycled in place, or dropped
    /// while the pool is above its target size.
    pub fn step(&mut self, pointer: Option<Vec2>) {
        let force = self.active_force();
        let mode = self.mode;
        let damping = self.config.damping;
        let boundary = self.config.boundary;
        let decay = match self.config.life {
            LifeModel::Finite { decay, .. } => decay,
            LifeModel::Immortal => 0.0,
        };
        let size = self.size;

        for particle in &mut self.particles {
            particle.position += particle.velocity;

            if let (Some(pointer), Some(force)) = (pointer, force) {
                particle.velocity += interaction_impulse(particle.position, pointer, mode, force);
            }

            particle.velocity *= damping;
            apply_boundary(particle, boundary, size);

            if let Some(life) = particle.life.as_mut() {
                life.remaining -= decay;
            }
        }

        self.recycle_dead();
    }

    /// Resizes the field according to its resize behavior.
    pub fn resize(&mut self, size: CanvasSize) {
        match self.config.on_resize {
            ResizeBehavior::Reseed => {
                debug!(
                    "Reseeding field for {}x{}",
                    size.pixel_width(),
                    size.pixel_height()
                );
                self.initialize_from_config(size);
            },
            ResizeBehavior::Keep => {
                self.size = size;
                self.target_count = self.config.count.resolve(size);
                for particle in &mut self.particles {
                    particle.position = size.clamp(particle.position);
                }
                self.particles.truncate(self.target_count);
                while self.particles.len() < self.target_count {
                    let particle = self.spawn();
                    self.particles.push(particle);
                }
            },
        }
    }

    /// Spawns the configured burst radially from `at`.
    ///
    /// Returns the number of particles added. Does nothing without a burst
    /// config or once the pool is at `MAX_FIELD_PARTICLES`.
    pub fn burst(&mut self, at: Vec2) -> usize {
        let Some(burst) = self.config.burst else {
            return 0;
        };
        let origin = self.size.clamp(at);
        let room = MAX_FIELD_PARTICLES.saturating_sub(self.particles.len());
        let count = burst.count.min(room);

        for i in 0..count {
            let angle = TAU * i as f32 / burst.count as f32;
            let speed = lerp(burst.min_speed, burst.max_speed, self.rng.f32());
            let mut particle = self.spawn();
            particle.position = origin;
            particle.velocity = Vec2::from_angle(angle) * speed;
            particle.size = lerp(burst.size.0, burst.size.1, self.rng.f32());
            self.particles.push(particle);
        }
        count
    }

    /// Marks the pointer as pressed or released.
    pub fn set_pressed(&mut self, pressed: bool) {
        self.pressed = pressed;
    }

    /// Flips attract/repel. Returns the new mode.
    pub fn toggle_mode(&mut self) -> InteractionMode {
        self.mode = self.mode.toggled();
        self.mode
    }

    /// Current interaction mode.
    #[must_use]
    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    /// Whether the pointer is currently pressed.
    #[must_use]
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// Force in effect this frame, accounting for the pressed override.
    #[must_use]
    pub fn active_force(&self) -> Option<PointerForce> {
        self.config.interaction.map(|interaction| match interaction.pressed {
            Some(pressed) if self.pressed => pressed,
            _ => interaction.force,
        })
    }

    /// The particles, in pool order.
    #[must_use]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Mutable access to the pool.
    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    /// Number of particles in the pool.
    #[must_use]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// Checks if the pool is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Pool size the field maintains between bursts.
    #[must_use]
    pub fn target_count(&self) -> usize {
        self.target_count
    }

    /// Current canvas size.
    #[must_use]
    pub fn size(&self) -> CanvasSize {
        self.size
    }

    /// The sanitized config.
    #[must_use]
    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    /// Draws a uniform sample in `[0, 1)` from the field's generator.
    pub(crate) fn sample(&mut self) -> f32 {
        self.rng.f32()
    }

    fn recycle_dead(&mut self) {
        let mut i = self.particles.len();
        while i > 0 {
            i -= 1;
            if self.particles[i].is_alive() {
                continue;
            }
            if self.particles.len() > self.target_count {
                self.particles.swap_remove(i);
            } else {
                self.particles[i] = self.spawn();
            }
        }
    }

    fn spawn(&mut self) -> Particle {
        let rng = &mut self.rng;
        let position = Vec2::new(rng.f32() * self.size.width, rng.f32() * self.size.height);

        let velocity = match self.config.spawn {
            SpawnVelocity::Uniform { max_speed } => Vec2::new(
                (rng.f32() * 2.0 - 1.0) * max_speed,
                (rng.f32() * 2.0 - 1.0) * max_speed,
            ),
            SpawnVelocity::Radial {
                min_speed,
                max_speed,
            } => {
                let angle = rng.f32() * TAU;
                Vec2::from_angle(angle) * lerp(min_speed, max_speed, rng.f32())
            },
        };

        let life = match self.config.life {
            LifeModel::Immortal => None,
            LifeModel::Finite { min, max, .. } => Some(Lifetime::new(lerp(min, max, rng.f32()))),
        };

        let (min_size, max_size) = self.config.size;
        let palette = &self.config.palette;
        let color = palette[rng.usize(..palette.len())];

        Particle {
            position,
            velocity,
            life,
            size: lerp(min_size, max_size, rng.f32()),
            color,
        }
    }
}

fn apply_boundary(particle: &mut Particle, boundary: BoundaryPolicy, size: CanvasSize) {
    let position = &mut particle.position;
    let velocity = &mut particle.velocity;
    match boundary {
        BoundaryPolicy::Reflect { restitution } => {
            if position.x < 0.0 || position.x > size.width {
                velocity.x = -velocity.x * restitution;
                position.x = position.x.clamp(0.0, size.width);
            }
            if position.y < 0.0 || position.y > size.height {
                velocity.y = -velocity.y * restitution;
                position.y = position.y.clamp(0.0, size.height);
            }
        },
        BoundaryPolicy::Wrap => {
            if position.x < 0.0 {
                position.x = size.width;
            } else if position.x > size.width {
                position.x = 0.0;
            }
            if position.y < 0.0 {
                position.y = size.height;
            } else if position.y > size.height {
                position.y = 0.0;
            }
        },
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Burst, Interaction, ParticleCount};
    use proptest::prelude::*;

    fn reflect_config() -> FieldConfig {
        FieldConfig {
            spawn: SpawnVelocity::Uniform { max_speed: 40.0 },
            boundary: BoundaryPolicy::Reflect { restitution: 0.8 },
            ..Default::default()
        }
    }

    fn wrap_config() -> FieldConfig {
        FieldConfig {
            boundary: BoundaryPolicy::Wrap,
            ..Default::default()
        }
    }

    fn finite_config(decay: f32) -> FieldConfig {
        FieldConfig {
            life: LifeModel::Finite {
                min: 3.0,
                max: 5.0,
                decay,
            },
            ..Default::default()
        }
    }

    fn interaction_config(mode: InteractionMode) -> FieldConfig {
        FieldConfig {
            interaction: Some(Interaction {
                mode,
                force: PointerForce {
                    radius: 100.0,
                    strength: 0.5,
                },
                pressed: Some(PointerForce {
                    radius: 200.0,
                    strength: 1.5,
                }),
                togglable: true,
            }),
            ..Default::default()
        }
    }

    proptest! {
        #[test]
        fn prop_initialized_particles_within_bounds(
            width in 1.0f32..4000.0,
            height in 1.0f32..4000.0,
            count in 0usize..300,
            seed in any::<u64>(),
        ) {
            let size = CanvasSize::new(width, height);
            let mut field = ParticleField::with_seed(FieldConfig::default(), seed);
            field.initialize(size, count);
            prop_assert_eq!(field.len(), count);
            for particle in field.particles() {
                prop_assert!(size.contains(particle.position));
            }
        }

        #[test]
        fn prop_reflection_never_leaves_domain(
            width in 1.0f32..800.0,
            height in 1.0f32..800.0,
            steps in 1usize..200,
            seed in any::<u64>(),
        ) {
            let size = CanvasSize::new(width, height);
            let mut field = ParticleField::with_seed(reflect_config(), seed);
            field.initialize(size, 40);
            for _ in 0..steps {
                field.step(None);
                for particle in field.particles() {
                    prop_assert!(size.contains(particle.position));
                }
            }
        }

        #[test]
        fn prop_wrap_never_leaves_domain(
            width in 1.0f32..800.0,
            height in 1.0f32..800.0,
            seed in any::<u64>(),
        ) {
            let size = CanvasSize::new(width, height);
            let config = FieldConfig {
                spawn: SpawnVelocity::Uniform { max_speed: 25.0 },
                ..wrap_config()
            };
            let mut field = ParticleField::with_seed(config, seed);
            field.initialize(size, 40);
            for _ in 0..50 {
                field.step(None);
                for particle in field.particles() {
                    prop_assert!(size.contains(particle.position));
                }
            }
        }
    }

    #[test]
    fn test_initialize_clamps_tiny_canvas() {
        let mut field = ParticleField::with_seed(FieldConfig::default(), 1);
        field.initialize(CanvasSize::new(0.0, 0.0), 10);
        for particle in field.particles() {
            assert!(particle.position.x <= 1.0 && particle.position.y <= 1.0);
        }
    }

    #[test]
    fn test_wrap_right_edge_reappears_at_zero() {
        let size = CanvasSize::new(200.0, 100.0);
        let mut field = ParticleField::with_seed(wrap_config(), 3);
        field.initialize(size, 1);
        field.particles_mut()[0].position = Vec2::new(200.0, 50.0);
        field.particles_mut()[0].velocity = Vec2::new(1.0, 0.0);
        field.step(None);
        assert_eq!(field.particles()[0].position.x, 0.0);
        assert_eq!(field.particles()[0].position.y, 50.0);
    }

    #[test]
    fn test_wrap_other_edges() {
        let size = CanvasSize::new(200.0, 100.0);
        let mut field = ParticleField::with_seed(wrap_config(), 3);
        field.initialize(size, 3);
        {
            let particles = field.particles_mut();
            particles[0].position = Vec2::new(0.0, 40.0);
            particles[0].velocity = Vec2::new(-1.0, 0.0);
            particles[1].position = Vec2::new(30.0, 100.0);
            particles[1].velocity = Vec2::new(0.0, 1.0);
            particles[2].position = Vec2::new(30.0, 0.0);
            particles[2].velocity = Vec2::new(0.0, -1.0);
        }
        field.step(None);
        let particles = field.particles();
        assert_eq!(particles[0].position.x, 200.0);
        assert_eq!(particles[1].position.y, 0.0);
        assert_eq!(particles[2].position.y, 100.0);
    }

    #[test]
    fn test_reflect_flips_and_scales_velocity() {
        let size = CanvasSize::new(100.0, 100.0);
        let mut field = ParticleField::with_seed(reflect_config(), 5);
        field.initialize(size, 1);
        field.particles_mut()[0].position = Vec2::new(99.0, 50.0);
        field.particles_mut()[0].velocity = Vec2::new(5.0, 0.0);
        field.step(None);
        let particle = field.particles()[0];
        assert_eq!(particle.position.x, 100.0);
        assert!((particle.velocity.x + 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_life_decreases_then_recycles() {
        let size = CanvasSize::new(100.0, 100.0);
        let mut field = ParticleField::with_seed(finite_config(1.0), 9);
        field.initialize(size, 12);

        let mut recycled = 0;
        for _ in 0..20 {
            let before: Vec<f32> = field
                .particles()
                .iter()
                .map(|p| p.life.map_or(0.0, |life| life.remaining))
                .collect();
            field.step(None);
            assert_eq!(field.len(), 12);

            for (old, particle) in before.iter().zip(field.particles()) {
                let now = particle.life.map_or(0.0, |life| life.remaining);
                if (old - 1.0) > 0.0 {
                    assert!((now - (old - 1.0)).abs() < 1e-5);
                } else {
                    recycled += 1;
                    assert!(now >= 3.0 && now <= 5.0);
                }
            }
        }
        assert!(recycled > 0);
    }

    #[test]
    fn test_immortal_particles_never_recycled() {
        let mut field = ParticleField::with_seed(FieldConfig::default(), 2);
        field.initialize(CanvasSize::new(50.0, 50.0), 5);
        for _ in 0..100 {
            field.step(None);
        }
        assert!(field.particles().iter().all(|p| p.life.is_none()));
        assert_eq!(field.len(), 5);
    }

    #[test]
    fn test_repel_delta_points_away() {
        let size = CanvasSize::new(400.0, 400.0);
        let mut field = ParticleField::with_seed(interaction_config(InteractionMode::Repel), 4);
        field.initialize(size, 1);
        field.particles_mut()[0].position = Vec2::new(200.0, 200.0);
        field.particles_mut()[0].velocity = Vec2::ZERO;

        let pointer = Vec2::new(230.0, 180.0);
        field.step(Some(pointer));
        let particle = field.particles()[0];
        let delta = particle.velocity;
        let to_pointer = pointer - Vec2::new(200.0, 200.0);
        assert!(delta.dot(to_pointer) < 0.0);
    }

    #[test]
    fn test_attract_delta_points_toward() {
        let size = CanvasSize::new(400.0, 400.0);
        let mut field = ParticleField::with_seed(interaction_config(InteractionMode::Attract), 4);
        field.initialize(size, 1);
        field.particles_mut()[0].position = Vec2::new(200.0, 200.0);
        field.particles_mut()[0].velocity = Vec2::ZERO;

        let pointer = Vec2::new(150.0, 260.0);
        field.step(Some(pointer));
        let delta = field.particles()[0].velocity;
        let to_pointer = pointer - Vec2::new(200.0, 200.0);
        assert!(delta.dot(to_pointer) > 0.0);
    }

    #[test]
    fn test_pointer_outside_radius_has_no_effect() {
        let force = PointerForce {
            radius: 50.0,
            strength: 1.0,
        };
        let impulse = interaction_impulse(
            Vec2::new(0.0, 0.0),
            Vec2::new(60.0, 0.0),
            InteractionMode::Repel,
            force,
        );
        assert_eq!(impulse, Vec2::ZERO);
    }

    #[test]
    fn test_impulse_scales_with_proximity() {
        let force = PointerForce {
            radius: 100.0,
            strength: 1.0,
        };
        let near = interaction_impulse(Vec2::ZERO, Vec2::new(10.0, 0.0), InteractionMode::Repel, force);
        let far = interaction_impulse(Vec2::ZERO, Vec2::new(90.0, 0.0), InteractionMode::Repel, force);
        assert!(near.length() > far.length());
        assert!((near.length() - 0.9).abs() < 1e-5);
    }

    #[test]
    fn test_pressed_force_override() {
        let mut field = ParticleField::with_seed(interaction_config(InteractionMode::Repel), 1);
        assert_eq!(field.active_force().map(|f| f.radius), Some(100.0));
        field.set_pressed(true);
        assert_eq!(field.active_force().map(|f| f.radius), Some(200.0));
    }

    #[test]
    fn test_toggle_mode() {
        let mut field = ParticleField::with_seed(interaction_config(InteractionMode::Repel), 1);
        assert_eq!(field.toggle_mode(), InteractionMode::Attract);
        assert_eq!(field.mode(), InteractionMode::Attract);
    }

    #[test]
    fn test_burst_grows_pool_then_shrinks_back() {
        let config = FieldConfig {
            burst: Some(Burst {
                count: 20,
                min_speed: 3.0,
                max_speed: 8.0,
                size: (2.0, 6.0),
            }),
            ..finite_config(1.0)
        };
        let mut field = ParticleField::with_seed(config, 11);
        field.initialize(CanvasSize::new(300.0, 300.0), 10);

        assert_eq!(field.burst(Vec2::new(150.0, 150.0)), 20);
        assert_eq!(field.len(), 30);

        for _ in 0..10 {
            field.step(None);
        }
        assert_eq!(field.len(), 10);
    }

    #[test]
    fn test_burst_without_config_is_noop() {
        let mut field = ParticleField::with_seed(FieldConfig::default(), 1);
        field.initialize(CanvasSize::new(100.0, 100.0), 4);
        assert_eq!(field.burst(Vec2::new(10.0, 10.0)), 0);
        assert_eq!(field.len(), 4);
    }

    #[test]
    fn test_resize_reseed() {
        let mut field = ParticleField::with_seed(FieldConfig::default(), 1);
        field.initialize_from_config(CanvasSize::new(1000.0, 1000.0));
        field.resize(CanvasSize::new(10.0, 10.0));
        assert_eq!(field.len(), 25);
        assert!(field
            .particles()
            .iter()
            .all(|p| field.size().contains(p.position)));
    }

    #[test]
    fn test_resize_keep_clamps_and_retargets() {
        let config = FieldConfig {
            count: ParticleCount::ByArea {
                area_per_particle: 100.0,
                max: 100,
            },
            on_resize: ResizeBehavior::Keep,
            ..wrap_config()
        };
        let mut field = ParticleField::with_seed(config, 8);
        field.initialize_from_config(CanvasSize::new(100.0, 100.0));
        assert_eq!(field.len(), 100);

        field.resize(CanvasSize::new(20.0, 20.0));
        assert_eq!(field.target_count(), 4);
        assert_eq!(field.len(), 4);
        assert!(field
            .particles()
            .iter()
            .all(|p| field.size().contains(p.position)));
    }
}
