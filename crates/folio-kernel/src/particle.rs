//! Particle records.

use glam::Vec2;

/// RGBA color with components in 0.0-1.0.
pub type Rgba = [f32; 4];

/// Remaining and maximum life of a fading particle, in frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lifetime {
    /// Frames left before the particle is recycled.
    pub remaining: f32,
    /// Life the particle was spawned with.
    pub max: f32,
}

impl Lifetime {
    /// Creates a full lifetime.
    #[must_use]
    pub fn new(max: f32) -> Self {
        Self { remaining: max, max }
    }

    /// Remaining fraction, clamped to 0.0-1.0.
    #[must_use]
    pub fn fraction(&self) -> f32 {
        if self.max <= 0.0 {
            return 0.0;
        }
        (self.remaining / self.max).clamp(0.0, 1.0)
    }

    /// Checks if any life is left.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.remaining > 0.0
    }
}

/// A single particle in canvas space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// Position in canvas pixels.
    pub position: Vec2,
    /// Velocity in pixels per frame.
    pub velocity: Vec2,
    /// Life for fading particles; `None` lives forever.
    pub life: Option<Lifetime>,
    /// Radius (dots) or half-length (streaks) in pixels.
    pub size: f32,
    /// Base color; alpha is scaled by the life fraction when drawn.
    pub color: Rgba,
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            life: None,
            size: 2.0,
            color: [1.0, 1.0, 1.0, 1.0],
        }
    }
}

impl Particle {
    /// Creates an immortal particle.
    #[must_use]
    pub fn new(position: Vec2, velocity: Vec2) -> Self {
        Self {
            position,
            velocity,
            ..Default::default()
        }
    }

    /// Sets a finite lifetime.
    #[must_use]
    pub fn with_life(mut self, life: f32) -> Self {
        self.life = Some(Lifetime::new(life));
        self
    }

    /// Sets the size.
    #[must_use]
    pub fn with_size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }

    /// Sets the color.
    #[must_use]
    pub fn with_color(mut self, color: Rgba) -> Self {
        self.color = color;
        self
    }

    /// Remaining life fraction; 1.0 for immortal particles.
    #[must_use]
    pub fn life_fraction(&self) -> f32 {
        self.life.map_or(1.0, |life| life.fraction())
    }

    /// Checks if the particle should still be simulated.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.life.map_or(true, |life| life.is_alive())
    }

    /// Color with alpha faded by remaining life.
    #[must_use]
    pub fn faded_color(&self) -> Rgba {
        let [r, g, b, a] = self.color;
        [r, g, b, a * self.life_fraction()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_particle_default_is_immortal() {
        let particle = Particle::default();
        assert!(particle.is_alive());
        assert_eq!(particle.life_fraction(), 1.0);
    }

    #[test]
    fn test_life_fraction() {
        let mut particle = Particle::default().with_life(200.0);
        if let Some(life) = particle.life.as_mut() {
            life.remaining = 50.0;
        }
        assert!((particle.life_fraction() - 0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn test_life_fraction_clamped() {
        let mut particle = Particle::default().with_life(10.0);
        if let Some(life) = particle.life.as_mut() {
            life.remaining = -3.0;
        }
        assert_eq!(particle.life_fraction(), 0.0);
        assert!(!particle.is_alive());
    }

    #[test]
    fn test_faded_color() {
        let mut particle = Particle::default()
            .with_color([0.2, 0.4, 0.6, 0.8])
            .with_life(100.0);
        if let Some(life) = particle.life.as_mut() {
            life.remaining = 50.0;
        }
        let color = particle.faded_color();
        assert_eq!(&color[..3], &[0.2, 0.4, 0.6]);
        assert!((color[3] - 0.4).abs() < 1e-6);
    }
}
