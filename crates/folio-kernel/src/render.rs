//! Drawing a particle field onto a canvas.

use glam::Vec2;

use crate::canvas::Canvas;
use crate::config::{Background, Connections, DrawStyle};
use crate::field::ParticleField;
use crate::particle::{Particle, Rgba};

/// What one `render` call drew.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Particles drawn.
    pub particles: usize,
    /// Connection lines drawn.
    pub lines: usize,
}

impl ParticleField {
    /// Draws the current frame.
    ///
    /// Clears or fades the canvas, draws every particle with alpha scaled by
    /// its remaining life, then any constellation lines. `None` means the host
    /// has no drawing context: nothing is drawn and the stats are zero.
    pub fn render<C: Canvas + ?Sized>(&mut self, canvas: Option<&mut C>) -> RenderStats {
        let Some(canvas) = canvas else {
            return RenderStats::default();
        };

        match self.config().background {
            Background::Clear => canvas.clear(),
            Background::Fade { color, alpha } => {
                canvas.fill_all([color[0], color[1], color[2], alpha]);
            },
        }

        let draw = self.config().draw;
        let connections = self.config().connections;
        let mut stats = RenderStats::default();

        for i in 0..self.len() {
            let particle = self.particles()[i];
            let color = particle.faded_color();
            draw_particle(canvas, &particle, draw, color);
            stats.particles += 1;

            if let Some(connections) = connections {
                let sampled =
                    connections.probability >= 1.0 || self.sample() < connections.probability;
                if sampled {
                    let base = connections.color.map_or(color, |line| {
                        [line[0], line[1], line[2], particle.life_fraction()]
                    });
                    stats.lines += self.draw_links(canvas, i, &connections, base);
                }
            }
        }

        stats
    }

    fn draw_links<C: Canvas + ?Sized>(
        &self,
        canvas: &mut C,
        index: usize,
        connections: &Connections,
        color: Rgba,
    ) -> usize {
        let particles = self.particles();
        let origin = particles[index].position;
        let link_color = |distance: f32| -> Rgba {
            let fade = 1.0 - distance / connections.max_distance;
            [color[0], color[1], color[2], fade * connections.max_alpha * color[3]]
        };

        if connections.nearest_only {
            let nearest = particles
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != index)
                .map(|(_, other)| (other.position, origin.distance(other.position)))
                .filter(|(_, distance)| *distance < connections.max_distance)
                .min_by(|a, b| a.1.total_cmp(&b.1));

            return match nearest {
                Some((target, distance)) => {
                    canvas.stroke_line(origin, target, connections.line_width, link_color(distance));
                    1
                },
                None => 0,
            };
        }

        let mut drawn = 0;
        for other in &particles[index + 1..] {
            let distance = origin.distance(other.position);
            if distance < connections.max_distance {
                canvas.stroke_line(
                    origin,
                    other.position,
                    connections.line_width,
                    link_color(distance),
                );
                drawn += 1;
            }
        }
        drawn
    }
}

fn draw_particle<C: Canvas + ?Sized>(canvas: &mut C, particle: &Particle, draw: DrawStyle, color: Rgba) {
    match draw {
        DrawStyle::Dot => canvas.fill_circle(particle.position, particle.size, color),
        DrawStyle::Streak => {
            let heading = particle.velocity.try_normalize().unwrap_or(Vec2::X);
            let tail = particle.position - heading * particle.size;
            let head = particle.position + heading * particle.size;
            canvas.stroke_line(tail, head, particle.size, color);
            canvas.fill_circle(particle.position, particle.size * 0.25, color);
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{DrawCommand, DrawList};
    use crate::config::{FieldConfig, LifeModel};
    use crate::pixel_canvas::PixelCanvas;
    use folio_common::CanvasSize;

    fn size() -> CanvasSize {
        CanvasSize::new(200.0, 200.0)
    }

    fn connected(probability: f32, nearest_only: bool) -> FieldConfig {
        FieldConfig {
            connections: Some(Connections {
                max_distance: 100.0,
                max_alpha: 0.3,
                probability,
                nearest_only,
                line_width: 1.0,
                color: None,
            }),
            ..Default::default()
        }
    }

    fn place(field: &mut ParticleField, points: &[Vec2]) {
        for (particle, point) in field.particles_mut().iter_mut().zip(points) {
            particle.position = *point;
        }
    }

    #[test]
    fn test_missing_canvas_is_noop() {
        let mut field = ParticleField::with_seed(FieldConfig::default(), 1);
        field.initialize(size(), 10);
        let stats = field.render::<DrawList>(None);
        assert_eq!(stats, RenderStats::default());
    }

    #[test]
    fn test_clear_then_one_dot_per_particle() {
        let mut field = ParticleField::with_seed(FieldConfig::default(), 1);
        field.initialize(size(), 10);
        let mut canvas = DrawList::new(size());
        let stats = field.render(Some(&mut canvas));

        assert_eq!(stats.particles, 10);
        assert_eq!(canvas.commands()[0], DrawCommand::Clear);
        assert_eq!(canvas.circle_count(), 10);
        assert_eq!(canvas.line_count(), 0);
    }

    #[test]
    fn test_fade_background_uses_configured_alpha() {
        let config = FieldConfig {
            background: Background::Fade {
                color: [0.06, 0.06, 0.12, 1.0],
                alpha: 0.1,
            },
            ..Default::default()
        };
        let mut field = ParticleField::with_seed(config, 1);
        field.initialize(size(), 1);
        let mut canvas = DrawList::new(size());
        field.render(Some(&mut canvas));
        assert_eq!(
            canvas.commands()[0],
            DrawCommand::FillAll {
                color: [0.06, 0.06, 0.12, 0.1]
            }
        );
    }

    #[test]
    fn test_alpha_follows_life_fraction() {
        let config = FieldConfig {
            life: LifeModel::Finite {
                min: 100.0,
                max: 100.0,
                decay: 1.0,
            },
            palette: vec![[1.0, 1.0, 1.0, 1.0]],
            ..Default::default()
        };
        let mut field = ParticleField::with_seed(config, 1);
        field.initialize(size(), 1);
        for _ in 0..25 {
            field.step(None);
        }
        let mut canvas = DrawList::new(size());
        field.render(Some(&mut canvas));
        match canvas.commands()[1] {
            DrawCommand::Circle { color, .. } => assert!((color[3] - 0.75).abs() < 1e-4),
            other => panic!("expected circle, got {other:?}"),
        }
    }

    #[test]
    fn test_all_pairs_connections() {
        let mut field = ParticleField::with_seed(connected(1.0, false), 1);
        field.initialize(size(), 3);
        place(
            &mut field,
            &[Vec2::new(10.0, 10.0), Vec2::new(40.0, 10.0), Vec2::new(190.0, 190.0)],
        );
        let mut canvas = DrawList::new(size());
        let stats = field.render(Some(&mut canvas));
        assert_eq!(stats.lines, 1);
        assert_eq!(canvas.line_count(), 1);
    }

    #[test]
    fn test_zero_probability_draws_no_lines() {
        let mut field = ParticleField::with_seed(connected(0.0, false), 1);
        field.initialize(size(), 3);
        place(
            &mut field,
            &[Vec2::new(10.0, 10.0), Vec2::new(11.0, 10.0), Vec2::new(12.0, 10.0)],
        );
        let mut canvas = DrawList::new(size());
        assert_eq!(field.render(Some(&mut canvas)).lines, 0);
    }

    #[test]
    fn test_nearest_only_draws_one_link_each() {
        let mut field = ParticleField::with_seed(connected(1.0, true), 1);
        field.initialize(size(), 3);
        place(
            &mut field,
            &[Vec2::new(10.0, 10.0), Vec2::new(20.0, 10.0), Vec2::new(50.0, 10.0)],
        );
        let mut canvas = DrawList::new(size());
        let stats = field.render(Some(&mut canvas));
        assert_eq!(stats.lines, 3);

        let first_link = canvas
            .commands()
            .iter()
            .find_map(|c| match c {
                DrawCommand::Line { from, to, .. } => Some((*from, *to)),
                _ => None,
            })
            .expect("a line");
        assert_eq!(first_link, (Vec2::new(10.0, 10.0), Vec2::new(20.0, 10.0)));
    }

    #[test]
    fn test_line_alpha_fades_with_distance() {
        let mut field = ParticleField::with_seed(connected(1.0, false), 1);
        field.initialize(size(), 2);
        place(&mut field, &[Vec2::new(0.0, 0.0), Vec2::new(50.0, 0.0)]);
        let mut canvas = DrawList::new(size());
        field.render(Some(&mut canvas));
        let alpha = canvas
            .commands()
            .iter()
            .find_map(|c| match c {
                DrawCommand::Line { color, .. } => Some(color[3]),
                _ => None,
            })
            .expect("a line");
        assert!((alpha - 0.15).abs() < 1e-5);
    }

    #[test]
    fn test_fixed_link_color_ignores_palette_alpha() {
        let config = FieldConfig {
            palette: vec![[0.5, 0.8, 0.7, 0.6]],
            connections: Some(Connections {
                color: Some([0.5, 0.8, 0.7, 1.0]),
                ..connected(1.0, true).connections.expect("connections")
            }),
            ..Default::default()
        };
        let mut field = ParticleField::with_seed(config, 1);
        field.initialize(size(), 2);
        place(&mut field, &[Vec2::new(0.0, 0.0), Vec2::new(50.0, 0.0)]);
        let mut canvas = DrawList::new(size());
        field.render(Some(&mut canvas));

        let alphas: Vec<f32> = canvas
            .commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Line { color, .. } => Some(color[3]),
                _ => None,
            })
            .collect();
        // (1 - 50/100) * 0.3 at full life, no palette factor
        assert_eq!(alphas.len(), 2);
        assert!(alphas.iter().all(|alpha| (alpha - 0.15).abs() < 1e-5));
    }

    #[test]
    fn test_streak_draws_line_and_core() {
        let config = FieldConfig {
            draw: DrawStyle::Streak,
            ..Default::default()
        };
        let mut field = ParticleField::with_seed(config, 1);
        field.initialize(size(), 4);
        let mut canvas = DrawList::new(size());
        field.render(Some(&mut canvas));
        assert_eq!(canvas.line_count(), 4);
        assert_eq!(canvas.circle_count(), 4);
    }

    #[test]
    fn test_renders_pixels() {
        let mut field = ParticleField::with_seed(FieldConfig::default(), 1);
        field.initialize(size(), 5);
        let mut canvas = PixelCanvas::new(200, 200);
        field.render(Some(&mut canvas));
        assert!(canvas.lit_pixels() > 0);
    }
}
