//! Per-frame particle simulation.

use rand::Rng;

use super::draw::{DrawCommand, Frame, Rect};
use super::particle::{Color, Particle};
use super::spawn;
use crate::error::ConfigError;
use crate::params::{PruneOrder, SimulationConfig};
use crate::surface::RenderSurface;

/// Owns the live particle set and turns spectra into draw commands
pub struct Simulator {
    config: SimulationConfig,
    particles: Vec<Particle>,
}

impl Simulator {
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            particles: Vec::new(),
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Run one frame: fade, bars, spawn, then update/draw/prune.
    ///
    /// # Arguments
    /// * `spectrum` - Byte magnitude per frequency bin (this frame's sample)
    /// * `surface` - Current drawing surface dimensions
    /// * `rng` - Source for random spawn angles and radii
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        spectrum: &[u8],
        surface: RenderSurface,
        rng: &mut R,
    ) -> Frame {
        let mut frame = Frame::default();
        let width = surface.width as f32;
        let height = surface.height as f32;

        frame.push(DrawCommand::Fade {
            rect: Rect::new(0.0, 0.0, width, height),
            color: Color::BLACK,
            alpha: self.config.fade_alpha,
        });

        if self.config.show_bars {
            push_bars(&mut frame, spectrum, width, height);
        }

        let spawn_config = &self.config.spawn;
        let origin = surface.point_at(spawn_config.origin.0, spawn_config.origin.1);
        let bin_count = spectrum.len();
        for (index, &magnitude) in spectrum.iter().enumerate() {
            if let Some(particle) =
                spawn::spawn(spawn_config, index, magnitude, bin_count, origin, rng)
            {
                self.particles.push(particle);
            }
        }

        // Newest first, so older particles end up on top
        let decay = self.config.decay_step;
        let draw_dead = self.config.prune_order == PruneOrder::DrawThenPrune;
        let final_flash = self.config.final_flash;
        for particle in self.particles.iter_mut().rev() {
            particle.update(decay);
            if draw_dead || particle.is_alive() {
                frame.push(DrawCommand::Circle {
                    center: particle.position,
                    radius: particle.radius,
                    color: Color::Hsl(particle.color),
                    alpha: particle.draw_alpha(final_flash),
                });
            }
        }
        self.particles.retain(Particle::is_alive);

        frame
    }
}

/// One bar per bin along the bottom edge, `(width / bins) * 2.5` wide with a
/// one pixel gap
fn push_bars(frame: &mut Frame, spectrum: &[u8], width: f32, height: f32) {
    if spectrum.is_empty() {
        return;
    }

    let bar_width = (width / spectrum.len() as f32) * 2.5;
    let mut x = 0.0;
    for &magnitude in spectrum {
        let bar_height = magnitude as f32;
        let green = magnitude.saturating_add(100);
        frame.push(DrawCommand::Bar {
            rect: Rect::new(x, height - bar_height, bar_width, bar_height),
            color: Color::Rgb(50, green, 100),
        });
        x += bar_width + 1.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{AlphaPolicy, SpawnConfig};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn surface() -> RenderSurface {
        RenderSurface::new(1280, 720, 1.0)
    }

    fn simulator(config: SimulationConfig) -> Simulator {
        Simulator::new(config).unwrap()
    }

    fn fixed_alpha_config() -> SimulationConfig {
        SimulationConfig {
            show_bars: false,
            spawn: SpawnConfig {
                alpha: AlphaPolicy::Fixed,
                ..SpawnConfig::default()
            },
            ..SimulationConfig::default()
        }
    }

    /// Spectrum with a single loud bin
    fn one_bin(index: usize, magnitude: u8) -> Vec<u8> {
        let mut spectrum = vec![0u8; 128];
        spectrum[index] = magnitude;
        spectrum
    }

    #[test]
    fn test_frame_order() {
        let mut sim = simulator(SimulationConfig::default());
        let mut rng = StdRng::seed_from_u64(0);
        let frame = sim.tick(&one_bin(10, 200), surface(), &mut rng);

        assert!(matches!(
            frame.commands[0],
            DrawCommand::Fade { alpha, .. } if (alpha - 0.15).abs() < 1e-6
        ));
        assert_eq!(frame.bars().count(), 128);
        assert_eq!(frame.circles().count(), 1);
        assert!(matches!(
            frame.commands.last(),
            Some(DrawCommand::Circle { .. })
        ));
    }

    #[test]
    fn test_bars_geometry() {
        let mut sim = simulator(SimulationConfig::default());
        let mut rng = StdRng::seed_from_u64(0);
        let frame = sim.tick(&one_bin(1, 200), surface(), &mut rng);
        let bars: Vec<_> = frame.bars().collect();

        let bar_width = 1280.0 / 128.0 * 2.5;
        assert_eq!(bars[0].0.height, 0.0);
        assert_eq!(*bars[1].0, Rect::new(bar_width + 1.0, 520.0, bar_width, 200.0));
        assert_eq!(*bars[1].1, Color::Rgb(50, 255, 100));
        assert_eq!(*bars[0].1, Color::Rgb(50, 100, 100));
    }

    #[test]
    fn test_spawn_at_origin_then_advance() {
        let mut sim = simulator(fixed_alpha_config());
        let mut rng = StdRng::seed_from_u64(0);
        sim.tick(&one_bin(0, 200), surface(), &mut rng);

        let p = &sim.particles()[0];
        // Spawned at (640, 240) and advanced once along angle 0
        assert!((p.position.x - (640.0 + 200.0 / 45.0 * 2.0)).abs() < 1e-3);
        assert!((p.position.y - 240.0).abs() < 1e-3);
        assert!((p.alpha - 0.985).abs() < 1e-6);
    }

    #[test]
    fn test_removed_after_67_ticks() {
        let mut sim = simulator(fixed_alpha_config());
        let mut rng = StdRng::seed_from_u64(0);
        let silence = vec![0u8; 128];

        // The spawning tick is the first update
        sim.tick(&one_bin(40, 120), surface(), &mut rng);
        for tick in 2..=66 {
            sim.tick(&silence, surface(), &mut rng);
            assert_eq!(sim.particles().len(), 1, "dead too early at tick {}", tick);
        }
        let alpha = sim.particles()[0].alpha;
        assert!((alpha - (1.0 - 66.0 * 0.015)).abs() < 1e-4);

        let frame = sim.tick(&silence, surface(), &mut rng);
        assert!(sim.particles().is_empty());

        // Drawn once more, fully transparent
        let circles: Vec<_> = frame.circles().collect();
        assert_eq!(circles.len(), 1);
        assert_eq!(circles[0].2, 0.0);
    }

    #[test]
    fn test_prune_then_draw_skips_dead() {
        let mut config = fixed_alpha_config();
        config.prune_order = PruneOrder::PruneThenDraw;
        config.decay_step = 0.6;
        let mut sim = simulator(config);
        let mut rng = StdRng::seed_from_u64(0);

        let frame = sim.tick(&one_bin(40, 120), surface(), &mut rng);
        assert_eq!(frame.circles().count(), 1);

        let frame = sim.tick(&[0u8; 128], surface(), &mut rng);
        assert_eq!(frame.circles().count(), 0);
        assert!(sim.particles().is_empty());
    }

    #[test]
    fn test_final_flash() {
        let mut config = fixed_alpha_config();
        config.final_flash = true;
        config.decay_step = 0.6;
        let mut sim = simulator(config);
        let mut rng = StdRng::seed_from_u64(0);

        sim.tick(&one_bin(40, 120), surface(), &mut rng);
        let frame = sim.tick(&[0u8; 128], surface(), &mut rng);
        let circles: Vec<_> = frame.circles().collect();
        assert_eq!(circles[0].2, 1.0);
    }

    #[test]
    fn test_silence_drains_live_set() {
        let mut sim = simulator(SimulationConfig::default());
        let mut rng = StdRng::seed_from_u64(5);
        let loud = vec![180u8; 128];
        sim.tick(&loud, surface(), &mut rng);
        assert_eq!(sim.particles().len(), 128);

        let silence = vec![0u8; 128];
        for _ in 0..100 {
            sim.tick(&silence, surface(), &mut rng);
        }
        assert!(sim.particles().is_empty());
    }

    #[test]
    fn test_newest_drawn_first() {
        let mut sim = simulator(fixed_alpha_config());
        let mut rng = StdRng::seed_from_u64(0);
        sim.tick(&one_bin(40, 120), surface(), &mut rng);
        let frame = sim.tick(&one_bin(40, 120), surface(), &mut rng);

        let alphas: Vec<f32> = frame.circles().map(|(_, _, a)| a).collect();
        assert_eq!(alphas.len(), 2);
        assert!(alphas[0] > alphas[1]);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SimulationConfig {
            decay_step: -1.0,
            ..SimulationConfig::default()
        };
        assert!(Simulator::new(config).is_err());
    }
}
