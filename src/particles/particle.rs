//! Particle state and color model.

use glam::Vec2;

/// Hue/saturation/lightness color (degrees, percent, percent)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    pub hue: f32,
    pub saturation: f32,
    pub lightness: f32,
}

impl Hsl {
    pub fn new(hue: f32, saturation: f32, lightness: f32) -> Self {
        Self {
            hue,
            saturation,
            lightness,
        }
    }

    /// Convert to RGB components in [0, 1]
    pub fn to_rgb(self) -> [f32; 3] {
        let h = self.hue.rem_euclid(360.0) / 360.0;
        let s = (self.saturation / 100.0).clamp(0.0, 1.0);
        let l = (self.lightness / 100.0).clamp(0.0, 1.0);

        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;

        [
            hue_to_channel(p, q, h + 1.0 / 3.0),
            hue_to_channel(p, q, h),
            hue_to_channel(p, q, h - 1.0 / 3.0),
        ]
    }
}

fn hue_to_channel(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

/// Fill color of a draw command
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Color {
    Rgb(u8, u8, u8),
    Hsl(Hsl),
}

impl Color {
    pub const BLACK: Color = Color::Rgb(0, 0, 0);

    pub fn to_rgb(self) -> [f32; 3] {
        match self {
            Self::Rgb(r, g, b) => [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0],
            Self::Hsl(hsl) => hsl.to_rgb(),
        }
    }
}

/// Transient visual entity emitted from the spawn origin
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// Center (pixels)
    pub position: Vec2,

    /// Pixels per tick
    pub velocity: Vec2,

    /// Pixels
    pub radius: f32,

    pub color: Hsl,

    /// Opacity; drops by the decay step every tick
    pub alpha: f32,
}

impl Particle {
    /// Advance one tick: move by velocity and fade
    pub fn update(&mut self, decay_step: f32) {
        self.position += self.velocity;
        self.alpha -= decay_step;
    }

    pub fn is_alive(&self) -> bool {
        self.alpha > 0.0
    }

    /// Opacity used when drawing. Non-positive alpha draws transparent,
    /// or fully opaque with `final_flash`.
    pub fn draw_alpha(&self, final_flash: bool) -> f32 {
        if self.alpha <= 0.0 && final_flash {
            1.0
        } else {
            self.alpha.clamp(0.0, 1.0)
        }
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_rgb(actual: [f32; 3], expected: [f32; 3]) {
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-4, "{:?} != {:?}", actual, expected);
        }
    }

    #[test]
    fn test_hsl_primaries() {
        assert_rgb(Hsl::new(0.0, 100.0, 50.0).to_rgb(), [1.0, 0.0, 0.0]);
        assert_rgb(Hsl::new(120.0, 100.0, 50.0).to_rgb(), [0.0, 1.0, 0.0]);
        assert_rgb(Hsl::new(240.0, 100.0, 50.0).to_rgb(), [0.0, 0.0, 1.0]);
        assert_rgb(Hsl::new(360.0, 100.0, 50.0).to_rgb(), [1.0, 0.0, 0.0]);
        assert_rgb(Hsl::new(0.0, 0.0, 50.0).to_rgb(), [0.5, 0.5, 0.5]);
    }

    #[test]
    fn test_hsl_particle_green() {
        assert_rgb(Hsl::new(140.0, 80.0, 50.0).to_rgb(), [0.1, 0.9, 0.366_667]);
    }

    #[test]
    fn test_update_moves_and_fades() {
        let mut p = Particle {
            position: Vec2::new(10.0, 10.0),
            velocity: Vec2::new(1.0, -2.0),
            radius: 3.0,
            color: Hsl::new(140.0, 80.0, 50.0),
            alpha: 0.5,
        };
        p.update(0.25);
        assert_eq!(p.position, Vec2::new(11.0, 8.0));
        assert_eq!(p.alpha, 0.25);
        assert!(p.is_alive());

        p.update(0.25);
        assert!(!p.is_alive());
        assert_eq!(p.draw_alpha(false), 0.0);
        assert_eq!(p.draw_alpha(true), 1.0);
    }
}
