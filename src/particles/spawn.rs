//! Spawn policy: frequency bin → particle.

use glam::Vec2;
use rand::Rng;
use std::f64::consts::TAU;

use super::particle::{Hsl, Particle};
use crate::params::{AlphaPolicy, AnglePolicy, HuePolicy, SpawnConfig};

/// Fractional part of the golden ratio
pub const GOLDEN_RATIO_CONJUGATE: f64 = 0.61803398875;

/// Low-discrepancy angle (radians) for a bin index.
///
/// Consecutive indices land far apart on the circle, so bins spawned in
/// ascending order still fan out evenly.
pub fn golden_angle(index: usize) -> f32 {
    ((index as f64 * GOLDEN_RATIO_CONJUGATE) % 1.0 * TAU) as f32
}

/// Speed/size multiplier: `low_freq_boost` for the lowest quarter of bins
pub fn boost(config: &SpawnConfig, index: usize, bin_count: usize) -> f32 {
    if (index as f32) < bin_count as f32 / 4.0 {
        config.low_freq_boost
    } else {
        1.0
    }
}

/// Pixels per tick for a bin
pub fn speed(config: &SpawnConfig, index: usize, magnitude: u8, bin_count: usize) -> f32 {
    (magnitude as f32 / config.speed_divisor) * boost(config, index, bin_count)
}

/// Hue in degrees for a bin
pub fn hue(config: &SpawnConfig, index: usize, bin_count: usize) -> f32 {
    let position = index as f32 / bin_count as f32;
    match config.hue {
        HuePolicy::Band => config.base_hue + position * config.hue_span - config.hue_span / 2.0,
        HuePolicy::Sweep => position * 360.0,
    }
}

/// Initial opacity for a bin
pub fn initial_alpha(config: &SpawnConfig, index: usize, magnitude: u8, bin_count: usize) -> f32 {
    match config.alpha {
        AlphaPolicy::Spectral => {
            let freq_factor = index as f32 / bin_count as f32;
            ((magnitude as f32 / 200.0) * freq_factor + 0.2).min(1.0)
        }
        AlphaPolicy::Fixed => 1.0,
    }
}

/// Spawn a particle for bin `index` if its magnitude exceeds the threshold
pub fn spawn<R: Rng + ?Sized>(
    config: &SpawnConfig,
    index: usize,
    magnitude: u8,
    bin_count: usize,
    origin: Vec2,
    rng: &mut R,
) -> Option<Particle> {
    if magnitude <= config.threshold {
        return None;
    }

    let boost = boost(config, index, bin_count);
    let angle = match config.angle {
        AnglePolicy::GoldenRatio => golden_angle(index),
        AnglePolicy::UniformRandom => rng.gen::<f32>() * std::f32::consts::TAU,
    };
    let speed = speed(config, index, magnitude, bin_count);
    let radius = rng.gen::<f32>() * (boost * config.radius_span) + config.min_radius;

    Some(Particle {
        position: origin,
        velocity: Vec2::from_angle(angle) * speed,
        radius,
        color: Hsl::new(
            hue(config, index, bin_count),
            config.saturation,
            config.lightness,
        ),
        alpha: initial_alpha(config, index, magnitude, bin_count),
    })
}
