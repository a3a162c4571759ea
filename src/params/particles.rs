//! Particle spawn policy and per-frame simulation parameters.

use clap::ValueEnum;

use crate::error::ConfigError;

/// Direction assigned to a newly spawned particle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum AnglePolicy {
    /// Low-discrepancy angle from the bin index (golden-ratio sequence)
    #[default]
    #[value(name = "golden")]
    GoldenRatio,

    /// Uniformly random angle in [0, 2π)
    #[value(name = "random")]
    UniformRandom,
}

/// Hue assigned to a newly spawned particle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum HuePolicy {
    /// base_hue ± hue_span/2 across the spectrum
    #[default]
    Band,

    /// Full 0..360° sweep across the spectrum
    Sweep,
}

/// Initial opacity of a newly spawned particle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum AlphaPolicy {
    /// min(1, magnitude/200 * bin_position + 0.2)
    #[default]
    Spectral,

    /// Always 1.0
    Fixed,
}

/// Whether dead particles are drawn once more before removal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum PruneOrder {
    /// Update, draw, then remove when alpha <= 0
    #[default]
    DrawThenPrune,

    /// Update, remove when alpha <= 0, draw survivors
    PruneThenDraw,
}

/// Mapping from a frequency bin to a spawned particle
#[derive(Debug, Clone)]
pub struct SpawnConfig {
    /// Magnitude a bin must exceed to spawn (0-255)
    pub threshold: u8,

    /// Speed/size multiplier for bins in the lowest quarter of the spectrum
    pub low_freq_boost: f32,

    /// Magnitude units per pixel/frame of speed
    /// Formula: speed = magnitude / speed_divisor * boost
    pub speed_divisor: f32,

    /// Smallest radius (pixels)
    pub min_radius: f32,

    /// Random radius range above min_radius, scaled by boost (pixels)
    pub radius_span: f32,

    /// Center hue for the band policy (degrees)
    pub base_hue: f32,

    /// Hue range covered by the band policy (degrees)
    pub hue_span: f32,

    /// Saturation (percent)
    pub saturation: f32,

    /// Lightness (percent)
    pub lightness: f32,

    /// Spawn origin as a fraction of surface (width, height)
    pub origin: (f32, f32),

    pub angle: AnglePolicy,
    pub hue: HuePolicy,
    pub alpha: AlphaPolicy,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            threshold: 50,
            low_freq_boost: 2.0,
            speed_divisor: 45.0,
            min_radius: 2.0,
            radius_span: 1.5,
            base_hue: 140.0, // green
            hue_span: 40.0,
            saturation: 80.0,
            lightness: 50.0,
            origin: (0.5, 1.0 / 3.0), // horizontally centered, upper third
            angle: AnglePolicy::default(),
            hue: HuePolicy::default(),
            alpha: AlphaPolicy::default(),
        }
    }
}

/// Per-frame simulation parameters
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Opacity lost per tick
    pub decay_step: f32,

    /// Opacity of the black rectangle composited every frame (trail length)
    pub fade_alpha: f32,

    /// Draw one bar per frequency bin along the bottom edge
    pub show_bars: bool,

    pub prune_order: PruneOrder,

    /// Draw dying particles (alpha <= 0) at full opacity for one frame
    pub final_flash: bool,

    pub spawn: SpawnConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            decay_step: 0.015,
            fade_alpha: 0.15,
            show_bars: true,
            prune_order: PruneOrder::default(),
            final_flash: false,
            spawn: SpawnConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Validate configuration (decay must be positive, etc.)
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |name, reason: &str| ConfigError::Simulation {
            name,
            reason: reason.to_string(),
        };

        if !is_positive(self.decay_step) {
            return Err(invalid("decay_step", "must be > 0"));
        }
        if !(0.0..=1.0).contains(&self.fade_alpha) {
            return Err(invalid("fade_alpha", "must be in [0, 1]"));
        }
        if !is_positive(self.spawn.speed_divisor) {
            return Err(invalid("speed_divisor", "must be > 0"));
        }
        if !is_positive(self.spawn.min_radius) || self.spawn.radius_span < 0.0 {
            return Err(invalid(
                "radius",
                "min_radius must be > 0 and radius_span >= 0",
            ));
        }
        if self.spawn.low_freq_boost < 1.0 {
            return Err(invalid("low_freq_boost", "must be >= 1"));
        }
        Ok(())
    }
}

/// False for NaN as well as non-positive values
fn is_positive(value: f32) -> bool {
    value > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_non_positive_decay() {
        let config = SimulationConfig {
            decay_step: 0.0,
            ..SimulationConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Simulation {
                name: "decay_step",
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_nan_divisor() {
        let mut config = SimulationConfig::default();
        config.spawn.speed_divisor = f32::NAN;
        assert!(config.validate().is_err());
    }
}
