//! Command-line argument parsing.

use clap::Parser;
use std::path::PathBuf;

use crate::params::{
    AlphaPolicy, AnglePolicy, FftConfig, HuePolicy, PruneOrder, RenderConfig, SimulationConfig,
    SpawnConfig,
};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "bassbloom")]
#[command(about = "Audio-reactive particle visualizer", long_about = None)]
pub struct Args {
    /// WAV file to play and visualize
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Start with the microphone instead of a file
    #[arg(long)]
    pub mic: bool,

    /// Magnitude (0-255) a frequency bin must exceed to spawn a particle
    #[arg(long, value_name = "MAGNITUDE", default_value_t = 50)]
    pub threshold: u8,

    /// Particle direction policy
    #[arg(long, value_enum, default_value_t = AnglePolicy::GoldenRatio)]
    pub angle: AnglePolicy,

    /// Particle hue policy
    #[arg(long, value_enum, default_value_t = HuePolicy::Band)]
    pub hue: HuePolicy,

    /// Particle initial opacity policy
    #[arg(long, value_enum, default_value_t = AlphaPolicy::Spectral)]
    pub alpha: AlphaPolicy,

    /// Whether dead particles get drawn one last time
    #[arg(long, value_enum, default_value_t = PruneOrder::DrawThenPrune)]
    pub prune: PruneOrder,

    /// Draw dying particles at full opacity
    #[arg(long)]
    pub final_flash: bool,

    /// Hide the spectrum bars
    #[arg(long)]
    pub no_bars: bool,

    /// Fraction of the window height used for drawing
    #[arg(long, value_name = "FRACTION", default_value_t = 1.0)]
    pub height_fraction: f32,

    /// FFT size (power of 2); bin count is half of this
    #[arg(long, value_name = "SAMPLES", default_value_t = 256)]
    pub fft_size: usize,

    /// Seed for spawn randomness (random if omitted)
    #[arg(long)]
    pub seed: Option<u64>,
}

impl Args {
    pub fn simulation_config(&self) -> SimulationConfig {
        SimulationConfig {
            show_bars: !self.no_bars,
            prune_order: self.prune,
            final_flash: self.final_flash,
            spawn: SpawnConfig {
                threshold: self.threshold,
                angle: self.angle,
                hue: self.hue,
                alpha: self.alpha,
                ..SpawnConfig::default()
            },
            ..SimulationConfig::default()
        }
    }

    pub fn fft_config(&self) -> FftConfig {
        FftConfig {
            fft_size: self.fft_size,
            ..FftConfig::default()
        }
    }

    pub fn render_config(&self) -> RenderConfig {
        RenderConfig {
            height_fraction: self.height_fraction,
            ..RenderConfig::default()
        }
    }
}
