//! Parameter definitions with units and documented semantics.
//!
//! All magic numbers are extracted here with:
//! - Units (pixels, bins, degrees, per-frame steps)
//! - Documented ranges and meanings
//! - Type safety where possible

mod audio;
mod particles;
mod render;

// Re-export all types
pub use audio::FftConfig;
pub use particles::{
    AlphaPolicy, AnglePolicy, HuePolicy, PruneOrder, SimulationConfig, SpawnConfig,
};
pub use render::RenderConfig;
