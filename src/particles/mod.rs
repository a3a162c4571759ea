//! Audio-driven particle simulation.
//!
//! Every frame the simulator fades the previous image, draws the spectrum
//! bars, spawns one particle per loud frequency bin and advances the live
//! set. Output is a list of draw commands; rendering happens elsewhere.

mod draw;
mod particle;
pub mod spawn;
mod simulator;

// Re-export public types
pub use draw::{DrawCommand, Frame, Rect};
pub use particle::{Color, Hsl, Particle};
pub use simulator::Simulator;
