//! bassbloom library - Audio-reactive particle visualizer

pub mod audio;
pub mod cli;
pub mod error;
pub mod params;
pub mod particles;
pub mod rendering;
pub mod surface;
