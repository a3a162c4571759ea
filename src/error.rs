//! Error types for configuration, audio sources and rendering.

use thiserror::Error;

/// Invalid parameter values
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// FFT size outside the supported power-of-two range
    #[error("FFT size must be a power of 2 in [32, 32768], got {0}")]
    FftSize(usize),

    /// Smoothing constant outside [0, 1]
    #[error("Smoothing time constant must be in [0, 1], got {0}")]
    Smoothing(f32),

    /// Decibel window is empty or inverted
    #[error("min_db ({min}) must be below max_db ({max})")]
    DecibelRange { min: f32, max: f32 },

    /// Drawing surface would cover none (or more than all) of the window
    #[error("Height fraction must be in (0, 1], got {0}")]
    HeightFraction(f32),

    /// A simulation parameter is out of range
    #[error("Invalid simulation parameter `{name}`: {reason}")]
    Simulation { name: &'static str, reason: String },
}

/// Failures while acquiring or driving an audio source
#[derive(Error, Debug)]
pub enum AudioError {
    /// No matching device on the default host
    #[error("No audio {0} device found")]
    NoDevice(&'static str),

    /// Device refused to report a usable stream configuration
    #[error("Failed to get audio config: {0}")]
    DeviceConfig(String),

    /// Stream could not be built
    #[error("Failed to build audio stream: {0}")]
    BuildStream(String),

    /// Stream was built but refused to start
    #[error("Failed to start audio stream: {0}")]
    Play(String),

    /// Input file could not be decoded
    #[error("Failed to decode {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: hound::Error,
    },

    /// Device sample format we do not convert
    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),
}

/// Failures while setting up the GPU surface
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("Failed to find suitable GPU adapter")]
    Adapter,

    #[error("Failed to request device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
}
