//! Audio sources and spectrum analysis.
//!
//! Sources (file playback or microphone capture) push mono samples into a
//! shared tap from their cpal callbacks; the render loop pulls a byte
//! magnitude spectrum out of it once per frame.

mod analyser;
mod input;
mod system;
mod tap;

// Re-export public types
pub use analyser::{blackman_window, SpectrumAnalyser};
pub use input::{
    format_time, AudioBackend, Capture, InputController, InputMode, PlayPauseLabel, Playback,
    PlaybackControls,
};
pub use system::{CpalBackend, DecodedAudio, FilePlayback, MicCapture};
pub use tap::SampleTap;
