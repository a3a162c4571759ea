//! Audio source selection and playback side state.
//!
//! The controller owns whichever source currently feeds the sample tap and
//! keeps the play/pause label and time readout in step with it. Switching
//! sources always tears the previous one down before the next is opened.

use std::fmt;
use std::path::Path;
use tracing::{debug, error, info, warn};

use super::tap::SampleTap;
use crate::error::AudioError;

/// Audible file playback routed through the sample tap
pub trait Playback {
    fn play(&mut self) -> Result<(), AudioError>;
    fn pause(&mut self) -> Result<(), AudioError>;
    fn is_paused(&self) -> bool;

    /// Elapsed playback time (seconds)
    fn position_secs(&self) -> f64;

    /// Total length (seconds); NaN when unknown
    fn duration_secs(&self) -> f64;
}

/// Live capture that feeds the sample tap without an audible output
pub trait Capture {
    /// Stop all capture tracks
    fn stop(&mut self);
}

/// Factory for audio sources
pub trait AudioBackend {
    type Playback: Playback;
    type Capture: Capture;

    fn open_file(&mut self, path: &Path, tap: SampleTap) -> Result<Self::Playback, AudioError>;
    fn open_microphone(&mut self, tap: SampleTap) -> Result<Self::Capture, AudioError>;
}

/// Which kind of source the user selected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    File,
    Microphone,
}

/// Two-state play/pause button label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayPauseLabel {
    /// Shown while paused or idle
    #[default]
    Play,
    /// Shown while playing
    Pause,
}

impl PlayPauseLabel {
    pub fn glyph(self) -> &'static str {
        match self {
            Self::Play => "▶",
            Self::Pause => "⏸",
        }
    }
}

impl fmt::Display for PlayPauseLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.glyph())
    }
}

/// Play/pause label and `elapsed / total` readout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackControls {
    pub label: PlayPauseLabel,
    pub readout: String,
}

impl Default for PlaybackControls {
    fn default() -> Self {
        Self {
            label: PlayPauseLabel::Play,
            readout: "0:00 / 0:00".to_string(),
        }
    }
}

impl PlaybackControls {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Format seconds as `m:ss`. Zero, NaN and non-finite values give `0:00`.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "0:00".to_string();
    }
    let minutes = (seconds / 60.0).floor() as u64;
    let secs = (seconds % 60.0).floor() as u64;
    format!("{}:{:02}", minutes, secs)
}

/// Owner of the current audio source
pub struct InputController<B: AudioBackend> {
    backend: B,
    tap: SampleTap,
    mode: InputMode,
    playback: Option<B::Playback>,
    capture: Option<B::Capture>,
    controls: PlaybackControls,
    /// Playback refused to start; retry on the next user interaction
    pending_unlock: bool,
}

impl<B: AudioBackend> InputController<B> {
    pub fn new(backend: B, tap: SampleTap) -> Self {
        Self {
            backend,
            tap,
            mode: InputMode::File,
            playback: None,
            capture: None,
            controls: PlaybackControls::default(),
            pending_unlock: false,
        }
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn controls(&self) -> &PlaybackControls {
        &self.controls
    }

    pub fn playback(&self) -> Option<&B::Playback> {
        self.playback.as_ref()
    }

    pub fn is_capturing(&self) -> bool {
        self.capture.is_some()
    }

    pub fn is_playing(&self) -> bool {
        self.controls.label == PlayPauseLabel::Pause
    }

    pub fn pending_unlock(&self) -> bool {
        self.pending_unlock
    }

    /// Switch between microphone and file input
    pub fn set_microphone(&mut self, enabled: bool) {
        info!("Use mic: {}", enabled);

        if enabled {
            self.mode = InputMode::Microphone;
            self.stop_playback();
            self.stop_capture();
            self.tap.clear();

            match self.backend.open_microphone(self.tap.clone()) {
                Ok(capture) => self.capture = Some(capture),
                Err(e) => error!("Microphone capture failed: {}", e),
            }
        } else {
            self.mode = InputMode::File;
            self.stop_capture();
            self.tap.clear();
            debug!("Microphone disabled");
        }
    }

    /// Load and start a file. Ignored while the microphone is selected.
    pub fn open_file(&mut self, path: &Path) {
        if self.mode == InputMode::Microphone {
            debug!("Ignoring file {} while microphone is active", path.display());
            return;
        }

        self.stop_playback();
        self.tap.clear();

        match self.backend.open_file(path, self.tap.clone()) {
            Ok(playback) => {
                info!("Playing {}", path.display());
                self.playback = Some(playback);
                self.start_playback();
            }
            Err(e) => error!("Failed to open {}: {}", path.display(), e),
        }
    }

    /// Pause or resume the current file. No-op without one.
    pub fn toggle_playback(&mut self) {
        let Some(playback) = self.playback.as_mut() else {
            return;
        };

        if playback.is_paused() {
            self.start_playback();
        } else {
            if let Err(e) = playback.pause() {
                warn!("{}", e);
            }
            self.controls.label = PlayPauseLabel::Play;
        }
    }

    /// Any key or mouse press; unlocks playback that failed to start.
    ///
    /// Returns `true` when the interaction was spent on a retry, in which
    /// case a play/pause key press must not also toggle playback.
    pub fn on_user_interaction(&mut self) -> bool {
        if !self.pending_unlock || self.playback.is_none() {
            return false;
        }
        debug!("Retrying playback after user interaction");
        self.start_playback();
        true
    }

    /// Recompute the time readout and label from the playback handle
    pub fn refresh_time(&mut self) {
        let Some(playback) = self.playback.as_ref() else {
            return;
        };

        self.controls.readout = format!(
            "{} / {}",
            format_time(playback.position_secs()),
            format_time(playback.duration_secs())
        );
        if playback.is_paused() && !self.pending_unlock {
            self.controls.label = PlayPauseLabel::Play;
        }
    }

    /// Window title text: `prefix ▶ 0:00 / 0:00`, or the mic marker
    pub fn title(&self, prefix: &str) -> String {
        match self.mode {
            InputMode::Microphone if self.is_capturing() => format!("{} [mic]", prefix),
            InputMode::Microphone => format!("{} [mic unavailable]", prefix),
            InputMode::File => format!(
                "{} {} {}",
                prefix, self.controls.label, self.controls.readout
            ),
        }
    }

    fn start_playback(&mut self) {
        let Some(playback) = self.playback.as_mut() else {
            return;
        };

        match playback.play() {
            Ok(()) => {
                self.pending_unlock = false;
                self.controls.label = PlayPauseLabel::Pause;
            }
            Err(e) => {
                warn!("Playback blocked until next interaction: {}", e);
                self.pending_unlock = true;
                self.controls.label = PlayPauseLabel::Play;
            }
        }
    }

    fn stop_playback(&mut self) {
        if let Some(mut playback) = self.playback.take() {
            if let Err(e) = playback.pause() {
                warn!("{}", e);
            }
            self.controls.reset();
        }
        self.pending_unlock = false;
    }

    fn stop_capture(&mut self) {
        if let Some(mut capture) = self.capture.take() {
            capture.stop();
        }
    }
}
