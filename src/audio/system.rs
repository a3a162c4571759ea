//! cpal-backed audio sources: WAV file playback and microphone capture.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

use super::input::{AudioBackend, Capture, Playback};
use super::tap::SampleTap;
use crate::error::AudioError;

/// Fully decoded audio file (interleaved, normalized to [-1, 1])
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub channels: usize,
    pub sample_rate: u32,
}

impl DecodedAudio {
    /// Decode a WAV file
    pub fn open(path: &Path) -> Result<Self, AudioError> {
        let decode_err = |source| AudioError::Decode {
            path: path.display().to_string(),
            source,
        };

        let reader = hound::WavReader::open(path).map_err(decode_err)?;
        let spec = reader.spec();

        let samples = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .into_samples::<f32>()
                .collect::<Result<Vec<_>, _>>()
                .map_err(decode_err)?,
            hound::SampleFormat::Int => {
                let scale = 1.0 / (1_i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| v as f32 * scale))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(decode_err)?
            }
        };

        Ok(Self {
            samples,
            channels: spec.channels.max(1) as usize,
            sample_rate: spec.sample_rate,
        })
    }

    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return f64::NAN;
        }
        self.frames() as f64 / self.sample_rate as f64
    }
}

/// Read position shared with the output callback
#[derive(Debug)]
struct Cursor {
    /// Position in source frames (fractional for rate conversion)
    position: f64,
    paused: bool,
}

/// Resampling reader over a decoded file
struct FileReader {
    audio: Arc<DecodedAudio>,
    cursor: Arc<Mutex<Cursor>>,
    /// Source frames advanced per output frame
    step: f64,
}

impl FileReader {
    /// Fill interleaved output frames; silence while paused or after the end
    fn fill(&self, data: &mut [f32], out_channels: usize) {
        let audio = &self.audio;
        let total = audio.frames();
        let mut cursor = self.cursor.lock();

        for frame in data.chunks_mut(out_channels) {
            if cursor.paused {
                frame.fill(0.0);
                continue;
            }
            if cursor.position >= total as f64 {
                cursor.paused = true;
                frame.fill(0.0);
                continue;
            }

            let index = cursor.position as usize;
            let frac = (cursor.position - index as f64) as f32;
            let next = (index + 1).min(total - 1);

            for (ch, out) in frame.iter_mut().enumerate() {
                let src_ch = ch.min(audio.channels - 1);
                let a = audio.samples[index * audio.channels + src_ch];
                let b = audio.samples[next * audio.channels + src_ch];
                *out = a + (b - a) * frac;
            }

            cursor.position += self.step;
            if cursor.position >= total as f64 {
                cursor.position = total as f64;
                cursor.paused = true;
            }
        }
    }
}

/// Audible playback of a decoded file, mirrored into the sample tap
pub struct FilePlayback {
    stream: cpal::Stream,
    cursor: Arc<Mutex<Cursor>>,
    total_frames: usize,
    sample_rate: u32,
}

impl Playback for FilePlayback {
    fn play(&mut self) -> Result<(), AudioError> {
        self.stream
            .play()
            .map_err(|e| AudioError::Play(e.to_string()))?;

        let mut cursor = self.cursor.lock();
        if cursor.position >= self.total_frames as f64 {
            cursor.position = 0.0;
        }
        cursor.paused = false;
        Ok(())
    }

    fn pause(&mut self) -> Result<(), AudioError> {
        // Stream keeps running so the analyser sees silence
        self.cursor.lock().paused = true;
        Ok(())
    }

    fn is_paused(&self) -> bool {
        self.cursor.lock().paused
    }

    fn position_secs(&self) -> f64 {
        self.cursor.lock().position / self.sample_rate as f64
    }

    fn duration_secs(&self) -> f64 {
        self.total_frames as f64 / self.sample_rate as f64
    }
}

/// Microphone capture stream (never routed to an output)
pub struct MicCapture {
    stream: Option<cpal::Stream>,
}

impl Capture for MicCapture {
    fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.pause() {
                error!("Failed to stop microphone: {}", e);
            }
        }
    }
}

impl Drop for MicCapture {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Audio backend on the default cpal host
pub struct CpalBackend {
    host: cpal::Host,
}

impl Default for CpalBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CpalBackend {
    pub fn new() -> Self {
        Self {
            host: cpal::default_host(),
        }
    }
}

impl AudioBackend for CpalBackend {
    type Playback = FilePlayback;
    type Capture = MicCapture;

    fn open_file(&mut self, path: &Path, tap: SampleTap) -> Result<FilePlayback, AudioError> {
        let audio = Arc::new(DecodedAudio::open(path)?);

        let device = self
            .host
            .default_output_device()
            .ok_or(AudioError::NoDevice("output"))?;
        let config: cpal::StreamConfig = device
            .default_output_config()
            .map_err(|e| AudioError::DeviceConfig(e.to_string()))?
            .into();

        info!(
            "Audio out: {} @ {}Hz (file {}Hz, {} ch, {:.1}s)",
            device.name().unwrap_or_else(|_| "Unknown".to_string()),
            config.sample_rate.0,
            audio.sample_rate,
            audio.channels,
            audio.duration_secs()
        );

        let cursor = Arc::new(Mutex::new(Cursor {
            position: 0.0,
            paused: true,
        }));
        let reader = FileReader {
            audio: Arc::clone(&audio),
            cursor: Arc::clone(&cursor),
            step: audio.sample_rate as f64 / config.sample_rate.0 as f64,
        };
        let out_channels = config.channels as usize;

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    reader.fill(data, out_channels);
                    tap.push_interleaved(data, out_channels);
                },
                |err| error!("Audio stream error: {}", err),
                None,
            )
            .map_err(|e| AudioError::BuildStream(e.to_string()))?;

        Ok(FilePlayback {
            stream,
            cursor,
            total_frames: audio.frames(),
            sample_rate: audio.sample_rate,
        })
    }

    fn open_microphone(&mut self, tap: SampleTap) -> Result<MicCapture, AudioError> {
        let device = self
            .host
            .default_input_device()
            .ok_or(AudioError::NoDevice("input"))?;
        let supported = device
            .default_input_config()
            .map_err(|e| AudioError::DeviceConfig(e.to_string()))?;

        info!(
            "Audio in: {} @ {}Hz",
            device.name().unwrap_or_else(|_| "Unknown".to_string()),
            supported.sample_rate().0
        );

        let config = supported.config();
        let stream = match supported.sample_format() {
            cpal::SampleFormat::F32 => build_input_stream::<f32>(&device, &config, tap),
            cpal::SampleFormat::I16 => build_input_stream::<i16>(&device, &config, tap),
            cpal::SampleFormat::U16 => build_input_stream::<u16>(&device, &config, tap),
            other => return Err(AudioError::UnsupportedFormat(format!("{:?}", other))),
        }
        .map_err(|e| AudioError::BuildStream(e.to_string()))?;

        stream
            .play()
            .map_err(|e| AudioError::Play(e.to_string()))?;

        Ok(MicCapture {
            stream: Some(stream),
        })
    }
}

/// Build a capture stream converting any sample type to f32 for the tap
fn build_input_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    tap: SampleTap,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let channels = config.channels as usize;
    let mut converted = Vec::new();

    device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            converted.clear();
            converted.extend(data.iter().map(|s| s.to_sample::<f32>()));
            tap.push_interleaved(&converted, channels);
        },
        |err| error!("Audio input stream error: {}", err),
        None,
    )
}
