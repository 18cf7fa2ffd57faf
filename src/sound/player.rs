//! Sound player implementation using rodio.
//!
//! This module provides the `RodioSoundPlayer` which uses the rodio v0.20
//! audio library for cross-platform sound playback.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use rodio::source::{SineWave, Source};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use tracing::{debug, warn};

use super::error::SoundError;
use super::source::{SoundSource, FALLBACK_TONE_HZ, FALLBACK_TONE_MS};

/// Peak amplitude of synthesized tones before volume is applied.
const TONE_AMPLITUDE: f32 = 0.3;

/// A sound player that uses rodio for audio playback.
///
/// The output stream is not `Send`, so the player must live on the thread
/// that created it. Playback is non-blocking; sounds continue playing in
/// the background after `play` returns.
pub struct RodioSoundPlayer {
    /// The audio output stream (must be kept alive for playback).
    _stream: OutputStream,
    /// Handle to the output stream for creating sinks.
    stream_handle: OutputStreamHandle,
}

impl RodioSoundPlayer {
    /// Opens the default audio output.
    ///
    /// # Errors
    ///
    /// Returns `SoundError::DeviceNotAvailable` if no audio output device
    /// is available.
    pub fn new() -> Result<Self, SoundError> {
        let (stream, stream_handle) = OutputStream::try_default()
            .map_err(|e| SoundError::DeviceNotAvailable(e.to_string()))?;

        debug!("Audio output stream initialized");

        Ok(Self {
            _stream: stream,
            stream_handle,
        })
    }

    /// Plays a sound at the given volume (clamped to 0.0..=1.0).
    ///
    /// A file that cannot be opened or decoded falls back to the
    /// synthesized beep.
    ///
    /// # Errors
    ///
    /// Returns an error if no sink can be created or the fallback also fails.
    pub fn play(&self, source: &SoundSource, volume: f32) -> Result<(), SoundError> {
        let volume = volume.clamp(0.0, 1.0);

        match source {
            SoundSource::File { path } => match self.play_file(path, volume) {
                Ok(()) => Ok(()),
                Err(e) if e.should_fallback_to_tone() => {
                    warn!(
                        "Failed to play '{}': {}, falling back to beep",
                        path.display(),
                        e
                    );
                    self.play_tone(FALLBACK_TONE_HZ, FALLBACK_TONE_MS, volume)
                }
                Err(e) => Err(e),
            },
            SoundSource::Tone {
                frequency_hz,
                duration_ms,
            } => self.play_tone(*frequency_hz, *duration_ms, volume),
        }
    }

    /// Plays a sound file from the filesystem.
    fn play_file(&self, path: &Path, volume: f32) -> Result<(), SoundError> {
        let file = File::open(path)
            .map_err(|e| SoundError::FileNotFound(format!("{}: {}", path.display(), e)))?;

        let decoder = Decoder::new(BufReader::new(file))
            .map_err(|e| SoundError::DecodeError(e.to_string()))?;

        let sink = self.new_sink(volume)?;
        sink.append(decoder);
        sink.detach(); // Non-blocking: sound continues after function returns

        debug!(path = %path.display(), "File playback started (detached)");
        Ok(())
    }

    /// Plays a sine tone.
    fn play_tone(&self, frequency_hz: u32, duration_ms: u64, volume: f32) -> Result<(), SoundError> {
        #[allow(clippy::cast_precision_loss)]
        let tone = SineWave::new(frequency_hz as f32)
            .take_duration(Duration::from_millis(duration_ms))
            .amplify(TONE_AMPLITUDE);

        let sink = self.new_sink(volume)?;
        sink.append(tone);
        sink.detach();

        debug!(frequency_hz, duration_ms, "Tone playback started (detached)");
        Ok(())
    }

    fn new_sink(&self, volume: f32) -> Result<Sink, SoundError> {
        let sink = Sink::try_new(&self.stream_handle)
            .map_err(|e| SoundError::StreamError(e.to_string()))?;
        sink.set_volume(volume);
        Ok(sink)
    }
}

impl std::fmt::Debug for RodioSoundPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RodioSoundPlayer").finish_non_exhaustive()
    }
}

/// Creates a sound player, returning None if audio is unavailable.
///
/// If audio initialization fails, a warning is logged and None is returned.
#[must_use]
pub fn try_create_player() -> Option<RodioSoundPlayer> {
    match RodioSoundPlayer::new() {
        Ok(player) => Some(player),
        Err(e) => {
            warn!("Audio not available, alarm sound disabled: {}", e);
            None
        }
    }
}
