//! Alarm sound support for the Pomodoro timer.
//!
//! This module provides:
//!
//! - The alarm sound catalog that settings refer to by id
//! - Platform sound discovery
//! - Non-blocking playback with volume control
//! - Graceful degradation when audio is unavailable
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────────┐
//! │   SoundCatalog   │────▶│   SoundSource    │
//! │  (id → entry)    │     │  File | Tone     │
//! └──────────────────┘     └────────┬─────────┘
//!                                   │
//!                                   ▼
//!                          ┌──────────────────┐
//!                          │   SoundPlayer    │ ← rodio / mock
//!                          └──────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use pomofocus::sound::{RodioSoundPlayer, SoundCatalog};
//!
//! let catalog = SoundCatalog::builtin();
//! let player = RodioSoundPlayer::new().expect("audio init");
//! player.play(&catalog.resolve("chime"), 0.7).expect("playback failed");
//! ```

mod catalog;
mod error;
mod player;
mod source;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

pub use catalog::{SoundCatalog, SoundEntry, SoundInfo, DEFAULT_SOUND_ID};
pub use error::SoundError;
pub use player::{try_create_player, RodioSoundPlayer};
pub use source::{discover_system_sounds, SoundSource, SystemSound};

/// Trait for sound playback implementations.
///
/// This trait abstracts the sound playback functionality, allowing for
/// different implementations (e.g., rodio-based, mock for testing).
pub trait SoundPlayer {
    /// Plays a sound at the given volume (0.0..=1.0).
    ///
    /// This method should be non-blocking; the sound plays in the background.
    ///
    /// # Errors
    ///
    /// Returns an error if playback fails.
    fn play(&self, source: &SoundSource, volume: f32) -> Result<(), SoundError>;
}

impl SoundPlayer for RodioSoundPlayer {
    fn play(&self, source: &SoundSource, volume: f32) -> Result<(), SoundError> {
        RodioSoundPlayer::play(self, source, volume)
    }
}

impl<T: SoundPlayer + ?Sized> SoundPlayer for Arc<T> {
    fn play(&self, source: &SoundSource, volume: f32) -> Result<(), SoundError> {
        (**self).play(source, volume)
    }
}

/// Mock sound player for testing.
#[derive(Debug)]
pub struct MockSoundPlayer {
    play_calls: Mutex<Vec<(SoundSource, f32)>>,
    should_fail: AtomicBool,
}

impl MockSoundPlayer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            play_calls: Mutex::new(Vec::new()),
            should_fail: AtomicBool::new(false),
        }
    }

    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    #[must_use]
    pub fn play_count(&self) -> usize {
        self.calls().len()
    }

    #[must_use]
    pub fn get_play_calls(&self) -> Vec<(SoundSource, f32)> {
        self.calls().clone()
    }

    fn calls(&self) -> std::sync::MutexGuard<'_, Vec<(SoundSource, f32)>> {
        self.play_calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Default for MockSoundPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl SoundPlayer for MockSoundPlayer {
    fn play(&self, source: &SoundSource, volume: f32) -> Result<(), SoundError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(SoundError::PlaybackError("Mock failure".to_string()));
        }
        self.calls().push((source.clone(), volume));
        Ok(())
    }
}
