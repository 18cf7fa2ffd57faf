//! Sound source management.
//!
//! A sound is either a file on disk (platform alarm sounds) or a
//! synthesized sine tone, which needs no audio assets and doubles as the
//! fallback when a file cannot be played.

use std::path::{Path, PathBuf};

/// Frequency of the fallback beep in Hz.
pub const FALLBACK_TONE_HZ: u32 = 800;

/// Length of the fallback beep in milliseconds.
pub const FALLBACK_TONE_MS: u64 = 1000;

/// Represents the source of a sound to be played.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoundSource {
    /// An audio file on disk.
    File {
        /// The full path to the sound file.
        path: PathBuf,
    },
    /// A synthesized sine tone.
    Tone {
        /// Tone frequency in Hz.
        frequency_hz: u32,
        /// Tone length in milliseconds.
        duration_ms: u64,
    },
}

impl SoundSource {
    /// Creates a file-backed sound source.
    #[must_use]
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File { path: path.into() }
    }

    /// Creates a synthesized tone.
    #[must_use]
    pub fn tone(frequency_hz: u32, duration_ms: u64) -> Self {
        Self::Tone {
            frequency_hz,
            duration_ms,
        }
    }

    /// The beep used when nothing better can be played.
    #[must_use]
    pub fn fallback_beep() -> Self {
        Self::tone(FALLBACK_TONE_HZ, FALLBACK_TONE_MS)
    }

    /// Returns true if this source reads from a file.
    #[must_use]
    pub fn is_file(&self) -> bool {
        matches!(self, Self::File { .. })
    }

    /// Returns true if this source is a synthesized tone.
    #[must_use]
    pub fn is_tone(&self) -> bool {
        matches!(self, Self::Tone { .. })
    }

    /// Returns the file path if this is a file source.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::File { path } => Some(path),
            Self::Tone { .. } => None,
        }
    }
}

/// Directories to search for platform sounds, in order of priority.
const SYSTEM_SOUND_DIRS: &[&str] = &[
    "/System/Library/Sounds",
    "/Library/Sounds",
    "/usr/share/sounds/freedesktop/stereo",
];

/// Supported audio file extensions.
const SUPPORTED_EXTENSIONS: &[&str] = &["aiff", "wav", "mp3", "flac", "ogg", "oga"];

/// A sound file found on the system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemSound {
    /// File stem, e.g. "Glass" or "complete".
    pub name: String,
    /// Full path to the file.
    pub path: PathBuf,
}

/// Discovers available system sounds.
///
/// Scans the platform sound directories and returns the sounds sorted by
/// name. Returns an empty vector if nothing is found.
#[must_use]
pub fn discover_system_sounds() -> Vec<SystemSound> {
    let mut sounds: Vec<SystemSound> = SYSTEM_SOUND_DIRS
        .iter()
        .flat_map(|dir| scan_sound_dir(Path::new(dir)))
        .collect();

    sounds.sort_by(|a, b| a.name.cmp(&b.name));
    sounds
}

/// Lists the supported sound files directly inside `dir`.
pub(crate) fn scan_sound_dir(dir: &Path) -> Vec<SystemSound> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| has_supported_extension(path))
        .filter_map(|path| {
            let name = path.file_stem()?.to_string_lossy().into_owned();
            Some(SystemSound { name, path })
        })
        .collect()
}

fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sound_source_file() {
        let source = SoundSource::file("/System/Library/Sounds/Glass.aiff");
        assert!(source.is_file());
        assert!(!source.is_tone());
        assert_eq!(
            source.path(),
            Some(Path::new("/System/Library/Sounds/Glass.aiff"))
        );
    }

    #[test]
    fn test_sound_source_tone() {
        let source = SoundSource::tone(440, 500);
        assert!(source.is_tone());
        assert!(source.path().is_none());
    }

    #[test]
    fn test_fallback_beep() {
        assert_eq!(
            SoundSource::fallback_beep(),
            SoundSource::Tone {
                frequency_hz: 800,
                duration_ms: 1000
            }
        );
    }

    #[test]
    fn test_discover_system_sounds_no_panic() {
        // Results depend on the host; containers usually have none.
        let _ = discover_system_sounds();
    }

    #[test]
    fn test_scan_sound_dir_filters_extensions() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bell.oga"), b"").unwrap();
        std::fs::write(dir.path().join("Glass.AIFF"), b"").unwrap();
        std::fs::write(dir.path().join("readme.txt"), b"").unwrap();

        let mut names: Vec<String> = scan_sound_dir(dir.path())
            .into_iter()
            .map(|s| s.name)
            .collect();
        names.sort();

        assert_eq!(names, vec!["Glass".to_string(), "bell".to_string()]);
    }

    #[test]
    fn test_scan_missing_dir_is_empty() {
        assert!(scan_sound_dir(Path::new("/nonexistent/sounds/dir")).is_empty());
    }
}
