//! Alarm sound catalog.
//!
//! The catalog is an ordered list of selectable alarm sounds. Settings
//! reference entries by id; the timer never constructs entries itself.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::source::{discover_system_sounds, SoundSource, SystemSound};

/// Id of the sound selected when nothing else is configured.
pub const DEFAULT_SOUND_ID: &str = "bell";

/// Prefix for ids of sounds discovered on the host.
const SYSTEM_ID_PREFIX: &str = "system:";

/// One selectable alarm sound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundEntry {
    /// Stable identifier stored in settings.
    pub id: String,
    /// Human-readable label.
    pub label: String,
    /// Where the audio comes from.
    pub source: SoundSource,
}

impl SoundEntry {
    /// Creates a new catalog entry.
    #[must_use]
    pub fn new(id: impl Into<String>, label: impl Into<String>, source: SoundSource) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            source,
        }
    }

    /// Returns the id/label pair shown to clients.
    #[must_use]
    pub fn info(&self) -> SoundInfo {
        SoundInfo {
            id: self.id.clone(),
            label: self.label.clone(),
        }
    }
}

/// Id and label of a catalog entry, as sent over IPC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoundInfo {
    pub id: String,
    pub label: String,
}

/// Ordered list of alarm sounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundCatalog {
    entries: Vec<SoundEntry>,
}

impl SoundCatalog {
    /// Creates a catalog from explicit entries. Later duplicates of an id
    /// are dropped.
    #[must_use]
    pub fn new(entries: Vec<SoundEntry>) -> Self {
        let mut catalog = Self {
            entries: Vec::with_capacity(entries.len()),
        };
        for entry in entries {
            catalog.push(entry);
        }
        catalog
    }

    /// The built-in synthesized sounds: bell, chime and beep.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(vec![
            SoundEntry::new(DEFAULT_SOUND_ID, "Bell", SoundSource::tone(660, 1500)),
            SoundEntry::new("chime", "Chime", SoundSource::tone(1046, 800)),
            SoundEntry::new("beep", "Beep", SoundSource::fallback_beep()),
        ])
    }

    /// Appends the sounds found in the platform sound directories.
    #[must_use]
    pub fn with_system_sounds(self) -> Self {
        self.with_discovered(discover_system_sounds())
    }

    pub(crate) fn with_discovered(mut self, sounds: Vec<SystemSound>) -> Self {
        for sound in sounds {
            let id = format!("{SYSTEM_ID_PREFIX}{}", sound.name.to_lowercase());
            self.push(SoundEntry::new(id, sound.name, SoundSource::file(sound.path)));
        }
        self
    }

    fn push(&mut self, entry: SoundEntry) {
        if !self.contains(&entry.id) {
            self.entries.push(entry);
        }
    }

    /// Looks up an entry by exact id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&SoundEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Returns true if an entry with this id exists.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// All entries in catalog order.
    #[must_use]
    pub fn entries(&self) -> &[SoundEntry] {
        &self.entries
    }

    /// Id/label pairs in catalog order.
    #[must_use]
    pub fn infos(&self) -> Vec<SoundInfo> {
        self.entries.iter().map(SoundEntry::info).collect()
    }

    /// The default entry, or the first one if the default is missing.
    #[must_use]
    pub fn default_entry(&self) -> Option<&SoundEntry> {
        self.get(DEFAULT_SOUND_ID).or_else(|| self.entries.first())
    }

    /// Resolves an id to something playable.
    ///
    /// Unknown ids resolve to the default entry, and an empty catalog
    /// resolves to the fallback beep.
    #[must_use]
    pub fn resolve(&self, id: &str) -> SoundSource {
        if let Some(entry) = self.get(id) {
            return entry.source.clone();
        }

        warn!(sound_id = id, "Unknown alarm sound, using default");
        self.default_entry()
            .map(|entry| entry.source.clone())
            .unwrap_or_else(SoundSource::fallback_beep)
    }
}

impl Default for SoundCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
