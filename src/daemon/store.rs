//! State persistence.
//!
//! Only settings, the auto-start preference and today's session count are
//! stored. The countdown itself is never resumed across a restart.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use thiserror::Error;
use tracing::{debug, warn};

use crate::types::PersistedState;

use super::timer::TimerEngine;

/// State file location relative to the home directory.
const DEFAULT_STATE_FILE: &str = ".pomofocus/state.json";

// ============================================================================
// StoreError
// ============================================================================

/// Errors that can occur while loading or saving state.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the state file failed
    #[error("state file I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The state file does not contain valid state
    #[error("state file {path} is not valid: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// State could not be serialized
    #[error("failed to serialize state: {0}")]
    Serialize(#[from] serde_json::Error),
}

// ============================================================================
// StateStore
// ============================================================================

/// Load/save capability for persisted state.
pub trait StateStore: Send + Sync {
    /// Loads the saved state, or `None` if nothing was saved yet.
    ///
    /// # Errors
    ///
    /// Returns an error if saved state exists but cannot be read.
    fn load(&self) -> Result<Option<PersistedState>, StoreError>;

    /// Replaces the saved state.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be written.
    fn save(&self, state: &PersistedState) -> Result<(), StoreError>;
}

/// Saves the engine's persisted subset, logging failures.
pub fn persist(store: &dyn StateStore, engine: &TimerEngine) {
    match store.save(&engine.persisted()) {
        Ok(()) => debug!("State saved"),
        Err(e) => warn!("Failed to save state: {}", e),
    }
}

/// Returns the default state file path under the home directory.
pub fn default_state_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(DEFAULT_STATE_FILE))
}

// ============================================================================
// JsonFileStore
// ============================================================================

/// Stores state as pretty-printed JSON in a single file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> Result<Option<PersistedState>, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };

        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|source| StoreError::Parse {
                path: self.path.clone(),
                source,
            })
    }

    fn save(&self, state: &PersistedState) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let json = serde_json::to_string_pretty(state)?;

        // Readers only ever see a complete file
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| self.io_error(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;

        Ok(())
    }
}

// ============================================================================
// MemoryStore
// ============================================================================

/// In-memory store for testing.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<Option<PersistedState>>,
    saves: AtomicUsize,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_state(state: PersistedState) -> Self {
        Self {
            state: Mutex::new(Some(state)),
            saves: AtomicUsize::new(0),
        }
    }

    /// Returns the last saved state.
    #[must_use]
    pub fn snapshot(&self) -> Option<PersistedState> {
        self.slot().clone()
    }

    /// Number of successful saves.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<PersistedState>> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> Result<Option<PersistedState>, StoreError> {
        Ok(self.snapshot())
    }

    fn save(&self, state: &PersistedState) -> Result<(), StoreError> {
        *self.slot() = Some(state.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
