//! Pomofocus library
//!
//! This library provides the core functionality for the Pomofocus timer.
//! It includes:
//! - Session state machine and mode registry
//! - Settings validation
//! - Timer engine, tick scheduling and daily rollover
//! - Completion side effects: alarm sound and desktop notification
//! - State persistence
//! - IPC server/client for daemon-CLI communication
//! - CLI command parsing and display utilities

pub mod cli;
pub mod daemon;
pub mod notification;
pub mod settings;
pub mod sound;
pub mod types;

// Re-export commonly used types for convenience
pub use types::{
    IpcRequest, IpcResponse, Mode, ModeDefinition, ModeRegistry, PersistedState, ResponseData,
    SessionState,
};

pub use settings::{Settings, SettingsField, SettingsReport, SettingsUpdate};

pub use daemon::{
    plan_transition, CompletionDispatcher, CompletionNotice, StateStore, TimerEngine, TimerEvent,
};

pub use notification::{
    completion_content, DesktopNotifier, MockNotifier, NotificationContent, NotificationError,
    Notifier,
};

pub use sound::{
    discover_system_sounds, MockSoundPlayer, RodioSoundPlayer, SoundCatalog, SoundError,
    SoundPlayer, SoundSource,
};
