//! Core data types for the Pomodoro timer.
//!
//! This module defines the data structures used for:
//! - Interval modes and their display metadata
//! - Session state and its transitions
//! - Persisted state
//! - IPC request/response serialization

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::settings::{Settings, SettingsField, SettingsUpdate};
use crate::sound::SoundInfo;

// ============================================================================
// Mode
// ============================================================================

/// One of the three interval types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Focus interval
    Work,
    /// Short break between focus intervals
    ShortBreak,
    /// Long break after every fourth focus interval
    LongBreak,
}

impl Mode {
    /// All modes in display order.
    pub const ALL: [Mode; 3] = [Mode::Work, Mode::ShortBreak, Mode::LongBreak];

    /// Returns the string representation of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Work => "work",
            Mode::ShortBreak => "short_break",
            Mode::LongBreak => "long_break",
        }
    }

    /// Returns true for either break.
    pub fn is_break(&self) -> bool {
        !matches!(self, Mode::Work)
    }

    fn index(self) -> usize {
        match self {
            Mode::Work => 0,
            Mode::ShortBreak => 1,
            Mode::LongBreak => 2,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Mode::Work => "Focus time",
            Mode::ShortBreak => "Short break",
            Mode::LongBreak => "Long break",
        }
    }

    fn color_token(self) -> &'static str {
        match self {
            Mode::Work => "red",
            Mode::ShortBreak => "green",
            Mode::LongBreak => "blue",
        }
    }

    fn icon_token(self) -> &'static str {
        match self {
            Mode::Work => "brain",
            Mode::ShortBreak | Mode::LongBreak => "coffee",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "work" | "focus" => Ok(Mode::Work),
            "short" | "short-break" | "short_break" => Ok(Mode::ShortBreak),
            "long" | "long-break" | "long_break" => Ok(Mode::LongBreak),
            other => Err(format!(
                "unknown mode '{other}' (expected work, short-break or long-break)"
            )),
        }
    }
}

// ============================================================================
// ModeDefinition / ModeRegistry
// ============================================================================

/// Duration and display metadata of one mode.
///
/// The color and icon are opaque tokens for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeDefinition {
    pub mode: Mode,
    pub duration_seconds: u32,
    pub label: String,
    pub color_token: String,
    pub icon_token: String,
}

impl ModeDefinition {
    fn new(mode: Mode, minutes: u32) -> Self {
        Self {
            mode,
            duration_seconds: minutes.saturating_mul(60),
            label: mode.label().to_string(),
            color_token: mode.color_token().to_string(),
            icon_token: mode.icon_token().to_string(),
        }
    }
}

/// The three mode definitions derived from one set of settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeRegistry {
    definitions: [ModeDefinition; 3],
}

impl ModeRegistry {
    /// Builds every definition from scratch.
    #[must_use]
    pub fn rebuild(settings: &Settings) -> Self {
        Self {
            definitions: [
                ModeDefinition::new(Mode::Work, settings.work_minutes),
                ModeDefinition::new(Mode::ShortBreak, settings.short_break_minutes),
                ModeDefinition::new(Mode::LongBreak, settings.long_break_minutes),
            ],
        }
    }

    #[must_use]
    pub fn get(&self, mode: Mode) -> &ModeDefinition {
        &self.definitions[mode.index()]
    }

    /// Full length of `mode` in seconds.
    #[must_use]
    pub fn duration_seconds(&self, mode: Mode) -> u32 {
        self.get(mode).duration_seconds
    }

    /// Definitions in display order.
    pub fn iter(&self) -> impl Iterator<Item = &ModeDefinition> {
        self.definitions.iter()
    }
}

impl Default for ModeRegistry {
    fn default() -> Self {
        Self::rebuild(&Settings::default())
    }
}

// ============================================================================
// SessionState
// ============================================================================

/// Current mode, countdown and session count.
///
/// Fields are only changed through the transition methods below.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    current_mode: Mode,
    remaining_seconds: u32,
    is_running: bool,
    completed_sessions: u32,
    auto_start_breaks: bool,
}

impl SessionState {
    /// Creates a paused work session with a full countdown.
    #[must_use]
    pub fn new(work_duration: u32) -> Self {
        Self {
            current_mode: Mode::Work,
            remaining_seconds: work_duration,
            is_running: false,
            completed_sessions: 0,
            auto_start_breaks: false,
        }
    }

    /// Decrements the countdown by one second.
    ///
    /// Returns true exactly once per interval, on the tick that reaches
    /// zero; running is cleared before returning. A tick while paused is
    /// ignored.
    pub fn tick(&mut self) -> bool {
        if !self.is_running {
            return false;
        }
        if self.remaining_seconds == 0 {
            debug_assert!(false, "tick while running with no time remaining");
            self.is_running = false;
            return false;
        }

        self.remaining_seconds -= 1;
        if self.remaining_seconds == 0 {
            self.is_running = false;
            return true;
        }
        false
    }

    /// Flips running. Mode and remaining time are unchanged.
    pub fn toggle_running(&mut self) {
        self.is_running = !self.is_running;
    }

    /// Stops and rewinds the current mode to `duration`.
    pub fn reset(&mut self, duration: u32) {
        self.is_running = false;
        self.remaining_seconds = duration;
    }

    /// Stops and moves to `mode` with a full countdown.
    pub fn switch_mode(&mut self, mode: Mode, duration: u32) {
        self.is_running = false;
        self.current_mode = mode;
        self.remaining_seconds = duration;
    }

    /// Zeroes the session count only.
    pub fn reset_daily_session(&mut self) {
        self.completed_sessions = 0;
    }

    /// Moves to the interval that follows a completion.
    pub fn begin(&mut self, mode: Mode, duration: u32, running: bool) {
        self.current_mode = mode;
        self.remaining_seconds = duration;
        self.is_running = running;
    }

    pub fn set_remaining_seconds(&mut self, seconds: u32) {
        self.remaining_seconds = seconds;
    }

    pub fn set_completed_sessions(&mut self, count: u32) {
        self.completed_sessions = count;
    }

    pub fn set_auto_start_breaks(&mut self, enabled: bool) {
        self.auto_start_breaks = enabled;
    }

    pub fn current_mode(&self) -> Mode {
        self.current_mode
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn completed_sessions(&self) -> u32 {
        self.completed_sessions
    }

    pub fn auto_start_breaks(&self) -> bool {
        self.auto_start_breaks
    }
}

// ============================================================================
// PersistedState
// ============================================================================

/// The subset of state that survives a restart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    pub settings: Settings,
    #[serde(default)]
    pub auto_start_breaks: bool,
    #[serde(default)]
    pub completed_sessions: u32,
    /// Local date the session count belongs to
    pub session_date: NaiveDate,
}

// ============================================================================
// IPC Types
// ============================================================================

/// IPC request from client to daemon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum IpcRequest {
    /// Start or pause the countdown
    Toggle,
    /// Rewind the current mode
    Reset,
    /// Switch to another mode
    Switch {
        mode: Mode,
    },
    /// Query the current status
    Status,
    /// Apply a settings update
    Settings {
        #[serde(flatten)]
        update: SettingsUpdate,
    },
    /// Set the auto-start preference; toggles when `enabled` is absent
    AutoStartBreaks {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        enabled: Option<bool>,
    },
    /// List the alarm sound catalog
    Sounds,
    /// Play an alarm once; the selected alarm when `sound_id` is absent
    Preview {
        #[serde(
            rename = "soundId",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        sound_id: Option<String>,
    },
}

/// Response data for IPC responses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
    /// Display label of the current mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_seconds: Option<u32>,
    /// Full length of the current mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub running: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_sessions: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_start_breaks: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<Settings>,
    /// Settings fields whose input was rejected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected: Option<Vec<SettingsField>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sounds: Option<Vec<SoundInfo>>,
}

impl ResponseData {
    /// Creates response data from the session and its active definition.
    pub fn from_session(state: &SessionState, definition: &ModeDefinition) -> Self {
        Self {
            mode: Some(state.current_mode()),
            label: Some(definition.label.clone()),
            remaining_seconds: Some(state.remaining_seconds()),
            duration_seconds: Some(definition.duration_seconds),
            running: Some(state.is_running()),
            completed_sessions: Some(state.completed_sessions()),
            auto_start_breaks: Some(state.auto_start_breaks()),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = Some(settings);
        self
    }

    #[must_use]
    pub fn with_rejected(mut self, rejected: Vec<SettingsField>) -> Self {
        self.rejected = Some(rejected);
        self
    }

    #[must_use]
    pub fn with_sounds(mut self, sounds: Vec<SoundInfo>) -> Self {
        self.sounds = Some(sounds);
        self
    }
}

/// IPC response from daemon to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpcResponse {
    /// Response status ("success" or "error")
    pub status: String,
    /// Human-readable message
    pub message: String,
    /// Optional response data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

impl IpcResponse {
    /// Creates a success response.
    pub fn success(message: impl Into<String>, data: Option<ResponseData>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            data,
        }
    }

    /// Creates an error response.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            data: None,
        }
    }

    /// Returns true for a success response.
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

// ============================================================================
// Tests
// ============================================================================
