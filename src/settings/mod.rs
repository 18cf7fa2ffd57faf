//! User settings: interval lengths and alarm preferences.
//!
//! Updates arrive as raw text from the command line. Each numeric field is
//! validated on its own; a bad field is rejected and keeps its previous
//! value while the rest of the update still applies.

use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::sound::{SoundCatalog, DEFAULT_SOUND_ID};

/// Default work interval in minutes.
pub const DEFAULT_WORK_MINUTES: u32 = 25;
/// Default short break in minutes.
pub const DEFAULT_SHORT_BREAK_MINUTES: u32 = 5;
/// Default long break in minutes.
pub const DEFAULT_LONG_BREAK_MINUTES: u32 = 15;
/// Default alarm volume.
pub const DEFAULT_ALARM_VOLUME: f32 = 0.5;

/// Accepted work interval lengths.
pub const WORK_MINUTES_RANGE: RangeInclusive<u32> = 1..=60;
/// Accepted short break lengths.
pub const SHORT_BREAK_MINUTES_RANGE: RangeInclusive<u32> = 1..=30;
/// Accepted long break lengths.
pub const LONG_BREAK_MINUTES_RANGE: RangeInclusive<u32> = 1..=60;

// ============================================================================
// Settings
// ============================================================================

/// User-configurable durations and alarm preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Work interval length in minutes (1-60)
    pub work_minutes: u32,
    /// Short break length in minutes (1-30)
    pub short_break_minutes: u32,
    /// Long break length in minutes (1-60)
    pub long_break_minutes: u32,
    /// Catalog id of the alarm sound
    pub alarm_sound_id: String,
    /// Alarm volume (0.0-1.0)
    pub alarm_volume: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            work_minutes: DEFAULT_WORK_MINUTES,
            short_break_minutes: DEFAULT_SHORT_BREAK_MINUTES,
            long_break_minutes: DEFAULT_LONG_BREAK_MINUTES,
            alarm_sound_id: DEFAULT_SOUND_ID.to_string(),
            alarm_volume: DEFAULT_ALARM_VOLUME,
        }
    }
}

impl Settings {
    /// Applies an update field by field.
    ///
    /// Empty input resets a minute field to its default. Input that is not
    /// an integer inside the field's bound is rejected and the previous
    /// value is kept. Rejections are listed in the report, never returned
    /// as errors.
    #[must_use]
    pub fn apply(&self, update: &SettingsUpdate, catalog: &SoundCatalog) -> SettingsReport {
        let mut settings = self.clone();
        let mut rejected = Vec::new();

        for field in MinuteField::ALL {
            let Some(raw) = update.minutes(field) else {
                continue;
            };
            match field.parse_minutes(raw) {
                Some(minutes) => settings.set_minutes(field, minutes),
                None => {
                    debug!(field = %field.settings_field(), input = raw, "Rejected settings input");
                    rejected.push(field.settings_field());
                }
            }
        }

        if let Some(id) = &update.alarm_sound_id {
            if catalog.contains(id) {
                settings.alarm_sound_id.clone_from(id);
            } else {
                debug!(sound_id = %id, "Rejected unknown alarm sound");
                rejected.push(SettingsField::AlarmSound);
            }
        }

        if let Some(volume) = update.alarm_volume {
            if volume.is_finite() {
                settings.alarm_volume = volume.clamp(0.0, 1.0);
            } else {
                rejected.push(SettingsField::AlarmVolume);
            }
        }

        SettingsReport { settings, rejected }
    }

    /// Brings settings loaded from disk back inside their bounds.
    ///
    /// Out-of-bound minutes become defaults, an unknown sound becomes the
    /// catalog default and the volume is clamped.
    #[must_use]
    pub fn sanitized(mut self, catalog: &SoundCatalog) -> Self {
        for field in MinuteField::ALL {
            let current = self.minutes(field);
            if !field.range().contains(&current) {
                self.set_minutes(field, field.default_minutes());
            }
        }

        if !catalog.contains(&self.alarm_sound_id) {
            self.alarm_sound_id = catalog
                .default_entry()
                .map_or_else(|| DEFAULT_SOUND_ID.to_string(), |entry| entry.id.clone());
        }

        self.alarm_volume = if self.alarm_volume.is_finite() {
            self.alarm_volume.clamp(0.0, 1.0)
        } else {
            DEFAULT_ALARM_VOLUME
        };

        self
    }

    fn minutes(&self, field: MinuteField) -> u32 {
        match field {
            MinuteField::Work => self.work_minutes,
            MinuteField::ShortBreak => self.short_break_minutes,
            MinuteField::LongBreak => self.long_break_minutes,
        }
    }

    fn set_minutes(&mut self, field: MinuteField, minutes: u32) {
        match field {
            MinuteField::Work => self.work_minutes = minutes,
            MinuteField::ShortBreak => self.short_break_minutes = minutes,
            MinuteField::LongBreak => self.long_break_minutes = minutes,
        }
    }
}

// ============================================================================
// SettingsField
// ============================================================================

/// A single settings field, used to report rejected input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingsField {
    Work,
    ShortBreak,
    LongBreak,
    AlarmSound,
    AlarmVolume,
}

impl SettingsField {
    /// Returns the string representation of the field.
    pub fn as_str(&self) -> &'static str {
        match self {
            SettingsField::Work => "work",
            SettingsField::ShortBreak => "short_break",
            SettingsField::LongBreak => "long_break",
            SettingsField::AlarmSound => "alarm_sound",
            SettingsField::AlarmVolume => "alarm_volume",
        }
    }
}

impl fmt::Display for SettingsField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three interval-length fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MinuteField {
    Work,
    ShortBreak,
    LongBreak,
}

impl MinuteField {
    const ALL: [MinuteField; 3] = [Self::Work, Self::ShortBreak, Self::LongBreak];

    fn settings_field(self) -> SettingsField {
        match self {
            MinuteField::Work => SettingsField::Work,
            MinuteField::ShortBreak => SettingsField::ShortBreak,
            MinuteField::LongBreak => SettingsField::LongBreak,
        }
    }

    fn range(self) -> RangeInclusive<u32> {
        match self {
            MinuteField::Work => WORK_MINUTES_RANGE,
            MinuteField::ShortBreak => SHORT_BREAK_MINUTES_RANGE,
            MinuteField::LongBreak => LONG_BREAK_MINUTES_RANGE,
        }
    }

    fn default_minutes(self) -> u32 {
        match self {
            MinuteField::Work => DEFAULT_WORK_MINUTES,
            MinuteField::ShortBreak => DEFAULT_SHORT_BREAK_MINUTES,
            MinuteField::LongBreak => DEFAULT_LONG_BREAK_MINUTES,
        }
    }

    /// Empty input maps to the default; `None` means reject.
    fn parse_minutes(self, raw: &str) -> Option<u32> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Some(self.default_minutes());
        }
        trimmed
            .parse::<u32>()
            .ok()
            .filter(|minutes| self.range().contains(minutes))
    }
}

// ============================================================================
// SettingsUpdate / SettingsReport
// ============================================================================

/// A partial settings change. Minute fields carry the raw user input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_minutes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_break_minutes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_break_minutes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alarm_sound_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alarm_volume: Option<f32>,
}

impl SettingsUpdate {
    /// Returns true if the update changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    fn minutes(&self, field: MinuteField) -> Option<&str> {
        match field {
            MinuteField::Work => self.work_minutes.as_deref(),
            MinuteField::ShortBreak => self.short_break_minutes.as_deref(),
            MinuteField::LongBreak => self.long_break_minutes.as_deref(),
        }
    }
}

/// Result of [`Settings::apply`].
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsReport {
    /// The settings after every accepted field was applied
    pub settings: Settings,
    /// Fields whose input was rejected, in the order they were checked
    pub rejected: Vec<SettingsField>,
}

impl SettingsReport {
    /// Returns true if every field in the update was accepted.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
