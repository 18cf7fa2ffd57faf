//! Display utilities for the Pomodoro timer CLI.
//!
//! This module provides formatted output for:
//! - Command results
//! - Error messages
//! - Status, settings and sound listings

use crate::types::{IpcResponse, ResponseData};

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Shows the result of toggle, reset or mode switch.
    pub fn show_timer_change(response: &IpcResponse) {
        let symbol = match response.data.as_ref().and_then(|d| d.running) {
            Some(true) => ">",
            _ => "||",
        };
        println!("{} {}", symbol, response.message);

        if let Some(data) = &response.data {
            if let Some(line) = Self::countdown_line(data) {
                println!("  {}", line);
            }
        }
    }

    /// Shows the current timer status.
    pub fn show_status(response: &IpcResponse) {
        println!("Pomofocus status");
        println!("────────────────");

        match &response.data {
            Some(data) => {
                for line in Self::status_lines(data) {
                    println!("{}", line);
                }
            }
            None => println!("No status available"),
        }
    }

    /// Shows the settings after an update, including rejected fields.
    pub fn show_settings(response: &IpcResponse) {
        println!("* {}", response.message);

        if let Some(data) = &response.data {
            for line in Self::settings_lines(data) {
                println!("  {}", line);
            }
        }
    }

    /// Shows the daemon's one-line confirmation.
    pub fn show_message(response: &IpcResponse) {
        println!("* {}", response.message);
    }

    /// Lists the alarm sounds, marking the selected one.
    pub fn show_sounds(response: &IpcResponse) {
        match &response.data {
            Some(data) => {
                for line in Self::sound_lines(data) {
                    println!("{}", line);
                }
            }
            None => println!("No sounds available"),
        }
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("Error: {}", message);
    }

    fn countdown_line(data: &ResponseData) -> Option<String> {
        let remaining = data.remaining_seconds?;
        let label = data.label.as_deref().unwrap_or("Remaining");
        Some(format!("{}: {}", label, Self::format_time(remaining)))
    }

    fn status_lines(data: &ResponseData) -> Vec<String> {
        let mut lines = Vec::new();

        if let Some(label) = &data.label {
            let state = if data.running == Some(true) {
                "running"
            } else {
                "paused"
            };
            lines.push(format!("Mode: {} ({})", label, state));
        }
        if let Some(remaining) = data.remaining_seconds {
            let total = data
                .duration_seconds
                .map(|d| format!(" / {}", Self::format_time(d)))
                .unwrap_or_default();
            lines.push(format!("Remaining: {}{}", Self::format_time(remaining), total));
        }
        if let Some(count) = data.completed_sessions {
            lines.push(format!("Sessions today: {}", count));
        }
        if let Some(auto) = data.auto_start_breaks {
            lines.push(format!("Auto-start breaks: {}", if auto { "on" } else { "off" }));
        }

        lines
    }

    fn settings_lines(data: &ResponseData) -> Vec<String> {
        let mut lines = Vec::new();

        if let Some(settings) = &data.settings {
            lines.push(format!("Work: {} min", settings.work_minutes));
            lines.push(format!("Short break: {} min", settings.short_break_minutes));
            lines.push(format!("Long break: {} min", settings.long_break_minutes));
            lines.push(format!(
                "Alarm: {} at {:.0}%",
                settings.alarm_sound_id,
                settings.alarm_volume * 100.0
            ));
        }
        if let Some(rejected) = data.rejected.as_ref().filter(|r| !r.is_empty()) {
            let fields: Vec<&str> = rejected.iter().map(|f| f.as_str()).collect();
            lines.push(format!("Rejected (kept previous value): {}", fields.join(", ")));
        }

        lines
    }

    fn sound_lines(data: &ResponseData) -> Vec<String> {
        let selected = data.settings.as_ref().map(|s| s.alarm_sound_id.as_str());

        data.sounds
            .iter()
            .flatten()
            .map(|sound| {
                let marker = if Some(sound.id.as_str()) == selected {
                    "*"
                } else {
                    " "
                };
                format!("{} {:<24} {}", marker, sound.id, sound.label)
            })
            .collect()
    }

    /// Formats seconds as `mm:ss`.
    fn format_time(total_seconds: u32) -> String {
        format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
    }
}

// ============================================================================
// Tests
// ============================================================================
