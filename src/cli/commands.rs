//! Command definitions for the Pomodoro timer CLI.
//!
//! Uses clap derive macro for argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::settings::SettingsUpdate;
use crate::types::Mode;

// ============================================================================
// CLI Structure
// ============================================================================

/// Pomofocus - a Pomodoro timer for the terminal
#[derive(Parser, Debug)]
#[command(
    name = "pomofocus",
    version,
    about = "Pomodoro timer daemon and command line client",
    long_about = "Alternate focus intervals with short and long breaks.\n\
                  Run `pomofocus daemon` once, then control it with the other commands.",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path of the daemon socket
    #[arg(long, global = true, value_name = "PATH")]
    pub socket: Option<PathBuf>,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start or pause the countdown
    Toggle,

    /// Rewind the current interval to its full length
    Reset,

    /// Switch to another interval type
    Mode {
        /// work, short-break or long-break
        #[arg(value_parser = parse_mode)]
        mode: Mode,
    },

    /// Show current timer status
    Status,

    /// Show or change interval lengths and the alarm
    Settings(SettingsArgs),

    /// Turn automatic break start on or off (toggles without an argument)
    AutoStart {
        #[arg(value_enum)]
        state: Option<Switch>,
    },

    /// List the available alarm sounds
    Sounds,

    /// Play an alarm sound once (the selected alarm by default)
    Preview {
        /// Sound id (see `pomofocus sounds`)
        sound: Option<String>,
    },

    /// Run the timer daemon in the foreground
    Daemon(DaemonArgs),

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// On/off argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Switch {
    On,
    Off,
}

impl Switch {
    pub fn enabled(self) -> bool {
        self == Switch::On
    }
}

// ============================================================================
// Settings Command Arguments
// ============================================================================

/// Arguments for the settings command.
///
/// Minute values are passed through as typed, negative numbers included;
/// the daemon validates them. An empty value restores the default.
#[derive(Args, Debug, Clone, Default)]
pub struct SettingsArgs {
    /// Work interval in minutes (1-60)
    #[arg(short, long, value_name = "MINUTES", allow_hyphen_values = true)]
    pub work: Option<String>,

    /// Short break in minutes (1-30)
    #[arg(short, long, value_name = "MINUTES", allow_hyphen_values = true)]
    pub short_break: Option<String>,

    /// Long break in minutes (1-60)
    #[arg(short, long, value_name = "MINUTES", allow_hyphen_values = true)]
    pub long_break: Option<String>,

    /// Alarm sound id (see `pomofocus sounds`)
    #[arg(long, value_name = "ID")]
    pub sound: Option<String>,

    /// Alarm volume (0.0-1.0)
    #[arg(long, value_name = "LEVEL")]
    pub volume: Option<f32>,
}

impl SettingsArgs {
    /// Converts the arguments into a settings update.
    pub fn to_update(&self) -> SettingsUpdate {
        SettingsUpdate {
            work_minutes: self.work.clone(),
            short_break_minutes: self.short_break.clone(),
            long_break_minutes: self.long_break.clone(),
            alarm_sound_id: self.sound.clone(),
            alarm_volume: self.volume,
        }
    }
}

// ============================================================================
// Daemon Command Arguments
// ============================================================================

/// Arguments for the daemon command
#[derive(Args, Debug, Clone, Default)]
pub struct DaemonArgs {
    /// State file (default: ~/.pomofocus/state.json)
    #[arg(long, value_name = "PATH")]
    pub state_file: Option<PathBuf>,

    /// Never play the alarm sound
    #[arg(long)]
    pub no_sound: bool,

    /// Never raise desktop notifications
    #[arg(long)]
    pub no_notifications: bool,
}

// ============================================================================
// Validation Functions
// ============================================================================

fn parse_mode(s: &str) -> Result<Mode, String> {
    s.parse()
}

// ============================================================================
// Tests
// ============================================================================
