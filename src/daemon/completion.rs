//! Interval completion: the next-mode decision and its side effects.
//!
//! The engine decides the transition synchronously. The alarm and the
//! desktop notification are carried by a [`CompletionNotice`] to a worker
//! thread, which owns the audio device and never blocks the countdown.

use std::thread::JoinHandle;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::notification::{NotificationContent, Notifier};
use crate::sound::{try_create_player, SoundPlayer, SoundSource};
use crate::types::Mode;

use super::timer::TimerEvent;

/// Work intervals per long break.
pub const SESSIONS_PER_LONG_BREAK: u32 = 4;

// ============================================================================
// Transition
// ============================================================================

/// What follows a completed interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Mode to switch to
    pub next: Mode,
    /// Whether the next interval starts counting immediately
    pub running: bool,
    /// Session count after the completion
    pub completed_sessions: u32,
}

/// Decides the interval that follows `completed`.
///
/// Finishing work counts a session and starts a break, long on every
/// fourth session. The break starts running only with auto-start enabled.
/// Finishing a break always returns to paused work.
#[must_use]
pub fn plan_transition(completed: Mode, completed_sessions: u32, auto_start_breaks: bool) -> Transition {
    match completed {
        Mode::Work => {
            let count = completed_sessions.saturating_add(1);
            let next = if count % SESSIONS_PER_LONG_BREAK == 0 {
                Mode::LongBreak
            } else {
                Mode::ShortBreak
            };
            Transition {
                next,
                running: auto_start_breaks,
                completed_sessions: count,
            }
        }
        Mode::ShortBreak | Mode::LongBreak => Transition {
            next: Mode::Work,
            running: false,
            completed_sessions,
        },
    }
}

// ============================================================================
// CompletionNotice
// ============================================================================

/// The alarm to play for a completion.
#[derive(Debug, Clone, PartialEq)]
pub struct Alarm {
    pub sound_id: String,
    pub source: SoundSource,
    pub volume: f32,
}

/// Everything the side-effect worker needs for one completion.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionNotice {
    pub completed: Mode,
    pub next: Mode,
    pub completed_sessions: u32,
    pub alarm: Alarm,
    pub content: NotificationContent,
}

// ============================================================================
// CompletionDispatcher
// ============================================================================

/// What a dispatch actually did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub sound_played: bool,
    pub notified: bool,
}

/// Plays the alarm and raises the notification for a completion.
///
/// Every failure is logged and swallowed.
pub struct CompletionDispatcher {
    player: Option<Box<dyn SoundPlayer>>,
    notifier: Box<dyn Notifier>,
}

impl CompletionDispatcher {
    /// Creates a dispatcher. A `None` player means sound is off.
    pub fn new(player: Option<Box<dyn SoundPlayer>>, notifier: Box<dyn Notifier>) -> Self {
        Self { player, notifier }
    }

    pub fn dispatch(&self, notice: &CompletionNotice) -> DispatchOutcome {
        let mut outcome = DispatchOutcome {
            sound_played: self.play_alarm(&notice.alarm),
            notified: false,
        };

        if self.notifier.is_permitted() {
            match self.notifier.raise(&notice.content) {
                Ok(()) => outcome.notified = true,
                Err(e) if e.is_permission_error() => debug!("Notification not permitted: {}", e),
                Err(e) => warn!("Notification failed: {}", e),
            }
        }

        outcome
    }

    /// Plays an alarm. Returns true if playback started.
    pub fn play_alarm(&self, alarm: &Alarm) -> bool {
        let Some(player) = &self.player else {
            debug!("No audio output, alarm skipped");
            return false;
        };

        match player.play(&alarm.source, alarm.volume) {
            Ok(()) => true,
            Err(e) if e.is_device_error() => {
                debug!(sound_id = %alarm.sound_id, "Audio device unavailable: {}", e);
                false
            }
            Err(e) => {
                warn!(sound_id = %alarm.sound_id, "Alarm playback failed: {}", e);
                false
            }
        }
    }
}

impl std::fmt::Debug for CompletionDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionDispatcher")
            .field("sound", &self.player.is_some())
            .field("notifications", &self.notifier.is_permitted())
            .finish()
    }
}

/// Drains timer events until every sender is gone, dispatching completions
/// and alarm previews.
pub fn run_effects_loop(mut rx: mpsc::UnboundedReceiver<TimerEvent>, dispatcher: &CompletionDispatcher) {
    while let Some(event) = rx.blocking_recv() {
        match event {
            TimerEvent::IntervalCompleted(notice) => {
                info!(
                    completed = %notice.completed,
                    next = %notice.next,
                    sessions = notice.completed_sessions,
                    "Interval completed"
                );
                dispatcher.dispatch(&notice);
            }
            TimerEvent::AlarmPreview(alarm) => {
                debug!(sound_id = %alarm.sound_id, "Alarm preview");
                dispatcher.play_alarm(&alarm);
            }
            other => debug!(event = ?other, "Timer event"),
        }
    }
    debug!("Timer event channel closed");
}

/// Starts the side-effect worker on its own thread.
///
/// The audio output is opened on that thread because it cannot move
/// between threads.
///
/// # Errors
///
/// Returns an error if the thread cannot be spawned.
pub fn spawn_effects_worker(
    rx: mpsc::UnboundedReceiver<TimerEvent>,
    sound_enabled: bool,
    notifier: Box<dyn Notifier>,
) -> std::io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("pomofocus-effects".to_string())
        .spawn(move || {
            let player = if sound_enabled {
                try_create_player().map(|p| Box::new(p) as Box<dyn SoundPlayer>)
            } else {
                debug!("Alarm sound disabled");
                None
            };
            let dispatcher = CompletionDispatcher::new(player, notifier);
            run_effects_loop(rx, &dispatcher);
        })
}

// ============================================================================
// Tests
// ============================================================================
