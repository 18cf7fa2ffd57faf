//! Timer engine for the Pomodoro timer.
//!
//! This module provides the core timer functionality:
//! - Session transitions (toggle, reset, mode switch, daily reset)
//! - One-second ticks and interval completion
//! - Settings application with mode registry rebuild
//! - Event firing for the alarm and notification worker

use chrono::{Local, NaiveDate};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::notification::completion_content;
use crate::settings::{Settings, SettingsReport, SettingsUpdate};
use crate::sound::SoundCatalog;
use crate::types::{Mode, ModeDefinition, ModeRegistry, PersistedState, ResponseData, SessionState};

use super::completion::{plan_transition, Alarm, CompletionNotice};

// ============================================================================
// TimerEvent
// ============================================================================

/// Timer events for the side-effect worker and logging.
#[derive(Debug, Clone, PartialEq)]
pub enum TimerEvent {
    /// Countdown started or resumed
    Started { mode: Mode },
    /// Countdown paused
    Paused { mode: Mode },
    /// Current mode rewound to its full duration
    Reset { mode: Mode },
    /// Switched to another mode by hand
    ModeSwitched { mode: Mode },
    /// Settings changed
    SettingsApplied,
    /// Auto-start preference changed
    AutoStartChanged { enabled: bool },
    /// An interval ran out
    IntervalCompleted(CompletionNotice),
    /// Session count zeroed for a new day
    DailySessionReset,
    /// Alarm requested for listening, outside any completion
    AlarmPreview(Alarm),
}

// ============================================================================
// TimerEngine
// ============================================================================

/// Owns the session state, the settings and the mode registry derived
/// from them.
pub struct TimerEngine {
    state: SessionState,
    settings: Settings,
    modes: ModeRegistry,
    catalog: SoundCatalog,
    /// Local date `completed_sessions` belongs to
    session_date: NaiveDate,
    event_tx: mpsc::UnboundedSender<TimerEvent>,
}

impl TimerEngine {
    /// Creates a paused work session dated today.
    pub fn new(
        settings: Settings,
        catalog: SoundCatalog,
        event_tx: mpsc::UnboundedSender<TimerEvent>,
    ) -> Self {
        let settings = settings.sanitized(&catalog);
        let modes = ModeRegistry::rebuild(&settings);
        Self {
            state: SessionState::new(modes.duration_seconds(Mode::Work)),
            settings,
            modes,
            catalog,
            session_date: Local::now().date_naive(),
            event_tx,
        }
    }

    /// Rebuilds an engine from persisted state.
    ///
    /// The session count only carries over when it belongs to `today`.
    /// The countdown always starts paused at the full work duration.
    pub fn restore(
        persisted: PersistedState,
        today: NaiveDate,
        catalog: SoundCatalog,
        event_tx: mpsc::UnboundedSender<TimerEvent>,
    ) -> Self {
        let mut engine = Self::new(persisted.settings, catalog, event_tx);
        engine.session_date = today;
        engine.state.set_auto_start_breaks(persisted.auto_start_breaks);

        if persisted.session_date == today {
            engine.state.set_completed_sessions(persisted.completed_sessions);
        } else {
            debug!(
                saved = %persisted.session_date,
                %today,
                "Saved session count is from another day, starting at 0"
            );
        }

        engine
    }

    /// Advances the countdown by one second.
    ///
    /// Returns the completion notice on the tick that finishes an interval.
    pub fn tick(&mut self) -> Option<CompletionNotice> {
        if !self.state.tick() {
            return None;
        }
        Some(self.complete_interval())
    }

    fn complete_interval(&mut self) -> CompletionNotice {
        let completed = self.state.current_mode();
        let transition = plan_transition(
            completed,
            self.state.completed_sessions(),
            self.state.auto_start_breaks(),
        );

        self.state.set_completed_sessions(transition.completed_sessions);
        self.state.begin(
            transition.next,
            self.modes.duration_seconds(transition.next),
            transition.running,
        );

        let notice = CompletionNotice {
            completed,
            next: transition.next,
            completed_sessions: transition.completed_sessions,
            alarm: self.alarm_for(&self.settings.alarm_sound_id),
            content: completion_content(completed, transition.next),
        };

        self.emit(TimerEvent::IntervalCompleted(notice.clone()));
        notice
    }

    /// Queues an alarm for listening at the configured volume.
    ///
    /// `None` previews the selected alarm. Returns `None` for an id the
    /// catalog does not know. The session is not touched.
    pub fn preview_alarm(&self, sound_id: Option<&str>) -> Option<Alarm> {
        let sound_id = sound_id.unwrap_or(self.settings.alarm_sound_id.as_str());
        if !self.catalog.contains(sound_id) {
            return None;
        }
        let alarm = self.alarm_for(sound_id);
        self.emit(TimerEvent::AlarmPreview(alarm.clone()));
        Some(alarm)
    }

    fn alarm_for(&self, sound_id: &str) -> Alarm {
        Alarm {
            sound_id: sound_id.to_string(),
            source: self.catalog.resolve(sound_id),
            volume: self.settings.alarm_volume,
        }
    }

    /// Starts or pauses the countdown.

    pub fn toggle_running(&mut self) {
        self.state.toggle_running();
        let mode = self.state.current_mode();
        if self.state.is_running() {
            self.emit(TimerEvent::Started { mode });
        } else {
            self.emit(TimerEvent::Paused { mode });
        }
    }

    /// Stops and rewinds the current mode.
    pub fn reset(&mut self) {
        let mode = self.state.current_mode();
        self.state.reset(self.modes.duration_seconds(mode));
        self.emit(TimerEvent::Reset { mode });
    }

    /// Stops and moves to `mode` with a full countdown.
    pub fn switch_mode(&mut self, mode: Mode) {
        self.state.switch_mode(mode, self.modes.duration_seconds(mode));
        self.emit(TimerEvent::ModeSwitched { mode });
    }

    /// Zeroes the session count. Mode and countdown are untouched.
    pub fn reset_daily_session(&mut self) {
        self.state.reset_daily_session();
        self.emit(TimerEvent::DailySessionReset);
    }

    /// Moves the session count to `today`, zeroing it if the date changed.
    ///
    /// Returns true if a reset happened.
    pub fn start_new_day(&mut self, today: NaiveDate) -> bool {
        if today == self.session_date {
            return false;
        }
        info!(%today, "New day, resetting session count");
        self.session_date = today;
        self.reset_daily_session();
        true
    }

    /// Applies a settings update and rebuilds the mode registry.
    ///
    /// A paused timer picks up a changed duration for the active mode right
    /// away. A running countdown is left alone until it completes or is
    /// reset.
    pub fn apply_settings(&mut self, update: &SettingsUpdate) -> SettingsReport {
        let report = self.settings.apply(update, &self.catalog);
        let mode = self.state.current_mode();
        let previous = self.modes.duration_seconds(mode);

        self.settings = report.settings.clone();
        self.modes = ModeRegistry::rebuild(&self.settings);

        let current = self.modes.duration_seconds(mode);
        if !self.state.is_running() && current != previous {
            self.state.set_remaining_seconds(current);
        }

        if !report.rejected.is_empty() {
            debug!(rejected = ?report.rejected, "Some settings were rejected");
        }
        self.emit(TimerEvent::SettingsApplied);
        report
    }

    pub fn set_auto_start_breaks(&mut self, enabled: bool) {
        self.state.set_auto_start_breaks(enabled);
        self.emit(TimerEvent::AutoStartChanged { enabled });
    }

    /// Flips the auto-start preference and returns the new value.
    pub fn toggle_auto_start_breaks(&mut self) -> bool {
        let enabled = !self.state.auto_start_breaks();
        self.set_auto_start_breaks(enabled);
        enabled
    }

    /// Returns a reference to the session state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn modes(&self) -> &ModeRegistry {
        &self.modes
    }

    pub fn catalog(&self) -> &SoundCatalog {
        &self.catalog
    }

    pub fn session_date(&self) -> NaiveDate {
        self.session_date
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// Definition of the mode currently counting down.
    pub fn active_definition(&self) -> &ModeDefinition {
        self.modes.get(self.state.current_mode())
    }

    /// Status snapshot for IPC responses.
    pub fn status(&self) -> ResponseData {
        ResponseData::from_session(&self.state, self.active_definition())
    }

    /// The subset of state written to disk.
    pub fn persisted(&self) -> PersistedState {
        PersistedState {
            settings: self.settings.clone(),
            auto_start_breaks: self.state.auto_start_breaks(),
            completed_sessions: self.state.completed_sessions(),
            session_date: self.session_date,
        }
    }

    fn emit(&self, event: TimerEvent) {
        if self.event_tx.send(event).is_err() {
            warn!("Timer event receiver is gone, event dropped");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_with(settings: Settings) -> (TimerEngine, mpsc::UnboundedReceiver<TimerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (TimerEngine::new(settings, SoundCatalog::builtin(), tx), rx)
    }

    fn short_settings() -> Settings {
        Settings {
            work_minutes: 1,
            short_break_minutes: 1,
            long_break_minutes: 2,
            ..Default::default()
        }
    }

    fn run_to_completion(engine: &mut TimerEngine) -> CompletionNotice {
        if !engine.is_running() {
            engine.toggle_running();
        }
        loop {
            if let Some(notice) = engine.tick() {
                return notice;
            }
        }
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<TimerEvent>) -> Vec<TimerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    // ------------------------------------------------------------------------
    // Construction Tests
    // ------------------------------------------------------------------------

    mod construction_tests {
        use super::*;

        #[test]
        fn test_initial_state() {
            let (engine, _rx) = engine_with(Settings::default());
            let state = engine.state();

            assert_eq!(state.current_mode(), Mode::Work);
            assert_eq!(state.remaining_seconds(), 1500);
            assert!(!state.is_running());
            assert_eq!(state.completed_sessions(), 0);
        }

        #[test]
        fn test_restore_same_day_keeps_count() {
            let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
            let persisted = PersistedState {
                settings: Settings {
                    work_minutes: 40,
                    ..Default::default()
                },
                auto_start_breaks: true,
                completed_sessions: 3,
                session_date: today,
            };
            let (tx, _rx) = mpsc::unbounded_channel();

            let engine = TimerEngine::restore(persisted, today, SoundCatalog::builtin(), tx);

            assert_eq!(engine.state().completed_sessions(), 3);
            assert!(engine.state().auto_start_breaks());
            assert_eq!(engine.state().remaining_seconds(), 2400);
            assert!(!engine.is_running());
        }

        #[test]
        fn test_restore_other_day_zeroes_count() {
            let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
            let persisted = PersistedState {
                settings: Settings::default(),
                auto_start_breaks: false,
                completed_sessions: 6,
                session_date: today.pred_opt().unwrap(),
            };
            let (tx, _rx) = mpsc::unbounded_channel();

            let engine = TimerEngine::restore(persisted, today, SoundCatalog::builtin(), tx);

            assert_eq!(engine.state().completed_sessions(), 0);
            assert_eq!(engine.session_date(), today);
        }

        #[test]
        fn test_restore_sanitizes_settings() {
            let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
            let persisted = PersistedState {
                settings: Settings {
                    work_minutes: 500,
                    alarm_sound_id: "gone".to_string(),
                    ..Default::default()
                },
                auto_start_breaks: false,
                completed_sessions: 0,
                session_date: today,
            };
            let (tx, _rx) = mpsc::unbounded_channel();

            let engine = TimerEngine::restore(persisted, today, SoundCatalog::builtin(), tx);

            assert_eq!(engine.settings().work_minutes, 25);
            assert_eq!(engine.settings().alarm_sound_id, "bell");
        }
    }

    // ------------------------------------------------------------------------
    // Tick and Completion Tests
    // ------------------------------------------------------------------------

    mod completion_tests {
        use super::*;

        #[test]
        fn test_tick_at_one_completes_once() {
            let (mut engine, mut rx) = engine_with(short_settings());
            engine.toggle_running();
            for _ in 0..59 {
                assert!(engine.tick().is_none());
            }
            drain(&mut rx);

            let notice = engine.tick().expect("interval should complete");
            assert_eq!(notice.completed, Mode::Work);

            let completions = drain(&mut rx)
                .into_iter()
                .filter(|e| matches!(e, TimerEvent::IntervalCompleted(_)))
                .count();
            assert_eq!(completions, 1);
        }

        #[test]
        fn test_full_work_interval_scenario() {
            let (mut engine, _rx) = engine_with(Settings::default());
            engine.toggle_running();

            let mut completions = 0;
            for _ in 0..1500 {
                if engine.tick().is_some() {
                    completions += 1;
                }
            }

            let state = engine.state();
            assert_eq!(completions, 1);
            assert_eq!(state.current_mode(), Mode::ShortBreak);
            assert_eq!(state.remaining_seconds(), 300);
            assert!(!state.is_running());
            assert_eq!(state.completed_sessions(), 1);
        }

        #[test]
        fn test_work_completion_with_auto_start_keeps_running() {
            let (mut engine, _rx) = engine_with(short_settings());
            engine.set_auto_start_breaks(true);

            run_to_completion(&mut engine);

            assert_eq!(engine.state().current_mode(), Mode::ShortBreak);
            assert!(engine.is_running());
        }

        #[test]
        fn test_break_completion_never_auto_starts() {
            let (mut engine, _rx) = engine_with(short_settings());
            engine.set_auto_start_breaks(true);
            engine.switch_mode(Mode::ShortBreak);

            let notice = run_to_completion(&mut engine);

            assert_eq!(notice.next, Mode::Work);
            assert_eq!(engine.state().current_mode(), Mode::Work);
            assert_eq!(engine.state().remaining_seconds(), 60);
            assert!(!engine.is_running());
            assert_eq!(engine.state().completed_sessions(), 0);
        }

        #[test]
        fn test_fourth_session_gets_long_break() {
            let (mut engine, _rx) = engine_with(short_settings());
            let mut nexts = Vec::new();

            for _ in 0..4 {
                engine.switch_mode(Mode::Work);
                nexts.push(run_to_completion(&mut engine).next);
            }

            assert_eq!(
                nexts,
                vec![Mode::ShortBreak, Mode::ShortBreak, Mode::ShortBreak, Mode::LongBreak]
            );
            assert_eq!(engine.state().completed_sessions(), 4);
            assert_eq!(engine.state().remaining_seconds(), 120);
        }

        #[test]
        fn test_notice_carries_alarm_and_content() {
            let settings = Settings {
                alarm_sound_id: "chime".to_string(),
                alarm_volume: 0.8,
                ..short_settings()
            };
            let (mut engine, _rx) = engine_with(settings);

            let notice = run_to_completion(&mut engine);

            assert_eq!(notice.alarm.sound_id, "chime");
            assert_eq!(notice.alarm.source, SoundCatalog::builtin().resolve("chime"));
            assert_eq!(notice.alarm.volume, 0.8);
            assert_eq!(notice.content.title, "Focus session done");
            assert_eq!(notice.completed_sessions, 1);
        }

        #[test]
        fn test_count_comes_from_the_transition_plan() {
            let today = Local::now().date_naive();
            let persisted = PersistedState {
                settings: short_settings(),
                auto_start_breaks: false,
                completed_sessions: 7,
                session_date: today,
            };
            let (tx, _rx) = mpsc::unbounded_channel();
            let mut engine = TimerEngine::restore(persisted, today, SoundCatalog::builtin(), tx);

            let work = run_to_completion(&mut engine);
            assert_eq!(work.completed_sessions, 8);
            assert_eq!(engine.state().completed_sessions(), 8);
            assert_eq!(work.next, Mode::LongBreak);

            let long_break = run_to_completion(&mut engine);
            assert_eq!(long_break.completed_sessions, 8);
            assert_eq!(engine.state().completed_sessions(), 8);
            assert_eq!(long_break.next, Mode::Work);
        }

        #[test]
        fn test_closed_channel_does_not_block_completion() {
            let (mut engine, rx) = engine_with(short_settings());
            drop(rx);

            let notice = run_to_completion(&mut engine);
            assert_eq!(notice.next, Mode::ShortBreak);
        }
    }

    // ------------------------------------------------------------------------
    // Operation Tests
    // ------------------------------------------------------------------------

    mod operation_tests {
        use super::*;

        #[test]
        fn test_toggle_emits_started_and_paused() {
            let (mut engine, mut rx) = engine_with(Settings::default());
            engine.toggle_running();
            engine.toggle_running();

            assert_eq!(
                drain(&mut rx),
                vec![
                    TimerEvent::Started { mode: Mode::Work },
                    TimerEvent::Paused { mode: Mode::Work },
                ]
            );
        }

        #[test]
        fn test_reset_restores_full_duration() {
            let (mut engine, _rx) = engine_with(Settings::default());
            engine.toggle_running();
            engine.tick();
            engine.tick();

            engine.reset();

            assert_eq!(engine.state().remaining_seconds(), 1500);
            assert!(!engine.is_running());
        }

        #[test]
        fn test_switch_mode_uses_target_duration() {
            let (mut engine, _rx) = engine_with(Settings::default());
            engine.toggle_running();

            engine.switch_mode(Mode::LongBreak);

            assert_eq!(engine.state().current_mode(), Mode::LongBreak);
            assert_eq!(engine.state().remaining_seconds(), 900);
            assert!(!engine.is_running());
        }

        #[test]
        fn test_reset_daily_session_leaves_timer() {
            let (mut engine, _rx) = engine_with(short_settings());
            run_to_completion(&mut engine);
            engine.toggle_running();
            engine.tick();
            let remaining = engine.state().remaining_seconds();

            engine.reset_daily_session();

            assert_eq!(engine.state().completed_sessions(), 0);
            assert_eq!(engine.state().current_mode(), Mode::ShortBreak);
            assert_eq!(engine.state().remaining_seconds(), remaining);
            assert!(engine.is_running());
        }

        #[test]
        fn test_start_new_day() {
            let (mut engine, _rx) = engine_with(short_settings());
            run_to_completion(&mut engine);
            let today = engine.session_date();

            assert!(!engine.start_new_day(today));
            assert_eq!(engine.state().completed_sessions(), 1);

            let tomorrow = today.succ_opt().unwrap();
            assert!(engine.start_new_day(tomorrow));
            assert_eq!(engine.state().completed_sessions(), 0);
            assert_eq!(engine.session_date(), tomorrow);
        }

        #[test]
        fn test_preview_alarm_defaults_to_selected_sound() {
            let settings = Settings {
                alarm_sound_id: "beep".to_string(),
                alarm_volume: 0.4,
                ..Default::default()
            };
            let (engine, mut rx) = engine_with(settings);

            let alarm = engine.preview_alarm(None).unwrap();

            assert_eq!(alarm.sound_id, "beep");
            assert_eq!(alarm.source, SoundCatalog::builtin().resolve("beep"));
            assert_eq!(alarm.volume, 0.4);
            assert_eq!(drain(&mut rx), vec![TimerEvent::AlarmPreview(alarm)]);
        }

        #[test]
        fn test_preview_alarm_by_id_leaves_session_alone() {
            let (mut engine, mut rx) = engine_with(Settings::default());
            engine.toggle_running();
            engine.tick();
            drain(&mut rx);

            let alarm = engine.preview_alarm(Some("chime")).unwrap();

            assert_eq!(alarm.sound_id, "chime");
            assert_eq!(engine.settings().alarm_sound_id, "bell");
            assert_eq!(engine.state().remaining_seconds(), 1499);
            assert!(engine.is_running());
        }

        #[test]
        fn test_preview_unknown_alarm_is_refused() {
            let (engine, mut rx) = engine_with(Settings::default());

            assert!(engine.preview_alarm(Some("gong")).is_none());
            assert!(drain(&mut rx).is_empty());
        }

        #[test]
        fn test_toggle_auto_start_breaks() {
            let (mut engine, _rx) = engine_with(Settings::default());

            assert!(engine.toggle_auto_start_breaks());
            assert!(!engine.toggle_auto_start_breaks());
        }
    }

    // ------------------------------------------------------------------------
    // Settings Tests
    // ------------------------------------------------------------------------

    mod settings_tests {
        use super::*;

        fn work(raw: &str) -> SettingsUpdate {
            SettingsUpdate {
                work_minutes: Some(raw.to_string()),
                ..Default::default()
            }
        }

        #[test]
        fn test_paused_timer_picks_up_new_duration() {
            let (mut engine, _rx) = engine_with(Settings::default());

            engine.apply_settings(&work("50"));

            assert_eq!(engine.state().remaining_seconds(), 3000);
            assert_eq!(engine.modes().duration_seconds(Mode::Work), 3000);
        }

        #[test]
        fn test_running_countdown_is_untouched() {
            let (mut engine, _rx) = engine_with(Settings::default());
            engine.toggle_running();
            engine.tick();

            engine.apply_settings(&work("50"));

            assert_eq!(engine.state().remaining_seconds(), 1499);
            assert_eq!(engine.modes().duration_seconds(Mode::Work), 3000);

            engine.reset();
            assert_eq!(engine.state().remaining_seconds(), 3000);
        }

        #[test]
        fn test_other_mode_change_keeps_partial_countdown() {
            let (mut engine, _rx) = engine_with(Settings::default());
            engine.toggle_running();
            engine.tick();
            engine.toggle_running();

            let update = SettingsUpdate {
                short_break_minutes: Some("10".to_string()),
                ..Default::default()
            };
            engine.apply_settings(&update);

            assert_eq!(engine.state().remaining_seconds(), 1499);
            assert_eq!(engine.modes().duration_seconds(Mode::ShortBreak), 600);
        }

        #[test]
        fn test_rejected_input_keeps_settings() {
            let (mut engine, _rx) = engine_with(Settings::default());

            let report = engine.apply_settings(&work("70"));

            assert_eq!(report.rejected.len(), 1);
            assert_eq!(engine.settings().work_minutes, 25);
            assert_eq!(engine.state().remaining_seconds(), 1500);
        }

        #[test]
        fn test_persisted_reflects_settings() {
            let (mut engine, _rx) = engine_with(Settings::default());
            engine.apply_settings(&work("30"));
            engine.set_auto_start_breaks(true);

            let persisted = engine.persisted();

            assert_eq!(persisted.settings.work_minutes, 30);
            assert!(persisted.auto_start_breaks);
            assert_eq!(persisted.session_date, engine.session_date());
        }
    }
}
