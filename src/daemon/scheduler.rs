//! Tick and midnight scheduling.
//!
//! - `TickScheduler`: the one-second countdown task, at most one at a time
//! - `spawn_daily_rollover`: zeroes the session count at local midnight
//!
//! The ticker also checks the date, so a late midnight wakeup after a
//! suspend is caught on the next tick.

use std::time::Duration;

use chrono::{DateTime, Local, TimeZone};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

use super::store::persist;
use super::{SharedEngine, SharedStore};

/// Default tick period.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Shortest wait between rollover checks.
const MIN_ROLLOVER_WAIT: Duration = Duration::from_secs(1);

// ============================================================================
// TickScheduler
// ============================================================================

/// Owns the countdown task.
///
/// Starting always cancels the previous task first, and dropping the
/// scheduler aborts whatever is still running.
pub struct TickScheduler {
    engine: SharedEngine,
    store: SharedStore,
    period: Duration,
    handle: Option<JoinHandle<()>>,
}

impl TickScheduler {
    pub fn new(engine: SharedEngine, store: SharedStore) -> Self {
        Self::with_period(engine, store, TICK_PERIOD)
    }

    /// Creates a scheduler with a custom tick period.
    pub fn with_period(engine: SharedEngine, store: SharedStore, period: Duration) -> Self {
        Self {
            engine,
            store,
            period,
            handle: None,
        }
    }

    /// Cancels any running ticker and starts a fresh one.
    ///
    /// The first tick lands one full period from now.
    pub fn reschedule(&mut self) {
        self.cancel();
        let handle = tokio::spawn(run_ticks(
            SharedEngine::clone(&self.engine),
            SharedStore::clone(&self.store),
            self.period,
        ));
        self.handle = Some(handle);
        debug!(period_ms = self.period.as_millis(), "Ticker scheduled");
    }

    /// Starts ticking if `running`, stops otherwise.
    pub fn sync(&mut self, running: bool) {
        if running {
            self.reschedule();
        } else {
            self.cancel();
        }
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!("Ticker cancelled");
        }
    }

    /// Returns true while a ticker task is alive.
    pub fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

impl Drop for TickScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for TickScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickScheduler")
            .field("period", &self.period)
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}

/// Ticks the engine every `period` until it stops running.
async fn run_ticks(engine: SharedEngine, store: SharedStore, period: Duration) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        let mut engine = engine.lock().await;
        let new_day = engine.start_new_day(Local::now().date_naive());
        if engine.tick().is_some() || new_day {
            persist(store.as_ref(), &engine);
        }
        if !engine.is_running() {
            debug!("Timer stopped, ticker exiting");
            break;
        }
    }
}

// ============================================================================
// Daily rollover
// ============================================================================

/// Starts the task that zeroes the session count at every local midnight.
///
/// The task re-arms itself after each firing and runs until aborted.
pub fn spawn_daily_rollover(engine: SharedEngine, store: SharedStore) -> JoinHandle<()> {
    spawn_daily_rollover_with_clock(engine, store, Local::now)
}

/// Same as [`spawn_daily_rollover`], reading the wall clock from `clock`.
pub fn spawn_daily_rollover_with_clock<Tz, C>(
    engine: SharedEngine,
    store: SharedStore,
    clock: C,
) -> JoinHandle<()>
where
    Tz: TimeZone + Send + 'static,
    Tz::Offset: Send,
    C: Fn() -> DateTime<Tz> + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            let wait = duration_until_next_midnight(&clock());
            debug!(wait_secs = wait.as_secs(), "Next daily rollover scheduled");
            tokio::time::sleep(wait).await;

            let today = clock().date_naive();
            let mut engine = engine.lock().await;
            if engine.start_new_day(today) {
                persist(store.as_ref(), &engine);
            }
        }
    })
}

/// Time from `now` until the next midnight in `now`'s time zone.
///
/// When midnight does not exist locally (a DST gap), the wall-clock
/// difference is used instead. The result is never shorter than one
/// second.
pub fn duration_until_next_midnight<Tz: TimeZone>(now: &DateTime<Tz>) -> Duration {
    let Some(midnight) = now
        .date_naive()
        .succ_opt()
        .and_then(|tomorrow| tomorrow.and_hms_opt(0, 0, 0))
    else {
        return Duration::from_secs(24 * 60 * 60);
    };

    let delta = match now.timezone().from_local_datetime(&midnight).earliest() {
        Some(next) => next.naive_utc() - now.naive_utc(),
        None => midnight - now.naive_local(),
    };

    delta.to_std().unwrap_or(MIN_ROLLOVER_WAIT).max(MIN_ROLLOVER_WAIT)
}

// ============================================================================
// Tests
// ============================================================================
