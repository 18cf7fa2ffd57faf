//! Daemon module for the Pomodoro timer.
//!
//! This module contains the core daemon functionality:
//! - `timer`: timer engine with session transitions and settings
//! - `completion`: next-mode decision and the alarm/notification worker
//! - `scheduler`: the one-second ticker and the midnight rollover
//! - `store`: persisted state
//! - `ipc`: Unix socket server and request handler

pub mod completion;
pub mod ipc;
pub mod scheduler;
pub mod store;
pub mod timer;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Local;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, warn};

use crate::notification::DesktopNotifier;
use crate::settings::Settings;
use crate::sound::SoundCatalog;

pub use completion::{plan_transition, CompletionDispatcher, CompletionNotice, Transition};
pub use ipc::{default_socket_path, IpcServer, RequestHandler};
pub use scheduler::{
    duration_until_next_midnight, spawn_daily_rollover, spawn_daily_rollover_with_clock,
    TickScheduler,
};
pub use store::{default_state_path, JsonFileStore, MemoryStore, StateStore, StoreError};
pub use timer::{TimerEngine, TimerEvent};

/// The engine shared between the IPC handler and the scheduled tasks.
pub type SharedEngine = Arc<Mutex<TimerEngine>>;

/// The state store shared between the IPC handler and the scheduled tasks.
pub type SharedStore = Arc<dyn StateStore>;

/// Runtime options for the daemon.
#[derive(Debug, Clone)]
pub struct DaemonOptions {
    pub socket_path: PathBuf,
    pub state_path: PathBuf,
    /// Play the alarm sound on completion
    pub sound: bool,
    /// Raise desktop notifications on completion
    pub notifications: bool,
}

/// Runs the daemon until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the socket cannot be bound or the side-effect
/// worker cannot be started.
pub async fn run(options: DaemonOptions) -> Result<()> {
    let store: SharedStore = Arc::new(JsonFileStore::new(&options.state_path));
    let catalog = SoundCatalog::builtin().with_system_sounds();
    debug!(sounds = catalog.entries().len(), "Sound catalog loaded");

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let engine = match store.load() {
        Ok(Some(persisted)) => {
            info!(path = %options.state_path.display(), "Restored saved state");
            TimerEngine::restore(persisted, Local::now().date_naive(), catalog, event_tx)
        }
        Ok(None) => TimerEngine::new(Settings::default(), catalog, event_tx),
        Err(e) => {
            warn!("Ignoring saved state: {}", e);
            TimerEngine::new(Settings::default(), catalog, event_tx)
        }
    };
    let engine: SharedEngine = Arc::new(Mutex::new(engine));

    let notifier = DesktopNotifier::new(options.notifications);
    completion::spawn_effects_worker(event_rx, options.sound, Box::new(notifier))
        .context("Failed to start the alarm worker")?;

    let rollover = spawn_daily_rollover(SharedEngine::clone(&engine), SharedStore::clone(&store));
    let handler = Arc::new(RequestHandler::new(
        SharedEngine::clone(&engine),
        SharedStore::clone(&store),
    ));
    let server = IpcServer::new(&options.socket_path)?;
    info!(socket = %server.socket_path().display(), "Daemon listening");

    loop {
        tokio::select! {
            accepted = server.accept() => match accepted {
                Ok(stream) => {
                    IpcServer::spawn_connection(Arc::clone(&handler), stream);
                }
                Err(e) => error!("{:#}", e),
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }
    }

    rollover.abort();
    handler.shutdown().await;
    store::persist(store.as_ref(), &*engine.lock().await);
    Ok(())
}
