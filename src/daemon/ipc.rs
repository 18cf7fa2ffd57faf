//! IPC server for the Pomodoro timer.
//!
//! This module provides Unix Domain Socket IPC functionality:
//! - Server that listens on a Unix socket
//! - Request/response handling for timer commands
//! - Integration with TimerEngine, the tick scheduler and the state store

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::settings::SettingsUpdate;
use crate::types::{IpcRequest, IpcResponse, Mode};

use super::scheduler::TickScheduler;
use super::store::persist;
use super::{SharedEngine, SharedStore};

// ============================================================================
// Constants
// ============================================================================

/// Socket location relative to the home directory.
const DEFAULT_SOCKET_FILE: &str = ".pomofocus/pomofocus.sock";

/// Maximum request size in bytes (4KB)
const MAX_REQUEST_SIZE: usize = 4096;

/// Read timeout in seconds
const READ_TIMEOUT_SECS: u64 = 5;

/// Returns the default socket path under the home directory.
pub fn default_socket_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(DEFAULT_SOCKET_FILE))
}

// ============================================================================
// IpcError
// ============================================================================

/// IPC-specific error types.
#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    /// Read error
    #[error("Failed to read request: {0}")]
    ReadError(String),

    /// The request body is not a valid command
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Client closed the connection without sending anything
    #[error("Connection closed by client")]
    ConnectionClosed,

    /// Timeout error
    #[error("Operation timed out")]
    Timeout,

    /// Request too large
    #[error("Request too large (max {MAX_REQUEST_SIZE} bytes)")]
    RequestTooLarge,
}

// ============================================================================
// IpcServer
// ============================================================================

/// Unix Domain Socket IPC server.
pub struct IpcServer {
    /// Unix socket listener
    listener: UnixListener,
    /// Socket path (for cleanup)
    socket_path: PathBuf,
}

impl IpcServer {
    /// Creates a new IPC server bound to the specified socket path.
    ///
    /// If the socket file already exists, it will be removed before binding.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket cannot be bound.
    pub fn new(socket_path: &Path) -> Result<Self> {
        if socket_path.exists() {
            std::fs::remove_file(socket_path)
                .with_context(|| format!("Failed to remove existing socket: {:?}", socket_path))?;
        }

        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create socket directory: {:?}", parent))?;
        }

        let listener = UnixListener::bind(socket_path)
            .with_context(|| format!("Failed to bind Unix socket: {:?}", socket_path))?;

        Ok(Self {
            listener,
            socket_path: socket_path.to_path_buf(),
        })
    }

    /// Accepts an incoming client connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be accepted.
    pub async fn accept(&self) -> Result<UnixStream> {
        let (stream, _addr) = self
            .listener
            .accept()
            .await
            .context("Failed to accept connection")?;
        Ok(stream)
    }

    /// Reads one request. The client signals its end by shutting down its
    /// write half.
    ///
    /// # Errors
    ///
    /// Returns an error on timeout, oversized input, early close or invalid
    /// JSON.
    pub async fn receive_request(stream: &mut UnixStream) -> Result<IpcRequest, IpcError> {
        let mut buffer = Vec::with_capacity(512);
        let limit = (MAX_REQUEST_SIZE + 1) as u64;

        let read_result = timeout(
            Duration::from_secs(READ_TIMEOUT_SECS),
            (&mut *stream).take(limit).read_to_end(&mut buffer),
        )
        .await;

        match read_result {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(IpcError::ReadError(e.to_string())),
            Err(_) => return Err(IpcError::Timeout),
        }

        if buffer.is_empty() {
            return Err(IpcError::ConnectionClosed);
        }
        if buffer.len() > MAX_REQUEST_SIZE {
            return Err(IpcError::RequestTooLarge);
        }

        serde_json::from_slice(&buffer).map_err(|e| IpcError::InvalidRequest(e.to_string()))
    }

    /// Serializes and sends an IPC response to the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub async fn send_response(stream: &mut UnixStream, response: &IpcResponse) -> Result<()> {
        let json = serde_json::to_vec(response).context("Failed to serialize IPC response")?;

        stream
            .write_all(&json)
            .await
            .context("Failed to write response")?;
        stream.flush().await.context("Failed to flush response")?;
        stream.shutdown().await.context("Failed to close response stream")?;

        Ok(())
    }

    /// Serves a single connection: one request, one response.
    ///
    /// A request that cannot be read is answered with an error response.
    ///
    /// # Errors
    ///
    /// Returns an error if the response cannot be written.
    pub async fn serve_connection(handler: &RequestHandler, mut stream: UnixStream) -> Result<()> {
        let response = match Self::receive_request(&mut stream).await {
            Ok(request) => {
                debug!(?request, "IPC request");
                handler.handle(request).await
            }
            Err(IpcError::ConnectionClosed) => return Ok(()),
            Err(e) => IpcResponse::error(e.to_string()),
        };

        Self::send_response(&mut stream, &response).await
    }

    /// Serves a connection on its own task.
    ///
    /// Each client gets its own read timeout, so an idle connection never
    /// delays another client's request.
    pub fn spawn_connection(handler: Arc<RequestHandler>, stream: UnixStream) -> JoinHandle<()> {
        tokio::spawn(async move {
            if let Err(e) = Self::serve_connection(&handler, stream).await {
                warn!("Failed to answer request: {:#}", e);
            }
        })
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}

impl Drop for IpcServer {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

// ============================================================================
// RequestHandler
// ============================================================================

/// Handles IPC requests by dispatching to TimerEngine.
///
/// The engine lock is held while the ticker is started or stopped, so an
/// old ticker can never tick between a state change and its cancellation.
pub struct RequestHandler {
    engine: SharedEngine,
    store: SharedStore,
    ticker: Mutex<TickScheduler>,
}

impl RequestHandler {
    /// Creates a request handler with a one-second ticker.
    pub fn new(engine: SharedEngine, store: SharedStore) -> Self {
        let ticker = TickScheduler::new(SharedEngine::clone(&engine), SharedStore::clone(&store));
        Self::with_ticker(engine, store, ticker)
    }

    /// Creates a request handler with a custom tick period.
    pub fn with_tick_period(engine: SharedEngine, store: SharedStore, period: Duration) -> Self {
        let ticker = TickScheduler::with_period(
            SharedEngine::clone(&engine),
            SharedStore::clone(&store),
            period,
        );
        Self::with_ticker(engine, store, ticker)
    }

    fn with_ticker(engine: SharedEngine, store: SharedStore, ticker: TickScheduler) -> Self {
        Self {
            engine,
            store,
            ticker: Mutex::new(ticker),
        }
    }

    /// Handles an IPC request and returns the appropriate response.
    ///
    /// The session date is checked first, so a midnight missed while the
    /// machine slept is applied before the request sees the count.
    pub async fn handle(&self, request: IpcRequest) -> IpcResponse {
        self.start_new_day(Local::now().date_naive()).await;

        match request {
            IpcRequest::Toggle => self.handle_toggle().await,
            IpcRequest::Reset => self.handle_reset().await,
            IpcRequest::Switch { mode } => self.handle_switch(mode).await,
            IpcRequest::Status => self.handle_status().await,
            IpcRequest::Settings { update } => self.handle_settings(update).await,
            IpcRequest::AutoStartBreaks { enabled } => self.handle_auto_start(enabled).await,
            IpcRequest::Sounds => self.handle_sounds().await,
            IpcRequest::Preview { sound_id } => self.handle_preview(sound_id).await,
        }
    }

    async fn start_new_day(&self, today: NaiveDate) {
        let mut engine = self.engine.lock().await;
        if engine.start_new_day(today) {
            persist(self.store.as_ref(), &engine);
        }
    }

    /// Returns true while a ticker task is alive.
    pub async fn is_ticking(&self) -> bool {
        self.ticker.lock().await.is_active()
    }

    /// Stops the ticker.
    pub async fn shutdown(&self) {
        let _engine = self.engine.lock().await;
        self.ticker.lock().await.cancel();
    }

    async fn handle_toggle(&self) -> IpcResponse {
        let mut engine = self.engine.lock().await;
        engine.toggle_running();
        let running = engine.is_running();
        self.ticker.lock().await.sync(running);
        persist(self.store.as_ref(), &engine);

        let message = if running { "Timer started" } else { "Timer paused" };
        IpcResponse::success(message, Some(engine.status()))
    }

    async fn handle_reset(&self) -> IpcResponse {
        let mut engine = self.engine.lock().await;
        engine.reset();
        self.ticker.lock().await.cancel();
        persist(self.store.as_ref(), &engine);

        IpcResponse::success("Timer reset", Some(engine.status()))
    }

    async fn handle_switch(&self, mode: Mode) -> IpcResponse {
        let mut engine = self.engine.lock().await;
        engine.switch_mode(mode);
        self.ticker.lock().await.cancel();
        persist(self.store.as_ref(), &engine);

        let message = format!("Switched to {}", engine.active_definition().label);
        IpcResponse::success(message, Some(engine.status()))
    }

    async fn handle_status(&self) -> IpcResponse {
        let engine = self.engine.lock().await;
        IpcResponse::success("", Some(engine.status()))
    }

    async fn handle_settings(&self, update: SettingsUpdate) -> IpcResponse {
        let mut engine = self.engine.lock().await;
        let report = engine.apply_settings(&update);
        persist(self.store.as_ref(), &engine);

        let message = if report.is_clean() {
            "Settings updated".to_string()
        } else {
            let fields: Vec<&str> = report.rejected.iter().map(|f| f.as_str()).collect();
            format!("Settings updated; rejected: {}", fields.join(", "))
        };

        let data = engine
            .status()
            .with_settings(report.settings)
            .with_rejected(report.rejected);
        IpcResponse::success(message, Some(data))
    }

    async fn handle_auto_start(&self, enabled: Option<bool>) -> IpcResponse {
        let mut engine = self.engine.lock().await;
        let enabled = match enabled {
            Some(enabled) => {
                engine.set_auto_start_breaks(enabled);
                enabled
            }
            None => engine.toggle_auto_start_breaks(),
        };
        persist(self.store.as_ref(), &engine);

        let message = if enabled {
            "Auto-start breaks enabled"
        } else {
            "Auto-start breaks disabled"
        };
        IpcResponse::success(message, Some(engine.status()))
    }

    async fn handle_sounds(&self) -> IpcResponse {
        let engine = self.engine.lock().await;
        let data = engine
            .status()
            .with_settings(engine.settings().clone())
            .with_sounds(engine.catalog().infos());
        IpcResponse::success("", Some(data))
    }

    async fn handle_preview(&self, sound_id: Option<String>) -> IpcResponse {
        let engine = self.engine.lock().await;
        let Some(alarm) = engine.preview_alarm(sound_id.as_deref()) else {
            let id = sound_id.unwrap_or_default();
            return IpcResponse::error(format!("Unknown alarm sound: {}", id));
        };

        let label = engine
            .catalog()
            .get(&alarm.sound_id)
            .map_or(alarm.sound_id.as_str(), |entry| entry.label.as_str());
        IpcResponse::success(format!("Playing {}", label), None)
    }
}

// ============================================================================
// Tests
// ============================================================================
