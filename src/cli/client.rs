//! IPC client for communicating with the Pomodoro timer daemon.
//!
//! This module provides:
//! - Unix Domain Socket client
//! - Request/response handling
//! - Connection retry logic (connect only)
//! - Timeout handling

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::time::timeout;

use crate::daemon::default_socket_path;
use crate::settings::SettingsUpdate;
use crate::types::{IpcRequest, IpcResponse, Mode};

// ============================================================================
// Constants
// ============================================================================

/// Connection timeout in seconds
const CONNECTION_TIMEOUT_SECS: u64 = 5;

/// Read/write timeout in seconds
const IO_TIMEOUT_SECS: u64 = 5;

/// Maximum response size in bytes (64KB)
const MAX_RESPONSE_SIZE: u64 = 65536;

/// Maximum retry attempts
const MAX_RETRIES: u32 = 3;

/// Retry delay in milliseconds (base delay, multiplied by attempt number)
const RETRY_DELAY_MS: u64 = 500;

// ============================================================================
// IpcClient
// ============================================================================

/// IPC client for daemon communication.
#[derive(Debug, Clone)]
pub struct IpcClient {
    /// Socket path
    socket_path: PathBuf,
    /// Connection timeout
    timeout: Duration,
    /// Base delay between retries
    retry_delay: Duration,
}

impl IpcClient {
    /// Creates a new IPC client with the default socket path.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self> {
        let socket_path =
            default_socket_path().context("Cannot determine the home directory for the socket")?;
        Ok(Self::with_socket_path(socket_path))
    }

    /// Creates a new IPC client with a custom socket path.
    pub fn with_socket_path(socket_path: PathBuf) -> Self {
        Self {
            socket_path,
            timeout: Duration::from_secs(CONNECTION_TIMEOUT_SECS),
            retry_delay: Duration::from_millis(RETRY_DELAY_MS),
        }
    }

    /// Overrides the base retry delay.
    #[must_use]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    pub async fn toggle(&self) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::Toggle).await
    }

    pub async fn reset(&self) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::Reset).await
    }

    pub async fn switch_mode(&self, mode: Mode) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::Switch { mode }).await
    }

    pub async fn status(&self) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::Status).await
    }

    pub async fn settings(&self, update: SettingsUpdate) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::Settings { update })
            .await
    }

    /// Sets the auto-start preference, or toggles it with `None`.
    pub async fn auto_start_breaks(&self, enabled: Option<bool>) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::AutoStartBreaks { enabled })
            .await
    }

    pub async fn sounds(&self) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::Sounds).await
    }

    /// Plays an alarm once; the selected alarm when `sound_id` is `None`.
    pub async fn preview(&self, sound_id: Option<String>) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::Preview { sound_id })
            .await
    }

    /// Sends a request, retrying only the connection attempt.
    ///
    /// Once the request is written it is never sent again, so a failure
    /// after that point cannot apply a command twice. An error response
    /// from the daemon is returned as an error.
    async fn send_request_with_retry(&self, request: &IpcRequest) -> Result<IpcResponse> {
        let stream = self.connect_with_retry().await?;
        let response = self.exchange(stream, request).await?;

        if !response.is_success() {
            anyhow::bail!("{}", response.message);
        }
        Ok(response)
    }

    async fn connect_with_retry(&self) -> Result<UnixStream> {
        let mut attempt = 1;
        loop {
            match self.connect().await {
                Ok(stream) => return Ok(stream),
                Err(e) if attempt >= MAX_RETRIES => return Err(e),
                Err(e) => {
                    tracing::warn!("Connect failed (attempt {}/{}): {:#}", attempt, MAX_RETRIES, e);
                    tokio::time::sleep(self.retry_delay * attempt).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn connect(&self) -> Result<UnixStream> {
        timeout(self.timeout, UnixStream::connect(&self.socket_path))
            .await
            .context("Connection timed out")?
            .with_context(|| {
                format!(
                    "Cannot connect to the daemon at {}. Start it with 'pomofocus daemon'",
                    self.socket_path.display()
                )
            })
    }

    /// Writes one request and reads its response.
    async fn exchange(&self, mut stream: UnixStream, request: &IpcRequest) -> Result<IpcResponse> {
        let io_timeout = Duration::from_secs(IO_TIMEOUT_SECS);
        let request_json = serde_json::to_vec(request).context("Failed to serialize request")?;

        timeout(io_timeout, stream.write_all(&request_json))
            .await
            .context("Write timed out")?
            .context("Failed to send request")?;

        // Shutdown write side to signal end of request
        stream
            .shutdown()
            .await
            .context("Failed to finish request")?;

        let mut buffer = Vec::new();
        timeout(
            io_timeout,
            (&mut stream).take(MAX_RESPONSE_SIZE).read_to_end(&mut buffer),
        )
        .await
        .context("Read timed out")?
        .context("Failed to receive response")?;

        if buffer.is_empty() {
            anyhow::bail!("The daemon closed the connection without answering");
        }

        serde_json::from_slice(&buffer).context("Failed to parse response")
    }
}

// ============================================================================
// Tests
// ============================================================================
