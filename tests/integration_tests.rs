//! Integration tests for the daemon/client IPC path.
//!
//! Each test binds a real Unix socket in a temporary directory, serves it
//! with `RequestHandler` and talks to it through `IpcClient`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::net::UnixStream;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::timeout;

use pomofocus::cli::client::IpcClient;
use pomofocus::daemon::ipc::{IpcServer, RequestHandler};
use pomofocus::daemon::store::{JsonFileStore, MemoryStore, StateStore};
use pomofocus::daemon::timer::{TimerEngine, TimerEvent};
use pomofocus::daemon::{SharedEngine, SharedStore};
use pomofocus::settings::{Settings, SettingsField, SettingsUpdate};
use pomofocus::sound::SoundCatalog;
use pomofocus::types::Mode;

// ============================================================================
// Test Helpers
// ============================================================================

struct TestDaemon {
    _dir: TempDir,
    socket_path: PathBuf,
    engine: SharedEngine,
    server: JoinHandle<()>,
    events: mpsc::UnboundedReceiver<TimerEvent>,
}

impl TestDaemon {
    fn start(store: SharedStore) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let socket_path = dir.path().join("pomofocus.sock");

        let (tx, rx) = mpsc::unbounded_channel();
        let engine: SharedEngine = Arc::new(Mutex::new(TimerEngine::new(
            Settings::default(),
            SoundCatalog::builtin(),
            tx,
        )));

        let server = IpcServer::new(&socket_path).unwrap();
        let handler = Arc::new(RequestHandler::new(Arc::clone(&engine), store));
        let server = tokio::spawn(async move {
            while let Ok(stream) = server.accept().await {
                IpcServer::spawn_connection(Arc::clone(&handler), stream);
            }
        });

        Self {
            _dir: dir,
            socket_path,
            engine,
            server,
            events: rx,
        }
    }

    fn client(&self) -> IpcClient {
        IpcClient::with_socket_path(self.socket_path.clone())
            .with_retry_delay(Duration::from_millis(10))
    }
}

impl Drop for TestDaemon {
    fn drop(&mut self) {
        self.server.abort();
    }
}

// ============================================================================
// Command Round Trips
// ============================================================================

#[tokio::test]
async fn test_status_round_trip() {
    let daemon = TestDaemon::start(Arc::new(MemoryStore::new()));

    let response = daemon.client().status().await.unwrap();

    let data = response.data.unwrap();
    assert_eq!(data.mode, Some(Mode::Work));
    assert_eq!(data.label.as_deref(), Some("Focus time"));
    assert_eq!(data.remaining_seconds, Some(1500));
    assert_eq!(data.running, Some(false));
}

#[tokio::test]
async fn test_toggle_reset_switch_round_trip() {
    let daemon = TestDaemon::start(Arc::new(MemoryStore::new()));
    let client = daemon.client();

    let started = client.toggle().await.unwrap();
    assert_eq!(started.data.unwrap().running, Some(true));

    let reset = client.reset().await.unwrap();
    let data = reset.data.unwrap();
    assert_eq!(data.running, Some(false));
    assert_eq!(data.remaining_seconds, Some(1500));

    let switched = client.switch_mode(Mode::ShortBreak).await.unwrap();
    let data = switched.data.unwrap();
    assert_eq!(data.mode, Some(Mode::ShortBreak));
    assert_eq!(data.remaining_seconds, Some(300));
    assert_eq!(data.completed_sessions, Some(0));
}

#[tokio::test]
async fn test_settings_round_trip_with_rejection() {
    let daemon = TestDaemon::start(Arc::new(MemoryStore::new()));

    let response = daemon
        .client()
        .settings(SettingsUpdate {
            work_minutes: Some("abc".to_string()),
            long_break_minutes: Some("".to_string()),
            alarm_sound_id: Some("chime".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    let data = response.data.unwrap();
    let settings = data.settings.unwrap();
    assert_eq!(settings.work_minutes, 25);
    assert_eq!(settings.long_break_minutes, 15);
    assert_eq!(settings.alarm_sound_id, "chime");
    assert_eq!(data.rejected, Some(vec![SettingsField::Work]));
}

#[tokio::test]
async fn test_auto_start_and_sounds_round_trip() {
    let daemon = TestDaemon::start(Arc::new(MemoryStore::new()));
    let client = daemon.client();

    let toggled = client.auto_start_breaks(None).await.unwrap();
    assert_eq!(toggled.data.unwrap().auto_start_breaks, Some(true));

    let sounds = client.sounds().await.unwrap();
    let ids: Vec<String> = sounds
        .data
        .unwrap()
        .sounds
        .unwrap()
        .into_iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(ids, vec!["bell", "chime", "beep"]);
}

#[tokio::test]
async fn test_requests_are_serialized_on_one_engine() {
    let daemon = TestDaemon::start(Arc::new(MemoryStore::new()));
    let client = daemon.client();

    client.switch_mode(Mode::LongBreak).await.unwrap();
    client.toggle().await.unwrap();
    client.toggle().await.unwrap();

    let engine = daemon.engine.lock().await;
    assert_eq!(engine.state().current_mode(), Mode::LongBreak);
    assert!(!engine.is_running());
}

#[tokio::test]
async fn test_idle_clients_do_not_cause_double_toggle() {
    let daemon = TestDaemon::start(Arc::new(MemoryStore::new()));
    let _idle_a = UnixStream::connect(&daemon.socket_path).await.unwrap();
    let _idle_b = UnixStream::connect(&daemon.socket_path).await.unwrap();

    let response = timeout(Duration::from_secs(2), daemon.client().toggle())
        .await
        .expect("toggle waited behind idle connections")
        .unwrap();

    assert_eq!(response.message, "Timer started");
    assert!(daemon.engine.lock().await.is_running());
}

#[tokio::test]
async fn test_preview_round_trip() {
    let mut daemon = TestDaemon::start(Arc::new(MemoryStore::new()));
    let client = daemon.client();

    let played = client.preview(Some("chime".to_string())).await.unwrap();
    assert_eq!(played.message, "Playing Chime");

    let err = client.preview(Some("gong".to_string())).await.unwrap_err();
    assert_eq!(err.to_string(), "Unknown alarm sound: gong");

    let previews: Vec<String> = std::iter::from_fn(|| daemon.events.try_recv().ok())
        .filter_map(|event| match event {
            TimerEvent::AlarmPreview(alarm) => Some(alarm.sound_id),
            _ => None,
        })
        .collect();
    assert_eq!(previews, vec!["chime"]);
}

// ============================================================================
// Persistence
// ============================================================================

#[tokio::test]
async fn test_settings_survive_restart() {
    let state_dir = tempfile::tempdir().unwrap();
    let state_path = state_dir.path().join("state.json");

    {
        let daemon = TestDaemon::start(Arc::new(JsonFileStore::new(&state_path)));
        daemon
            .client()
            .settings(SettingsUpdate {
                work_minutes: Some("40".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        daemon.client().auto_start_breaks(Some(true)).await.unwrap();
    }

    let persisted = JsonFileStore::new(&state_path).load().unwrap().unwrap();
    let (tx, _rx) = mpsc::unbounded_channel();
    let restored = TimerEngine::restore(
        persisted.clone(),
        persisted.session_date,
        SoundCatalog::builtin(),
        tx,
    );

    assert_eq!(restored.settings().work_minutes, 40);
    assert!(restored.state().auto_start_breaks());
    assert_eq!(restored.state().remaining_seconds(), 2400);
    assert!(!restored.is_running());
}

// ============================================================================
// Error Handling
// ============================================================================

#[tokio::test]
async fn test_client_without_daemon_fails() {
    let dir = tempfile::tempdir().unwrap();
    let client = IpcClient::with_socket_path(dir.path().join("missing.sock"))
        .with_retry_delay(Duration::from_millis(1));

    let result = client.status().await;

    assert!(result.is_err());
}
