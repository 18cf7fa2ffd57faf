//! Pomofocus - a Pomodoro timer for the terminal
//!
//! This tool helps you stay focused using the Pomodoro Technique:
//! - 25 minutes of focused work
//! - 5 minutes of short break
//! - 15 minutes of long break after every 4 focus sessions

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};

use pomofocus::cli::{Cli, Commands, DaemonArgs, Display, IpcClient};
use pomofocus::daemon::{self, default_socket_path, default_state_path, DaemonOptions};

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    if let Err(e) = execute(cli).await {
        Display::show_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
///
/// `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    let socket = cli.socket.clone();

    match cli.command {
        Some(Commands::Toggle) => {
            let response = client(socket)?.toggle().await?;
            Display::show_timer_change(&response);
        }
        Some(Commands::Reset) => {
            let response = client(socket)?.reset().await?;
            Display::show_timer_change(&response);
        }
        Some(Commands::Mode { mode }) => {
            let response = client(socket)?.switch_mode(mode).await?;
            Display::show_timer_change(&response);
        }
        Some(Commands::Status) => {
            let response = client(socket)?.status().await?;
            Display::show_status(&response);
        }
        Some(Commands::Settings(args)) => {
            let response = client(socket)?.settings(args.to_update()).await?;
            Display::show_settings(&response);
        }
        Some(Commands::AutoStart { state }) => {
            let response = client(socket)?
                .auto_start_breaks(state.map(|s| s.enabled()))
                .await?;
            Display::show_message(&response);
        }
        Some(Commands::Sounds) => {
            let response = client(socket)?.sounds().await?;
            Display::show_sounds(&response);
        }
        Some(Commands::Preview { sound }) => {
            let response = client(socket)?.preview(sound).await?;
            Display::show_message(&response);
        }
        Some(Commands::Daemon(args)) => {
            daemon::run(daemon_options(socket, args)?).await?;
        }
        Some(Commands::Completions { shell }) => {
            generate_completions(shell);
        }
        None => {
            Cli::command().print_help()?;
        }
    }

    Ok(())
}

fn client(socket: Option<PathBuf>) -> Result<IpcClient> {
    match socket {
        Some(path) => Ok(IpcClient::with_socket_path(path)),
        None => IpcClient::new(),
    }
}

fn daemon_options(socket: Option<PathBuf>, args: DaemonArgs) -> Result<DaemonOptions> {
    let socket_path = match socket {
        Some(path) => path,
        None => default_socket_path().context("Cannot determine the default socket path")?,
    };
    let state_path = match args.state_file {
        Some(path) => path,
        None => default_state_path().context("Cannot determine the default state file")?,
    };

    Ok(DaemonOptions {
        socket_path,
        state_path,
        sound: !args.no_sound,
        notifications: !args.no_notifications,
    })
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daemon_options_from_flags() {
        let args = DaemonArgs {
            state_file: Some(PathBuf::from("/tmp/state.json")),
            no_sound: true,
            no_notifications: false,
        };

        let options = daemon_options(Some(PathBuf::from("/tmp/p.sock")), args).unwrap();

        assert_eq!(options.socket_path, PathBuf::from("/tmp/p.sock"));
        assert_eq!(options.state_path, PathBuf::from("/tmp/state.json"));
        assert!(!options.sound);
        assert!(options.notifications);
    }

    #[test]
    fn test_client_uses_socket_override() {
        let client = client(Some(PathBuf::from("/tmp/p.sock"))).unwrap();
        assert_eq!(client.socket_path(), std::path::Path::new("/tmp/p.sock"));
    }
}
