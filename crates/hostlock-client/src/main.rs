//! Main entry point for the hostlock launcher client.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use hostlock_client::{SaveClient, SaveClientConfig, workflow};

/// Fetch the shared save, run the game, submit the save back.
#[derive(Debug, Parser)]
#[command(name = "hostlock-client")]
struct Cli {
    /// Hostlock server address
    #[arg(short, long, default_value = "http://127.0.0.1:8040")]
    server: String,

    /// Player name recorded as the lock holder
    #[arg(short = 'n', long = "name", env = "HOSTLOCK_PLAYER")]
    player: String,

    /// Shared secret
    #[arg(long, env = "HOSTLOCK_PASSWORD", hide_env_values = true)]
    password: String,

    /// Local path where the game reads and writes the save
    #[arg(long = "save-path")]
    save_path: PathBuf,

    #[arg(long, default_value_t = 5000)]
    connect_timeout_ms: u64,

    #[arg(long, default_value_t = 30000)]
    read_timeout_ms: u64,

    /// Game command and its arguments
    #[arg(trailing_var_arg = true, required = true)]
    command: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = SaveClientConfig::new(&cli.server, &cli.player, &cli.password)
        .with_timeouts(cli.connect_timeout_ms, cli.read_timeout_ms);

    let client = match SaveClient::new(config) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to build HTTP client: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    match workflow::run_session(&client, &cli.save_path, &cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Session failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
