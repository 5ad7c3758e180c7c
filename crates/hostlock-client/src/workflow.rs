//! Session workflow
//!
//! Three sequential stages: fetch the save, run the game, submit the save
//! back. The submit stage only runs when the fetch stage actually took the
//! lock; a guest session leaves the server untouched.

use std::path::Path;

use anyhow::{Context, ensure};
use tracing::{info, warn};

use crate::http::{FetchOutcome, SaveClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionRole {
    /// We hold the lock and must submit the save afterwards
    Host,
    /// Someone else hosts; play without the save
    Guest,
}

/// Write the downloaded save through a temporary file and atomic rename.
async fn write_save(path: &Path, content: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let tmp = path.with_extension("tmp");
    tokio::fs::write(&tmp, content)
        .await
        .with_context(|| format!("writing {}", tmp.display()))?;
    tokio::fs::rename(&tmp, path)
        .await
        .with_context(|| format!("moving save into {}", path.display()))?;
    Ok(())
}

async fn run_game(command: &[String]) -> anyhow::Result<std::process::ExitStatus> {
    info!(command = %command.join(" "), "Launching game");
    let status = tokio::process::Command::new(&command[0])
        .args(&command[1..])
        .status()
        .await
        .with_context(|| format!("spawning '{}'", command[0]))?;

    // A crashed game does not abort the workflow: the save still has to
    // go back to the server, or the lock sticks. The failure is reported
    // after the submit stage instead.
    if !status.success() {
        warn!(code = ?status.code(), "Game exited with non-zero status");
    }
    Ok(status)
}

/// Run one full session: fetch, play, submit.
pub async fn run_session(
    client: &SaveClient,
    save_path: &Path,
    command: &[String],
) -> anyhow::Result<()> {
    ensure!(!command.is_empty(), "no game command given");

    let role = match client.fetch_save().await? {
        FetchOutcome::Acquired { filename, content } => {
            write_save(save_path, &content).await?;
            info!(file = %filename, path = %save_path.display(), "Save downloaded, hosting this session");
            SessionRole::Host
        }
        FetchOutcome::Locked { message } => {
            info!(%message, "Save is checked out, joining as guest");
            SessionRole::Guest
        }
    };

    let status = run_game(command).await?;

    if role == SessionRole::Host {
        let content = tokio::fs::read(save_path)
            .await
            .with_context(|| format!("reading {}", save_path.display()))?;
        let filename = save_path
            .file_name()
            .and_then(|n| n.to_str())
            .context("save path has no file name")?;
        client.submit_save(filename, content).await?;
        info!("Save uploaded, lock released");
    }

    ensure!(status.success(), "game exited with {}", status);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_save_creates_parents_and_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("world.sav");

        write_save(&path, b"first").await.unwrap();
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"first");

        write_save(&path, b"second").await.unwrap();
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_run_game_reports_spawn_failure() {
        let result = run_game(&["hostlock-test-no-such-binary".to_string()]).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_run_game_returns_exit_status() {
        let command = ["sh".to_string(), "-c".to_string(), "exit 3".to_string()];
        let status = run_game(&command).await.unwrap();
        assert!(!status.success());
        assert_eq!(status.code(), Some(3));

        let command = ["sh".to_string(), "-c".to_string(), "exit 0".to_string()];
        let status = run_game(&command).await.unwrap();
        assert!(status.success());
    }
}
