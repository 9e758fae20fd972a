//! `chunkflow pause|resume|restart|delete <id>`.
//!
//! Goes through a running `serve` when its socket answers, so the process that
//! owns the transfer applies it; otherwise acts on the registry directly.

use anyhow::Result;
use chunkflow_core::config::ChunkflowConfig;
use chunkflow_core::control::default_control_socket_path;
use chunkflow_core::dispatch::{Command, Response};
use std::path::PathBuf;
use std::time::Duration;

use super::expect_success;
use crate::cli::control_socket;
use crate::cli::engine::open_engine;

pub async fn run_control(
    cfg: ChunkflowConfig,
    command: Command,
    socket: Option<PathBuf>,
) -> Result<()> {
    let label = describe(&command);
    let path = match socket {
        Some(p) => Some(p),
        None => default_control_socket_path().ok(),
    };

    if let Some(path) = path.filter(|p| p.exists()) {
        if control_socket::server_running(&path).await {
            let message = serde_json::to_string(&command)?;
            let reply = control_socket::request(&path, &message, Duration::from_secs(30)).await?;
            let response: Response = match reply {
                Some(v) => serde_json::from_value(v)?,
                None => anyhow::bail!("no reply from control socket"),
            };
            expect_success(&response)?;
            println!("{label}");
            return Ok(());
        }
    }

    let engine = open_engine(cfg, None).await?;
    let response = engine.dispatcher.handle(command).await;
    expect_success(&response)?;
    println!("{label}");
    // A resumed or restarted transfer runs in this process; finish it before exiting.
    engine.host.wait_idle().await;
    Ok(())
}

fn describe(command: &Command) -> String {
    match command {
        Command::PauseDownload { download_id } => format!("Paused download {download_id}"),
        Command::ResumeDownload { download_id } => format!("Resumed download {download_id}"),
        Command::RestartDownload { download_id } => format!("Restarted download {download_id}"),
        Command::DeleteDownload { download_id } => format!("Deleted download {download_id}"),
        other => format!("{other:?}"),
    }
}
