//! `chunkflow send <json>` and `chunkflow completions <shell>`.

use anyhow::{Context, Result};
use chunkflow_core::control::default_control_socket_path;
use clap::CommandFactory;
use std::path::PathBuf;
use std::time::Duration;

use crate::cli::{control_socket, Cli};

pub async fn run_send(message: &str, socket: Option<PathBuf>, wait: u64) -> Result<()> {
    serde_json::from_str::<serde_json::Value>(message).context("message is not valid JSON")?;
    let path = match socket {
        Some(p) => p,
        None => default_control_socket_path()?,
    };
    match control_socket::request(&path, message, Duration::from_secs(wait)).await? {
        Some(reply) => println!("{}", serde_json::to_string_pretty(&reply)?),
        None => eprintln!("no reply"),
    }
    Ok(())
}

pub fn run_completions(shell: clap_complete::Shell) {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "chunkflow", &mut std::io::stdout());
}
