//! `chunkflow serve` – answer tagged messages on the control socket.

use anyhow::Result;
use chunkflow_core::config::ChunkflowConfig;
use chunkflow_core::control::default_control_socket_path;
use std::path::PathBuf;

use crate::cli::control_socket;
use crate::cli::engine::open_engine;

pub async fn run_serve(cfg: ChunkflowConfig, socket: Option<PathBuf>) -> Result<()> {
    let path = match socket {
        Some(p) => p,
        None => default_control_socket_path()?,
    };
    let engine = open_engine(cfg, None).await?;
    println!("Listening on {}", path.display());
    control_socket::serve(engine.dispatcher.clone(), &path).await
}
