//! CLI for the ChunkFlow transfer engine.

mod commands;
mod control_socket;
mod engine;

use anyhow::Result;
use clap::{Parser, Subcommand};
use chunkflow_core::config;
use chunkflow_core::dispatch::Command;
use std::path::PathBuf;

use commands::{
    run_completions, run_control, run_get, run_list, run_send, run_serve, run_set_chunks,
    run_upload, run_uploads,
};

/// Top-level CLI for ChunkFlow.
#[derive(Debug, Parser)]
#[command(name = "chunkflow")]
#[command(about = "ChunkFlow: parallel chunked downloads and uploads", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download a URL, in parallel byte-range chunks when the server allows it.
    Get {
        /// HTTP/HTTPS URL to download.
        url: String,
        /// Number of chunks (clamped to the configured bounds; default: saved preference).
        #[arg(long, value_name = "N")]
        chunks: Option<usize>,
    },

    /// Upload a file, in Content-Range chunks when the endpoint accepts ranges.
    Upload {
        /// File to upload.
        path: PathBuf,
        /// Endpoint receiving the upload.
        url: String,
        /// MIME type recorded in the upload history and sent with a normal upload.
        #[arg(long = "type", value_name = "MIME")]
        mime_type: Option<String>,
    },

    /// List downloads known to the local host.
    List,

    /// Pause a running download.
    Pause {
        /// Download identifier.
        id: i64,
        #[arg(long, value_name = "PATH")]
        socket: Option<PathBuf>,
    },

    /// Resume a paused or failed download.
    Resume {
        /// Download identifier.
        id: i64,
        #[arg(long, value_name = "PATH")]
        socket: Option<PathBuf>,
    },

    /// Cancel a download and start its address again as a new download.
    Restart {
        /// Download identifier.
        id: i64,
        #[arg(long, value_name = "PATH")]
        socket: Option<PathBuf>,
    },

    /// Delete a download's file and forget it.
    Delete {
        /// Download identifier.
        id: i64,
        #[arg(long, value_name = "PATH")]
        socket: Option<PathBuf>,
    },

    /// Show the upload history.
    Uploads,

    /// Save the preferred chunk count (normalized before saving).
    SetChunks {
        /// Requested count; non-numbers select the default.
        count: String,
    },

    /// Serve tagged JSON messages on a Unix control socket until interrupted.
    Serve {
        /// Socket path (default: state dir `control.sock`).
        #[arg(long, value_name = "PATH")]
        socket: Option<PathBuf>,
    },

    /// Send one raw JSON message to a running `serve` and print the reply.
    Send {
        /// Message, e.g. '{"type":"GET_DOWNLOADS"}'.
        message: String,
        #[arg(long, value_name = "PATH")]
        socket: Option<PathBuf>,
        /// Seconds to wait for a reply.
        #[arg(long, default_value = "30", value_name = "SECS")]
        wait: u64,
    },

    /// Print a shell completion script.
    Completions {
        shell: clap_complete::Shell,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        if let CliCommand::Completions { shell } = cli.command {
            run_completions(shell);
            return Ok(());
        }
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Get { url, chunks } => run_get(cfg, &url, chunks).await?,
            CliCommand::Upload {
                path,
                url,
                mime_type,
            } => run_upload(cfg, &path, &url, mime_type).await?,
            CliCommand::List => run_list(cfg).await?,
            CliCommand::Pause { id, socket } => {
                run_control(cfg, Command::PauseDownload { download_id: id }, socket).await?
            }
            CliCommand::Resume { id, socket } => {
                run_control(cfg, Command::ResumeDownload { download_id: id }, socket).await?
            }
            CliCommand::Restart { id, socket } => {
                run_control(cfg, Command::RestartDownload { download_id: id }, socket).await?
            }
            CliCommand::Delete { id, socket } => {
                run_control(cfg, Command::DeleteDownload { download_id: id }, socket).await?
            }
            CliCommand::Uploads => run_uploads(cfg).await?,
            CliCommand::SetChunks { count } => run_set_chunks(cfg, &count).await?,
            CliCommand::Serve { socket } => run_serve(cfg, socket).await?,
            CliCommand::Send {
                message,
                socket,
                wait,
            } => run_send(&message, socket, wait).await?,
            CliCommand::Completions { .. } => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
