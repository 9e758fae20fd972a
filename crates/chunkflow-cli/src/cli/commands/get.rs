//! `chunkflow get <url>` – download and wait until the file is on disk.

use anyhow::Result;
use chunkflow_core::config::ChunkflowConfig;
use chunkflow_core::executor::ChunkProgress;
use chunkflow_core::host::DownloadState;
use chunkflow_core::listener::Notification;
use chunkflow_core::orchestrator::TransferMode;
use chunkflow_core::url_model::is_download_link;
use chunkflow_core::util::{format_file_size, validate_url};
use std::collections::HashMap;
use tokio::sync::mpsc;

use crate::cli::engine::open_engine;

pub async fn run_get(cfg: ChunkflowConfig, url: &str, chunks: Option<usize>) -> Result<()> {
    if !validate_url(url) {
        anyhow::bail!("not an absolute URL: {}", url);
    }
    if !is_download_link(url, false) {
        eprintln!("note: {} does not name a known file type; downloading anyway", url);
    }
    let (progress_tx, progress_rx) = mpsc::channel(256);
    let engine = open_engine(cfg, Some(progress_tx)).await?;
    let orchestrator = engine.orchestrator();

    let (note_tx, mut note_rx) = mpsc::channel(16);
    let listener_handle = orchestrator.listener().connect(note_tx);
    let printer = tokio::spawn(print_progress(progress_rx));

    let count = match chunks {
        Some(n) => n,
        None => orchestrator.preferences().chunk_count()?,
    };
    let report = orchestrator.download(url, count).await;
    orchestrator.listener().disconnect(listener_handle);
    while let Ok(note) = note_rx.try_recv() {
        if let Notification::Error { message } = note {
            eprintln!("{message}");
        }
    }
    let report = report?;
    printer.abort();
    eprintln!();

    let mode = report.outcome.mode();
    let Some(id) = report.outcome.download_id() else {
        return Ok(());
    };
    let item = engine.host.wait_until_settled(id).await?;
    match item.state {
        DownloadState::Complete => {
            let path = engine
                .host
                .file_path(&item)
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            println!(
                "Saved {} ({}, {})",
                path,
                format_file_size(item.bytes_received.max(0) as u64),
                mode_label(mode)
            );
            Ok(())
        }
        _ => anyhow::bail!(
            "download {} did not complete: {}",
            id,
            item.error.as_deref().unwrap_or("paused")
        ),
    }
}

fn mode_label(mode: TransferMode) -> &'static str {
    match mode {
        TransferMode::Chunked => "chunked",
        TransferMode::Normal => "normal",
        TransferMode::Fallback => "fallback",
    }
}

/// Prints overall progress of the chunk set to stderr.
async fn print_progress(mut rx: mpsc::Receiver<ChunkProgress>) {
    let mut per_chunk: HashMap<usize, (u64, u64)> = HashMap::new();
    let mut last_pct = None;
    while let Some(p) = rx.recv().await {
        per_chunk.insert(p.index, (p.transferred, p.total));
        let (done, total) = per_chunk
            .values()
            .fold((0u64, 0u64), |(d, t), (pd, pt)| (d + pd, t + pt));
        if total == 0 {
            continue;
        }
        let pct = done * 100 / total;
        if last_pct != Some(pct) {
            last_pct = Some(pct);
            eprint!("\r{} chunks: {:>3}%", per_chunk.len(), pct);
        }
    }
    eprintln!();
}
