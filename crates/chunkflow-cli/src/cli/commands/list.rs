//! `chunkflow list` and `chunkflow uploads`.

use anyhow::Result;
use chunkflow_core::config::ChunkflowConfig;
use chunkflow_core::host::{DownloadQuery, HostDownloader};
use chunkflow_core::url_model::{file_extension, is_image_file};
use chunkflow_core::util::format_file_size;

use crate::cli::engine::open_engine;

pub async fn run_list(cfg: ChunkflowConfig) -> Result<()> {
    let engine = open_engine(cfg, None).await?;
    let items = engine.host.search(DownloadQuery::default()).await?;
    if items.is_empty() {
        println!("No downloads.");
        return Ok(());
    }
    let outcomes = engine.orchestrator().outcomes();
    println!(
        "{:<6} {:<12} {:<9} {:<10} {}",
        "ID", "STATE", "MODE", "SIZE", "FILE"
    );
    for item in items {
        let state = if item.paused {
            "paused".to_string()
        } else {
            item.state.as_str().to_string()
        };
        let mode = outcomes
            .mode_of(item.id)
            .ok()
            .flatten()
            .map(|m| format!("{m:?}").to_lowercase())
            .unwrap_or_else(|| "-".to_string());
        let size = item
            .total_bytes
            .map(|s| format_file_size(s.max(0) as u64))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<6} {:<12} {:<9} {:<10} {}",
            item.id,
            state,
            mode,
            size,
            item.filename.as_deref().unwrap_or(&item.url)
        );
    }
    Ok(())
}

pub async fn run_uploads(cfg: ChunkflowConfig) -> Result<()> {
    let engine = open_engine(cfg, None).await?;
    let uploads = engine.orchestrator().uploads().list()?;
    if uploads.is_empty() {
        println!("No uploads.");
        return Ok(());
    }
    println!("{:<10} {:<6} {:<24} {}", "SIZE", "KIND", "TYPE", "NAME");
    for u in uploads {
        let kind = if is_image_file(&u.name) {
            "image".to_string()
        } else {
            match file_extension(&u.name) {
                ext if ext.is_empty() => "-".to_string(),
                ext => ext,
            }
        };
        println!(
            "{:<10} {:<6} {:<24} {}",
            format_file_size(u.size),
            kind,
            if u.mime_type.is_empty() { "-" } else { u.mime_type.as_str() },
            u.name
        );
    }
    Ok(())
}
