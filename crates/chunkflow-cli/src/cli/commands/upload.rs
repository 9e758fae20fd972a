//! `chunkflow upload <file> <url>` and `chunkflow set-chunks <n>`.

use anyhow::{Context, Result};
use chunkflow_core::config::ChunkflowConfig;
use chunkflow_core::dispatch::{Command, FileData};
use serde_json::Value;
use std::path::Path;

use super::expect_success;
use crate::cli::engine::open_engine;

pub async fn run_upload(
    cfg: ChunkflowConfig,
    path: &Path,
    url: &str,
    mime_type: Option<String>,
) -> Result<()> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .context("upload path has no file name")?;
    let size = data.len() as u64;

    let engine = open_engine(cfg, None).await?;
    let response = engine
        .dispatcher
        .handle(Command::UploadFile {
            file_data: Some(FileData::Bytes(data)),
            file_name: Some(name.clone()),
            file_size: Some(size),
            file_type: mime_type,
            upload_url: Some(url.to_string()),
        })
        .await;
    expect_success(&response)?;
    println!("Uploaded {name} to {url}");
    Ok(())
}

pub async fn run_set_chunks(cfg: ChunkflowConfig, count: &str) -> Result<()> {
    let raw = count
        .trim()
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(count.to_string()));
    let engine = open_engine(cfg, None).await?;
    let stored = engine.orchestrator().preferences().set_chunk_count(&raw)?;
    println!("Chunk count set to {stored}");
    Ok(())
}
