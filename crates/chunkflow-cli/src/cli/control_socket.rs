//! Control socket: server (during `chunkflow serve`) and client.
//!
//! Protocol: newline-delimited JSON. Each inbound line is one tagged message;
//! the server answers known messages with one response line (an object with
//! no `type`). A connection that sends `{"type":"SUBSCRIBE"}` becomes the
//! attached listener and also receives notification lines (objects with a
//! `type`) until it disconnects or another client subscribes.

use anyhow::{Context, Result};
use chunkflow_core::dispatch::{Dispatcher, Response};
use chunkflow_core::host::LocalHost;
use chunkflow_core::listener::Notification;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc;

/// Line that attaches the connection as the notification listener.
pub const SUBSCRIBE_TYPE: &str = "SUBSCRIBE";

/// Serves `path` until Ctrl-C. Removes a stale socket file first.
pub async fn serve(dispatcher: Dispatcher<LocalHost>, path: &Path) -> Result<()> {
    let _ = std::fs::remove_file(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let listener = UnixListener::bind(path)
        .with_context(|| format!("control socket bind {}", path.display()))?;
    tracing::info!(path = %path.display(), "control socket listening");
    let forwarder = dispatcher.forward_host_events();

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, _)) => {
                    let d = dispatcher.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(d, stream).await {
                            tracing::debug!("control connection: {:#}", e);
                        }
                    });
                }
                Err(e) => tracing::debug!("control socket accept: {}", e),
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("control socket shutting down");
                break;
            }
        }
    }

    forwarder.abort();
    let _ = std::fs::remove_file(path);
    Ok(())
}

fn is_subscribe(line: &str) -> bool {
    serde_json::from_str::<Value>(line)
        .ok()
        .and_then(|v| v.get("type").and_then(Value::as_str).map(|t| t == SUBSCRIBE_TYPE))
        .unwrap_or(false)
}

async fn handle_connection(dispatcher: Dispatcher<LocalHost>, stream: UnixStream) -> Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let (out_tx, mut out_rx) = mpsc::channel::<String>(16);
    let (note_tx, mut note_rx) = mpsc::channel::<Notification>(64);
    let listener = Arc::clone(dispatcher.orchestrator().listener());

    let writer = tokio::spawn(async move {
        loop {
            let line = tokio::select! {
                Some(r) = out_rx.recv() => r,
                Some(n) = note_rx.recv() => match serde_json::to_string(&n) {
                    Ok(s) => s,
                    Err(_) => continue,
                },
                else => break,
            };
            if write_half.write_all(line.as_bytes()).await.is_err()
                || write_half.write_all(b"\n").await.is_err()
            {
                break;
            }
        }
    });

    let mut note_tx = Some(note_tx);
    let mut handle = None;
    let mut lines = BufReader::new(read_half).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if is_subscribe(line) {
            if let Some(tx) = note_tx.take() {
                handle = Some(listener.connect(tx));
            }
            continue;
        }
        let response = match dispatcher.handle_json(line).await {
            Ok(Some(r)) => r,
            Ok(None) => continue,
            Err(e) => Response::failed(format!("{:#}", e)),
        };
        if out_tx.send(serde_json::to_string(&response)?).await.is_err() {
            break;
        }
    }

    if let Some(h) = handle {
        listener.disconnect(h);
    }
    drop(note_tx);
    drop(out_tx);
    let _ = writer.await;
    Ok(())
}

/// True if something accepts connections on `path`.
pub async fn server_running(path: &Path) -> bool {
    path.exists() && UnixStream::connect(path).await.is_ok()
}

/// Sends one message and returns the first response line, skipping notifications.
/// `None` when the server sent no reply within `wait` (e.g. an ignored message).
pub async fn request(path: &Path, message: &str, wait: Duration) -> Result<Option<Value>> {
    let stream = UnixStream::connect(path)
        .await
        .with_context(|| format!("no control socket at {}", path.display()))?;
    let (read_half, mut write_half) = stream.into_split();
    write_half.write_all(message.trim().as_bytes()).await?;
    write_half.write_all(b"\n").await?;

    let mut lines = BufReader::new(read_half).lines();
    loop {
        match tokio::time::timeout(wait, lines.next_line()).await {
            Err(_) | Ok(Ok(None)) => return Ok(None),
            Ok(Err(e)) => return Err(e.into()),
            Ok(Ok(Some(line))) => {
                let v: Value = serde_json::from_str(&line).context("invalid reply")?;
                if v.get("type").is_none() {
                    return Ok(Some(v));
                }
            }
        }
    }
}
