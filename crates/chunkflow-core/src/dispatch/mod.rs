//! Inbound message dispatch.
//!
//! Turns tagged JSON messages into orchestrator and host calls. Unknown tags
//! are logged and ignored; malformed known messages are errors.

mod command;

pub use command::{Command, FileData, Response, KNOWN_TYPES};

use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::Value;
use tokio::sync::broadcast;

use crate::host::{DownloadId, DownloadQuery, HandoffRequest, HostDownloader};
use crate::listener::Notification;
use crate::orchestrator::{Orchestrator, UploadRequest};
use crate::store::UploadRecord;
use crate::util::unix_millis;

const MISSING_UPLOAD_DATA: &str = "Missing required upload data";

/// Routes commands to one orchestrator and its host.
pub struct Dispatcher<H: HostDownloader> {
    orchestrator: Arc<Orchestrator<H>>,
}

impl<H: HostDownloader> Clone for Dispatcher<H> {
    fn clone(&self) -> Self {
        Self {
            orchestrator: Arc::clone(&self.orchestrator),
        }
    }
}

impl<H: HostDownloader> Dispatcher<H> {
    pub fn new(orchestrator: Arc<Orchestrator<H>>) -> Self {
        Self { orchestrator }
    }

    pub fn orchestrator(&self) -> &Arc<Orchestrator<H>> {
        &self.orchestrator
    }

    /// Parses and handles one raw message. `Ok(None)` means the tag was unknown.
    pub async fn handle_json(&self, raw: &str) -> Result<Option<Response>> {
        let value: Value = serde_json::from_str(raw).context("message is not valid JSON")?;
        self.handle_value(value).await
    }

    pub async fn handle_value(&self, value: Value) -> Result<Option<Response>> {
        let tag = value.get("type").and_then(Value::as_str).unwrap_or("");
        if !KNOWN_TYPES.contains(&tag) {
            tracing::warn!(message_type = %tag, "unknown message type, ignoring");
            return Ok(None);
        }
        let tag = tag.to_string();
        let command: Command =
            serde_json::from_value(value).with_context(|| format!("malformed {} message", tag))?;
        Ok(Some(self.handle(command).await))
    }

    /// Handles one parsed command. Failures are reported in the response.
    pub async fn handle(&self, command: Command) -> Response {
        match command {
            Command::StartDownload { url } => self.start_download(url),
            Command::UploadFile {
                file_data,
                file_name,
                file_size,
                file_type,
                upload_url,
            } => match (file_data, file_name, upload_url) {
                (Some(data), Some(name), Some(url))
                    if !data.is_blank() && !name.is_empty() && !url.is_empty() =>
                {
                    self.upload(data.into_bytes(), name, file_size, file_type, url)
                        .await
                }
                _ => Response::failed(MISSING_UPLOAD_DATA),
            },
            Command::PauseDownload { download_id } => {
                let r = self.orchestrator.host().pause(download_id).await;
                ack("pause", download_id, r)
            }
            Command::ResumeDownload { download_id } => {
                let r = self.orchestrator.host().resume(download_id).await;
                ack("resume", download_id, r)
            }
            Command::DeleteDownload { download_id } => {
                let r = self.delete(download_id).await;
                ack("delete", download_id, r)
            }
            Command::RestartDownload { download_id } => {
                let r = self.restart(download_id).await;
                ack("restart", download_id, r)
            }
            Command::GetUploadedFiles {} => match self.orchestrator.uploads().list() {
                Ok(uploaded_files) => Response::UploadedFiles { uploaded_files },
                Err(e) => {
                    tracing::warn!(error = %e, "failed to read upload history");
                    Response::UploadedFiles {
                        uploaded_files: Vec::new(),
                    }
                }
            },
            Command::SetChunkCount { chunk_count } => {
                match self.orchestrator.preferences().set_chunk_count(&chunk_count) {
                    Ok(n) => Response::Ack {
                        success: true,
                        error: None,
                        chunk_count: Some(n),
                    },
                    Err(e) => Response::failed(format!("{:#}", e)),
                }
            }
            Command::GetDownloads {} => {
                match self
                    .orchestrator
                    .host()
                    .search(DownloadQuery::default())
                    .await
                {
                    Ok(downloads) => Response::Downloads { downloads },
                    Err(e) => Response::failed(format!("{:#}", e)),
                }
            }
        }
    }

    /// Starts the download in the background and acknowledges at once.
    fn start_download(&self, url: String) -> Response {
        let count = match self.orchestrator.preferences().chunk_count() {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(error = %e, "chunk count unreadable, using default");
                self.orchestrator.config().default_chunks
            }
        };
        tracing::info!(url = %url, chunks = count, "starting download");
        let orchestrator = Arc::clone(&self.orchestrator);
        tokio::spawn(async move {
            // Failures were already reported to the listener.
            let _ = orchestrator.download(&url, count).await;
        });
        Response::ok()
    }

    async fn upload(
        &self,
        data: Vec<u8>,
        name: String,
        size: Option<u64>,
        mime_type: Option<String>,
        url: String,
    ) -> Response {
        let chunk_count = match self.orchestrator.preferences().chunk_count() {
            Ok(n) => n,
            Err(_) => self.orchestrator.config().default_chunks,
        };
        let size = size.unwrap_or(data.len() as u64);
        let request = UploadRequest {
            data,
            file_name: name.clone(),
            mime_type: mime_type.clone(),
            upload_url: url,
            chunk_count,
        };
        match self.orchestrator.upload(request).await {
            Ok(_) => {
                let record = UploadRecord {
                    name,
                    size,
                    mime_type: mime_type.unwrap_or_default(),
                    timestamp: unix_millis(),
                };
                if let Err(e) = self.orchestrator.uploads().append(record) {
                    tracing::warn!(error = %e, "failed to store upload history");
                }
                Response::ok()
            }
            Err(e) => Response::failed(e.to_string()),
        }
    }

    /// Removes the file, then forgets the record even if removal failed.
    async fn delete(&self, id: DownloadId) -> Result<()> {
        let host = self.orchestrator.host();
        if let Err(e) = host.remove_file(id).await {
            tracing::warn!(download_id = id, error = %e, "remove file failed");
        }
        host.erase(id).await?;
        tracing::info!(download_id = id, "deleted download");
        Ok(())
    }

    /// Cancels `id` and starts its address again as a new host download.
    async fn restart(&self, id: DownloadId) -> Result<()> {
        let host = self.orchestrator.host();
        let item = host
            .search(DownloadQuery::by_id(id))
            .await?
            .into_iter()
            .next()
            .with_context(|| format!("no download with id {}", id))?;
        let url = item.restart_url().to_string();
        host.cancel(id).await?;
        let new_id = host.submit(HandoffRequest::url(url.clone(), None)).await?;
        tracing::info!(download_id = id, new_download_id = new_id, url = %url, "restarted download");
        Ok(())
    }

    /// Forwards every host lifecycle event to the listener as `DOWNLOAD_UPDATE`.
    pub fn forward_host_events(&self) -> tokio::task::JoinHandle<()> {
        let mut events = self.orchestrator.host().subscribe();
        let listener = Arc::clone(self.orchestrator.listener());
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        tracing::trace!(?event, "host event");
                        listener.notify(Notification::DownloadUpdate);
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::debug!(skipped = n, "host events lagged");
                        listener.notify(Notification::DownloadUpdate);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}

fn ack(action: &str, id: DownloadId, result: Result<()>) -> Response {
    match result {
        Ok(()) => {
            tracing::info!(download_id = id, action, "download command applied");
            Response::ok()
        }
        Err(e) => {
            tracing::warn!(download_id = id, action, error = %e, "download command failed");
            Response::failed(format!("{:#}", e))
        }
    }
}
