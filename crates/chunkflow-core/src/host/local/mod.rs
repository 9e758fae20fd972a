//! Local host: registry-backed downloads written into a directory.
//!
//! Blob hand-offs are written straight to disk. URL hand-offs are fetched by a
//! background task with a single GET; pause and cancel stop that task through
//! its [`TransferToken`](crate::control::TransferToken), and resume starts the
//! GET over.

mod fetch;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::broadcast;

use super::{DownloadEvent, HandoffRequest, HandoffSource, HostDownloader};
use crate::control::{StopReason, TransferControl};
use crate::error::TransferError;
use crate::executor::RequestOptions;
use crate::registry::{
    DownloadId, DownloadItem, DownloadQuery, DownloadRegistry, DownloadState, NewDownload,
};
use crate::storage::{temp_path, write_file_atomically, TEMP_SUFFIX};
use crate::url_model::{
    derive_filename, sanitize_filename, unique_filename_among, DEFAULT_FILENAME, NAME_MAX,
};
use fetch::{FetchError, FetchInfo};

/// Error text stored for a user-cancelled download.
pub const USER_CANCELED: &str = "USER_CANCELED";

const PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

/// Longest final name whose `.part` file still fits in `NAME_MAX`.
const HOST_NAME_MAX: usize = NAME_MAX - TEMP_SUFFIX.len();

struct Inner {
    registry: DownloadRegistry,
    download_dir: PathBuf,
    control: TransferControl,
    events: broadcast::Sender<DownloadEvent>,
    opts: RequestOptions,
    // Names handed out but not yet on disk.
    reserved: Mutex<HashSet<String>>,
}

/// Host implementation writing into `download_dir`.
#[derive(Clone)]
pub struct LocalHost {
    inner: Arc<Inner>,
}

impl LocalHost {
    pub fn new(
        registry: DownloadRegistry,
        download_dir: impl Into<PathBuf>,
        connect_timeout: Duration,
    ) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            inner: Arc::new(Inner {
                registry,
                download_dir: download_dir.into(),
                control: TransferControl::new(),
                events,
                opts: RequestOptions { connect_timeout },
                reserved: Mutex::new(HashSet::new()),
            }),
        }
    }

    pub fn download_dir(&self) -> &Path {
        &self.inner.download_dir
    }

    pub fn registry(&self) -> &DownloadRegistry {
        &self.inner.registry
    }

    /// Path of the file written for `item`, if it has a name.
    pub fn file_path(&self, item: &DownloadItem) -> Option<PathBuf> {
        item.filename
            .as_deref()
            .map(|name| self.inner.download_dir.join(name))
    }

    /// Waits until `id` is complete, interrupted, or paused with nothing running.
    pub async fn wait_until_settled(&self, id: DownloadId) -> Result<DownloadItem> {
        let mut rx = self.inner.events.subscribe();
        loop {
            let item = self
                .inner
                .registry
                .get(id)
                .await?
                .with_context(|| format!("no download with id {}", id))?;
            let running = self.inner.control.is_running(id);
            if item.state != DownloadState::InProgress || (item.paused && !running) {
                return Ok(item);
            }
            match tokio::time::timeout(PROGRESS_INTERVAL * 2, rx.recv()).await {
                Ok(Err(broadcast::error::RecvError::Closed)) => {
                    anyhow::bail!("host event channel closed")
                }
                _ => continue,
            }
        }
    }

    /// Waits until no transfer started by this host is running.
    pub async fn wait_idle(&self) {
        let mut rx = self.inner.events.subscribe();
        while self.inner.control.running_count() > 0 {
            // Timeout covers a missed event between the check and recv.
            let _ = tokio::time::timeout(PROGRESS_INTERVAL * 2, rx.recv()).await;
        }
    }

    async fn item(&self, id: DownloadId) -> Result<DownloadItem> {
        self.inner
            .registry
            .get(id)
            .await?
            .with_context(|| format!("no download with id {}", id))
    }

    fn emit(&self, event: DownloadEvent) {
        // No subscribers is fine.
        let _ = self.inner.events.send(event);
    }

    fn reserved(&self) -> std::sync::MutexGuard<'_, HashSet<String>> {
        self.inner.reserved.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Picks a free name for `candidate` and holds it until [`Self::release_name`].
    ///
    /// Names fit in `NAME_MAX` together with the `.part` suffix.
    async fn reserve_name(&self, candidate: &str) -> String {
        let mut on_disk: HashSet<String> = HashSet::new();
        loop {
            let name = {
                let reserved = self.reserved();
                unique_filename_among(candidate, HOST_NAME_MAX, |n| {
                    reserved.contains(n) || on_disk.contains(n)
                })
            };
            if self.occupied(&name).await {
                on_disk.insert(name);
                continue;
            }
            if self.reserved().insert(name.clone()) {
                return name;
            }
        }
    }

    /// True if `name` or its `.part` file exists in the download dir.
    async fn occupied(&self, name: &str) -> bool {
        let path = self.inner.download_dir.join(name);
        for p in [temp_path(&path), path] {
            if tokio::fs::try_exists(&p).await.unwrap_or(false) {
                return true;
            }
        }
        false
    }

    fn release_name(&self, name: &str) {
        self.inner
            .reserved
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(name);
    }

    async fn submit_blob(
        &self,
        bytes: Vec<u8>,
        mime_type: String,
        object_url: String,
        filename: Option<String>,
    ) -> Result<DownloadId, TransferError> {
        let candidate = filename
            .map(|f| sanitize_filename(&f))
            .filter(|f| !f.is_empty())
            .unwrap_or_else(|| DEFAULT_FILENAME.to_string());
        let name = self.reserve_name(&candidate).await;
        let refused = |e: anyhow::Error| TransferError::HostHandoffFailed(format!("{:#}", e));

        let id = self
            .inner
            .registry
            .insert(&NewDownload {
                url: &object_url,
                filename: Some(&name),
                mime_type: Some(&mime_type),
                total_bytes: Some(bytes.len() as i64),
            })
            .await
            .map_err(|e| {
                self.release_name(&name);
                refused(e)
            })?;
        self.emit(DownloadEvent::Created(id));

        let final_path = self.inner.download_dir.join(&name);
        let len = bytes.len() as i64;
        let written = tokio::task::spawn_blocking(move || write_file_atomically(&final_path, &bytes))
            .await
            .map_err(anyhow::Error::from)
            .and_then(|r| r);
        self.release_name(&name);

        match written {
            Ok(()) => match self.mark_blob_complete(id, len).await {
                Ok(()) => {
                    tracing::info!(download_id = id, file = %name, bytes = len, "blob saved");
                    self.emit(DownloadEvent::Changed(id));
                    Ok(id)
                }
                Err(e) => {
                    self.mark_interrupted(id, &format!("{:#}", e)).await;
                    Err(refused(e))
                }
            },
            Err(e) => {
                let msg = format!("{:#}", e);
                self.mark_interrupted(id, &msg).await;
                Err(TransferError::HostHandoffFailed(msg))
            }
        }
    }

    async fn mark_blob_complete(&self, id: DownloadId, len: i64) -> Result<()> {
        let registry = &self.inner.registry;
        registry.set_bytes_received(id, len).await?;
        registry.set_state(id, DownloadState::Complete, None).await
    }

    /// Best effort: a registry that just failed may fail again.
    async fn mark_interrupted(&self, id: DownloadId, msg: &str) {
        if let Err(e) = self
            .inner
            .registry
            .set_state(id, DownloadState::Interrupted, Some(msg))
            .await
        {
            tracing::warn!(download_id = id, error = %e, "failed to record blob failure");
        }
        self.emit(DownloadEvent::Changed(id));
    }

    async fn submit_url(
        &self,
        url: String,
        filename: Option<String>,
    ) -> Result<DownloadId, TransferError> {
        let parsed = url::Url::parse(&url)
            .map_err(|e| TransferError::HostHandoffFailed(format!("invalid URL {:?}: {}", url, e)))?;
        if parsed.scheme() == "blob" {
            return Err(TransferError::HostHandoffFailed(format!(
                "{} is a transient object URL and can no longer be fetched",
                url
            )));
        }
        let candidate = filename
            .map(|f| sanitize_filename(&f))
            .filter(|f| !f.is_empty())
            .unwrap_or_else(|| derive_filename(&url, None));
        let name = self.reserve_name(&candidate).await;

        let id = match self
            .inner
            .registry
            .insert(&NewDownload {
                url: &url,
                filename: Some(&name),
                mime_type: None,
                total_bytes: None,
            })
            .await
        {
            Ok(id) => id,
            Err(e) => {
                self.release_name(&name);
                return Err(TransferError::HostHandoffFailed(format!("{:#}", e)));
            }
        };
        self.emit(DownloadEvent::Created(id));
        self.spawn_fetch(id, url, name);
        Ok(id)
    }

    /// Runs the single-stream GET for `id` in the background.
    fn spawn_fetch(&self, id: DownloadId, url: String, name: String) {
        let host = self.clone();
        let token = self.inner.control.register(id);
        tracing::debug!(download_id = id, url = %url, file = %name, "starting host fetch");
        tokio::spawn(async move {
            let final_path = host.inner.download_dir.join(&name);
            let opts = host.inner.opts;
            let fetch_token = Arc::clone(&token);
            let mut handle = tokio::task::spawn_blocking(move || {
                fetch::fetch_to_file(&url, &final_path, &fetch_token, &opts)
            });

            let mut tick = tokio::time::interval(PROGRESS_INTERVAL);
            tick.tick().await;
            let mut last = 0u64;
            let joined = loop {
                tokio::select! {
                    joined = &mut handle => break joined,
                    _ = tick.tick() => {
                        let now = token.received();
                        if now != last {
                            last = now;
                            if let Err(e) = host.inner.registry.set_bytes_received(id, now as i64).await {
                                tracing::debug!(download_id = id, error = %e, "progress update failed");
                            }
                            host.emit(DownloadEvent::Changed(id));
                        }
                    }
                }
            };

            let outcome = joined.unwrap_or_else(|e| Err(FetchError::Failed(e.to_string())));
            if let Err(e) = host.record_fetch_outcome(id, outcome).await {
                tracing::warn!(download_id = id, error = %e, "failed to record download outcome");
            }
            host.inner.control.unregister(id);
            host.release_name(&name);
            host.emit(DownloadEvent::Changed(id));
        });
    }

    async fn record_fetch_outcome(
        &self,
        id: DownloadId,
        outcome: Result<FetchInfo, FetchError>,
    ) -> Result<()> {
        let registry = &self.inner.registry;
        match outcome {
            Ok(info) => {
                registry
                    .set_response_info(
                        id,
                        info.final_url.as_deref(),
                        info.mime_type.as_deref(),
                        Some(info.received as i64),
                    )
                    .await?;
                registry.set_bytes_received(id, info.received as i64).await?;
                registry.set_paused(id, false).await?;
                registry.set_state(id, DownloadState::Complete, None).await?;
                tracing::info!(download_id = id, bytes = info.received, "host download complete");
            }
            Err(FetchError::Stopped(StopReason::Pause)) => {
                registry.set_bytes_received(id, 0).await?;
                tracing::info!(download_id = id, "host download paused");
            }
            Err(FetchError::Stopped(StopReason::Cancel)) => {
                registry
                    .set_state(id, DownloadState::Interrupted, Some(USER_CANCELED))
                    .await?;
                tracing::info!(download_id = id, "host download cancelled");
            }
            Err(FetchError::Failed(msg)) => {
                registry
                    .set_state(id, DownloadState::Interrupted, Some(&msg))
                    .await?;
                tracing::warn!(download_id = id, error = %msg, "host download failed");
            }
        }
        Ok(())
    }
}

impl HostDownloader for LocalHost {
    async fn submit(&self, request: HandoffRequest) -> Result<DownloadId, TransferError> {
        match request.source {
            HandoffSource::Url(url) => self.submit_url(url, request.filename).await,
            HandoffSource::Blob {
                bytes,
                mime_type,
                object_url,
            } => {
                self.submit_blob(bytes, mime_type, object_url, request.filename)
                    .await
            }
        }
    }

    async fn pause(&self, id: DownloadId) -> Result<()> {
        let item = self.item(id).await?;
        if item.state != DownloadState::InProgress || item.paused {
            tracing::debug!(download_id = id, state = ?item.state, "pause ignored");
            return Ok(());
        }
        self.inner.registry.set_paused(id, true).await?;
        self.inner.control.request_stop(id, StopReason::Pause);
        self.emit(DownloadEvent::Changed(id));
        Ok(())
    }

    async fn resume(&self, id: DownloadId) -> Result<()> {
        let item = self.item(id).await?;
        let cancelled = item.error.as_deref() == Some(USER_CANCELED);
        let resumable = item.paused || (item.state == DownloadState::Interrupted && !cancelled);
        if item.state == DownloadState::Complete || !resumable {
            tracing::debug!(download_id = id, state = ?item.state, "resume ignored");
            return Ok(());
        }
        if self.inner.control.is_running(id) {
            anyhow::bail!("download {} is still stopping", id);
        }
        if item.url.starts_with("blob:") {
            anyhow::bail!("download {} has no source to resume from", id);
        }
        let name = item
            .filename
            .clone()
            .unwrap_or_else(|| derive_filename(item.restart_url(), None));
        self.reserved().insert(name.clone());
        self.inner.registry.set_paused(id, false).await?;
        self.inner
            .registry
            .set_state(id, DownloadState::InProgress, None)
            .await?;
        self.inner.registry.set_bytes_received(id, 0).await?;
        self.spawn_fetch(id, item.url.clone(), name);
        self.emit(DownloadEvent::Changed(id));
        Ok(())
    }

    async fn cancel(&self, id: DownloadId) -> Result<()> {
        let item = self.item(id).await?;
        if item.state != DownloadState::InProgress {
            tracing::debug!(download_id = id, state = ?item.state, "cancel ignored");
            return Ok(());
        }
        if !self.inner.control.request_stop(id, StopReason::Cancel) {
            self.inner
                .registry
                .set_state(id, DownloadState::Interrupted, Some(USER_CANCELED))
                .await?;
        }
        self.inner.registry.set_paused(id, false).await?;
        self.emit(DownloadEvent::Changed(id));
        Ok(())
    }

    async fn remove_file(&self, id: DownloadId) -> Result<()> {
        let item = self.item(id).await?;
        if item.state == DownloadState::InProgress {
            anyhow::bail!("download {} is not finished", id);
        }
        if let Some(path) = self.file_path(&item) {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => tracing::info!(download_id = id, path = %path.display(), "file removed"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(e).with_context(|| format!("failed to remove {}", path.display()))
                }
            }
        }
        self.emit(DownloadEvent::Changed(id));
        Ok(())
    }

    async fn erase(&self, id: DownloadId) -> Result<()> {
        if self.inner.control.request_stop(id, StopReason::Cancel) {
            tracing::debug!(download_id = id, "erasing a running download; stopping it");
        }
        if self.inner.registry.delete(id).await? {
            self.emit(DownloadEvent::Erased(id));
        }
        Ok(())
    }

    async fn search(&self, query: DownloadQuery) -> Result<Vec<DownloadItem>> {
        self.inner.registry.search(&query).await
    }

    fn subscribe(&self) -> broadcast::Receiver<DownloadEvent> {
        self.inner.events.subscribe()
    }
}
