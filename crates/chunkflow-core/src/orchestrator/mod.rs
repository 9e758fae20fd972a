//! Transfer orchestration: probe, plan, execute, merge, hand off.
//!
//! One orchestrator serves every transfer of a process. Collaborators (host,
//! store, listener) are passed in at construction; nothing is global.

mod download;
mod state;
mod upload;

pub use state::{ArtifactRef, TransferMode, TransferOutcome, TransferReport, TransferState};
pub use upload::UploadRequest;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::config::ChunkflowConfig;
use crate::executor::{ChunkProgress, Executor};
use crate::host::HostDownloader;
use crate::listener::Listener;
use crate::store::{KeyValueStore, OutcomeLog, Preferences, UploadHistory};

/// Sequences the chunked path and its fallbacks.
pub struct Orchestrator<H: HostDownloader> {
    config: ChunkflowConfig,
    host: Arc<H>,
    store: Arc<dyn KeyValueStore>,
    listener: Arc<Listener>,
    progress: Option<mpsc::Sender<ChunkProgress>>,
    blob_seq: AtomicU64,
}

impl<H: HostDownloader> Orchestrator<H> {
    pub fn new(
        config: ChunkflowConfig,
        host: Arc<H>,
        store: Arc<dyn KeyValueStore>,
        listener: Arc<Listener>,
    ) -> Self {
        Self {
            config,
            host,
            store,
            listener,
            progress: None,
            blob_seq: AtomicU64::new(0),
        }
    }

    /// Forward per-chunk progress to `tx` (best effort).
    pub fn with_progress(mut self, tx: mpsc::Sender<ChunkProgress>) -> Self {
        self.progress = Some(tx);
        self
    }

    pub fn config(&self) -> &ChunkflowConfig {
        &self.config
    }

    pub fn host(&self) -> &Arc<H> {
        &self.host
    }

    pub fn listener(&self) -> &Arc<Listener> {
        &self.listener
    }

    pub fn preferences(&self) -> Preferences {
        Preferences::new(Arc::clone(&self.store), self.config.chunk_bounds())
    }

    pub fn outcomes(&self) -> OutcomeLog {
        OutcomeLog::new(Arc::clone(&self.store))
    }

    pub fn uploads(&self) -> UploadHistory {
        UploadHistory::new(Arc::clone(&self.store))
    }

    fn executor(&self) -> Executor {
        Executor::new(self.config.retry_policy(), self.config.connect_timeout())
            .with_progress(self.progress.clone())
    }

    fn next_object_url(&self) -> String {
        let seq = self.blob_seq.fetch_add(1, Ordering::Relaxed) + 1;
        format!("blob:chunkflow/{}", seq)
    }

    /// Persists the mode of a host download. Failures are logged, never surfaced.
    fn record(&self, outcome: &TransferOutcome) {
        let Some(id) = outcome.download_id() else {
            return;
        };
        if let Err(e) = self.outcomes().record(id, outcome.mode()) {
            tracing::warn!(download_id = id, error = %e, "failed to record transfer mode");
        }
    }
}
