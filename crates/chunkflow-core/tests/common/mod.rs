#![allow(dead_code)]

pub mod host;
pub mod range_server;

use chunkflow_core::config::ChunkflowConfig;
use chunkflow_core::host::{HostDownloader, LocalHost};
use chunkflow_core::listener::{Listener, Notification};
use chunkflow_core::orchestrator::Orchestrator;
use chunkflow_core::registry::DownloadRegistry;
use chunkflow_core::store::{KeyValueStore, MemoryStore};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;

/// An orchestrator over a [`LocalHost`] writing into a temp dir, with an
/// attached listener.
pub struct Harness {
    pub orchestrator: Arc<Orchestrator<LocalHost>>,
    pub host: Arc<LocalHost>,
    pub store: Arc<dyn KeyValueStore>,
    pub notes: mpsc::Receiver<Notification>,
    pub dir: TempDir,
}

pub async fn local_harness(cfg: ChunkflowConfig) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let registry = DownloadRegistry::open_memory().await.unwrap();
    let host = Arc::new(LocalHost::new(
        registry,
        dir.path().to_path_buf(),
        Duration::from_secs(5),
    ));
    let (orchestrator, store, notes) = orchestrator_over(cfg, Arc::clone(&host));
    Harness {
        orchestrator,
        host,
        store,
        notes,
        dir,
    }
}

pub fn orchestrator_over<H: HostDownloader>(
    cfg: ChunkflowConfig,
    host: Arc<H>,
) -> (
    Arc<Orchestrator<H>>,
    Arc<dyn KeyValueStore>,
    mpsc::Receiver<Notification>,
) {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let listener = Arc::new(Listener::new());
    let (tx, rx) = mpsc::channel(32);
    listener.connect(tx);
    let orchestrator = Arc::new(Orchestrator::new(
        cfg,
        host,
        Arc::clone(&store),
        listener,
    ));
    (orchestrator, store, rx)
}

/// Drains every notification received so far.
pub fn drain(rx: &mut mpsc::Receiver<Notification>) -> Vec<Notification> {
    let mut out = Vec::new();
    while let Ok(n) = rx.try_recv() {
        out.push(n);
    }
    out
}

pub fn patterned_body(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}
