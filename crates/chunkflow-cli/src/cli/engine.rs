//! Wiring of the core collaborators for one CLI process.

use anyhow::Result;
use chunkflow_core::config::ChunkflowConfig;
use chunkflow_core::dispatch::Dispatcher;
use chunkflow_core::executor::ChunkProgress;
use chunkflow_core::host::LocalHost;
use chunkflow_core::listener::Listener;
use chunkflow_core::orchestrator::Orchestrator;
use chunkflow_core::registry::DownloadRegistry;
use chunkflow_core::store::{JsonFileStore, KeyValueStore};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

pub(crate) struct Engine {
    pub host: Arc<LocalHost>,
    pub dispatcher: Dispatcher<LocalHost>,
}

impl Engine {
    pub fn orchestrator(&self) -> &Arc<Orchestrator<LocalHost>> {
        self.dispatcher.orchestrator()
    }
}

/// Opens the registry and store and builds the orchestrator.
pub(crate) async fn open_engine(
    cfg: ChunkflowConfig,
    progress: Option<mpsc::Sender<ChunkProgress>>,
) -> Result<Engine> {
    let registry = DownloadRegistry::open_default().await?;
    let download_dir: PathBuf = match &cfg.download_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    };
    let host = Arc::new(LocalHost::new(
        registry,
        download_dir,
        cfg.connect_timeout(),
    ));
    let store: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::open_default()?);
    let listener = Arc::new(Listener::new());
    let mut orchestrator = Orchestrator::new(cfg, Arc::clone(&host), store, listener);
    if let Some(tx) = progress {
        orchestrator = orchestrator.with_progress(tx);
    }
    Ok(Engine {
        host,
        dispatcher: Dispatcher::new(Arc::new(orchestrator)),
    })
}
