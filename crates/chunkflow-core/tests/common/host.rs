//! Host double that refuses every hand-off.

use anyhow::Result;
use chunkflow_core::host::{
    DownloadEvent, DownloadId, DownloadItem, DownloadQuery, HandoffRequest, HostDownloader,
};
use chunkflow_core::TransferError;
use std::sync::Mutex;
use tokio::sync::broadcast;

pub struct RejectingHost {
    pub submissions: Mutex<Vec<HandoffRequest>>,
    events: broadcast::Sender<DownloadEvent>,
}

impl RejectingHost {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(4);
        Self {
            submissions: Mutex::new(Vec::new()),
            events,
        }
    }
}

impl HostDownloader for RejectingHost {
    async fn submit(&self, request: HandoffRequest) -> Result<DownloadId, TransferError> {
        self.submissions.lock().unwrap().push(request);
        Err(TransferError::HostHandoffFailed("host refused".into()))
    }

    async fn pause(&self, _id: DownloadId) -> Result<()> {
        Ok(())
    }

    async fn resume(&self, _id: DownloadId) -> Result<()> {
        Ok(())
    }

    async fn cancel(&self, _id: DownloadId) -> Result<()> {
        Ok(())
    }

    async fn remove_file(&self, _id: DownloadId) -> Result<()> {
        Ok(())
    }

    async fn erase(&self, _id: DownloadId) -> Result<()> {
        Ok(())
    }

    async fn search(&self, _query: DownloadQuery) -> Result<Vec<DownloadItem>> {
        Ok(Vec::new())
    }

    fn subscribe(&self) -> broadcast::Receiver<DownloadEvent> {
        self.events.subscribe()
    }
}
