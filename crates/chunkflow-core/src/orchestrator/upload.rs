//! Upload path of the orchestrator.

use std::sync::Arc;

use super::state::{StateTrail, TransferOutcome, TransferReport, TransferState};
use super::Orchestrator;
use crate::error::TransferError;
use crate::executor::upload_multipart;
use crate::host::HostDownloader;
use crate::listener::Notification;
use crate::planner;
use crate::probe::{self, DEFAULT_MIME_TYPE};

/// A file to upload.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub data: Vec<u8>,
    pub file_name: String,
    pub mime_type: Option<String>,
    pub upload_url: String,
    pub chunk_count: usize,
}

impl<H: HostDownloader> Orchestrator<H> {
    /// Uploads `req.data`: in Content-Range chunks when the endpoint accepts
    /// ranges, else as one multipart POST. There is no host hand-off.
    pub async fn upload(&self, req: UploadRequest) -> Result<TransferReport, TransferError> {
        let url = req.upload_url.clone();
        let mut trail = StateTrail::new();
        match self.run_upload(req, &mut trail).await {
            Ok(outcome) => {
                tracing::info!(url = %url, mode = ?outcome.mode(), "upload complete");
                Ok(trail.finish(outcome))
            }
            Err(e) => {
                trail.enter(&url, TransferState::Failed);
                tracing::warn!(url = %url, error = %e, "upload failed");
                self.listener.notify(Notification::Error {
                    message: format!("Upload failed: {}", e),
                });
                Err(e)
            }
        }
    }

    async fn run_upload(
        &self,
        req: UploadRequest,
        trail: &mut StateTrail,
    ) -> Result<TransferOutcome, TransferError> {
        let url = req.upload_url.as_str();
        trail.enter(url, TransferState::Probing);
        let ranged =
            probe::upload_endpoint_supports_ranges(url, self.config.connect_timeout()).await;

        if ranged && !req.data.is_empty() {
            let count = self.config.chunk_bounds().normalize_count(req.chunk_count);
            trail.enter(url, TransferState::Planning);
            let plan = planner::plan(req.data.len() as u64, count);
            tracing::info!(url, chunks = plan.len(), size = req.data.len(), "chunked upload");
            trail.enter(url, TransferState::Executing);
            self.executor()
                .upload(url, &plan, Arc::new(req.data))
                .await?;
            return Ok(TransferOutcome::Chunked {
                download_id: None,
                artifact: None,
            });
        }

        tracing::info!(url, size = req.data.len(), "normal upload");
        trail.enter(url, TransferState::DirectHandoff);
        let opts = self.executor().request_options();
        let mime_type = req
            .mime_type
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string());
        let upload_url = req.upload_url.clone();
        tokio::task::spawn_blocking(move || {
            upload_multipart(&upload_url, &req.file_name, &mime_type, &req.data, &opts)
        })
        .await
        .map_err(|e| TransferError::UploadFailed(format!("upload task failed: {}", e)))??;
        Ok(TransferOutcome::Normal(None))
    }
}
