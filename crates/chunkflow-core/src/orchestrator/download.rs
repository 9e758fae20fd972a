//! Download path of the orchestrator.

use super::state::{ArtifactRef, StateTrail, TransferOutcome, TransferReport, TransferState};
use super::Orchestrator;
use crate::error::TransferError;
use crate::host::{HandoffRequest, HandoffSource, HostDownloader};
use crate::listener::Notification;
use crate::planner;
use crate::probe::{self, Probed};
use crate::reassembler;
use crate::url_model::{filename_from_url_path, sanitize_filename, DEFAULT_FILENAME};
use crate::util::format_file_size;

impl<H: HostDownloader> Orchestrator<H> {
    /// Downloads `url`, chunked when possible, and hands the result to the host.
    ///
    /// `chunk_count` is normalized into the configured bounds first. Every
    /// recoverable failure of the chunked path ends in a direct hand-off of
    /// `url`; only a refused hand-off is returned as an error.
    pub async fn download(
        &self,
        url: &str,
        chunk_count: usize,
    ) -> Result<TransferReport, TransferError> {
        let count = self.config.chunk_bounds().normalize_count(chunk_count);
        tracing::info!(url, chunks = count, "download requested");
        let mut trail = StateTrail::new();

        match self.chunked_download(url, count, &mut trail).await {
            Ok(outcome) => {
                tracing::info!(url, mode = ?outcome.mode(), download_id = ?outcome.download_id(), "download handed off");
                self.record(&outcome);
                Ok(trail.finish(outcome))
            }
            Err(e) if e.is_recoverable() => self.fall_back(url, e, trail).await,
            Err(e) => {
                trail.enter(url, TransferState::Failed);
                tracing::error!(url, error = %e, "download could not be handed off");
                self.listener.notify(Notification::Error {
                    message: format!("Download failed: {}", e),
                });
                Err(e)
            }
        }
    }

    async fn chunked_download(
        &self,
        url: &str,
        count: usize,
        trail: &mut StateTrail,
    ) -> Result<TransferOutcome, TransferError> {
        trail.enter(url, TransferState::Probing);
        let meta = match probe::probe(url, self.config.connect_timeout()).await? {
            Probed::Unsupported { suggested_name } => {
                tracing::info!(url, "no range support, using direct download");
                return self.direct_handoff(url, suggested_name, trail).await;
            }
            Probed::Ranged(meta) if meta.total_size > self.config.max_in_memory_bytes => {
                tracing::info!(
                    url,
                    size = %format_file_size(meta.total_size),
                    ceiling = %format_file_size(self.config.max_in_memory_bytes),
                    "too large for in-memory chunking, using direct download"
                );
                return self.direct_handoff(url, meta.suggested_name, trail).await;
            }
            Probed::Ranged(meta) => meta,
        };

        trail.enter(url, TransferState::Planning);
        let plan = planner::plan(meta.total_size, count);
        tracing::debug!(
            url,
            effective_url = %meta.effective_url,
            size = meta.total_size,
            chunks = plan.len(),
            chunk_size = plan.chunk_size(),
            "planned chunks"
        );

        trail.enter(url, TransferState::Executing);
        let results = self.executor().download(&meta.effective_url, &plan).await?;

        trail.enter(url, TransferState::Merging);
        let merged = reassembler::merge_planned(&plan, results)?;

        trail.enter(url, TransferState::Handoff);
        let artifact = ArtifactRef {
            object_url: self.next_object_url(),
            len: merged.len() as u64,
            mime_type: meta.mime_type.clone(),
        };
        let id = self
            .host
            .submit(HandoffRequest {
                source: HandoffSource::Blob {
                    bytes: merged,
                    mime_type: meta.mime_type,
                    object_url: artifact.object_url.clone(),
                },
                filename: Some(meta.suggested_name.clone()),
            })
            .await?;
        self.listener.notify(Notification::DownloadReady {
            url: artifact.object_url.clone(),
            filename: meta.suggested_name,
            is_chunked: true,
        });
        Ok(TransferOutcome::Chunked {
            download_id: Some(id),
            artifact: Some(artifact),
        })
    }

    async fn direct_handoff(
        &self,
        url: &str,
        filename: String,
        trail: &mut StateTrail,
    ) -> Result<TransferOutcome, TransferError> {
        trail.enter(url, TransferState::DirectHandoff);
        let id = self
            .host
            .submit(HandoffRequest::url(url, Some(filename)))
            .await?;
        Ok(TransferOutcome::Normal(Some(id)))
    }

    /// Reports `cause` and hands the original URL to the host.
    async fn fall_back(
        &self,
        url: &str,
        cause: TransferError,
        mut trail: StateTrail,
    ) -> Result<TransferReport, TransferError> {
        trail.enter(url, TransferState::Failed);
        match &cause {
            TransferError::MergeInvariantViolation(_) => {
                tracing::error!(url, error = %cause, "chunk merge invariant violated")
            }
            _ => tracing::warn!(url, error = %cause, "chunked download failed, falling back"),
        }
        self.listener.notify(Notification::Error {
            message: format!("Download failed: {}", cause),
        });

        trail.enter(url, TransferState::DirectHandoff);
        let id = self
            .host
            .submit(HandoffRequest::url(url, fallback_filename(url)))
            .await
            .inspect_err(|e| tracing::error!(url, error = %e, "fallback download refused"))?;
        let outcome = TransferOutcome::Fallback {
            download_id: id,
            reason: cause.to_string(),
        };
        tracing::info!(url, download_id = id, "fallback download handed off");
        self.record(&outcome);
        Ok(trail.finish(outcome))
    }
}

/// Name for a fallback hand-off: last path segment, or the default name.
/// `None` when `url` does not parse, so the host decides.
fn fallback_filename(url: &str) -> Option<String> {
    url::Url::parse(url).ok()?;
    Some(
        filename_from_url_path(url)
            .map(|segment| sanitize_filename(&segment))
            .unwrap_or_else(|| DEFAULT_FILENAME.to_string()),
    )
}
