//! Host transfer mechanism: where finished artifacts and direct URLs are handed off.
//!
//! The orchestrator only needs the [`HostDownloader`] contract. [`LocalHost`]
//! implements it on top of the SQLite registry and a download directory.

pub mod local;

pub use crate::registry::{DownloadId, DownloadItem, DownloadQuery, DownloadState};
pub use local::LocalHost;

use std::future::Future;

use anyhow::Result;
use tokio::sync::broadcast;

use crate::error::TransferError;

/// What to transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandoffSource {
    /// Let the host fetch this address itself.
    Url(String),
    /// Already-merged bytes, addressed by a transient object URL.
    Blob {
        bytes: Vec<u8>,
        mime_type: String,
        object_url: String,
    },
}

/// A transfer handed to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandoffRequest {
    pub source: HandoffSource,
    /// Suggested file name; the host picks one when absent.
    pub filename: Option<String>,
}

impl HandoffRequest {
    pub fn url(url: impl Into<String>, filename: Option<String>) -> Self {
        Self {
            source: HandoffSource::Url(url.into()),
            filename,
        }
    }
}

/// Lifecycle change of a host download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadEvent {
    Created(DownloadId),
    Changed(DownloadId),
    Erased(DownloadId),
}

/// Native transfer mechanism contract.
pub trait HostDownloader: Send + Sync + 'static {
    /// Start a transfer. Fails with [`TransferError::HostHandoffFailed`] when refused.
    fn submit(
        &self,
        request: HandoffRequest,
    ) -> impl Future<Output = Result<DownloadId, TransferError>> + Send;

    fn pause(&self, id: DownloadId) -> impl Future<Output = Result<()>> + Send;

    fn resume(&self, id: DownloadId) -> impl Future<Output = Result<()>> + Send;

    fn cancel(&self, id: DownloadId) -> impl Future<Output = Result<()>> + Send;

    /// Delete the downloaded file; the record stays.
    fn remove_file(&self, id: DownloadId) -> impl Future<Output = Result<()>> + Send;

    /// Forget the record; the file stays.
    fn erase(&self, id: DownloadId) -> impl Future<Output = Result<()>> + Send;

    fn search(
        &self,
        query: DownloadQuery,
    ) -> impl Future<Output = Result<Vec<DownloadItem>>> + Send;

    fn subscribe(&self) -> broadcast::Receiver<DownloadEvent>;
}
