//! Failure taxonomy of one transfer attempt.

use thiserror::Error;

use crate::retry::ChunkError;

/// Why a chunked transfer (or its hand-off) did not go through.
///
/// Everything except `HostHandoffFailed` is recoverable: the orchestrator
/// turns it into a direct hand-off of the original URL.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Transport error or non-2xx answer to the capability probe.
    #[error("probe failed: {0}")]
    ProbeFailed(String),
    /// The probe advertised ranges but no usable size.
    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),
    /// One chunk exhausted its retry budget or got an HTTP error; the set was abandoned.
    #[error("chunk {index} failed: {cause}")]
    ChunkTransferFailed {
        index: usize,
        #[source]
        cause: ChunkError,
    },
    /// Chunk results were missing, duplicated or out of order. Internal bug signal.
    #[error("merge invariant violated: {0}")]
    MergeInvariantViolation(String),
    /// The host transfer mechanism refused the request.
    #[error("host refused transfer: {0}")]
    HostHandoffFailed(String),
    /// A plain (unchunked) upload failed.
    #[error("upload failed: {0}")]
    UploadFailed(String),
}

impl TransferError {
    /// True for failures the orchestrator absorbs by falling back to a direct hand-off.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            TransferError::HostHandoffFailed(_) | TransferError::UploadFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_chunk_index_and_cause() {
        let e = TransferError::ChunkTransferFailed {
            index: 2,
            cause: ChunkError::Http(503),
        };
        assert_eq!(e.to_string(), "chunk 2 failed: HTTP 503");
        assert!(e.is_recoverable());
    }

    #[test]
    fn host_failure_is_terminal() {
        assert!(!TransferError::HostHandoffFailed("quota".into()).is_recoverable());
        assert!(TransferError::MergeInvariantViolation("gap".into()).is_recoverable());
    }
}
