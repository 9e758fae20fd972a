//! Per-request chunk error type for retry classification.

use thiserror::Error;

/// Error returned by a single chunk request.
/// Used so we can classify and decide retries before converting to `TransferError`.
#[derive(Debug, Error)]
pub enum ChunkError {
    /// Curl reported an error (timeout, connection reset, DNS, ...).
    #[error("{0}")]
    Transport(#[source] curl::Error),
    /// HTTP response had a non-2xx status.
    #[error("HTTP {0}")]
    Http(u32),
    /// 2xx response but the body ended before the range did (server closed early).
    #[error("truncated body: expected {expected} bytes, got {received}")]
    Truncated { expected: u64, received: u64 },
    /// 2xx response with more bytes than requested (server ignored the Range header).
    #[error("overlong body: expected {expected} bytes, got at least {received}")]
    Overlong { expected: u64, received: u64 },
    /// Another chunk failed and the shared abort flag stopped this one.
    #[error("aborted after another chunk failed")]
    Aborted,
}
