//! Retry policy for chunk requests.
//!
//! Classifies a failed chunk request (transport failure, HTTP status,
//! truncated body) and decides whether to try again. Only transport-level
//! failures are retried; an HTTP error response stops the chunk at once.

mod classify;
mod error;
mod policy;
mod run;

pub use classify::{classify, classify_curl_error};
pub use error::ChunkError;
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::run_with_retry;
