//! CLI command handlers, one file per command family.

mod control;
mod get;
mod list;
mod send;
mod serve;
mod upload;

pub use control::run_control;
pub use get::run_get;
pub use list::{run_list, run_uploads};
pub use send::{run_completions, run_send};
pub use serve::run_serve;
pub use upload::{run_set_chunks, run_upload};

use anyhow::Result;
use chunkflow_core::dispatch::Response;

/// Turns a failed acknowledgement into an error.
pub(super) fn expect_success(response: &Response) -> Result<()> {
    if let Response::Ack {
        success: false,
        error,
        ..
    } = response
    {
        anyhow::bail!("{}", error.as_deref().unwrap_or("request failed"));
    }
    Ok(())
}
