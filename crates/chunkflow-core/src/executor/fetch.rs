//! Single-chunk HTTP Range GET into an in-memory buffer.

use std::sync::atomic::{AtomicBool, Ordering};

use super::progress::ProgressReporter;
use super::RequestOptions;
use crate::planner::ChunkRange;
use crate::retry::ChunkError;

/// Fetches one range of `url`. The body must be exactly `range.len()` bytes.
///
/// Stops early (as [`ChunkError::Aborted`]) when `abort` is raised by another chunk.
pub(super) fn fetch_range(
    url: &str,
    range: &ChunkRange,
    opts: &RequestOptions,
    abort: &AtomicBool,
    progress: &mut ProgressReporter,
) -> Result<Vec<u8>, ChunkError> {
    let expected = range.len();
    let mut body: Vec<u8> = Vec::with_capacity(expected as usize);
    let mut overlong: Option<u64> = None;

    let mut easy = curl::easy::Easy::new();
    easy.url(url).map_err(ChunkError::Transport)?;
    easy.follow_location(true).map_err(ChunkError::Transport)?;
    opts.apply(&mut easy)?;
    easy.progress(true).map_err(ChunkError::Transport)?;

    let mut list = curl::easy::List::new();
    list.append(&format!("Range: {}", range.range_header_value()))
        .map_err(ChunkError::Transport)?;
    easy.http_headers(list).map_err(ChunkError::Transport)?;

    let performed = {
        let mut transfer = easy.transfer();
        transfer
            .write_function(|data| {
                let seen = body.len() as u64 + data.len() as u64;
                if seen > expected {
                    overlong = Some(seen);
                    return Ok(0);
                }
                body.extend_from_slice(data);
                Ok(data.len())
            })
            .map_err(ChunkError::Transport)?;
        transfer
            .progress_function(|_, dlnow, _, _| {
                progress.report(dlnow as u64);
                !abort.load(Ordering::Relaxed)
            })
            .map_err(ChunkError::Transport)?;
        transfer.perform()
    };

    let code = easy.response_code().map_err(ChunkError::Transport)?;
    if let Err(e) = performed {
        if e.is_aborted_by_callback() {
            return Err(ChunkError::Aborted);
        }
        // A write abort with a non-2xx status is an error page, not a range violation.
        match overlong {
            Some(received) if (200..300).contains(&code) => {
                return Err(ChunkError::Overlong { expected, received });
            }
            Some(_) => {}
            None => return Err(ChunkError::Transport(e)),
        }
    }
    if !(200..300).contains(&code) {
        return Err(ChunkError::Http(code));
    }

    let received = body.len() as u64;
    if received < expected {
        return Err(ChunkError::Truncated { expected, received });
    }
    Ok(body)
}
