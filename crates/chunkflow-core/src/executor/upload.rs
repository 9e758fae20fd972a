//! Upload requests: one Content-Range POST per chunk, or a single multipart POST.

use std::sync::atomic::{AtomicBool, Ordering};

use super::progress::ProgressReporter;
use super::RequestOptions;
use crate::error::TransferError;
use crate::planner::ChunkRange;
use crate::retry::ChunkError;

/// POSTs `payload[range]` to `url` annotated with `Content-Range: bytes s-e/total`.
pub(super) fn post_range(
    url: &str,
    range: &ChunkRange,
    payload: &[u8],
    opts: &RequestOptions,
    abort: &AtomicBool,
    progress: &mut ProgressReporter,
) -> Result<(), ChunkError> {
    let total = payload.len() as u64;
    let mut easy = curl::easy::Easy::new();
    easy.url(url).map_err(ChunkError::Transport)?;
    easy.post(true).map_err(ChunkError::Transport)?;
    easy.post_fields_copy(&payload[range.as_slice_range()])
        .map_err(ChunkError::Transport)?;
    opts.apply(&mut easy)?;
    easy.progress(true).map_err(ChunkError::Transport)?;

    let mut list = curl::easy::List::new();
    for h in [
        format!("Content-Range: {}", range.content_range_value(total)),
        "Content-Type: application/octet-stream".to_string(),
        // No 100-continue round trip.
        "Expect:".to_string(),
    ] {
        list.append(&h).map_err(ChunkError::Transport)?;
    }
    easy.http_headers(list).map_err(ChunkError::Transport)?;

    {
        let mut transfer = easy.transfer();
        transfer
            .write_function(|data| Ok(data.len()))
            .map_err(ChunkError::Transport)?;
        transfer
            .progress_function(|_, _, _, ulnow| {
                progress.report(ulnow as u64);
                !abort.load(Ordering::Relaxed)
            })
            .map_err(ChunkError::Transport)?;
        if let Err(e) = transfer.perform() {
            if e.is_aborted_by_callback() {
                return Err(ChunkError::Aborted);
            }
            return Err(ChunkError::Transport(e));
        }
    }

    let code = easy.response_code().map_err(ChunkError::Transport)?;
    if !(200..300).contains(&code) {
        return Err(ChunkError::Http(code));
    }
    Ok(())
}

/// Sends `data` as one multipart/form-data POST with a single part named `file`.
///
/// Blocking; call from `spawn_blocking`.
pub fn upload_multipart(
    url: &str,
    file_name: &str,
    mime_type: &str,
    data: &[u8],
    opts: &RequestOptions,
) -> Result<(), TransferError> {
    let fail = |e: curl::Error| TransferError::UploadFailed(format!("POST {}: {}", url, e));

    let mut form = curl::easy::Form::new();
    form.part("file")
        .buffer(file_name, data.to_vec())
        .content_type(mime_type)
        .add()
        .map_err(|e| TransferError::UploadFailed(format!("multipart form: {}", e)))?;

    let mut easy = curl::easy::Easy::new();
    easy.url(url).map_err(fail)?;
    easy.httppost(form).map_err(fail)?;
    let mut list = curl::easy::List::new();
    list.append("Expect:").map_err(fail)?;
    easy.http_headers(list).map_err(fail)?;
    opts.apply(&mut easy)
        .map_err(|e| TransferError::UploadFailed(e.to_string()))?;
    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| Ok(data.len())).map_err(fail)?;
        transfer.perform().map_err(fail)?;
    }

    let code = easy.response_code().map_err(fail)?;
    if !(200..300).contains(&code) {
        return Err(TransferError::UploadFailed(format!(
            "POST {} returned HTTP {}",
            url, code
        )));
    }
    Ok(())
}
