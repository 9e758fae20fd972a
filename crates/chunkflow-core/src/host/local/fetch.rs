//! Single-stream HTTP GET into a `.part` file (direct hand-offs).

use std::path::Path;
use std::str;

use crate::control::{StopReason, TransferToken};
use crate::executor::RequestOptions;
use crate::storage::PartFile;

/// Response facts learned while fetching.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct FetchInfo {
    pub final_url: Option<String>,
    pub mime_type: Option<String>,
    pub total_bytes: Option<u64>,
    pub received: u64,
}

#[derive(Debug)]
pub(crate) enum FetchError {
    Stopped(StopReason),
    Failed(String),
}

impl From<curl::Error> for FetchError {
    fn from(e: curl::Error) -> Self {
        FetchError::Failed(e.to_string())
    }
}

impl From<anyhow::Error> for FetchError {
    fn from(e: anyhow::Error) -> Self {
        FetchError::Failed(format!("{:#}", e))
    }
}

/// Downloads `url` with one GET (no Range) and renames the result to `final_path`.
///
/// The `.part` file is removed on any failure.
pub(crate) fn fetch_to_file(
    url: &str,
    final_path: &Path,
    token: &TransferToken,
    opts: &RequestOptions,
) -> Result<FetchInfo, FetchError> {
    let part = PartFile::create(final_path)?;
    match fetch_into(url, &part, token, opts) {
        Ok(info) => {
            part.finalize(final_path)?;
            Ok(info)
        }
        Err(e) => {
            part.discard();
            Err(e)
        }
    }
}

fn fetch_into(
    url: &str,
    part: &PartFile,
    token: &TransferToken,
    opts: &RequestOptions,
) -> Result<FetchInfo, FetchError> {
    let mut headers: Vec<String> = Vec::new();
    let mut write_error: Option<anyhow::Error> = None;

    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.progress(true)?;
    opts.apply(&mut easy)
        .map_err(|e| FetchError::Failed(e.to_string()))?;

    let performed = {
        let mut transfer = easy.transfer();
        transfer.header_function(|data| {
            if let Ok(s) = str::from_utf8(data) {
                // Each redirect hop starts a new header block; keep only the last.
                if s.starts_with("HTTP/") {
                    headers.clear();
                }
                headers.push(s.trim_end().to_string());
            }
            true
        })?;
        transfer.write_function(|data| match part.write_at(token.received(), data) {
            Ok(()) => {
                token.add_received(data.len() as u64);
                Ok(data.len())
            }
            Err(e) => {
                write_error = Some(e);
                Ok(0)
            }
        })?;
        transfer.progress_function(|_, _, _, _| !token.is_stopped())?;
        transfer.perform()
    };

    if let Err(e) = performed {
        if let Some(reason) = token.stop_reason() {
            return Err(FetchError::Stopped(reason));
        }
        if let Some(we) = write_error {
            return Err(FetchError::Failed(format!("write failed: {:#}", we)));
        }
        return Err(e.into());
    }

    let code = easy.response_code()?;
    if !(200..300).contains(&code) {
        return Err(FetchError::Failed(format!("HTTP {}", code)));
    }

    let mut info = FetchInfo {
        final_url: easy.effective_url()?.map(str::to_string),
        received: token.received(),
        ..FetchInfo::default()
    };
    for line in &headers {
        if let Some((name, value)) = line.split_once(':') {
            let (name, value) = (name.trim(), value.trim());
            if name.eq_ignore_ascii_case("content-type") && !value.is_empty() {
                info.mime_type = Some(value.to_string());
            }
            if name.eq_ignore_ascii_case("content-length") {
                info.total_bytes = value.parse().ok();
            }
        }
    }
    if let Some(total) = info.total_bytes {
        if total != info.received {
            return Err(FetchError::Failed(format!(
                "partial transfer: got {} of {} bytes",
                info.received, total
            )));
        }
    }

    part.seal(info.received)?;
    Ok(info)
}
