//! Capability probing: HEAD request, range support and resource metadata.
//!
//! Uses the curl crate (libcurl) to fetch response headers of the final
//! (post-redirect) response. The effective URL reported by libcurl is what
//! every chunk request must target afterwards.

mod parse;

pub use parse::DEFAULT_MIME_TYPE;

use std::str;
use std::time::Duration;

use crate::error::TransferError;
use crate::url_model::derive_filename;

/// Raw facts gathered by one HEAD request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    /// HTTP status of the final response.
    pub status: u32,
    /// URL after following redirects.
    pub effective_url: String,
    /// `Content-Length` exactly as sent, if present.
    pub content_length: Option<String>,
    /// True only if the server sent `Accept-Ranges: bytes`.
    pub accept_ranges: bool,
    /// `Content-Type`, or `application/octet-stream`.
    pub content_type: String,
    /// `Content-Disposition` value if present (filename hint).
    pub content_disposition: Option<String>,
}

/// Metadata of a resource that can be fetched in ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceMetadata {
    pub total_size: u64,
    pub mime_type: String,
    pub supports_range_requests: bool,
    pub effective_url: String,
    pub suggested_name: String,
}

/// Outcome of probing a download URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probed {
    /// Range support advertised and a usable size declared.
    Ranged(ResourceMetadata),
    /// No range support; the resource must be handed off whole.
    Unsupported { suggested_name: String },
}

/// Performs a HEAD request against `url`, following redirects.
///
/// Runs in the current thread; call from `spawn_blocking` if used from async code.
pub fn head(url: &str, connect_timeout: Duration) -> Result<ProbeReport, TransferError> {
    let fail = |e: curl::Error| TransferError::ProbeFailed(format!("HEAD {}: {}", url, e));
    let mut headers: Vec<String> = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(url).map_err(fail)?;
    easy.nobody(true).map_err(fail)?;
    easy.follow_location(true).map_err(fail)?;
    easy.max_redirections(10).map_err(fail)?;
    easy.connect_timeout(connect_timeout).map_err(fail)?;
    easy.timeout(Duration::from_secs(60)).map_err(fail)?;

    {
        let mut transfer = easy.transfer();
        transfer
            .header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    // Each redirect hop starts a new header block; keep only the last.
                    if s.starts_with("HTTP/") {
                        headers.clear();
                    }
                    headers.push(s.trim_end().to_string());
                }
                true
            })
            .map_err(fail)?;
        transfer.perform().map_err(fail)?;
    }

    let status = easy.response_code().map_err(fail)?;
    let effective_url = easy
        .effective_url()
        .map_err(fail)?
        .map(str::to_string)
        .unwrap_or_else(|| url.to_string());

    if !(200..300).contains(&status) {
        return Err(TransferError::ProbeFailed(format!(
            "HEAD {} returned HTTP {}",
            url, status
        )));
    }

    Ok(parse::parse_headers(&headers, status, effective_url))
}

/// Turns a probe report into range metadata or an "unsupported" verdict.
///
/// The suggested name is derived from `Content-Disposition`, else from the
/// path of `original_url` (the address the user asked for).
pub fn interpret(report: &ProbeReport, original_url: &str) -> Result<Probed, TransferError> {
    let suggested_name = derive_filename(original_url, report.content_disposition.as_deref());
    if !report.accept_ranges {
        return Ok(Probed::Unsupported { suggested_name });
    }
    let total_size = parse::parse_total_size(report.content_length.as_deref()).ok_or_else(|| {
        TransferError::InvalidMetadata(format!(
            "range support advertised but Content-Length is {:?}",
            report.content_length
        ))
    })?;
    Ok(Probed::Ranged(ResourceMetadata {
        total_size,
        mime_type: report.content_type.clone(),
        supports_range_requests: true,
        effective_url: report.effective_url.clone(),
        suggested_name,
    }))
}

/// Probes a download URL from async code.
pub async fn probe(url: &str, connect_timeout: Duration) -> Result<Probed, TransferError> {
    let owned = url.to_string();
    let report = tokio::task::spawn_blocking(move || head(&owned, connect_timeout))
        .await
        .map_err(|e| TransferError::ProbeFailed(format!("probe task failed: {}", e)))??;
    tracing::debug!(
        url,
        effective_url = %report.effective_url,
        accept_ranges = report.accept_ranges,
        content_length = ?report.content_length,
        "probe complete"
    );
    interpret(&report, url)
}

/// Checks whether an upload endpoint accepts ranged uploads.
///
/// Any probe failure counts as "no": the caller falls back to a normal upload.
pub async fn upload_endpoint_supports_ranges(url: &str, connect_timeout: Duration) -> bool {
    let owned = url.to_string();
    match tokio::task::spawn_blocking(move || head(&owned, connect_timeout)).await {
        Ok(Ok(report)) => report.accept_ranges,
        Ok(Err(e)) => {
            tracing::debug!(url, error = %e, "upload endpoint probe failed");
            false
        }
        Err(e) => {
            tracing::debug!(url, error = %e, "upload endpoint probe task failed");
            false
        }
    }
}
