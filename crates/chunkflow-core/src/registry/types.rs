//! Types stored in the download registry.

use serde::{Deserialize, Serialize};

/// Download identifier assigned by the registry.
pub type DownloadId = i64;

/// Lifecycle state stored as a string in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadState {
    InProgress,
    Complete,
    Interrupted,
}

impl DownloadState {
    pub fn as_str(self) -> &'static str {
        match self {
            DownloadState::InProgress => "in_progress",
            DownloadState::Complete => "complete",
            DownloadState::Interrupted => "interrupted",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "in_progress" => DownloadState::InProgress,
            "complete" => DownloadState::Complete,
            _ => DownloadState::Interrupted,
        }
    }
}

/// Full record of one download, as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadItem {
    pub id: DownloadId,
    /// Address handed to the host (a `blob:` reference for merged artifacts).
    pub url: String,
    /// Address after redirects, once known.
    pub final_url: Option<String>,
    /// File name inside the download directory, once chosen.
    pub filename: Option<String>,
    pub mime_type: Option<String>,
    pub state: DownloadState,
    pub paused: bool,
    pub bytes_received: i64,
    pub total_bytes: Option<i64>,
    /// Unix milliseconds.
    pub start_time: i64,
    pub error: Option<String>,
}

impl DownloadItem {
    /// Address to use when starting this download again.
    pub fn restart_url(&self) -> &str {
        self.final_url.as_deref().unwrap_or(&self.url)
    }
}

/// Fields known when a download is created.
#[derive(Debug, Clone)]
pub struct NewDownload<'a> {
    pub url: &'a str,
    pub filename: Option<&'a str>,
    pub mime_type: Option<&'a str>,
    pub total_bytes: Option<i64>,
}

/// Search filter; `None` fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadQuery {
    pub id: Option<DownloadId>,
    pub state: Option<DownloadState>,
    /// Substring of `url` or `final_url`.
    pub url_contains: Option<String>,
    pub limit: Option<u32>,
}

impl DownloadQuery {
    pub fn by_id(id: DownloadId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }
}
