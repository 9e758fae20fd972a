//! Typed views over the raw key-value store.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::KeyValueStore;
use crate::host::DownloadId;
use crate::orchestrator::TransferMode;
use crate::util::{normalize_chunk_count, ChunkBounds};

pub const CHUNK_COUNT_KEY: &str = "chunkCount";
pub const DOWNLOAD_MODES_KEY: &str = "downloadModes";
pub const UPLOADED_FILES_KEY: &str = "uploadedFiles";

/// Outcome log capacity; the smallest id is evicted first.
pub const MAX_OUTCOME_ENTRIES: usize = 100;

/// User preferences (currently just the chunk count).
#[derive(Clone)]
pub struct Preferences {
    store: Arc<dyn KeyValueStore>,
    bounds: ChunkBounds,
}

impl Preferences {
    pub fn new(store: Arc<dyn KeyValueStore>, bounds: ChunkBounds) -> Self {
        Self { store, bounds }
    }

    /// Stored chunk count, normalized. Missing or unusable values give the default.
    pub fn chunk_count(&self) -> Result<usize> {
        let raw = self.store.get(CHUNK_COUNT_KEY)?;
        Ok(normalize_chunk_count(raw.as_ref(), &self.bounds))
    }

    /// Normalizes `raw` and stores the result; returns what was stored.
    pub fn set_chunk_count(&self, raw: &Value) -> Result<usize> {
        let n = normalize_chunk_count(Some(raw), &self.bounds);
        self.store.set(CHUNK_COUNT_KEY, Value::from(n))?;
        Ok(n)
    }
}

/// One recorded outcome classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeEntry {
    pub id: DownloadId,
    pub mode: TransferMode,
}

/// Bounded map of download id to transfer mode.
///
/// Stored as a JSON object keyed by the decimal id (`{"7": "fallback"}`).
/// Ids are assigned in increasing order, so evicting the smallest id drops
/// the oldest download.
#[derive(Clone)]
pub struct OutcomeLog {
    store: Arc<dyn KeyValueStore>,
}

impl OutcomeLog {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn load(&self) -> Result<BTreeMap<DownloadId, TransferMode>> {
        match self.store.get(DOWNLOAD_MODES_KEY)? {
            Some(v) => serde_json::from_value(v).context("malformed downloadModes"),
            None => Ok(BTreeMap::new()),
        }
    }

    /// All entries, by ascending id.
    pub fn entries(&self) -> Result<Vec<OutcomeEntry>> {
        Ok(self
            .load()?
            .into_iter()
            .map(|(id, mode)| OutcomeEntry { id, mode })
            .collect())
    }

    pub fn mode_of(&self, id: DownloadId) -> Result<Option<TransferMode>> {
        Ok(self.load()?.get(&id).copied())
    }

    /// Records `mode` for `id`, replacing any earlier mode.
    pub fn record(&self, id: DownloadId, mode: TransferMode) -> Result<()> {
        let mut modes = self.load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "discarding unreadable outcome log");
            BTreeMap::new()
        });
        modes.insert(id, mode);
        while modes.len() > MAX_OUTCOME_ENTRIES {
            modes.pop_first();
        }
        self.store
            .set(DOWNLOAD_MODES_KEY, serde_json::to_value(&modes)?)
    }
}

/// One uploaded file, as shown in the upload history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRecord {
    pub name: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub mime_type: String,
    /// Unix milliseconds.
    pub timestamp: i64,
}

/// Append-only history of completed uploads.
#[derive(Clone)]
pub struct UploadHistory {
    store: Arc<dyn KeyValueStore>,
}

impl UploadHistory {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn list(&self) -> Result<Vec<UploadRecord>> {
        match self.store.get(UPLOADED_FILES_KEY)? {
            Some(v) => serde_json::from_value(v).context("malformed uploadedFiles"),
            None => Ok(Vec::new()),
        }
    }

    pub fn append(&self, record: UploadRecord) -> Result<()> {
        let mut all = self.list()?;
        all.push(record);
        self.store.set(UPLOADED_FILES_KEY, serde_json::to_value(&all)?)
    }
}
