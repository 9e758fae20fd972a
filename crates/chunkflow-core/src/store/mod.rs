//! Key-value persistence for preferences and bookkeeping.
//!
//! Values are JSON. Writes are whole-value replacements with no transactional
//! guard; callers that read-modify-write a key race benignly.

mod file;
mod memory;
mod views;

pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use views::{
    OutcomeEntry, OutcomeLog, Preferences, UploadHistory, UploadRecord, CHUNK_COUNT_KEY,
    DOWNLOAD_MODES_KEY, MAX_OUTCOME_ENTRIES, UPLOADED_FILES_KEY,
};

use anyhow::Result;
use serde_json::Value;

/// Minimal get/set store.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>>;
    fn set(&self, key: &str, value: Value) -> Result<()>;
}
