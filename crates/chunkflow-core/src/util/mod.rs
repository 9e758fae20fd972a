//! Small pure helpers shared by the engine and its surfaces: human-readable
//! sizes, URL checks, and chunk-count normalization.

mod chunk_count;
mod size;

pub use chunk_count::{normalize_chunk_count, ChunkBounds};
pub use size::format_file_size;

/// True if `input` parses as an absolute URL (scheme required).
pub fn validate_url(input: &str) -> bool {
    url::Url::parse(input).is_ok()
}

/// Current time as Unix milliseconds.
pub fn unix_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
