//! Range math and chunk planning.
//!
//! Splits a resource of known size into contiguous, non-overlapping byte
//! ranges and renders them as HTTP `Range` / `Content-Range` values.

mod range;

pub use range::{plan, ChunkPlan, ChunkRange};
