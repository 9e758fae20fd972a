//! Persistent download registry (SQLite via sqlx).
//!
//! Backs the local host: one row per handed-off download with its state,
//! progress and the file it produced.

pub mod db;
mod items;
pub mod types;

pub use db::*;
pub use types::*;
