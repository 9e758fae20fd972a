pub mod config;
pub mod logging;

pub mod control;
pub mod dispatch;
pub mod error;
pub mod executor;
pub mod host;
pub mod listener;
pub mod orchestrator;
pub mod planner;
pub mod probe;
pub mod reassembler;
pub mod registry;
pub mod retry;
pub mod storage;
pub mod store;
pub mod url_model;
pub mod util;

pub use error::TransferError;
