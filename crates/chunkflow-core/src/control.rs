//! Stop tokens for running host transfers, plus the control socket location.
//!
//! Each running single-stream fetch is registered with a token. Pause and
//! cancel raise the token with a reason; the fetch sees it from its progress
//! callback, stops, and the host records the outcome that matches the reason.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, RwLock};

use crate::registry::DownloadId;

/// Why a running transfer was asked to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Pause,
    Cancel,
}

const RUNNING: u8 = 0;
const PAUSE: u8 = 1;
const CANCEL: u8 = 2;

/// Shared between a running fetch and whoever may stop it.
#[derive(Debug, Default)]
pub struct TransferToken {
    stop: AtomicU8,
    received: AtomicU64,
}

impl TransferToken {
    pub fn stop_reason(&self) -> Option<StopReason> {
        match self.stop.load(Ordering::Relaxed) {
            PAUSE => Some(StopReason::Pause),
            CANCEL => Some(StopReason::Cancel),
            _ => None,
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed) != RUNNING
    }

    /// Raise the token. Cancel overrides an earlier pause, never the reverse.
    pub fn request_stop(&self, reason: StopReason) {
        let v = match reason {
            StopReason::Pause => PAUSE,
            StopReason::Cancel => CANCEL,
        };
        self.stop.fetch_max(v, Ordering::Relaxed);
    }

    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    pub fn add_received(&self, n: u64) -> u64 {
        self.received.fetch_add(n, Ordering::Relaxed) + n
    }
}

/// Registry of download id -> token for transfers currently running.
#[derive(Default)]
pub struct TransferControl {
    active: RwLock<HashMap<DownloadId, Arc<TransferToken>>>,
}

impl TransferControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a running transfer; returns the token to pass to the fetch.
    pub fn register(&self, id: DownloadId) -> Arc<TransferToken> {
        let token = Arc::new(TransferToken::default());
        self.write().insert(id, Arc::clone(&token));
        token
    }

    /// Unregister a transfer (call when it ends, whatever the outcome).
    pub fn unregister(&self, id: DownloadId) {
        self.write().remove(&id);
    }

    pub fn is_running(&self, id: DownloadId) -> bool {
        self.read().contains_key(&id)
    }

    pub fn running_count(&self) -> usize {
        self.read().len()
    }

    /// Ask the transfer `id` to stop. Returns false when it is not running.
    pub fn request_stop(&self, id: DownloadId, reason: StopReason) -> bool {
        match self.read().get(&id) {
            Some(token) => {
                token.request_stop(reason);
                true
            }
            None => false,
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<DownloadId, Arc<TransferToken>>> {
        self.active.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<DownloadId, Arc<TransferToken>>> {
        self.active.write().unwrap_or_else(|e| e.into_inner())
    }
}

/// Default path for the control socket (same XDG state dir as the registry).
pub fn default_control_socket_path() -> std::io::Result<PathBuf> {
    xdg::BaseDirectories::with_prefix("chunkflow")?.place_state_file("control.sock")
}
