//! Outbound notifications to the one attached UI client.
//!
//! At most one listener is attached at a time. Delivery is best effort:
//! nothing is queued while detached, and a full channel drops the message.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Message pushed to the attached client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Notification {
    #[serde(rename_all = "camelCase")]
    DownloadReady {
        url: String,
        filename: String,
        is_chunked: bool,
    },
    /// Some download changed; the client should re-query.
    DownloadUpdate,
    Error {
        message: String,
    },
}

/// Identifies one `connect` so a stale client cannot detach its successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerHandle(u64);

#[derive(Default)]
struct Slot {
    generation: u64,
    tx: Option<mpsc::Sender<Notification>>,
}

/// Single-listener slot shared by the orchestrator, the host event pump and the server.
#[derive(Default)]
pub struct Listener {
    slot: Mutex<Slot>,
}

impl Listener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches `tx`, replacing any previous listener.
    pub fn connect(&self, tx: mpsc::Sender<Notification>) -> ListenerHandle {
        let mut slot = self.lock();
        slot.generation += 1;
        slot.tx = Some(tx);
        tracing::debug!(generation = slot.generation, "listener connected");
        ListenerHandle(slot.generation)
    }

    /// Detaches the listener if `handle` is still the current one.
    pub fn disconnect(&self, handle: ListenerHandle) {
        let mut slot = self.lock();
        if slot.generation == handle.0 {
            slot.tx = None;
            tracing::debug!(generation = handle.0, "listener disconnected");
        }
    }

    pub fn is_connected(&self) -> bool {
        self.lock().tx.as_ref().is_some_and(|tx| !tx.is_closed())
    }

    /// Sends `n` if a listener is attached. Returns whether it was accepted.
    pub fn notify(&self, n: Notification) -> bool {
        let slot = self.lock();
        match &slot.tx {
            Some(tx) => match tx.try_send(n) {
                Ok(()) => true,
                Err(e) => {
                    tracing::debug!(error = %e, "notification dropped");
                    false
                }
            },
            None => false,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Slot> {
        // A panic while holding the lock leaves the slot itself consistent.
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }
}
