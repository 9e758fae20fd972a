//! States, outcomes and reports of one orchestrated transfer.

use serde::{Deserialize, Serialize};

use crate::host::DownloadId;

/// Orchestrator state; a report lists them in the order they were entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferState {
    Idle,
    Probing,
    Planning,
    Executing,
    Merging,
    Handoff,
    DirectHandoff,
    Done,
    Failed,
}

/// Strategy recorded for a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferMode {
    Chunked,
    Normal,
    Fallback,
}

/// Transient handle of a merged artifact handed to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRef {
    pub object_url: String,
    pub len: u64,
    pub mime_type: String,
}

/// How a transfer was carried out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    /// Chunks merged and handed off as a blob (uploads: sent in chunks, no host id).
    Chunked {
        download_id: Option<DownloadId>,
        artifact: Option<ArtifactRef>,
    },
    /// Transferred whole because ranges were unsupported or the resource was too large.
    Normal(Option<DownloadId>),
    /// Chunked path failed; the original URL was handed off instead.
    Fallback { download_id: DownloadId, reason: String },
}

impl TransferOutcome {
    pub fn mode(&self) -> TransferMode {
        match self {
            TransferOutcome::Chunked { .. } => TransferMode::Chunked,
            TransferOutcome::Normal(_) => TransferMode::Normal,
            TransferOutcome::Fallback { .. } => TransferMode::Fallback,
        }
    }

    pub fn download_id(&self) -> Option<DownloadId> {
        match self {
            TransferOutcome::Chunked { download_id, .. } => *download_id,
            TransferOutcome::Normal(id) => *id,
            TransferOutcome::Fallback { download_id, .. } => Some(*download_id),
        }
    }
}

/// Outcome plus the path taken through the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReport {
    pub outcome: TransferOutcome,
    pub states: Vec<TransferState>,
}

/// Records state transitions of one transfer.
#[derive(Debug, Default)]
pub(crate) struct StateTrail {
    states: Vec<TransferState>,
}

impl StateTrail {
    pub(crate) fn new() -> Self {
        Self {
            states: vec![TransferState::Idle],
        }
    }

    pub(crate) fn enter(&mut self, url: &str, state: TransferState) {
        tracing::debug!(url, ?state, "transfer state");
        self.states.push(state);
    }

    pub(crate) fn finish(self, outcome: TransferOutcome) -> TransferReport {
        let mut states = self.states;
        states.push(TransferState::Done);
        TransferReport { outcome, states }
    }
}
