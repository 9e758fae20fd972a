//! Advisory per-chunk progress events.

use tokio::sync::mpsc;

/// Bytes moved so far for one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkProgress {
    pub index: usize,
    pub transferred: u64,
    pub total: u64,
}

/// Sends progress for one chunk; drops events when no one listens or the channel is full.
#[derive(Debug, Clone)]
pub(crate) struct ProgressReporter {
    index: usize,
    total: u64,
    tx: Option<mpsc::Sender<ChunkProgress>>,
    last: u64,
}

impl ProgressReporter {
    pub(crate) fn new(index: usize, total: u64, tx: Option<mpsc::Sender<ChunkProgress>>) -> Self {
        Self {
            index,
            total,
            tx,
            last: u64::MAX,
        }
    }

    /// Reports `transferred` bytes if it changed since the last report.
    pub(crate) fn report(&mut self, transferred: u64) {
        let Some(tx) = &self.tx else { return };
        if transferred == self.last {
            return;
        }
        self.last = transferred;
        let _ = tx.try_send(ChunkProgress {
            index: self.index,
            transferred: transferred.min(self.total),
            total: self.total,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeats_are_suppressed_and_full_channel_drops() {
        let (tx, mut rx) = mpsc::channel(2);
        let mut p = ProgressReporter::new(3, 100, Some(tx));
        p.report(10);
        p.report(10);
        p.report(50);
        p.report(100);
        assert_eq!(
            rx.try_recv().unwrap(),
            ChunkProgress {
                index: 3,
                transferred: 10,
                total: 100
            }
        );
        assert_eq!(rx.try_recv().unwrap().transferred, 50);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn no_channel_is_a_no_op() {
        let mut p = ProgressReporter::new(0, 10, None);
        p.report(5);
    }
}
