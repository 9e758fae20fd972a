//! Parallel chunk transfer: fork one blocking request per planned range, join all.
//!
//! Every chunk runs on the blocking pool (libcurl is blocking) with its own
//! bounded retry loop. The first chunk that gives up raises a shared abort
//! flag; the others stop at their next progress callback and all partial
//! results are discarded.

mod fetch;
mod progress;
mod upload;

pub use progress::ChunkProgress;
pub use upload::upload_multipart;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::error::TransferError;
use crate::planner::{ChunkPlan, ChunkRange};
use crate::retry::{run_with_retry, ChunkError, RetryPolicy};
use progress::ProgressReporter;

/// Bytes of one fetched range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkResult {
    pub index: usize,
    pub payload: Vec<u8>,
}

/// Curl options shared by every request of a transfer.
#[derive(Debug, Clone, Copy)]
pub struct RequestOptions {
    pub connect_timeout: Duration,
}

impl RequestOptions {
    pub(crate) fn apply(&self, easy: &mut curl::easy::Easy) -> Result<(), ChunkError> {
        easy.connect_timeout(self.connect_timeout)
            .map_err(ChunkError::Transport)?;
        // Abort if throughput stays below 1 KiB/s for 60s.
        easy.low_speed_limit(1024).map_err(ChunkError::Transport)?;
        easy.low_speed_time(Duration::from_secs(60))
            .map_err(ChunkError::Transport)?;
        easy.timeout(Duration::from_secs(3600))
            .map_err(ChunkError::Transport)?;
        Ok(())
    }
}

/// Runs the chunk set of one transfer.
#[derive(Debug, Clone)]
pub struct Executor {
    policy: RetryPolicy,
    opts: RequestOptions,
    progress: Option<mpsc::Sender<ChunkProgress>>,
}

impl Executor {
    pub fn new(policy: RetryPolicy, connect_timeout: Duration) -> Self {
        Self {
            policy,
            opts: RequestOptions { connect_timeout },
            progress: None,
        }
    }

    /// Sends [`ChunkProgress`] events on `tx` (best effort).
    pub fn with_progress(mut self, tx: Option<mpsc::Sender<ChunkProgress>>) -> Self {
        self.progress = tx;
        self
    }

    pub fn request_options(&self) -> RequestOptions {
        self.opts
    }

    /// Fetches every range of `plan` from `url` concurrently.
    ///
    /// Results come back ordered by index. Any chunk failure fails the whole set.
    pub async fn download(
        &self,
        url: &str,
        plan: &ChunkPlan,
    ) -> Result<Vec<ChunkResult>, TransferError> {
        let url = url.to_string();
        let opts = self.opts;
        let tx = self.progress.clone();
        let done = fork_join(plan, self.policy, move |range, abort| {
            let mut progress = ProgressReporter::new(range.index, range.len(), tx.clone());
            fetch::fetch_range(&url, range, &opts, abort, &mut progress)
        })
        .await?;
        Ok(done
            .into_iter()
            .map(|(index, payload)| ChunkResult { index, payload })
            .collect())
    }

    /// POSTs every range of `payload` to `url` concurrently, one Content-Range request each.
    ///
    /// `plan` must have been built over `payload.len()`.
    pub async fn upload(
        &self,
        url: &str,
        plan: &ChunkPlan,
        payload: Arc<Vec<u8>>,
    ) -> Result<(), TransferError> {
        if plan.total_size() != payload.len() as u64 {
            return Err(TransferError::MergeInvariantViolation(format!(
                "upload plan covers {} bytes, payload has {}",
                plan.total_size(),
                payload.len()
            )));
        }
        let url = url.to_string();
        let opts = self.opts;
        let tx = self.progress.clone();
        fork_join(plan, self.policy, move |range, abort| {
            let mut progress = ProgressReporter::new(range.index, range.len(), tx.clone());
            upload::post_range(&url, range, &payload, &opts, abort, &mut progress)
        })
        .await?;
        Ok(())
    }
}

/// Runs `work` once per range on the blocking pool and joins the set.
///
/// Returns `(index, value)` pairs sorted by index, or the first real failure.
async fn fork_join<T, F>(
    plan: &ChunkPlan,
    policy: RetryPolicy,
    work: F,
) -> Result<Vec<(usize, T)>, TransferError>
where
    T: Send + 'static,
    F: Fn(&ChunkRange, &AtomicBool) -> Result<T, ChunkError> + Send + Sync + 'static,
{
    let work = Arc::new(work);
    let abort = Arc::new(AtomicBool::new(false));
    let mut set = JoinSet::new();

    for range in plan.ranges().iter().copied() {
        let work = Arc::clone(&work);
        let abort = Arc::clone(&abort);
        set.spawn_blocking(move || {
            let result = run_with_retry(&policy, |attempt| {
                if abort.load(Ordering::Relaxed) {
                    return Err(ChunkError::Aborted);
                }
                if attempt > 1 {
                    tracing::debug!(chunk = range.index, attempt, "retrying chunk");
                }
                work(&range, &abort)
            });
            if result.is_err() {
                abort.store(true, Ordering::Relaxed);
            }
            (range.index, result)
        });
    }

    let mut done = Vec::with_capacity(plan.len());
    let mut failure: Option<TransferError> = None;
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((index, Ok(value))) => done.push((index, value)),
            Ok((index, Err(ChunkError::Aborted))) => {
                tracing::trace!(chunk = index, "chunk stopped by abort flag");
            }
            Ok((index, Err(cause))) => {
                if failure.is_none() {
                    tracing::warn!(chunk = index, error = %cause, "chunk failed, abandoning chunk set");
                    failure = Some(TransferError::ChunkTransferFailed { index, cause });
                }
            }
            Err(e) => {
                abort.store(true, Ordering::Relaxed);
                if failure.is_none() {
                    failure = Some(TransferError::MergeInvariantViolation(format!(
                        "chunk task did not complete: {}",
                        e
                    )));
                }
            }
        }
    }

    if let Some(e) = failure {
        return Err(e);
    }
    if done.len() != plan.len() {
        return Err(TransferError::MergeInvariantViolation(format!(
            "{} of {} chunks completed without a reported failure",
            done.len(),
            plan.len()
        )));
    }
    done.sort_by_key(|(index, _)| *index);
    Ok(done)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::plan;
    use std::sync::atomic::AtomicU32;

    #[tokio::test]
    async fn fork_join_returns_results_in_index_order() {
        let p = plan(100, 4);
        let out = fork_join(&p, RetryPolicy::default(), |range, _| {
            // Later chunks finish first.
            std::thread::sleep(Duration::from_millis(10 * (4 - range.index as u64)));
            Ok(range.start)
        })
        .await
        .unwrap();
        let indices: Vec<usize> = out.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        assert_eq!(out[2].1, 50);
    }

    #[tokio::test]
    async fn fork_join_reports_the_failing_chunk() {
        let p = plan(100, 4);
        let err = fork_join(&p, RetryPolicy::default(), |range, abort| {
            if range.index == 2 {
                return Err(ChunkError::Http(500));
            }
            for _ in 0..200 {
                if abort.load(Ordering::Relaxed) {
                    return Err(ChunkError::Aborted);
                }
                std::thread::sleep(Duration::from_millis(5));
            }
            Ok(())
        })
        .await
        .unwrap_err();
        match err {
            TransferError::ChunkTransferFailed { index, cause } => {
                assert_eq!(index, 2);
                assert!(matches!(cause, ChunkError::Http(500)));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn fork_join_retries_transport_failures_once() {
        let p = plan(10, 2);
        let calls = Arc::new(AtomicU32::new(0));
        let counted = Arc::clone(&calls);
        let out = fork_join(&p, RetryPolicy::default(), move |range, _| {
            if range.index == 1 && counted.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(ChunkError::Truncated {
                    expected: range.len(),
                    received: 1,
                });
            }
            Ok(range.len())
        })
        .await
        .unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
