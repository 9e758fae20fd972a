//! Merge ordered chunk buffers into the original byte sequence.

use crate::error::TransferError;
use crate::executor::ChunkResult;
use crate::planner::ChunkPlan;

/// Concatenates `results` in index order.
///
/// Results must be exactly indices `0..n` in order; a gap, duplicate or
/// reordering is a [`TransferError::MergeInvariantViolation`].
pub fn merge(results: Vec<ChunkResult>) -> Result<Vec<u8>, TransferError> {
    for (expected, r) in results.iter().enumerate() {
        if r.index != expected {
            return Err(TransferError::MergeInvariantViolation(format!(
                "chunk at position {} has index {}",
                expected, r.index
            )));
        }
    }
    let total: usize = results.iter().map(|r| r.payload.len()).sum();
    let mut out = Vec::with_capacity(total);
    for r in results {
        out.extend_from_slice(&r.payload);
    }
    Ok(out)
}

/// Like [`merge`], but also checks every chunk against its planned range
/// and the merged length against the plan's total size.
pub fn merge_planned(plan: &ChunkPlan, results: Vec<ChunkResult>) -> Result<Vec<u8>, TransferError> {
    if results.len() != plan.len() {
        return Err(TransferError::MergeInvariantViolation(format!(
            "expected {} chunks, got {}",
            plan.len(),
            results.len()
        )));
    }
    for (range, r) in plan.ranges().iter().zip(&results) {
        if r.payload.len() as u64 != range.len() {
            return Err(TransferError::MergeInvariantViolation(format!(
                "chunk {} has {} bytes, planned {}",
                range.index,
                r.payload.len(),
                range.len()
            )));
        }
    }
    let merged = merge(results)?;
    if merged.len() as u64 != plan.total_size() {
        return Err(TransferError::MergeInvariantViolation(format!(
            "merged {} bytes, resource has {}",
            merged.len(),
            plan.total_size()
        )));
    }
    Ok(merged)
}
