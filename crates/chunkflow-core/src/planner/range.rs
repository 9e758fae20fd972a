//! Chunk range type and plan construction.

/// One planned byte range `[start, end]` (inclusive on both ends).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRange {
    pub index: usize,
    pub start: u64,
    pub end_inclusive: u64,
}

impl ChunkRange {
    /// Length of this range in bytes (always >= 1 for planned ranges).
    pub fn len(&self) -> u64 {
        self.end_inclusive - self.start + 1
    }

    /// HTTP Range header value: `bytes=start-end`.
    pub fn range_header_value(&self) -> String {
        format!("bytes={}-{}", self.start, self.end_inclusive)
    }

    /// HTTP Content-Range header value for uploads: `bytes start-end/total`.
    pub fn content_range_value(&self, total: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end_inclusive, total)
    }

    /// Range as a `usize` span for slicing an in-memory payload.
    pub fn as_slice_range(&self) -> std::ops::Range<usize> {
        self.start as usize..(self.end_inclusive as usize + 1)
    }
}

/// Ordered, gap-free partition of `[0, total_size - 1]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkPlan {
    total_size: u64,
    ranges: Vec<ChunkRange>,
}

impl ChunkPlan {
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    pub fn ranges(&self) -> &[ChunkRange] {
        &self.ranges
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Size of every range but (possibly) the last one.
    pub fn chunk_size(&self) -> u64 {
        self.ranges.first().map(ChunkRange::len).unwrap_or(0)
    }
}

/// Builds a chunk plan for `total_size` bytes split into `chunk_count` ranges.
///
/// The count is expected to be normalized already. Each range is
/// `ceil(total_size / count)` bytes; the last range ends at `total_size - 1`.
/// Never plans more ranges than there are bytes, and never emits an empty
/// range: when ceiling sizing reaches the end early, the plan stops there.
/// Returns an empty plan when `total_size` or `chunk_count` is 0.
pub fn plan(total_size: u64, chunk_count: usize) -> ChunkPlan {
    if total_size == 0 || chunk_count == 0 {
        return ChunkPlan {
            total_size,
            ranges: Vec::new(),
        };
    }

    let count = (chunk_count as u64).min(total_size);
    let chunk_size = total_size.div_ceil(count);

    let mut ranges = Vec::with_capacity(count as usize);
    for i in 0..count {
        let start = i * chunk_size;
        if start >= total_size {
            break;
        }
        let end_inclusive = if i == count - 1 {
            total_size - 1
        } else {
            (start + chunk_size - 1).min(total_size - 1)
        };
        ranges.push(ChunkRange {
            index: i as usize,
            start,
            end_inclusive,
        });
        if end_inclusive == total_size - 1 {
            break;
        }
    }

    ChunkPlan { total_size, ranges }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_partition(p: &ChunkPlan) {
        let mut next = 0u64;
        for (i, r) in p.ranges().iter().enumerate() {
            assert_eq!(r.index, i, "indices ordered");
            assert_eq!(r.start, next, "no gap or overlap at chunk {}", i);
            assert!(r.end_inclusive >= r.start, "non-empty chunk {}", i);
            next = r.end_inclusive + 1;
        }
        assert_eq!(next, p.total_size(), "covers whole resource");
    }

    #[test]
    fn plan_even_ten_megabytes() {
        let p = plan(10_000_000, 4);
        assert_eq!(p.len(), 4);
        let sizes: Vec<u64> = p.ranges().iter().map(ChunkRange::len).collect();
        assert_eq!(sizes, vec![2_500_000; 4]);
        assert_eq!(sizes.iter().sum::<u64>(), 10_000_000);
        assert_partition(&p);
    }

    #[test]
    fn plan_remainder_goes_to_last() {
        let p = plan(10, 4);
        // ceil(10/4) = 3 → 3,3,3,1
        let sizes: Vec<u64> = p.ranges().iter().map(ChunkRange::len).collect();
        assert_eq!(sizes, vec![3, 3, 3, 1]);
        assert_eq!(p.ranges()[3].end_inclusive, 9);
        assert_partition(&p);
    }

    #[test]
    fn plan_never_more_chunks_than_bytes() {
        let p = plan(3, 10);
        assert_eq!(p.len(), 3);
        assert!(p.ranges().iter().all(|r| r.len() == 1));
        assert_partition(&p);

        let one = plan(1, 32);
        assert_eq!(one.len(), 1);
        assert_eq!(one.ranges()[0].end_inclusive, 0);
    }

    #[test]
    fn plan_stops_when_ceiling_reaches_end_early() {
        // ceil(10/6) = 2 → five ranges already cover 10 bytes
        let p = plan(10, 6);
        assert_eq!(p.len(), 5);
        assert_partition(&p);
    }

    #[test]
    fn plan_partitions_for_all_counts() {
        for total in [1u64, 2, 7, 31, 32, 33, 1000, 65_537, 10_000_000] {
            for count in 2..=32usize {
                let p = plan(total, count);
                assert!(p.len() <= count);
                assert_partition(&p);
            }
        }
    }

    #[test]
    fn plan_is_deterministic() {
        assert_eq!(plan(123_457, 7), plan(123_457, 7));
    }

    #[test]
    fn plan_empty() {
        assert!(plan(0, 4).is_empty());
        assert!(plan(100, 0).is_empty());
    }

    #[test]
    fn header_values() {
        let r = ChunkRange {
            index: 0,
            start: 0,
            end_inclusive: 99,
        };
        assert_eq!(r.range_header_value(), "bytes=0-99");
        assert_eq!(r.content_range_value(1000), "bytes 0-99/1000");
        assert_eq!(r.len(), 100);
        assert_eq!(r.as_slice_range(), 0..100);
    }

    #[test]
    fn single_byte_range_header() {
        let r = ChunkRange {
            index: 3,
            start: 42,
            end_inclusive: 42,
        };
        assert_eq!(r.range_header_value(), "bytes=42-42");
    }
}
