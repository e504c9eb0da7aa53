//! Segments for a parallel full-table scan.

use tracing::warn;

use crate::input_split::ScanSplit;
use crate::Result;

/// Largest segment count the store accepts for a parallel scan.
pub const MAX_TOTAL_SEGMENTS: u32 = 1_000_000;

/// Cuts a full-table scan into parallel segments.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanSplitter;

impl ScanSplitter {
    /// One split per segment, `max(parallelism, 1)` segments in total.
    pub fn split(&self, parallelism: i64) -> Result<Vec<ScanSplit>> {
        let clamped = parallelism.clamp(1, i64::from(MAX_TOTAL_SEGMENTS));
        if clamped != parallelism.max(1) {
            warn!(parallelism, limit = MAX_TOTAL_SEGMENTS, "too many scan segments, clamping");
        }
        let total = u32::try_from(clamped).unwrap_or(MAX_TOTAL_SEGMENTS);
        (0..total).map(|segment| ScanSplit::new(segment, total)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments() {
        let splits = ScanSplitter.split(3).unwrap();
        let segments: Vec<_> = splits.iter().map(|s| (s.segment(), s.total_segments())).collect();
        assert_eq!(segments, vec![(0, 3), (1, 3), (2, 3)]);
    }

    #[test]
    fn test_at_least_one_segment() {
        assert_eq!(ScanSplitter.split(0).unwrap().len(), 1);
        assert_eq!(ScanSplitter.split(-7).unwrap().len(), 1);
    }
}
