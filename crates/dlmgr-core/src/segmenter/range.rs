//! Segment type and range planning.

use serde::{Deserialize, Serialize};

/// Lifecycle of a single segment within a multi-segment Task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentStatus {
    Pending,
    Active,
    Completed,
    Failed,
}

/// A single segment: inclusive byte range `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub index: usize,
    pub start: u64,
    pub end: u64,
    pub downloaded: u64,
    pub status: SegmentStatus,
}

impl Segment {
    /// Length of this segment in bytes (inclusive range, so `end - start + 1`).
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// HTTP Range header value: `bytes=start-end`.
    pub fn range_header_value(&self) -> String {
        format!("bytes={}-{}", self.start, self.end)
    }

    /// Range header value resuming from `self.downloaded` bytes already on disk.
    pub fn resume_range_header_value(&self) -> String {
        format!("bytes={}-{}", self.start + self.downloaded, self.end)
    }
}

/// Builds a segment plan for a given total size and segment count.
///
/// `N = segment_count` segments are produced; segments `0..N-2` have equal
/// length `base = total_size / N` and segment `N-1` absorbs the remainder, so
/// only the last segment is ever off-size. Returns an empty vec if
/// `total_size` or `segment_count` is 0.
pub fn plan_segments(total_size: u64, segment_count: usize) -> Vec<Segment> {
    if total_size == 0 || segment_count == 0 {
        return Vec::new();
    }

    let n = segment_count as u64;
    let base = total_size / n;
    if base == 0 {
        // Fewer bytes than segments requested: one byte-sized segment each,
        // last one absorbs whatever remains.
        let n = total_size.min(n);
        return plan_segments(total_size, n as usize);
    }

    let mut out = Vec::with_capacity(segment_count);
    let mut start = 0u64;
    for i in 0..n {
        let end = if i == n - 1 {
            total_size - 1
        } else {
            start + base - 1
        };
        out.push(Segment {
            index: i as usize,
            start,
            end,
            downloaded: 0,
            status: SegmentStatus::Pending,
        });
        start = end + 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_segments_even() {
        let segs = plan_segments(104_857_600, 4);
        assert_eq!(segs.len(), 4);
        assert_eq!((segs[0].start, segs[0].end), (0, 26_214_399));
        assert_eq!((segs[1].start, segs[1].end), (26_214_400, 52_428_799));
        assert_eq!((segs[2].start, segs[2].end), (52_428_800, 78_643_199));
        assert_eq!((segs[3].start, segs[3].end), (78_643_200, 104_857_599));
    }

    #[test]
    fn plan_segments_remainder_goes_to_last() {
        let segs = plan_segments(10, 4);
        assert_eq!(segs.len(), 4);
        // 10/4 -> base 2: first 3 segments get 2 bytes, last absorbs the remainder (4).
        assert_eq!((segs[0].start, segs[0].end), (0, 1));
        assert_eq!((segs[1].start, segs[1].end), (2, 3));
        assert_eq!((segs[2].start, segs[2].end), (4, 5));
        assert_eq!((segs[3].start, segs[3].end), (6, 9));
        assert_eq!(segs[3].len(), 4);
    }

    #[test]
    fn plan_segments_one() {
        let segs = plan_segments(100, 1);
        assert_eq!(segs.len(), 1);
        assert_eq!((segs[0].start, segs[0].end), (0, 99));
    }

    #[test]
    fn plan_segments_empty() {
        assert!(plan_segments(0, 4).is_empty());
        assert!(plan_segments(100, 0).is_empty());
    }

    #[test]
    fn plan_segments_partition_covers_total_size() {
        let segs = plan_segments(104_857_600, 4);
        let sum: u64 = segs.iter().map(|s| s.len()).sum();
        assert_eq!(sum, 104_857_600);
        for w in segs.windows(2) {
            assert_eq!(w[0].end + 1, w[1].start);
        }
        assert_eq!(segs.last().unwrap().end, 104_857_600 - 1);
    }

    #[test]
    fn segment_range_header() {
        let s = Segment { index: 0, start: 0, end: 98, downloaded: 0, status: SegmentStatus::Pending };
        assert_eq!(s.range_header_value(), "bytes=0-98");
        assert_eq!(s.len(), 99);
    }

    #[test]
    fn segment_resume_range_header() {
        let s = Segment { index: 1, start: 100, end: 199, downloaded: 40, status: SegmentStatus::Active };
        assert_eq!(s.resume_range_header_value(), "bytes=140-199");
    }

    #[test]
    fn fewer_bytes_than_segments() {
        let segs = plan_segments(2, 4);
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[0].len(), 1);
        assert_eq!(segs[1].len(), 1);
    }
}
