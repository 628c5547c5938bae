//! Segment planning: decides single-stream vs multi-segment and computes
//! the byte ranges for a Task.

mod range;

pub use range::{plan_segments, Segment, SegmentStatus};

/// Inputs the planner needs beyond `total_size`/`supports_range`.
#[derive(Debug, Clone, Copy)]
pub struct PlannerSettings {
    pub min_split_size: u64,
    pub segment_count: usize,
}

/// Decides whether a task should be single-stream (`None`) or split into
/// segments (`Some(segments)`), per the fixed-N rule: the remainder of an
/// uneven split is absorbed entirely by the last segment.
pub fn plan(total_size: u64, supports_range: bool, settings: PlannerSettings) -> Option<Vec<Segment>> {
    if !supports_range || settings.segment_count <= 1 || total_size <= settings.min_split_size {
        return None;
    }
    let segments = plan_segments(total_size, settings.segment_count);
    if segments.len() <= 1 {
        None
    } else {
        Some(segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn below_min_split_size_is_single_stream() {
        assert!(plan(
            1000,
            true,
            PlannerSettings { min_split_size: 10_000, segment_count: 4 }
        )
        .is_none());
    }

    #[test]
    fn no_range_support_is_single_stream() {
        assert!(plan(
            10_000_000,
            false,
            PlannerSettings { min_split_size: 1000, segment_count: 4 }
        )
        .is_none());
    }

    #[test]
    fn segment_count_one_is_single_stream() {
        assert!(plan(
            10_000_000,
            true,
            PlannerSettings { min_split_size: 1000, segment_count: 1 }
        )
        .is_none());
    }

    #[test]
    fn splits_when_eligible() {
        let segs = plan(
            104_857_600,
            true,
            PlannerSettings { min_split_size: 10_485_760, segment_count: 4 },
        )
        .unwrap();
        assert_eq!(segs.len(), 4);
    }
}
