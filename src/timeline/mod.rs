//! Millisecond time ranges
//!
//! Every window the pipeline reasons about, whether a subtitle cue or the
//! span of a decoded audio frame, is a half-open `[start, end)` interval in
//! milliseconds.

pub mod timebase;

pub use timebase::{ms_to_ticks, rescale, ticks_to_ms};

/// Half-open millisecond interval `[start, end)` with `end > start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeRange {
    start: i64,
    end: i64,
}

impl TimeRange {
    /// Create a range, or `None` if it would be empty.
    pub fn new(start_ms: i64, end_ms: i64) -> Option<Self> {
        (end_ms > start_ms).then_some(Self {
            start: start_ms,
            end: end_ms,
        })
    }

    /// Range covering everything from `start_ms` onwards.
    pub fn open_ended(start_ms: i64) -> Self {
        Self {
            start: start_ms,
            end: i64::MAX,
        }
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn end(&self) -> i64 {
        self.end
    }

    /// Duration in milliseconds (always positive).
    pub fn duration_ms(&self) -> i64 {
        self.end - self.start
    }

    /// True iff the two ranges share at least one instant.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// The overlap of two ranges.
    ///
    /// Callers must check [`overlaps`](Self::overlaps) first; intersecting
    /// disjoint ranges is a programming error.
    pub fn intersect(&self, other: &TimeRange) -> TimeRange {
        debug_assert!(
            self.overlaps(other),
            "intersect of disjoint ranges {:?} and {:?}",
            self,
            other
        );
        TimeRange {
            start: self.start.max(other.start),
            end: self.end.min(other.end),
        }
    }

    /// True iff `other` lies entirely inside `self`.
    pub fn contains(&self, other: &TimeRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Grow the range by `margin_ms` on both sides, never starting before 0.
    pub fn expand(&self, margin_ms: i64) -> TimeRange {
        TimeRange {
            start: self.start.saturating_sub(margin_ms).max(0),
            end: self.end.saturating_add(margin_ms),
        }
    }

    /// Where this range sits relative to `window`.
    pub fn position_against(&self, window: &TimeRange) -> RangePosition {
        if self.overlaps(window) {
            RangePosition::Overlapping
        } else if self.end <= window.start {
            RangePosition::Before
        } else {
            RangePosition::After
        }
    }
}

/// Classification of a frame's range against a cue window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangePosition {
    /// Entirely earlier than the window
    Before,
    /// Shares at least one instant with the window
    Overlapping,
    /// Entirely later than the window
    After,
}
