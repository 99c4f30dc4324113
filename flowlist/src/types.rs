use core::ops::Range;

/// The laid-out position of one item in the scroll axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemPosition {
    pub index: usize,
    /// Sum of the heights of all items before this one.
    pub top: u64,
    pub height: u32,
}

impl ItemPosition {
    pub fn bottom(&self) -> u64 {
        self.top.saturating_add(self.height as u64)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VisibleRange {
    pub start_index: usize,
    pub end_index: usize, // exclusive
}

impl VisibleRange {
    pub const EMPTY: Self = Self {
        start_index: 0,
        end_index: 0,
    };

    pub fn is_empty(&self) -> bool {
        self.start_index >= self.end_index
    }

    pub fn len(&self) -> usize {
        self.end_index.saturating_sub(self.start_index)
    }

    /// The last index in the range, if any.
    pub fn last_index(&self) -> Option<usize> {
        (!self.is_empty()).then(|| self.end_index - 1)
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start_index && index < self.end_index
    }

    pub fn indices(&self) -> Range<usize> {
        self.start_index..self.end_index.max(self.start_index)
    }

    /// Builds a range from inclusive bounds, expanded by `overscan` and clamped to `count`.
    pub(crate) fn overscanned(first: usize, last: usize, overscan: usize, count: usize) -> Self {
        if count == 0 {
            return Self::EMPTY;
        }
        let last = last.min(count - 1);
        let first = first.min(last);
        Self {
            start_index: first.saturating_sub(overscan),
            end_index: last.saturating_add(overscan).min(count - 1) + 1,
        }
    }
}

/// Which signal produced a visible range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SignalSource {
    /// Observed membership reported by the host's intersection mechanism.
    Intersection,
    /// Binary search over the position index at the current scroll offset.
    Scroll,
}

/// One enter/exit report from the host's intersection mechanism.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IntersectionEntry {
    pub index: usize,
    pub is_intersecting: bool,
}

impl IntersectionEntry {
    pub fn enter(index: usize) -> Self {
        Self {
            index,
            is_intersecting: true,
        }
    }

    pub fn exit(index: usize) -> Self {
        Self {
            index,
            is_intersecting: false,
        }
    }
}
