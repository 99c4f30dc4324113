use alloc::collections::BTreeSet;

use crate::{IntersectionEntry, PositionIndex, SignalSource, ViewportState, VisibleRange};

/// Root margin a host should give its intersection observer, in pixels.
///
/// Items within `overscan` rows of an average height `per_item` count as intersecting, so the
/// observed set already covers the overscan region.
pub fn intersection_root_margin(overscan: usize, per_item: u32) -> u64 {
    (overscan as u64).saturating_mul(per_item as u64)
}

/// Decides which items are visible from two independent signals.
///
/// - Intersection membership (`VisibleIndexSet`) reported by the host, when available.
/// - Scroll geometry over the [`PositionIndex`], always available.
///
/// A non-empty intersection set takes precedence over scroll geometry, even when the two
/// disagree. Geometry can lag while heights are still resolving; observed visibility cannot.
#[derive(Clone, Debug, Default)]
pub struct ViewportTracker {
    visible: BTreeSet<usize>,
    observer_available: bool,
    revision: u64,
}

impl ViewportTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observer_available(&self) -> bool {
        self.observer_available
    }

    /// Marks the host's intersection mechanism as (un)available.
    ///
    /// Turning it off drops the visible set.
    pub fn set_observer_available(&mut self, available: bool) {
        if self.observer_available == available {
            return;
        }
        self.observer_available = available;
        if !available {
            self.reset();
        }
    }

    /// Bumped whenever the visible set changes.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Drops the visible set, e.g. after observation targets were replaced.
    pub fn reset(&mut self) {
        if self.visible.is_empty() {
            return;
        }
        self.visible.clear();
        self.revision = self.revision.wrapping_add(1);
    }

    /// Applies one batch of enter/exit reports.
    ///
    /// Entries at or beyond `count` are ignored. Returns whether membership changed.
    pub fn apply(
        &mut self,
        entries: impl IntoIterator<Item = IntersectionEntry>,
        count: usize,
    ) -> bool {
        if !self.observer_available {
            return false;
        }
        let mut changed = false;
        for entry in entries {
            if entry.index >= count {
                vtrace!(index = entry.index, count, "ignoring stale intersection entry");
                continue;
            }
            changed |= if entry.is_intersecting {
                self.visible.insert(entry.index)
            } else {
                self.visible.remove(&entry.index)
            };
        }
        if changed {
            self.revision = self.revision.wrapping_add(1);
        }
        changed
    }

    pub fn visible_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.visible.iter().copied()
    }

    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    /// Whether the intersection signal currently decides the visible range.
    pub fn intersection_active(&self) -> bool {
        self.observer_available && !self.visible.is_empty()
    }

    /// Inclusive bounds of the observed set, ignoring indices at or beyond `count`.
    fn observed_bounds(&self, count: usize) -> Option<(usize, usize)> {
        if !self.observer_available {
            return None;
        }
        let mut in_bounds = self.visible.range(..count);
        let first = *in_bounds.next()?;
        let last = in_bounds.next_back().copied().unwrap_or(first);
        Some((first, last))
    }

    /// Computes the overscanned visible range and reports which signal produced it.
    pub fn resolve(
        &self,
        index: &PositionIndex,
        viewport: ViewportState,
        overscan: usize,
    ) -> Option<(VisibleRange, SignalSource)> {
        let count = index.len();
        if count == 0 {
            return None;
        }
        if let Some((first, last)) = self.observed_bounds(count) {
            let range = VisibleRange::overscanned(first, last, overscan, count);
            return Some((range, SignalSource::Intersection));
        }
        let (first, last) = index.scroll_bounds(viewport)?;
        let range = VisibleRange::overscanned(first, last, overscan, count);
        Some((range, SignalSource::Scroll))
    }
}
