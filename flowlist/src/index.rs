use alloc::vec::Vec;

use crate::{HeightCache, HeightSource, ItemPosition, ViewportState};

/// Cumulative item offsets derived from a [`HeightCache`] plus a default height.
///
/// The index is a plain prefix sum: `positions[i].top` is the sum of the heights of all items
/// before `i`, so `top` is non-decreasing and the binary searches below are valid. It is rebuilt
/// wholesale whenever heights change; there is no incremental patching.
#[derive(Clone, Debug, Default)]
pub struct PositionIndex {
    positions: Vec<ItemPosition>,
    total_height: u64,
}

impl PositionIndex {
    pub fn build(count: usize, cache: &HeightCache, default_height: &HeightSource) -> Self {
        let mut index = Self::default();
        index.rebuild(count, cache, default_height);
        index
    }

    /// Recomputes every position in one left-to-right pass, reusing the allocation.
    pub fn rebuild(&mut self, count: usize, cache: &HeightCache, default_height: &HeightSource) {
        self.positions.clear();
        self.positions.reserve_exact(count);

        let mut top = 0u64;
        for index in 0..count {
            let height = cache
                .height(index)
                .unwrap_or_else(|| default_height.height_for(index));
            self.positions.push(ItemPosition { index, top, height });
            top = top.saturating_add(height as u64);
        }
        self.total_height = top;
    }

    pub fn positions(&self) -> &[ItemPosition] {
        &self.positions
    }

    pub fn get(&self, index: usize) -> Option<ItemPosition> {
        self.positions.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn total_height(&self) -> u64 {
        self.total_height
    }

    /// The first item whose bottom edge is at or below `offset`.
    pub fn first_visible(&self, offset: u64) -> Option<usize> {
        let i = self.positions.partition_point(|p| p.bottom() < offset);
        (i < self.positions.len()).then_some(i)
    }

    /// The last item whose top edge is at or above `offset`.
    pub fn last_visible(&self, offset: u64) -> Option<usize> {
        let i = self.positions.partition_point(|p| p.top <= offset);
        i.checked_sub(1)
    }

    /// The item that contains `offset`, clamped to the last item.
    pub fn index_at_offset(&self, offset: u64) -> Option<usize> {
        if self.positions.is_empty() {
            return None;
        }
        let i = self.positions.partition_point(|p| p.bottom() <= offset);
        Some(i.min(self.positions.len() - 1))
    }

    pub fn max_scroll_offset(&self, viewport_height: u32) -> u64 {
        self.total_height.saturating_sub(viewport_height as u64)
    }

    /// Inclusive bounds of the items overlapping the viewport, before overscan.
    ///
    /// Offsets past the end of the content are clamped to the last scrollable position.
    pub fn scroll_bounds(&self, viewport: ViewportState) -> Option<(usize, usize)> {
        if self.positions.is_empty() {
            return None;
        }
        let offset = viewport
            .scroll_offset
            .min(self.max_scroll_offset(viewport.viewport_height));
        let end = offset.saturating_add(viewport.viewport_height as u64);

        let first = self.first_visible(offset)?;
        let last = self.last_visible(end).unwrap_or(first).max(first);
        Some((first, last))
    }
}
