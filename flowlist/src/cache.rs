use alloc::vec::Vec;

/// A resolved item height.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CachedHeight {
    pub height: u32,
    /// The display width the height was derived from, for heights that depend on it.
    pub basis_width: Option<u32>,
}

/// Resolved heights for one data set, keyed by item index.
///
/// Entries are add-only while the data set lives: recording an index twice keeps the first
/// height. The only exception is [`HeightCache::remeasure`], which replaces width-derived
/// heights after the container width changed. Every mutation bumps [`HeightCache::version`].
#[derive(Clone, Debug, Default)]
pub struct HeightCache {
    slots: Vec<Option<CachedHeight>>,
    resolved: usize,
    version: u64,
}

impl HeightCache {
    pub fn new(count: usize) -> Self {
        Self {
            slots: alloc::vec![None; count],
            resolved: 0,
            version: 0,
        }
    }

    /// Drops every entry and resizes the cache for a new data set.
    pub fn reset(&mut self, count: usize) {
        self.slots.clear();
        self.slots.resize(count, None);
        self.resolved = 0;
        self.version = self.version.wrapping_add(1);
    }

    /// The number of items the cache covers.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn resolved_count(&self) -> usize {
        self.resolved
    }

    /// Whether every item has a resolved height.
    pub fn is_complete(&self) -> bool {
        self.resolved == self.slots.len()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn get(&self, index: usize) -> Option<CachedHeight> {
        self.slots.get(index).copied().flatten()
    }

    pub fn height(&self, index: usize) -> Option<u32> {
        self.get(index).map(|c| c.height)
    }

    pub fn is_resolved(&self, index: usize) -> bool {
        self.get(index).is_some()
    }

    /// Records the resolved height for `index`.
    ///
    /// Returns `false` (and changes nothing) when the index is out of bounds or already resolved.
    pub fn record(&mut self, index: usize, height: u32, basis_width: Option<u32>) -> bool {
        let Some(slot) = self.slots.get_mut(index) else {
            return false;
        };
        if slot.is_some() {
            return false;
        }
        *slot = Some(CachedHeight {
            height,
            basis_width,
        });
        self.resolved += 1;
        self.version = self.version.wrapping_add(1);
        true
    }

    /// Replaces a width-derived height with one measured against `basis_width`.
    ///
    /// Returns `false` when the index has no width-derived entry.
    pub fn remeasure(&mut self, index: usize, height: u32, basis_width: u32) -> bool {
        let Some(Some(entry)) = self.slots.get_mut(index) else {
            return false;
        };
        if entry.basis_width.is_none() {
            return false;
        }
        if entry.height == height && entry.basis_width == Some(basis_width) {
            return true;
        }
        entry.height = height;
        entry.basis_width = Some(basis_width);
        self.version = self.version.wrapping_add(1);
        true
    }

    /// Iterates over resolved entries in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, CachedHeight)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.map(|c| (i, c)))
    }

    /// Indexes whose height was derived from a width other than `width`.
    pub fn stale_for_width(&self, width: u32) -> impl Iterator<Item = usize> + '_ {
        self.iter()
            .filter(move |(_, c)| c.basis_width.is_some_and(|w| w != width))
            .map(|(i, _)| i)
    }
}
