use alloc::sync::Arc;
use alloc::vec::Vec;
use core::cell::Cell;

use crate::{
    HeightCache, HeightSource, IntersectionEntry, ItemPosition, ListOptions, PositionIndex,
    RenderWindow, SignalSource, ViewportState, ViewportTracker, VisibleRange, WindowItem,
};

/// A headless virtual list over items of unknown height.
///
/// This type does not hold any UI objects or item payloads:
/// - The host drives it with container geometry, scroll offsets and intersection reports.
/// - Resolved heights are recorded into its [`HeightCache`]; the [`PositionIndex`] is derived
///   from the cache lazily, on the next read after a change.
/// - Rendering is exposed via `render_window` and the `for_each_window_item` iteration API.
///
/// Read methods that need positions take `&mut self` so the index can be brought up to date.
///
/// For idle-time resolution and scroll throttling, see the `flowlist-adapter` crate.
#[derive(Clone, Debug)]
pub struct VirtualList {
    options: ListOptions,
    scroll_offset: u64,

    cache: HeightCache,
    index: PositionIndex,
    tracker: ViewportTracker,

    // Bumped when positions must be rebuilt for reasons other than a cache change.
    layout_epoch: u64,
    synced: Option<(u64, u64)>,

    notify_depth: Cell<usize>,
    notify_pending: Cell<bool>,
}

impl VirtualList {
    pub fn new(options: ListOptions) -> Self {
        vdebug!(
            count = options.count,
            overscan = options.overscan,
            container_height = options.container_height,
            container_width = options.container_width,
            "VirtualList::new"
        );
        Self {
            scroll_offset: 0,
            cache: HeightCache::new(options.count),
            index: PositionIndex::default(),
            tracker: ViewportTracker::new(),
            layout_epoch: 0,
            synced: None,
            options,
            notify_depth: Cell::new(0),
            notify_pending: Cell::new(false),
        }
    }

    pub fn options(&self) -> &ListOptions {
        &self.options
    }

    /// Replaces the options, deciding what has to be reset or recomputed.
    ///
    /// A different `count` is treated as a new data set: the height cache and the visible set
    /// are cleared.
    pub fn set_options(&mut self, options: ListOptions) {
        let prev_count = self.options.count;
        let default_unchanged = self.options.default_height.same_as(&options.default_height);
        self.options = options;
        vtrace!(
            count = self.options.count,
            overscan = self.options.overscan,
            "VirtualList::set_options"
        );

        if self.options.count != prev_count {
            self.reset_data(self.options.count);
        } else if !default_unchanged {
            self.invalidate_layout();
        }
        self.notify();
    }

    /// Clones the current options, applies `f`, then delegates to `set_options`.
    pub fn update_options(&mut self, f: impl FnOnce(&mut ListOptions)) {
        let mut next = self.options.clone();
        f(&mut next);
        self.set_options(next);
    }

    pub fn set_on_change(
        &mut self,
        on_change: Option<impl Fn(&VirtualList) + Send + Sync + 'static>,
    ) {
        self.options.on_change = on_change.map(|f| Arc::new(f) as _);
        self.notify();
    }

    fn notify_now(&self) {
        if let Some(cb) = &self.options.on_change {
            cb(self);
        }
    }

    fn notify(&self) {
        if self.notify_depth.get() > 0 {
            self.notify_pending.set(true);
            return;
        }
        self.notify_now();
    }

    /// Batches multiple updates into a single `on_change` notification.
    ///
    /// A host typically records several heights, a scroll offset and a batch of intersection
    /// reports in one turn of its event loop; without batching each of them fires `on_change`.
    pub fn batch_update(&mut self, f: impl FnOnce(&mut Self)) {
        let depth = self.notify_depth.get();
        self.notify_depth.set(depth.saturating_add(1));

        f(self);

        let depth = self.notify_depth.get();
        debug_assert!(depth > 0, "notify_depth underflow");
        let next = depth.saturating_sub(1);
        self.notify_depth.set(next);

        if next == 0 && self.notify_pending.replace(false) {
            self.notify_now();
        }
    }

    pub fn count(&self) -> usize {
        self.options.count
    }

    /// Starts a new data set of `count` items.
    ///
    /// Clears every resolved height and the intersection set, even when `count` is unchanged.
    pub fn reset(&mut self, count: usize) {
        self.options.count = count;
        self.reset_data(count);
        self.notify();
    }

    fn reset_data(&mut self, count: usize) {
        vdebug!(count, "VirtualList::reset");
        self.cache.reset(count);
        self.tracker.reset();
        self.invalidate_layout();
    }

    fn invalidate_layout(&mut self) {
        self.layout_epoch = self.layout_epoch.wrapping_add(1);
    }

    pub fn overscan(&self) -> usize {
        self.options.overscan
    }

    pub fn set_overscan(&mut self, overscan: usize) {
        if self.options.overscan == overscan {
            return;
        }
        self.options.overscan = overscan;
        self.notify();
    }

    pub fn default_height(&self) -> &HeightSource {
        &self.options.default_height
    }

    pub fn default_height_for(&self, index: usize) -> u32 {
        self.options.default_height.height_for(index)
    }

    pub fn set_default_height(&mut self, default_height: impl Into<HeightSource>) {
        let next = default_height.into();
        if self.options.default_height.same_as(&next) {
            return;
        }
        self.options.default_height = next;
        self.invalidate_layout();
        self.notify();
    }

    pub fn scroll_offset(&self) -> u64 {
        self.scroll_offset
    }

    pub fn set_scroll_offset(&mut self, offset: u64) {
        if self.scroll_offset == offset {
            return;
        }
        vtrace!(offset, "set_scroll_offset");
        self.scroll_offset = offset;
        self.notify();
    }

    pub fn viewport_height(&self) -> u32 {
        self.options.container_height
    }

    pub fn set_viewport_height(&mut self, height: u32) {
        if self.options.container_height == height {
            return;
        }
        self.options.container_height = height;
        self.notify();
    }

    pub fn viewport_state(&self) -> ViewportState {
        ViewportState {
            scroll_offset: self.scroll_offset,
            viewport_height: self.options.container_height,
        }
    }

    /// Restores scroll position and viewport height from a previously captured snapshot.
    pub fn restore_viewport_state(&mut self, viewport: ViewportState) {
        self.batch_update(|l| {
            l.set_viewport_height(viewport.viewport_height);
            l.set_scroll_offset(viewport.scroll_offset);
        });
    }

    pub fn container_width(&self) -> u32 {
        self.options.container_width
    }

    /// Width available to an item's asset (`container_width - content_inset`).
    pub fn display_width(&self) -> u32 {
        self.options.display_width()
    }

    /// Updates the container width.
    ///
    /// Returns `true` when the width changed. Heights derived from the old width are left in
    /// place until they are remeasured (see [`HeightCache::stale_for_width`]).
    pub fn set_container_width(&mut self, width: u32) -> bool {
        if self.options.container_width == width {
            return false;
        }
        vdebug!(
            from = self.options.container_width,
            to = width,
            "set_container_width"
        );
        self.options.container_width = width;
        self.notify();
        true
    }

    pub fn cache(&self) -> &HeightCache {
        &self.cache
    }

    pub fn resolved_count(&self) -> usize {
        self.cache.resolved_count()
    }

    pub fn is_fully_resolved(&self) -> bool {
        self.cache.is_complete()
    }

    /// Records a resolved height.
    ///
    /// Out-of-bounds indexes and already resolved indexes are ignored. Returns whether the cache
    /// changed.
    pub fn record_height(&mut self, index: usize, height: u32, basis_width: Option<u32>) -> bool {
        if !self.cache.record(index, height, basis_width) {
            vtrace!(index, height, "record_height ignored");
            return false;
        }
        vtrace!(index, height, "record_height");
        self.notify();
        true
    }

    /// Replaces a width-derived height after a container resize.
    pub fn remeasure_height(&mut self, index: usize, height: u32, basis_width: u32) -> bool {
        let version = self.cache.version();
        if !self.cache.remeasure(index, height, basis_width) {
            return false;
        }
        if self.cache.version() != version {
            self.notify();
        }
        true
    }

    pub fn tracker(&self) -> &ViewportTracker {
        &self.tracker
    }

    pub fn observer_available(&self) -> bool {
        self.tracker.observer_available()
    }

    pub fn set_observer_available(&mut self, available: bool) {
        if self.tracker.observer_available() == available {
            return;
        }
        self.tracker.set_observer_available(available);
        self.notify();
    }

    /// Applies a batch of intersection reports. Returns whether the visible set changed.
    pub fn apply_intersections(
        &mut self,
        entries: impl IntoIterator<Item = IntersectionEntry>,
    ) -> bool {
        let changed = self.tracker.apply(entries, self.options.count);
        if changed {
            vtrace!(
                visible = self.tracker.visible_len(),
                "apply_intersections"
            );
            self.notify();
        }
        changed
    }

    /// Drops the intersection set, e.g. after the host replaced its observation targets.
    pub fn clear_intersections(&mut self) {
        let revision = self.tracker.revision();
        self.tracker.reset();
        if self.tracker.revision() != revision {
            self.notify();
        }
    }

    fn sync_layout(&mut self) {
        let key = (self.cache.version(), self.layout_epoch);
        if self.synced == Some(key) {
            return;
        }
        vtrace!(
            count = self.options.count,
            resolved = self.cache.resolved_count(),
            "rebuild positions"
        );
        self.index
            .rebuild(self.options.count, &self.cache, &self.options.default_height);
        self.synced = Some(key);
    }

    /// Returns the position index, rebuilding it first if heights changed.
    pub fn layout(&mut self) -> &PositionIndex {
        self.sync_layout();
        &self.index
    }

    pub fn total_height(&mut self) -> u64 {
        self.layout().total_height()
    }

    pub fn item_position(&mut self, index: usize) -> Option<ItemPosition> {
        self.layout().get(index)
    }

    pub fn index_at_offset(&mut self, offset: u64) -> Option<usize> {
        self.layout().index_at_offset(offset)
    }

    pub fn max_scroll_offset(&mut self) -> u64 {
        let view = self.options.container_height;
        self.layout().max_scroll_offset(view)
    }

    pub fn clamp_scroll_offset(&mut self, offset: u64) -> u64 {
        offset.min(self.max_scroll_offset())
    }

    pub fn set_scroll_offset_clamped(&mut self, offset: u64) {
        let clamped = self.clamp_scroll_offset(offset);
        self.set_scroll_offset(clamped);
    }

    /// The overscanned range to materialize, and the signal that produced it.
    pub fn resolve_range(&mut self) -> Option<(VisibleRange, SignalSource)> {
        let viewport = self.viewport_state();
        let overscan = self.options.overscan;
        self.sync_layout();
        self.tracker.resolve(&self.index, viewport, overscan)
    }

    pub fn visible_range(&mut self) -> VisibleRange {
        self.resolve_range()
            .map(|(range, _)| range)
            .unwrap_or(VisibleRange::EMPTY)
    }

    /// Items overlapping `[scroll_offset, scroll_offset + viewport_height]` by geometry alone.
    ///
    /// This ignores the intersection signal and applies no overscan.
    pub fn scroll_range_for(&mut self, scroll_offset: u64, viewport_height: u32) -> VisibleRange {
        let viewport = ViewportState::new(scroll_offset, viewport_height);
        match self.layout().scroll_bounds(viewport) {
            Some((first, last)) => VisibleRange {
                start_index: first,
                end_index: last + 1,
            },
            None => VisibleRange::EMPTY,
        }
    }

    pub fn render_window(&mut self) -> RenderWindow {
        let resolved = self.resolve_range();
        RenderWindow::select(&self.index, resolved)
    }

    pub fn for_each_window_item(&mut self, mut f: impl FnMut(WindowItem)) {
        let window = self.render_window();
        for item in window.items(&self.index) {
            f(item);
        }
    }

    /// Collects the materialized items into `out` (clears `out` first).
    ///
    /// This is a convenience wrapper around [`Self::for_each_window_item`]. Hosts rendering every
    /// frame should prefer the callback form and reuse a scratch buffer.
    pub fn collect_window_items(&mut self, out: &mut Vec<WindowItem>) {
        out.clear();
        self.for_each_window_item(|it| out.push(it));
    }
}
