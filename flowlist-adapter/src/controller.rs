use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use flowlist::{
    IntersectionEntry, ListOptions, RenderWindow, SignalSource, VirtualList, WindowItem,
};

use crate::{
    AssetInfo, AssetLoader, HeightResolver, IdleDeadline, IdleScheduler, LoadOutcome, LoadResult,
    LoadTicket, Preloader, Resolution, ScrollMode, ScrollThrottle, TimerIdleScheduler,
};

/// Maps an item to the URL of the asset that determines its height, if it has one.
pub type AssetUrlFn<T> = Arc<dyn Fn(&T, usize) -> Option<String> + Send + Sync>;

/// Receives every raw scroll offset, before throttling.
pub type ScrollCallback = Arc<dyn Fn(u64) + Send + Sync>;

/// Configuration for [`Controller`].
pub struct ControllerOptions<T> {
    /// `None` means no item has an asset: every height is the default height.
    pub get_asset_url: Option<AssetUrlFn<T>>,
    pub on_scroll: Option<ScrollCallback>,

    /// Items dispatched per idle slice.
    pub batch_size: usize,
    /// Upper bound on how long an idle slice may be postponed.
    pub idle_timeout_ms: u64,
    /// Quiet period before a scroll offset is committed while intersections are reported.
    pub scroll_debounce_ms: u64,
    /// Forced flush of a frame-coalesced scroll offset when no frame arrives.
    pub frame_fallback_ms: u64,
}

impl<T> Clone for ControllerOptions<T> {
    fn clone(&self) -> Self {
        Self {
            get_asset_url: self.get_asset_url.clone(),
            on_scroll: self.on_scroll.clone(),
            batch_size: self.batch_size,
            idle_timeout_ms: self.idle_timeout_ms,
            scroll_debounce_ms: self.scroll_debounce_ms,
            frame_fallback_ms: self.frame_fallback_ms,
        }
    }
}

impl<T> Default for ControllerOptions<T> {
    fn default() -> Self {
        Self {
            get_asset_url: None,
            on_scroll: None,
            batch_size: 3,
            idle_timeout_ms: 2000,
            scroll_debounce_ms: 100,
            frame_fallback_ms: 16,
        }
    }
}

impl<T> ControllerOptions<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_asset_url(
        mut self,
        f: impl Fn(&T, usize) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.get_asset_url = Some(Arc::new(f));
        self
    }

    pub fn with_on_scroll(
        mut self,
        on_scroll: Option<impl Fn(u64) + Send + Sync + 'static>,
    ) -> Self {
        self.on_scroll = on_scroll.map(|f| Arc::new(f) as _);
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_idle_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.idle_timeout_ms = timeout_ms;
        self
    }

    pub fn with_scroll_debounce_ms(mut self, debounce_ms: u64) -> Self {
        self.scroll_debounce_ms = debounce_ms;
        self
    }

    pub fn with_frame_fallback_ms(mut self, fallback_ms: u64) -> Self {
        self.frame_fallback_ms = fallback_ms;
        self
    }
}

impl<T> core::fmt::Debug for ControllerOptions<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ControllerOptions")
            .field("get_asset_url", &self.get_asset_url.is_some())
            .field("on_scroll", &self.on_scroll.is_some())
            .field("batch_size", &self.batch_size)
            .field("idle_timeout_ms", &self.idle_timeout_ms)
            .field("scroll_debounce_ms", &self.scroll_debounce_ms)
            .field("frame_fallback_ms", &self.frame_fallback_ms)
            .finish()
    }
}

/// One materialized item of a [`RenderOutput`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedItem<R> {
    pub index: usize,
    /// Absolute offset from the top of the content.
    pub top: u64,
    pub height: u32,
    pub output: R,
}

/// What the host lays out: a leading spacer, the rendered items, then a trailing spacer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderOutput<R> {
    pub total_height: u64,
    pub leading_spacer: u64,
    pub trailing_spacer: u64,
    /// The signal that selected the items; `None` when nothing is rendered.
    pub source: Option<SignalSource>,
    pub items: Vec<RenderedItem<R>>,
}

/// A framework-neutral list component over items with asynchronously measured heights.
///
/// The controller owns the items and a [`VirtualList`], and drives height resolution in idle
/// slices. It does not hold any UI objects. Adapters drive it by calling:
/// - `on_scroll` / `on_frame` / `on_intersection` when UI events occur
/// - `complete_load` when an asset load issued through the [`AssetLoader`] finishes
/// - `tick(now_ms)` each frame/timer tick (idle slices and scroll flushing)
/// - `render` to obtain the spacers and rendered items
#[derive(Debug)]
pub struct Controller<T, L, S = TimerIdleScheduler> {
    list: VirtualList,
    items: Vec<T>,
    options: ControllerOptions<T>,
    resolver: HeightResolver,
    preloader: Preloader,
    scheduler: S,
    loader: L,
    scroll: ScrollThrottle,
}

impl<T, L: AssetLoader, S: IdleScheduler> Controller<T, L, S> {
    pub fn new(
        items: Vec<T>,
        list_options: ListOptions,
        options: ControllerOptions<T>,
        loader: L,
        scheduler: S,
        now_ms: u64,
    ) -> Self {
        let count = items.len();
        let mut c = Self {
            list: VirtualList::new(list_options.with_count(count)),
            items,
            resolver: HeightResolver::new(count),
            preloader: Preloader::new(options.batch_size),
            scroll: ScrollThrottle::new(options.scroll_debounce_ms, options.frame_fallback_ms),
            options,
            scheduler,
            loader,
        };
        c.start_generation(now_ms);
        c
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn list(&self) -> &VirtualList {
        &self.list
    }

    pub fn list_mut(&mut self) -> &mut VirtualList {
        &mut self.list
    }

    pub fn options(&self) -> &ControllerOptions<T> {
        &self.options
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn loader_mut(&mut self) -> &mut L {
        &mut self.loader
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn resolver(&self) -> &HeightResolver {
        &self.resolver
    }

    pub fn preloader(&self) -> &Preloader {
        &self.preloader
    }

    /// Generation of the current data set; see [`LoadTicket`].
    pub fn generation(&self) -> u64 {
        self.resolver.generation()
    }

    /// Percentage of items with a resolved height (0..=100).
    pub fn preload_progress(&self) -> u8 {
        self.preloader.progress(self.list.resolved_count())
    }

    pub fn is_preloading(&self) -> bool {
        self.preloader.is_running()
    }

    pub fn asset_info(&self, index: usize) -> Option<&AssetInfo> {
        self.resolver.asset_info(index)
    }

    /// Replaces the data set.
    ///
    /// Pending idle work and throttled scroll state are dropped, and loads still in flight
    /// for the old items will complete as [`LoadOutcome::Stale`].
    pub fn set_items(&mut self, items: Vec<T>, now_ms: u64) {
        if let Some(handle) = self.preloader.cancel() {
            self.scheduler.cancel(handle);
        }
        self.scroll.cancel();
        let count = items.len();
        self.items = items;
        self.resolver.reset(count);
        self.list.reset(count);
        self.start_generation(now_ms);
    }

    fn start_generation(&mut self, now_ms: u64) {
        let total = self.items.len();
        let mut queued = Vec::new();
        let Self {
            list,
            items,
            options,
            resolver,
            loader,
            ..
        } = self;
        list.batch_update(|list| {
            for (index, item) in items.iter().enumerate() {
                match options.get_asset_url.as_ref().and_then(|f| f(item, index)) {
                    Some(url) => queued.push((index, url)),
                    None => {
                        resolver.resolve(list, loader, index, || None);
                    }
                }
            }
        });
        self.preloader.start(total, queued);
        self.reschedule(now_ms);
    }

    /// Requests the next idle slice while work remains, or marks preloading complete.
    fn reschedule(&mut self, now_ms: u64) {
        let resolved = self.list.resolved_count();
        if self
            .preloader
            .needs_another_slice(resolved, self.resolver.in_flight())
        {
            if self.preloader.handle().is_none() {
                let handle = self.scheduler.request(now_ms, self.options.idle_timeout_ms);
                self.preloader.set_handle(handle);
            }
        } else if let Some(handle) = self.preloader.take_handle() {
            self.scheduler.cancel(handle);
        }
    }

    /// Resolves one item's height now instead of waiting for its turn in the queue.
    ///
    /// Returns `None` for out-of-bounds indexes.
    pub fn resolve(&mut self, index: usize) -> Option<Resolution> {
        let Self {
            list,
            items,
            options,
            resolver,
            loader,
            ..
        } = self;
        let item = items.get(index)?;
        resolver.resolve(list, loader, index, || {
            options.get_asset_url.as_ref().and_then(|f| f(item, index))
        })
    }

    /// Reports a finished asset load.
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        result: LoadResult,
        now_ms: u64,
    ) -> LoadOutcome {
        let outcome = self.resolver.complete(&mut self.list, ticket, result);
        if !outcome.is_stale() {
            self.reschedule(now_ms);
        }
        outcome
    }

    /// Advances the controller.
    ///
    /// Flushes a throttled scroll offset whose delay elapsed and runs at most one idle slice.
    /// Returns the committed scroll offset, if any.
    pub fn tick(&mut self, now_ms: u64) -> Option<u64> {
        let committed = self.scroll.poll(now_ms);
        if let Some(offset) = committed {
            self.list.set_scroll_offset(offset);
        }

        while let Some((handle, deadline)) = self.scheduler.poll(now_ms) {
            if self.preloader.claim(handle) {
                self.run_slice(deadline);
                self.reschedule(now_ms);
                break;
            }
        }
        committed
    }

    fn run_slice(&mut self, deadline: IdleDeadline) {
        let Self {
            list,
            resolver,
            preloader,
            loader,
            ..
        } = self;
        list.batch_update(|list| {
            preloader.run_slice(deadline, |index, url| {
                resolver.resolve(list, loader, index, || Some(url));
            });
        });
    }

    /// Call this when the UI reports a scroll offset change.
    ///
    /// The offset is committed later by `tick` or `on_frame`, depending on whether
    /// intersections are being reported.
    pub fn on_scroll(&mut self, offset: u64, now_ms: u64) {
        if let Some(cb) = &self.options.on_scroll {
            cb(offset);
        }
        let mode = if self.list.observer_available() {
            ScrollMode::Debounce
        } else {
            ScrollMode::FrameCoalesce
        };
        self.scroll.on_scroll(offset, now_ms, mode);
    }

    /// Whether a scroll offset is waiting for the next animation frame.
    pub fn wants_frame(&self) -> bool {
        self.scroll.wants_frame()
    }

    /// Call this from the host's animation-frame callback.
    ///
    /// Returns the committed scroll offset, if one was waiting for a frame.
    pub fn on_frame(&mut self) -> Option<u64> {
        let offset = self.scroll.on_frame()?;
        self.list.set_scroll_offset(offset);
        Some(offset)
    }

    /// Applies a batch of intersection reports. Returns whether the visible set changed.
    pub fn on_intersection(
        &mut self,
        entries: impl IntoIterator<Item = IntersectionEntry>,
    ) -> bool {
        self.list.apply_intersections(entries)
    }

    pub fn set_observer_available(&mut self, available: bool) {
        self.list.set_observer_available(available);
    }

    pub fn set_container_height(&mut self, height: u32) {
        self.list.set_viewport_height(height);
    }

    /// Updates the container width and remeasures asset heights derived from the old width.
    ///
    /// Returns the number of heights that changed.
    pub fn set_container_width(&mut self, width: u32) -> usize {
        if !self.list.set_container_width(width) {
            return 0;
        }
        let resolver = &mut self.resolver;
        let mut changed = 0;
        self.list.batch_update(|list| changed = resolver.remeasure(list));
        changed
    }

    pub fn render_window(&mut self) -> RenderWindow {
        self.list.render_window()
    }

    /// Renders the materialized items with `render_item`.
    pub fn render<R>(
        &mut self,
        mut render_item: impl FnMut(&T, usize, Option<&AssetInfo>) -> R,
    ) -> RenderOutput<R> {
        let window = self.list.render_window();
        let layout = self.list.layout();
        let mut items = Vec::with_capacity(window.len());
        for WindowItem { index, position } in window.items(layout) {
            let Some(item) = self.items.get(index) else {
                continue;
            };
            items.push(RenderedItem {
                index,
                top: position.top,
                height: position.height,
                output: render_item(item, index, self.resolver.asset_info(index)),
            });
        }
        RenderOutput {
            total_height: window.total_height,
            leading_spacer: window.leading_spacer,
            trailing_spacer: window.trailing_spacer,
            source: window.source,
            items,
        }
    }
}
