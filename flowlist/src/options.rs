use alloc::sync::Arc;

use crate::list::VirtualList;

/// A callback fired when the list's state changes.
pub type OnChangeCallback = Arc<dyn Fn(&VirtualList) + Send + Sync>;

/// The height an item occupies before (or without) an asynchronously resolved one.
///
/// This is also the base height that asset-derived extents are added to.
#[derive(Clone)]
pub enum HeightSource {
    /// The same height for every index.
    Fixed(u32),
    /// A per-index height function.
    Computed(Arc<dyn Fn(usize) -> u32 + Send + Sync>),
}

impl HeightSource {
    pub fn computed(f: impl Fn(usize) -> u32 + Send + Sync + 'static) -> Self {
        Self::Computed(Arc::new(f))
    }

    pub fn height_for(&self, index: usize) -> u32 {
        match self {
            Self::Fixed(h) => *h,
            Self::Computed(f) => f(index),
        }
    }

    /// Whether two sources are known to produce the same heights.
    ///
    /// Closures compare by identity.
    pub(crate) fn same_as(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Fixed(a), Self::Fixed(b)) => a == b,
            (Self::Computed(a), Self::Computed(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Default for HeightSource {
    fn default() -> Self {
        Self::Fixed(50)
    }
}

impl From<u32> for HeightSource {
    fn from(value: u32) -> Self {
        Self::Fixed(value)
    }
}

impl core::fmt::Debug for HeightSource {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Fixed(h) => f.debug_tuple("Fixed").field(h).finish(),
            Self::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// Configuration for [`crate::VirtualList`].
///
/// Cheap to clone: closures are stored in `Arc`s so hosts can tweak a few fields and call
/// `VirtualList::set_options` without reallocating them.
pub struct ListOptions {
    pub count: usize,
    pub default_height: HeightSource,

    /// Visible height of the scroll container.
    pub container_height: u32,
    /// Width of the scroll container. Asset-derived heights are computed against it.
    pub container_width: u32,
    /// Horizontal space inside an item that is not available to its asset.
    pub content_inset: u32,

    /// Extra items materialized on each side of the visible range.
    pub overscan: usize,

    /// Optional callback fired when the list's state changes.
    pub on_change: Option<OnChangeCallback>,
}

impl Clone for ListOptions {
    fn clone(&self) -> Self {
        Self {
            count: self.count,
            default_height: self.default_height.clone(),
            container_height: self.container_height,
            container_width: self.container_width,
            content_inset: self.content_inset,
            overscan: self.overscan,
            on_change: self.on_change.clone(),
        }
    }
}

impl Default for ListOptions {
    fn default() -> Self {
        Self::new(0, HeightSource::default())
    }
}

impl ListOptions {
    pub fn new(count: usize, default_height: impl Into<HeightSource>) -> Self {
        Self {
            count,
            default_height: default_height.into(),
            container_height: 400,
            container_width: 800,
            content_inset: 32,
            overscan: 3,
            on_change: None,
        }
    }

    /// Width available to an item's asset.
    pub fn display_width(&self) -> u32 {
        self.container_width.saturating_sub(self.content_inset)
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    pub fn with_default_height(mut self, default_height: impl Into<HeightSource>) -> Self {
        self.default_height = default_height.into();
        self
    }

    pub fn with_height_fn(mut self, f: impl Fn(usize) -> u32 + Send + Sync + 'static) -> Self {
        self.default_height = HeightSource::computed(f);
        self
    }

    pub fn with_container(mut self, width: u32, height: u32) -> Self {
        self.container_width = width;
        self.container_height = height;
        self
    }

    pub fn with_container_height(mut self, height: u32) -> Self {
        self.container_height = height;
        self
    }

    pub fn with_container_width(mut self, width: u32) -> Self {
        self.container_width = width;
        self
    }

    pub fn with_content_inset(mut self, inset: u32) -> Self {
        self.content_inset = inset;
        self
    }

    pub fn with_overscan(mut self, overscan: usize) -> Self {
        self.overscan = overscan;
        self
    }

    pub fn with_on_change(
        mut self,
        on_change: Option<impl Fn(&VirtualList) + Send + Sync + 'static>,
    ) -> Self {
        self.on_change = on_change.map(|f| Arc::new(f) as _);
        self
    }
}

impl core::fmt::Debug for ListOptions {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ListOptions")
            .field("count", &self.count)
            .field("default_height", &self.default_height)
            .field("container_height", &self.container_height)
            .field("container_width", &self.container_width)
            .field("content_inset", &self.content_inset)
            .field("overscan", &self.overscan)
            .finish_non_exhaustive()
    }
}
