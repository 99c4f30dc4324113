//! A headless virtual list engine for items whose heights are discovered asynchronously.
//!
//! For host-driven workflows (idle-time height resolution, scroll throttling, rendering), see the
//! `flowlist-adapter` crate.
//!
//! This crate holds the layout math and the per-list state:
//! - a [`HeightCache`] of resolved item heights (add-only within one data set)
//! - a [`PositionIndex`] derived from the cache by a prefix sum, recomputed lazily
//! - a [`ViewportTracker`] that reconciles intersection membership with scroll geometry
//! - a [`RenderWindow`] selector producing the materialized range plus spacer sizes
//!
//! It is UI-agnostic. A host layer is expected to provide:
//! - container geometry (height/width)
//! - scroll offsets
//! - resolved heights (directly, or through the adapter's resolver)
//! - optionally, intersection enter/exit events
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod cache;
mod index;
mod list;
mod options;
mod state;
mod tracker;
mod types;
mod window;


pub use cache::{CachedHeight, HeightCache};
pub use index::PositionIndex;
pub use list::VirtualList;
pub use options::{HeightSource, ListOptions, OnChangeCallback};
pub use state::ViewportState;
pub use tracker::{ViewportTracker, intersection_root_margin};
pub use types::{IntersectionEntry, ItemPosition, SignalSource, VisibleRange};
pub use window::{RenderWindow, WindowItem};
