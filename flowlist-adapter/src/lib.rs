//! Host-driven adapter for the `flowlist` crate.
//!
//! `flowlist` only knows heights and positions. This crate discovers those heights for items
//! whose size depends on an asynchronously loaded asset (typically an image), without blocking
//! the host:
//!
//! - Height resolution, memoized per item, with loads issued through an [`AssetLoader`]
//! - Idle-time preloading in small batches, over a native idle callback or a timer emulation
//! - Scroll throttling (debounced or frame-coalesced)
//! - A [`Controller`] facade tying these to a [`flowlist::VirtualList`]
//!
//! Time is always passed in by the host (`now_ms`); this crate never reads a clock.
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod controller;
mod error;
mod loader;
mod preload;
mod resolver;
mod schedule;
mod scroll;

#[cfg(test)]
mod tests;

pub use controller::{
    AssetUrlFn, Controller, ControllerOptions, RenderOutput, RenderedItem, ScrollCallback,
};
pub use error::AssetError;
pub use loader::{
    AssetDimensions, AssetInfo, AssetLoader, LoadQueue, LoadRequest, LoadResult, LoadTicket,
};
pub use preload::{PreloadState, Preloader};
pub use resolver::{HeightResolver, LoadOutcome, Resolution};
pub use schedule::{
    AnyIdleScheduler, HostIdleScheduler, IdleDeadline, IdleHandle, IdleHost, IdleScheduler,
    TimerIdleScheduler,
};
pub use scroll::{ScrollMode, ScrollThrottle};
