use alloc::string::String;
use alloc::vec::Vec;

use crate::AssetError;

/// Identifies one asset load: the data-set generation it was issued for, and the item index.
///
/// Completions are matched against the resolver's current generation so results for a replaced
/// data set are dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoadTicket {
    pub generation: u64,
    pub index: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoadRequest {
    pub ticket: LoadTicket,
    pub url: String,
}

/// Natural dimensions reported by a successful load.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AssetDimensions {
    pub natural_width: u32,
    pub natural_height: u32,
}

impl AssetDimensions {
    pub fn new(natural_width: u32, natural_height: u32) -> Self {
        Self {
            natural_width,
            natural_height,
        }
    }
}

/// Metadata kept for a measured asset and handed to the renderer.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AssetInfo {
    pub url: String,
    pub natural_width: u32,
    pub natural_height: u32,
    pub display_width: u32,
    pub display_height: f64,
    /// `natural_height / natural_width`.
    pub aspect_ratio: f64,
}

impl AssetInfo {
    pub(crate) fn measure(url: String, dims: AssetDimensions, display_width: u32) -> Self {
        let aspect_ratio = dims.natural_height as f64 / dims.natural_width as f64;
        Self {
            url,
            natural_width: dims.natural_width,
            natural_height: dims.natural_height,
            display_width,
            display_height: display_width as f64 * aspect_ratio,
            aspect_ratio,
        }
    }

    pub(crate) fn remeasure(&mut self, display_width: u32) {
        self.display_width = display_width;
        self.display_height = display_width as f64 * self.aspect_ratio;
    }

    /// The display height rounded to whole pixels.
    pub fn display_extent(&self) -> u32 {
        // Non-negative, so adding one half and truncating rounds to nearest; `as` saturates.
        (self.display_height + 0.5) as u32
    }
}

/// Starts asset loads on behalf of the resolver.
///
/// Loading is asynchronous: `load` only issues the request. The host reports the result later
/// through `Controller::complete_load` with the same ticket, in any order.
pub trait AssetLoader {
    fn load(&mut self, request: LoadRequest);
}

impl<L: AssetLoader + ?Sized> AssetLoader for &mut L {
    fn load(&mut self, request: LoadRequest) {
        (**self).load(request);
    }
}

/// An [`AssetLoader`] that queues requests for the host to drain.
///
/// Useful when the host's loading primitive cannot be called from inside the controller, e.g.
/// because it needs its own event loop.
#[derive(Clone, Debug, Default)]
pub struct LoadQueue {
    requests: Vec<LoadRequest>,
    issued: usize,
}

impl LoadQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns every request issued since the last call.
    pub fn take_requests(&mut self) -> Vec<LoadRequest> {
        core::mem::take(&mut self.requests)
    }

    pub fn pending(&self) -> &[LoadRequest] {
        &self.requests
    }

    /// Total number of requests ever issued.
    pub fn issued(&self) -> usize {
        self.issued
    }
}

impl AssetLoader for LoadQueue {
    fn load(&mut self, request: LoadRequest) {
        self.issued += 1;
        self.requests.push(request);
    }
}

/// Result type the host reports for a finished load.
pub type LoadResult = Result<AssetDimensions, AssetError>;
