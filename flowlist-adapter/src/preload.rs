use alloc::collections::VecDeque;
use alloc::string::String;

use crate::{IdleDeadline, IdleHandle};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PreloadState {
    /// No data set has been started.
    #[default]
    Idle,
    /// Resolutions are queued or in flight.
    Running,
    /// Every item has a resolved height.
    Complete,
}

/// The queue of items waiting for height resolution, drained in idle slices.
///
/// Each slice dispatches up to `batch_size` items in index order and returns without waiting
/// for them. The owner reschedules while items are queued or loads are in flight.
#[derive(Clone, Debug)]
pub struct Preloader {
    pending: VecDeque<(usize, String)>,
    total: usize,
    batch_size: usize,
    handle: Option<IdleHandle>,
    state: PreloadState,
}

impl Preloader {
    pub fn new(batch_size: usize) -> Self {
        Self {
            pending: VecDeque::new(),
            total: 0,
            batch_size: batch_size.max(1),
            handle: None,
            state: PreloadState::Idle,
        }
    }

    /// Starts a data set of `total` items; `pending` lists the items that need an asset load.
    pub fn start(&mut self, total: usize, pending: impl IntoIterator<Item = (usize, String)>) {
        self.pending.clear();
        self.pending.extend(pending);
        self.total = total;
        self.handle = None;
        self.state = PreloadState::Running;
        vdebug!(total, queued = self.pending.len(), "Preloader::start");
    }

    /// Drops queued work and returns the outstanding idle request, if any, for cancellation.
    pub fn cancel(&mut self) -> Option<IdleHandle> {
        self.pending.clear();
        self.state = PreloadState::Idle;
        self.handle.take()
    }

    pub fn state(&self) -> PreloadState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == PreloadState::Running
    }

    pub fn is_complete(&self) -> bool {
        self.state == PreloadState::Complete
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn handle(&self) -> Option<IdleHandle> {
        self.handle
    }

    pub(crate) fn set_handle(&mut self, handle: IdleHandle) {
        self.handle = Some(handle);
    }

    pub(crate) fn take_handle(&mut self) -> Option<IdleHandle> {
        self.handle.take()
    }

    /// Claims the slice for `handle`. Returns `false` for requests this preloader no longer
    /// waits on.
    pub(crate) fn claim(&mut self, handle: IdleHandle) -> bool {
        if self.handle != Some(handle) {
            return false;
        }
        self.handle = None;
        true
    }

    /// Dispatches up to one batch of queued items. Returns how many were dispatched.
    pub fn run_slice(
        &mut self,
        deadline: IdleDeadline,
        mut dispatch: impl FnMut(usize, String),
    ) -> usize {
        let mut dispatched = 0usize;
        while dispatched < self.batch_size && deadline.has_budget() {
            let Some((index, url)) = self.pending.pop_front() else {
                break;
            };
            dispatch(index, url);
            dispatched += 1;
        }
        vtrace!(
            dispatched,
            queued = self.pending.len(),
            remaining_ms = deadline.time_remaining_ms,
            did_timeout = deadline.did_timeout,
            "idle slice"
        );
        dispatched
    }

    /// Whether another slice is needed after the last one.
    ///
    /// Marks the preloader complete once every item is resolved.
    pub fn needs_another_slice(&mut self, resolved: usize, in_flight: usize) -> bool {
        if !self.is_running() {
            return false;
        }
        if resolved >= self.total {
            self.finish();
            return false;
        }
        !self.pending.is_empty() || in_flight > 0
    }

    pub(crate) fn finish(&mut self) {
        if self.state != PreloadState::Complete {
            vdebug!(total = self.total, "preloading complete");
        }
        self.state = PreloadState::Complete;
        self.pending.clear();
    }

    /// Percentage of resolved items, rounded to the nearest integer.
    pub fn progress(&self, resolved: usize) -> u8 {
        if self.total == 0 {
            return 100;
        }
        let resolved = resolved.min(self.total) as u64;
        let total = self.total as u64;
        ((resolved * 100 + total / 2) / total) as u8
    }
}

impl Default for Preloader {
    fn default() -> Self {
        Self::new(3)
    }
}
