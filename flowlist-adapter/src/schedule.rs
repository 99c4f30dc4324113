use alloc::collections::VecDeque;
use alloc::vec::Vec;

/// Identifies one idle-callback request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IdleHandle(pub u64);

/// The budget handed to one idle slice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IdleDeadline {
    /// Estimated time left in the slice.
    pub time_remaining_ms: u64,
    /// The request's timeout elapsed: the slice runs even without idle time.
    pub did_timeout: bool,
}

impl IdleDeadline {
    /// Whether work may run in this slice.
    pub fn has_budget(&self) -> bool {
        self.time_remaining_ms > 0 || self.did_timeout
    }
}

/// Runs low-priority work in idle slices.
///
/// The controller only talks to this trait; whether slices come from a native idle-callback
/// primitive or from the timer emulation is decided once, at construction
/// (see [`AnyIdleScheduler::detect`]).
pub trait IdleScheduler {
    /// Requests a slice that runs no later than `timeout_ms` after `now_ms`.
    fn request(&mut self, now_ms: u64, timeout_ms: u64) -> IdleHandle;

    /// Cancels a request. Unknown or already delivered handles are ignored.
    fn cancel(&mut self, handle: IdleHandle);

    /// Returns a slice that is ready to run at `now_ms`, if any.
    fn poll(&mut self, now_ms: u64) -> Option<(IdleHandle, IdleDeadline)>;

    /// Number of requests not yet delivered by `poll`.
    fn outstanding(&self) -> usize;
}

/// A host's native idle-callback primitive.
pub trait IdleHost {
    /// Registers a callback with the runtime and returns the runtime's id for it.
    fn request_idle_callback(&mut self, timeout_ms: u64) -> u64;

    fn cancel_idle_callback(&mut self, id: u64);
}

/// An [`IdleScheduler`] backed by the host's native idle callbacks.
///
/// When the runtime fires a callback, the host forwards it with
/// [`HostIdleScheduler::deliver`]; the next `poll` hands it to the controller.
#[derive(Clone, Debug)]
pub struct HostIdleScheduler<H> {
    host: H,
    requested: Vec<IdleHandle>,
    delivered: VecDeque<(IdleHandle, IdleDeadline)>,
}

impl<H: IdleHost> HostIdleScheduler<H> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            requested: Vec::new(),
            delivered: VecDeque::new(),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Forwards a fired native callback.
    ///
    /// Returns `false` for handles that were cancelled or never requested.
    pub fn deliver(
        &mut self,
        handle: IdleHandle,
        time_remaining_ms: u64,
        did_timeout: bool,
    ) -> bool {
        let Some(pos) = self.requested.iter().position(|&h| h == handle) else {
            vtrace!(handle = handle.0, "ignoring idle callback for unknown handle");
            return false;
        };
        self.requested.swap_remove(pos);
        self.delivered.push_back((
            handle,
            IdleDeadline {
                time_remaining_ms,
                did_timeout,
            },
        ));
        true
    }
}

impl<H: IdleHost> IdleScheduler for HostIdleScheduler<H> {
    fn request(&mut self, _now_ms: u64, timeout_ms: u64) -> IdleHandle {
        let handle = IdleHandle(self.host.request_idle_callback(timeout_ms));
        self.requested.push(handle);
        handle
    }

    fn cancel(&mut self, handle: IdleHandle) {
        if let Some(pos) = self.requested.iter().position(|&h| h == handle) {
            self.requested.swap_remove(pos);
            self.host.cancel_idle_callback(handle.0);
        }
        self.delivered.retain(|(h, _)| *h != handle);
    }

    fn poll(&mut self, _now_ms: u64) -> Option<(IdleHandle, IdleDeadline)> {
        self.delivered.pop_front()
    }

    fn outstanding(&self) -> usize {
        self.requested.len() + self.delivered.len()
    }
}

#[derive(Clone, Copy, Debug)]
struct TimerTask {
    handle: IdleHandle,
    requested_at: u64,
    due_at: u64,
    timeout_ms: u64,
}

/// Emulates idle callbacks with a short timer, for hosts without a native primitive.
///
/// A request fires `delay_ms` after it was made. Its budget is estimated as `budget_ms` minus
/// however late the host polled. A request polled with no budget left is not delivered; it is
/// re-armed for another `delay_ms`, keeping its request time. Once `timeout_ms` has passed since
/// the request the slice is delivered with `did_timeout`, so queued work always makes progress.
#[derive(Clone, Debug)]
pub struct TimerIdleScheduler {
    tasks: Vec<TimerTask>,
    next_handle: u64,
    delay_ms: u64,
    budget_ms: u64,
}

impl Default for TimerIdleScheduler {
    fn default() -> Self {
        Self::new(1, 50)
    }
}

impl TimerIdleScheduler {
    pub fn new(delay_ms: u64, budget_ms: u64) -> Self {
        Self {
            tasks: Vec::new(),
            next_handle: 0,
            delay_ms,
            budget_ms,
        }
    }

    pub fn delay_ms(&self) -> u64 {
        self.delay_ms
    }

    pub fn budget_ms(&self) -> u64 {
        self.budget_ms
    }
}

impl IdleScheduler for TimerIdleScheduler {
    fn request(&mut self, now_ms: u64, timeout_ms: u64) -> IdleHandle {
        self.next_handle = self.next_handle.wrapping_add(1);
        let handle = IdleHandle(self.next_handle);
        self.tasks.push(TimerTask {
            handle,
            requested_at: now_ms,
            due_at: now_ms.saturating_add(self.delay_ms),
            timeout_ms,
        });
        handle
    }

    fn cancel(&mut self, handle: IdleHandle) {
        self.tasks.retain(|t| t.handle != handle);
    }

    fn poll(&mut self, now_ms: u64) -> Option<(IdleHandle, IdleDeadline)> {
        let mut i = 0;
        while i < self.tasks.len() {
            let task = self.tasks[i];
            if now_ms >= task.due_at {
                let late_by = now_ms - task.due_at;
                let deadline = IdleDeadline {
                    time_remaining_ms: self.budget_ms.saturating_sub(late_by),
                    did_timeout: now_ms.saturating_sub(task.requested_at) >= task.timeout_ms,
                };
                if deadline.has_budget() {
                    self.tasks.remove(i);
                    return Some((task.handle, deadline));
                }
                // Re-armed in place: the timeout still counts from the original request.
                vtrace!(handle = task.handle.0, late_by, "idle slice without budget; re-arming");
                self.tasks[i].due_at = now_ms.saturating_add(self.delay_ms);
            }
            i += 1;
        }
        None
    }

    fn outstanding(&self) -> usize {
        self.tasks.len()
    }
}

/// Picks the native scheduler when the host has one, and the timer emulation otherwise.
#[derive(Clone, Debug)]
pub enum AnyIdleScheduler<H> {
    Native(HostIdleScheduler<H>),
    Polyfill(TimerIdleScheduler),
}

impl<H: IdleHost> AnyIdleScheduler<H> {
    pub fn detect(host: Option<H>) -> Self {
        match host {
            Some(host) => Self::Native(HostIdleScheduler::new(host)),
            None => {
                vdebug!("no native idle callback; using timer emulation");
                Self::Polyfill(TimerIdleScheduler::default())
            }
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, Self::Native(_))
    }

    /// Forwards a fired native callback. Always `false` for the emulation.
    pub fn deliver(
        &mut self,
        handle: IdleHandle,
        time_remaining_ms: u64,
        did_timeout: bool,
    ) -> bool {
        match self {
            Self::Native(s) => s.deliver(handle, time_remaining_ms, did_timeout),
            Self::Polyfill(_) => false,
        }
    }
}

impl<H: IdleHost> IdleScheduler for AnyIdleScheduler<H> {
    fn request(&mut self, now_ms: u64, timeout_ms: u64) -> IdleHandle {
        match self {
            Self::Native(s) => s.request(now_ms, timeout_ms),
            Self::Polyfill(s) => s.request(now_ms, timeout_ms),
        }
    }

    fn cancel(&mut self, handle: IdleHandle) {
        match self {
            Self::Native(s) => s.cancel(handle),
            Self::Polyfill(s) => s.cancel(handle),
        }
    }

    fn poll(&mut self, now_ms: u64) -> Option<(IdleHandle, IdleDeadline)> {
        match self {
            Self::Native(s) => s.poll(now_ms),
            Self::Polyfill(s) => s.poll(now_ms),
        }
    }

    fn outstanding(&self) -> usize {
        match self {
            Self::Native(s) => s.outstanding(),
            Self::Polyfill(s) => s.outstanding(),
        }
    }
}
