/// How raw scroll events are turned into committed scroll offsets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScrollMode {
    /// Commit once scrolling has been quiet for a while. Used while intersection reports keep
    /// the visible range current.
    Debounce,
    /// Commit at most once per animation frame, with a timer fallback if frames stall.
    FrameCoalesce,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PendingScroll {
    offset: u64,
    mode: ScrollMode,
    flush_at: u64,
}

/// Throttles scroll offsets before they reach the list.
///
/// Only the latest offset survives; earlier ones are superseded, not queued.
#[derive(Clone, Debug)]
pub struct ScrollThrottle {
    pending: Option<PendingScroll>,
    debounce_ms: u64,
    frame_fallback_ms: u64,
}

impl Default for ScrollThrottle {
    fn default() -> Self {
        Self::new(100, 16)
    }
}

impl ScrollThrottle {
    pub fn new(debounce_ms: u64, frame_fallback_ms: u64) -> Self {
        Self {
            pending: None,
            debounce_ms,
            frame_fallback_ms,
        }
    }

    /// Records a raw scroll event.
    pub fn on_scroll(&mut self, offset: u64, now_ms: u64, mode: ScrollMode) {
        let delay = match mode {
            ScrollMode::Debounce => self.debounce_ms,
            ScrollMode::FrameCoalesce => self.frame_fallback_ms,
        };
        self.pending = Some(PendingScroll {
            offset,
            mode,
            flush_at: now_ms.saturating_add(delay),
        });
    }

    /// Whether the host should schedule an animation frame for a pending offset.
    pub fn wants_frame(&self) -> bool {
        matches!(
            self.pending,
            Some(PendingScroll {
                mode: ScrollMode::FrameCoalesce,
                ..
            })
        )
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// An animation frame fired. Flushes a frame-coalesced offset.
    pub fn on_frame(&mut self) -> Option<u64> {
        if !self.wants_frame() {
            return None;
        }
        self.pending.take().map(|p| p.offset)
    }

    /// Flushes an offset whose debounce period or frame fallback has elapsed.
    pub fn poll(&mut self, now_ms: u64) -> Option<u64> {
        let pending = self.pending?;
        if now_ms < pending.flush_at {
            return None;
        }
        self.pending = None;
        Some(pending.offset)
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}
