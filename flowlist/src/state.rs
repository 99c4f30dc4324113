/// A lightweight, serializable snapshot of the current viewport geometry and scroll position.
///
/// With `feature = "serde"`, this type implements `Serialize`/`Deserialize`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ViewportState {
    pub scroll_offset: u64,
    pub viewport_height: u32,
}

impl ViewportState {
    pub fn new(scroll_offset: u64, viewport_height: u32) -> Self {
        Self {
            scroll_offset,
            viewport_height,
        }
    }

    /// The offset of the viewport's bottom edge.
    pub fn end(&self) -> u64 {
        self.scroll_offset.saturating_add(self.viewport_height as u64)
    }
}
