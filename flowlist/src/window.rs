use crate::{ItemPosition, PositionIndex, SignalSource, VisibleRange};

/// One materialized item of a [`RenderWindow`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WindowItem {
    pub index: usize,
    pub position: ItemPosition,
}

/// The set of items to materialize, plus the spacers that stand in for everything else.
///
/// `leading_spacer + (sum of materialized heights) + trailing_spacer == total_height`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RenderWindow {
    pub range: VisibleRange,
    /// `None` when nothing is materialized.
    pub source: Option<SignalSource>,
    pub leading_spacer: u64,
    pub trailing_spacer: u64,
    pub total_height: u64,
}

impl RenderWindow {
    pub fn empty(total_height: u64) -> Self {
        Self {
            range: VisibleRange::EMPTY,
            source: None,
            leading_spacer: 0,
            trailing_spacer: total_height,
            total_height,
        }
    }

    /// Selects the window for a resolved range over `index`.
    pub fn select(index: &PositionIndex, resolved: Option<(VisibleRange, SignalSource)>) -> Self {
        let total_height = index.total_height();
        let Some((range, source)) = resolved else {
            return Self::empty(total_height);
        };
        let (Some(first), Some(last)) = (
            index.get(range.start_index),
            range.last_index().and_then(|i| index.get(i)),
        ) else {
            return Self::empty(total_height);
        };
        Self {
            range,
            source: Some(source),
            leading_spacer: first.top,
            trailing_spacer: total_height.saturating_sub(last.bottom()),
            total_height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    pub fn len(&self) -> usize {
        self.range.len()
    }

    /// Iterates the materialized items.
    pub fn items<'a>(
        &self,
        index: &'a PositionIndex,
    ) -> impl Iterator<Item = WindowItem> + use<'a> {
        let end = self.range.end_index.min(index.len());
        let start = self.range.start_index.min(end);
        index.positions()[start..end]
            .iter()
            .map(|&position| WindowItem {
                index: position.index,
                position,
            })
    }
}
