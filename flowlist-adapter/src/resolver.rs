use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use flowlist::VirtualList;

use crate::{AssetError, AssetInfo, AssetLoader, LoadRequest, LoadResult, LoadTicket};

/// The immediate answer to a resolution request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// The height is known.
    Ready(u32),
    /// A load is in flight; its completion will carry this ticket.
    Pending(LoadTicket),
}

/// What a load completion did to the height cache.
#[derive(Clone, Debug, PartialEq)]
pub enum LoadOutcome {
    /// The asset was measured: `height = default + display extent`.
    Measured { index: usize, height: u32 },
    /// The load failed; the default height was recorded instead.
    Fallback {
        index: usize,
        height: u32,
        error: AssetError,
    },
    /// The ticket belongs to a replaced data set, or was already completed. Nothing changed.
    Stale,
}

impl LoadOutcome {
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Stale)
    }

    pub fn height(&self) -> Option<u32> {
        match self {
            Self::Measured { height, .. } | Self::Fallback { height, .. } => Some(*height),
            Self::Stale => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Slot {
    Idle,
    InFlight { ticket: LoadTicket, url: String },
    Resolved,
}

/// Resolves item heights, at most once per index.
///
/// Items without an asset resolve immediately to their default height. Items with an asset
/// issue one load; asking again while it is in flight returns the same ticket instead of
/// starting another. Results are recorded into the list's [`flowlist::HeightCache`] only.
#[derive(Clone, Debug, Default)]
pub struct HeightResolver {
    generation: u64,
    slots: Vec<Slot>,
    in_flight: usize,
    assets: BTreeMap<usize, AssetInfo>,
}

impl HeightResolver {
    pub fn new(count: usize) -> Self {
        let mut r = Self::default();
        r.reset(count);
        r
    }

    /// Forgets every slot and starts a new generation of `count` items.
    ///
    /// Tickets issued before the reset complete as [`LoadOutcome::Stale`].
    pub fn reset(&mut self, count: usize) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.slots.clear();
        self.slots.resize(count, Slot::Idle);
        self.in_flight = 0;
        self.assets.clear();
        vdebug!(generation = self.generation, count, "HeightResolver::reset");
        self.generation
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of loads issued and not yet completed.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn is_in_flight(&self, index: usize) -> bool {
        matches!(self.slots.get(index), Some(Slot::InFlight { .. }))
    }

    pub fn asset_info(&self, index: usize) -> Option<&AssetInfo> {
        self.assets.get(&index)
    }

    /// Resolves the height of `index`.
    ///
    /// `asset_url` is only called when the index has never been asked for. Returns `None` for
    /// out-of-bounds indexes.
    pub fn resolve<L: AssetLoader + ?Sized>(
        &mut self,
        list: &mut VirtualList,
        loader: &mut L,
        index: usize,
        asset_url: impl FnOnce() -> Option<String>,
    ) -> Option<Resolution> {
        let slot = self.slots.get_mut(index)?;
        match slot {
            Slot::Resolved => {
                let height = list
                    .cache()
                    .height(index)
                    .unwrap_or_else(|| list.default_height_for(index));
                Some(Resolution::Ready(height))
            }
            Slot::InFlight { ticket, .. } => Some(Resolution::Pending(*ticket)),
            Slot::Idle => match asset_url() {
                None => {
                    let height = list.default_height_for(index);
                    list.record_height(index, height, None);
                    *slot = Slot::Resolved;
                    Some(Resolution::Ready(height))
                }
                Some(url) => {
                    let ticket = LoadTicket {
                        generation: self.generation,
                        index,
                    };
                    vtrace!(index, url = url.as_str(), "issuing asset load");
                    *slot = Slot::InFlight {
                        ticket,
                        url: url.clone(),
                    };
                    self.in_flight += 1;
                    loader.load(LoadRequest { ticket, url });
                    Some(Resolution::Pending(ticket))
                }
            },
        }
    }

    /// Applies a finished load.
    ///
    /// Failures are recovered locally: the default height is recorded and the error is logged.
    pub fn complete(
        &mut self,
        list: &mut VirtualList,
        ticket: LoadTicket,
        result: LoadResult,
    ) -> LoadOutcome {
        if ticket.generation != self.generation {
            vdebug!(
                index = ticket.index,
                ticket_generation = ticket.generation,
                generation = self.generation,
                "dropping completion from a replaced data set"
            );
            return LoadOutcome::Stale;
        }
        let Some(slot) = self.slots.get_mut(ticket.index) else {
            return LoadOutcome::Stale;
        };
        let url = match core::mem::replace(slot, Slot::Resolved) {
            Slot::InFlight { ticket: t, url } if t == ticket => url,
            other => {
                *slot = other;
                vdebug!(index = ticket.index, "dropping completion for an index not in flight");
                return LoadOutcome::Stale;
            }
        };
        self.in_flight -= 1;

        let index = ticket.index;
        let base = list.default_height_for(index);
        let dims = result.and_then(|dims| {
            if dims.natural_width == 0 || dims.natural_height == 0 {
                Err(AssetError::InvalidDimensions {
                    width: dims.natural_width,
                    height: dims.natural_height,
                })
            } else {
                Ok(dims)
            }
        });

        match dims {
            Ok(dims) => {
                let display_width = list.display_width();
                let info = AssetInfo::measure(url, dims, display_width);
                let height = base.saturating_add(info.display_extent());
                vtrace!(index, height, "asset measured");
                list.record_height(index, height, Some(display_width));
                self.assets.insert(index, info);
                LoadOutcome::Measured { index, height }
            }
            Err(error) => {
                vwarn!(
                    index,
                    url = url.as_str(),
                    %error,
                    "asset load failed; using default height"
                );
                list.record_height(index, base, None);
                LoadOutcome::Fallback {
                    index,
                    height: base,
                    error,
                }
            }
        }
    }

    /// Recomputes the cached heights whose width basis differs from the list's display width.
    ///
    /// Natural dimensions are kept from the first load, so no asset is fetched again.
    /// Returns the number of heights that changed.
    pub fn remeasure(&mut self, list: &mut VirtualList) -> usize {
        let display_width = list.display_width();
        let stale: Vec<usize> = list.cache().stale_for_width(display_width).collect();
        let mut changed = 0usize;
        for index in stale {
            let Some(info) = self.assets.get_mut(&index) else {
                continue;
            };
            info.remeasure(display_width);
            let height = list
                .default_height_for(index)
                .saturating_add(info.display_extent());
            if list.remeasure_height(index, height, display_width) {
                changed += 1;
            }
        }
        vdebug!(display_width, changed, "remeasured assets");
        changed
    }
}
