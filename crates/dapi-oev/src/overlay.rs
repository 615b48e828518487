//! Per-proxy overlay of the data feed store.

use alloy::primitives::Address;
use dapi_core::{DataFeed, DataFeedId};
use dapi_feed::FeedStore;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Overlay slot: one feed as seen by one OEV proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OverlayKey {
    pub oev_proxy: Address,
    pub data_feed_id: DataFeedId,
}

impl OverlayKey {
    pub fn new(oev_proxy: Address, data_feed_id: DataFeedId) -> Self {
        Self {
            oev_proxy,
            data_feed_id,
        }
    }
}

impl fmt::Display for OverlayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.oev_proxy, self.data_feed_id)
    }
}

/// Same store, partitioned by proxy.
pub type OverlayStore = FeedStore<OverlayKey>;

/// The feed a reader presenting an OEV proxy sees: the overlay wins only
/// when it is strictly newer than the base feed.
pub fn resolve(base: DataFeed, overlay: DataFeed) -> DataFeed {
    if overlay.timestamp > base.timestamp {
        overlay
    } else {
        base
    }
}
