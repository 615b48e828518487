//! Read API.
//!
//! Plain reads see the base store. Reads made on behalf of an OEV proxy see
//! the proxy's overlay wherever it is strictly newer than the base feed.

use crate::error::{ServerError, ServerResult};
use crate::server::{DapiServer, Ledger};
use alloy::primitives::Address;
use dapi_core::{DapiName, DapiNameHash, DataFeed, DataFeedId};
use dapi_feed::FeedError;
use dapi_oev::resolve;

impl Ledger {
    fn resolve_dapi_name(&self, dapi_name_hash: DapiNameHash) -> ServerResult<DataFeedId> {
        self.dapi_names
            .get(&dapi_name_hash)
            .copied()
            .ok_or(ServerError::AliasNotSet(dapi_name_hash))
    }

    fn read_as_oev_proxy(
        &self,
        oev_proxy: Address,
        data_feed_id: DataFeedId,
    ) -> ServerResult<DataFeed> {
        let feed = resolve(
            self.feeds.get(&data_feed_id),
            self.oev.overlay_feed(oev_proxy, data_feed_id),
        );
        if !feed.is_initialized() {
            return Err(FeedError::DataFeedNotInitialized.into());
        }
        Ok(feed)
    }
}

impl DapiServer {
    pub fn read_data_feed_with_id(&self, data_feed_id: DataFeedId) -> ServerResult<DataFeed> {
        Ok(self.ledger.read().feeds.read(&data_feed_id)?)
    }

    pub fn read_data_feed_with_dapi_name_hash(
        &self,
        dapi_name_hash: DapiNameHash,
    ) -> ServerResult<DataFeed> {
        let ledger = self.ledger.read();
        let data_feed_id = ledger.resolve_dapi_name(dapi_name_hash)?;
        Ok(ledger.feeds.read(&data_feed_id)?)
    }

    pub fn read_data_feed_with_dapi_name(&self, dapi_name: DapiName) -> ServerResult<DataFeed> {
        self.read_data_feed_with_dapi_name_hash(dapi_name.hash())
    }

    /// Newer of the base feed and the proxy's overlay.
    pub fn read_data_feed_with_id_as_oev_proxy(
        &self,
        oev_proxy: Address,
        data_feed_id: DataFeedId,
    ) -> ServerResult<DataFeed> {
        self.ledger.read().read_as_oev_proxy(oev_proxy, data_feed_id)
    }

    pub fn read_data_feed_with_dapi_name_hash_as_oev_proxy(
        &self,
        oev_proxy: Address,
        dapi_name_hash: DapiNameHash,
    ) -> ServerResult<DataFeed> {
        let ledger = self.ledger.read();
        let data_feed_id = ledger.resolve_dapi_name(dapi_name_hash)?;
        ledger.read_as_oev_proxy(oev_proxy, data_feed_id)
    }
}
