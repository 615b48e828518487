//! The data feed ledger.
//!
//! `DapiServer` owns every piece of mutable state behind one lock. A write
//! operation holds the write lock for its whole duration, runs every check
//! first and only then commits, so a failed call leaves no trace. Racing
//! writers are ordered by the lock and resolved by the store's
//! strictly-newer timestamp rule.

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use alloy::primitives::{Address, Bytes, U256};
use dapi_core::{
    AccessControl, BeneficiaryResolver, Clock, DapiName, DapiNameHash, DataFeed, DataFeedId,
    Role, SignedData, SubscriptionId, TemplateId, ValueTransfer,
};
use dapi_feed::{update_beacon_set, FeedError, FeedStore, SignedDataVerifier};
use dapi_oev::{OevBid, OevLedger, OevUpdate, OevUpdateRequest, Withdrawal};
use dapi_psp::{
    condition_beacon_set_update, condition_beacon_update, ConditionParameters, PspError,
    SubscriptionRegistry, UpdateTarget,
};
use dapi_telemetry::Metrics;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// A committed write to the base store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataFeedUpdated {
    pub data_feed_id: DataFeedId,
    pub feed: DataFeed,
}

/// The services the server calls out to.
#[derive(Clone)]
pub struct Collaborators {
    pub clock: Arc<dyn Clock>,
    pub access: Arc<dyn AccessControl>,
    pub beneficiaries: Arc<dyn BeneficiaryResolver>,
    pub transfer: Arc<dyn ValueTransfer>,
}

#[derive(Debug, Default)]
pub(crate) struct Ledger {
    pub(crate) feeds: FeedStore,
    pub(crate) dapi_names: HashMap<DapiNameHash, DataFeedId>,
    pub(crate) subscriptions: SubscriptionRegistry,
    pub(crate) oev: OevLedger,
}

/// The dAPI data feed server.
pub struct DapiServer {
    pub(crate) ledger: RwLock<Ledger>,
    verifier: SignedDataVerifier,
    collaborators: Collaborators,
}

impl fmt::Debug for DapiServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DapiServer")
            .field("verifier", &self.verifier)
            .finish_non_exhaustive()
    }
}

impl DapiServer {
    pub fn new(config: &ServerConfig, collaborators: Collaborators) -> Self {
        Self {
            ledger: RwLock::new(Ledger::default()),
            verifier: SignedDataVerifier::new(config.freshness_window()),
            collaborators,
        }
    }

    fn now(&self) -> u32 {
        self.collaborators.clock.now()
    }

    fn authorize(&self, role: Role, principal: Address) -> ServerResult<()> {
        if self.collaborators.access.has_role(role, principal) {
            Ok(())
        } else {
            Err(ServerError::Unauthorized { role, principal })
        }
    }

    // --- Beacons and Beacon sets ---

    /// Verify a signed update and write it to its Beacon.
    pub fn update_beacon_with_signed_data(
        &self,
        signed: &SignedData,
    ) -> ServerResult<DataFeedUpdated> {
        let result = self.apply_signed_data(signed);
        observe("beacon", result)
    }

    fn apply_signed_data(&self, signed: &SignedData) -> ServerResult<DataFeedUpdated> {
        let mut ledger = self.ledger.write();
        let verified = self.verifier.verify(signed, self.now())?;
        ledger.feeds.update(verified.beacon_id, verified.feed)?;
        Ok(committed("beacon", verified.beacon_id, verified.feed))
    }

    /// Aggregate the stored state of `beacon_ids` into their Beacon set.
    pub fn update_beacon_set_with_beacons(
        &self,
        beacon_ids: &[DataFeedId],
    ) -> ServerResult<DataFeedUpdated> {
        let result = {
            let mut ledger = self.ledger.write();
            update_beacon_set(&mut ledger.feeds, beacon_ids)
                .map(|(id, feed)| committed("beacon_set", id, feed))
                .map_err(ServerError::from)
        };
        observe("beacon_set", result)
    }

    /// Stored base feed, zero if never written.
    pub fn data_feeds(&self, data_feed_id: DataFeedId) -> DataFeed {
        self.ledger.read().feeds.get(&data_feed_id)
    }

    // --- dAPI names ---

    /// Point `dapi_name` at `data_feed_id`; a zero id unsets it.
    pub fn set_dapi_name(
        &self,
        caller: Address,
        dapi_name: DapiName,
        data_feed_id: DataFeedId,
    ) -> ServerResult<()> {
        let result = self.assign_dapi_name(caller, dapi_name, data_feed_id);
        observe("set_dapi_name", result)
    }

    fn assign_dapi_name(
        &self,
        caller: Address,
        dapi_name: DapiName,
        data_feed_id: DataFeedId,
    ) -> ServerResult<()> {
        self.authorize(Role::DapiNameSetter, caller)?;
        if dapi_name.is_zero() {
            return Err(ServerError::DapiNameZero);
        }
        let hash = dapi_name.hash();
        let mut ledger = self.ledger.write();
        if data_feed_id.is_zero() {
            ledger.dapi_names.remove(&hash);
        } else {
            ledger.dapi_names.insert(hash, data_feed_id);
        }
        info!(
            dapi_name = %dapi_name,
            data_feed_id = %data_feed_id,
            caller = %caller,
            "dAPI name set"
        );
        Ok(())
    }

    pub fn dapi_name_to_data_feed_id(&self, dapi_name: DapiName) -> DataFeedId {
        self.dapi_name_hash_to_data_feed_id(dapi_name.hash())
    }

    pub fn dapi_name_hash_to_data_feed_id(&self, dapi_name_hash: DapiNameHash) -> DataFeedId {
        self.ledger
            .read()
            .dapi_names
            .get(&dapi_name_hash)
            .copied()
            .unwrap_or(DataFeedId::ZERO)
    }

    // --- PSP ---

    pub fn register_beacon_update_subscription(
        &self,
        caller: Address,
        airnode: Address,
        template_id: TemplateId,
        condition_parameters: &[u8],
        relayer: Address,
        sponsor: Address,
    ) -> ServerResult<SubscriptionId> {
        let target = UpdateTarget::Beacon {
            airnode,
            template_id,
        };
        let result =
            self.register_subscription(caller, target, condition_parameters, relayer, sponsor);
        observe("register_subscription", result)
    }

    pub fn register_beacon_set_update_subscription(
        &self,
        caller: Address,
        beacon_ids: Vec<DataFeedId>,
        condition_parameters: &[u8],
        relayer: Address,
        sponsor: Address,
    ) -> ServerResult<SubscriptionId> {
        let target = UpdateTarget::BeaconSet { beacon_ids };
        let result =
            self.register_subscription(caller, target, condition_parameters, relayer, sponsor);
        observe("register_subscription", result)
    }

    fn register_subscription(
        &self,
        caller: Address,
        target: UpdateTarget,
        condition_parameters: &[u8],
        relayer: Address,
        sponsor: Address,
    ) -> ServerResult<SubscriptionId> {
        self.authorize(Role::SubscriptionRegistrar, caller)?;
        let mut ledger = self.ledger.write();
        Ok(ledger
            .subscriptions
            .register(target, condition_parameters, relayer, sponsor)?)
    }

    /// Whether pushing `data` to the subscription's Beacon is due.
    pub fn condition_psp_beacon_update(
        &self,
        subscription_id: SubscriptionId,
        data: &[u8],
        condition_parameters: &[u8],
    ) -> ServerResult<bool> {
        let ledger = self.ledger.read();
        let params = ConditionParameters::decode(condition_parameters)?;
        let beacon_id = match &ledger.subscriptions.get(&subscription_id)?.target {
            target @ UpdateTarget::Beacon { .. } => target.data_feed_id(),
            UpdateTarget::BeaconSet { .. } => {
                return Err(PspError::TargetMismatch(subscription_id, "Beacon").into())
            }
        };
        let due = condition_beacon_update(&ledger.feeds, beacon_id, data, &params, self.now())?;
        Metrics::condition_checked("beacon", due);
        Ok(due)
    }

    /// Whether aggregating the subscription's Beacon set is due.
    pub fn condition_psp_beacon_set_update(
        &self,
        subscription_id: SubscriptionId,
        condition_parameters: &[u8],
    ) -> ServerResult<bool> {
        let ledger = self.ledger.read();
        let params = ConditionParameters::decode(condition_parameters)?;
        let beacon_ids = match &ledger.subscriptions.get(&subscription_id)?.target {
            UpdateTarget::BeaconSet { beacon_ids } => beacon_ids,
            UpdateTarget::Beacon { .. } => {
                return Err(PspError::TargetMismatch(subscription_id, "Beacon set").into())
            }
        };
        let due = condition_beacon_set_update(&ledger.feeds, beacon_ids, &params, self.now())?;
        Metrics::condition_checked("beacon_set", due);
        Ok(due)
    }

    /// Delivery callback for a Beacon subscription.
    ///
    /// The payload is verified again regardless of how it was delivered.
    pub fn fulfill_psp_beacon_update(
        &self,
        subscription_id: SubscriptionId,
        airnode: Address,
        timestamp: u32,
        data: Bytes,
        signature: Bytes,
    ) -> ServerResult<DataFeedUpdated> {
        let result = self.apply_psp_beacon(subscription_id, airnode, timestamp, data, signature);
        observe("psp_beacon", result)
    }

    fn apply_psp_beacon(
        &self,
        subscription_id: SubscriptionId,
        airnode: Address,
        timestamp: u32,
        data: Bytes,
        signature: Bytes,
    ) -> ServerResult<DataFeedUpdated> {
        let mut ledger = self.ledger.write();
        let template_id = match &ledger.subscriptions.get(&subscription_id)?.target {
            UpdateTarget::Beacon {
                airnode: subscribed,
                template_id,
            } => {
                if *subscribed != airnode {
                    return Err(FeedError::SignatureInvalid.into());
                }
                *template_id
            }
            UpdateTarget::BeaconSet { .. } => {
                return Err(PspError::TargetMismatch(subscription_id, "Beacon").into())
            }
        };
        let signed = SignedData {
            airnode,
            template_id,
            timestamp,
            data,
            signature,
        };
        let verified = self.verifier.verify(&signed, self.now())?;
        ledger.feeds.update(verified.beacon_id, verified.feed)?;
        Ok(committed("psp_beacon", verified.beacon_id, verified.feed))
    }

    /// Delivery callback for a Beacon set subscription.
    pub fn fulfill_psp_beacon_set_update(
        &self,
        subscription_id: SubscriptionId,
    ) -> ServerResult<DataFeedUpdated> {
        let result = self.apply_psp_beacon_set(subscription_id);
        observe("psp_beacon_set", result)
    }

    fn apply_psp_beacon_set(
        &self,
        subscription_id: SubscriptionId,
    ) -> ServerResult<DataFeedUpdated> {
        let mut ledger = self.ledger.write();
        let Ledger {
            feeds,
            subscriptions,
            ..
        } = &mut *ledger;
        match &subscriptions.get(&subscription_id)?.target {
            UpdateTarget::BeaconSet { beacon_ids } => {
                let (id, feed) = update_beacon_set(feeds, beacon_ids)?;
                Ok(committed("psp_beacon_set", id, feed))
            }
            UpdateTarget::Beacon { .. } => {
                Err(PspError::TargetMismatch(subscription_id, "Beacon set").into())
            }
        }
    }

    // --- OEV ---

    /// Apply an auction winner's update to the proxy's overlay and escrow the bid.
    pub fn update_oev_proxy_data_feed_with_signed_data(
        &self,
        request: &OevUpdateRequest,
        bid: &OevBid,
    ) -> ServerResult<OevUpdate> {
        let result = {
            let mut ledger = self.ledger.write();
            let Ledger { feeds, oev, .. } = &mut *ledger;
            oev.update(feeds, &self.verifier, request, bid, self.now())
                .map_err(ServerError::from)
        };
        if result.is_ok() {
            Metrics::feed_updated("oev");
            Metrics::oev_bid_credited();
        }
        observe("oev", result)
    }

    /// Pay the proxy's escrow to its beneficiary. Anyone may call this.
    pub fn withdraw(&self, oev_proxy: Address) -> ServerResult<Withdrawal> {
        let result = {
            let mut ledger = self.ledger.write();
            ledger
                .oev
                .withdraw(
                    oev_proxy,
                    self.collaborators.beneficiaries.as_ref(),
                    self.collaborators.transfer.as_ref(),
                )
                .map_err(ServerError::from)
        };
        Metrics::oev_withdrawal(result.is_ok());
        observe("withdraw", result)
    }

    pub fn oev_proxy_to_balance(&self, oev_proxy: Address) -> U256 {
        self.ledger.read().oev.balance(&oev_proxy)
    }

    /// Stored overlay feed, zero if never written.
    pub fn oev_proxy_data_feed(&self, oev_proxy: Address, data_feed_id: DataFeedId) -> DataFeed {
        self.ledger.read().oev.overlay_feed(oev_proxy, data_feed_id)
    }
}

fn committed(kind: &'static str, data_feed_id: DataFeedId, feed: DataFeed) -> DataFeedUpdated {
    Metrics::feed_updated(kind);
    info!(
        kind,
        feed_id = %data_feed_id,
        value = %feed.value,
        timestamp = feed.timestamp,
        "Data feed updated"
    );
    DataFeedUpdated { data_feed_id, feed }
}

fn observe<T>(kind: &'static str, result: ServerResult<T>) -> ServerResult<T> {
    if let Err(e) = &result {
        Metrics::update_rejected(kind, e.kind());
        if e.is_timestamp_not_newer() {
            debug!(kind, error = %e, "Update lost race");
        } else {
            info!(kind, reason = e.kind(), error = %e, "Update rejected");
        }
    }
    result
}
