//! Update requests accepted by the node, one JSON object per line.

use alloy::primitives::{Address, Bytes};
use dapi_core::{DapiName, DataFeedId, SignedData, SubscriptionId};
use dapi_oev::{OevBid, OevUpdateRequest};
use dapi_psp::{ConditionParameters, UpdateTarget};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    UpdateBeacon {
        signed: SignedData,
    },
    UpdateBeaconSet {
        beacon_ids: Vec<DataFeedId>,
    },
    SetDapiName {
        caller: Address,
        dapi_name: DapiName,
        data_feed_id: DataFeedId,
    },
    RegisterSubscription {
        caller: Address,
        target: UpdateTarget,
        conditions: ConditionParameters,
        relayer: Address,
        sponsor: Address,
    },
    FulfillBeacon {
        subscription_id: SubscriptionId,
        airnode: Address,
        timestamp: u32,
        data: Bytes,
        signature: Bytes,
    },
    FulfillBeaconSet {
        subscription_id: SubscriptionId,
    },
    OevUpdate {
        request: OevUpdateRequest,
        bid: OevBid,
    },
    Withdraw {
        oev_proxy: Address,
    },
}

impl Request {
    /// Operation name for logs.
    pub fn op(&self) -> &'static str {
        match self {
            Self::UpdateBeacon { .. } => "update_beacon",
            Self::UpdateBeaconSet { .. } => "update_beacon_set",
            Self::SetDapiName { .. } => "set_dapi_name",
            Self::RegisterSubscription { .. } => "register_subscription",
            Self::FulfillBeacon { .. } => "fulfill_beacon",
            Self::FulfillBeaconSet { .. } => "fulfill_beacon_set",
            Self::OevUpdate { .. } => "oev_update",
            Self::Withdraw { .. } => "withdraw",
        }
    }
}
