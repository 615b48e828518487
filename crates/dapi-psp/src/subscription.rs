//! Registered PSP update subscriptions.

use crate::condition::ConditionParameters;
use crate::error::{PspError, PspResult};
use alloy::primitives::{keccak256, Address};
use dapi_core::{uint_word, DataFeedId, SubscriptionId, TemplateId};
use dapi_feed::FeedError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

/// What a subscription keeps updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UpdateTarget {
    Beacon {
        airnode: Address,
        template_id: TemplateId,
    },
    BeaconSet {
        beacon_ids: Vec<DataFeedId>,
    },
}

impl UpdateTarget {
    pub fn data_feed_id(&self) -> DataFeedId {
        match self {
            Self::Beacon {
                airnode,
                template_id,
            } => DataFeedId::beacon(*airnode, *template_id),
            Self::BeaconSet { beacon_ids } => DataFeedId::beacon_set(beacon_ids),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Beacon { .. } => "beacon",
            Self::BeaconSet { .. } => "beacon_set",
        }
    }

    fn kind_word(&self) -> [u8; 32] {
        match self {
            Self::Beacon { .. } => uint_word(0u8),
            Self::BeaconSet { .. } => uint_word(1u8),
        }
    }

    fn validate(&self) -> PspResult<()> {
        match self {
            Self::Beacon { airnode, .. } if airnode.is_zero() => Err(PspError::AirnodeAddressZero),
            Self::BeaconSet { beacon_ids } if beacon_ids.len() < 2 => {
                Err(FeedError::LessThanTwoBeacons(beacon_ids.len()).into())
            }
            _ => Ok(()),
        }
    }
}

/// A registered subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub target: UpdateTarget,
    pub condition_parameters: ConditionParameters,
    pub relayer: Address,
    pub sponsor: Address,
}

impl Subscription {
    /// `keccak256(kind ‖ targetId ‖ conditionParameters ‖ relayer ‖ sponsor)`.
    pub fn id(&self) -> SubscriptionId {
        let conditions = self.condition_parameters.encode();
        let mut buf = Vec::with_capacity(64 + conditions.len() + 40);
        buf.extend_from_slice(&self.target.kind_word());
        buf.extend_from_slice(self.target.data_feed_id().0.as_slice());
        buf.extend_from_slice(&conditions);
        buf.extend_from_slice(self.relayer.as_slice());
        buf.extend_from_slice(self.sponsor.as_slice());
        SubscriptionId(keccak256(buf))
    }
}

/// Subscriptions keyed by their derived id.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionRegistry {
    subscriptions: HashMap<SubscriptionId, Subscription>,
}

impl SubscriptionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and register a subscription. Registering the same
    /// subscription again returns the same id.
    pub fn register(
        &mut self,
        target: UpdateTarget,
        condition_parameters: &[u8],
        relayer: Address,
        sponsor: Address,
    ) -> PspResult<SubscriptionId> {
        target.validate()?;
        if relayer.is_zero() {
            return Err(PspError::RelayerAddressZero);
        }
        if sponsor.is_zero() {
            return Err(PspError::SponsorAddressZero);
        }
        let condition_parameters = ConditionParameters::decode(condition_parameters)?;

        let subscription = Subscription {
            target,
            condition_parameters,
            relayer,
            sponsor,
        };
        let id = subscription.id();
        info!(
            subscription_id = %id,
            target = subscription.target.label(),
            data_feed_id = %subscription.target.data_feed_id(),
            relayer = %relayer,
            sponsor = %sponsor,
            "Registered update subscription"
        );
        self.subscriptions.insert(id, subscription);
        Ok(id)
    }

    pub fn get(&self, id: &SubscriptionId) -> PspResult<&Subscription> {
        self.subscriptions
            .get(id)
            .ok_or(PspError::SubscriptionNotRegistered(*id))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}
