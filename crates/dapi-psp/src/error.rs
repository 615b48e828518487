//! PSP error types.

use dapi_core::{CoreError, SubscriptionId};
use dapi_feed::FeedError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PspError {
    #[error("Subscription not registered: {0}")]
    SubscriptionNotRegistered(SubscriptionId),

    #[error("Subscription {0} does not target a {1}")]
    TargetMismatch(SubscriptionId, &'static str),

    #[error("Airnode address zero")]
    AirnodeAddressZero,

    #[error("Relayer address zero")]
    RelayerAddressZero,

    #[error("Sponsor address zero")]
    SponsorAddressZero,

    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl PspError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SubscriptionNotRegistered(_) => "subscription_not_registered",
            Self::TargetMismatch(..) => "target_mismatch",
            Self::AirnodeAddressZero => "airnode_address_zero",
            Self::RelayerAddressZero => "relayer_address_zero",
            Self::SponsorAddressZero => "sponsor_address_zero",
            Self::Feed(e) => e.kind(),
            Self::Core(CoreError::IncorrectParameterLength { .. }) => "incorrect_parameter_length",
            Self::Core(e) => FeedError::Core(e.clone()).kind(),
        }
    }
}

pub type PspResult<T> = Result<T, PspError>;
