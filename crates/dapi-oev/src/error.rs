//! OEV error types.

use dapi_core::{CoreError, TransferError};
use dapi_feed::FeedError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OevError {
    #[error("OEV proxy address zero")]
    OevProxyAddressZero,

    #[error("Update batch is empty")]
    EmptyBatch,

    #[error("Missing signature")]
    MissingSignature,

    #[error("More signatures than stated: {placeholders} placeholders, {declared} declared")]
    MoreSignaturesThanStated { declared: usize, placeholders: usize },

    #[error("Less signatures than stated: {placeholders} placeholders, {declared} declared")]
    LessSignaturesThanStated { declared: usize, placeholders: usize },

    #[error("OEV proxy balance zero")]
    OevProxyBalanceZero,

    #[error("Beneficiary address zero")]
    BeneficiaryAddressZero,

    #[error("Withdrawal reverted: {0}")]
    WithdrawalReverted(TransferError),

    #[error("Escrow balance overflow")]
    EscrowOverflow,

    #[error(transparent)]
    Feed(#[from] FeedError),
}

impl From<CoreError> for OevError {
    fn from(e: CoreError) -> Self {
        Self::Feed(FeedError::Core(e))
    }
}

impl OevError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::OevProxyAddressZero => "oev_proxy_address_zero",
            Self::EmptyBatch => "empty_batch",
            Self::MissingSignature => "missing_signature",
            Self::MoreSignaturesThanStated { .. } => "more_signatures_than_stated",
            Self::LessSignaturesThanStated { .. } => "less_signatures_than_stated",
            Self::OevProxyBalanceZero => "oev_proxy_balance_zero",
            Self::BeneficiaryAddressZero => "beneficiary_address_zero",
            Self::WithdrawalReverted(_) => "withdrawal_reverted",
            Self::EscrowOverflow => "escrow_overflow",
            Self::Feed(e) => e.kind(),
        }
    }
}

pub type OevResult<T> = Result<T, OevError>;
