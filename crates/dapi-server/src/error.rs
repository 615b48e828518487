//! Server error types.

use alloy::primitives::Address;
use dapi_core::{DapiNameHash, Role};
use dapi_feed::FeedError;
use dapi_oev::OevError;
use dapi_psp::PspError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServerError {
    #[error("{principal} is not a {role}")]
    Unauthorized { role: Role, principal: Address },

    #[error("dAPI name zero")]
    DapiNameZero,

    #[error("dAPI name not set: {0}")]
    AliasNotSet(DapiNameHash),

    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error(transparent)]
    Psp(#[from] PspError),

    #[error(transparent)]
    Oev(#[from] OevError),
}

impl ServerError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "unauthorized",
            Self::DapiNameZero => "dapi_name_zero",
            Self::AliasNotSet(_) => "alias_not_set",
            Self::Feed(e) => e.kind(),
            Self::Psp(e) => e.kind(),
            Self::Oev(e) => e.kind(),
        }
    }

    /// Whether this is a lost race against a newer or equal update.
    pub fn is_timestamp_not_newer(&self) -> bool {
        matches!(
            self,
            Self::Feed(FeedError::TimestampNotNewer { .. })
                | Self::Psp(PspError::Feed(FeedError::TimestampNotNewer { .. }))
                | Self::Oev(OevError::Feed(FeedError::TimestampNotNewer { .. }))
        )
    }
}

pub type ServerResult<T> = Result<T, ServerError>;
