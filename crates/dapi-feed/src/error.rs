//! Feed error types.

use dapi_core::CoreError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    #[error("Timestamp {timestamp} invalid at {now}")]
    TimestampInvalid { timestamp: u32, now: u32 },

    #[error("Signature invalid")]
    SignatureInvalid,

    #[error("Timestamp {proposed} not newer than stored {stored}")]
    TimestampNotNewer { stored: u32, proposed: u32 },

    #[error("Data feed not initialized")]
    DataFeedNotInitialized,

    #[error("Specified {0} Beacons, at least 2 required")]
    LessThanTwoBeacons(usize),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl FeedError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TimestampInvalid { .. } => "timestamp_invalid",
            Self::SignatureInvalid => "signature_invalid",
            Self::TimestampNotNewer { .. } => "timestamp_not_newer",
            Self::DataFeedNotInitialized => "data_feed_not_initialized",
            Self::LessThanTwoBeacons(_) => "less_than_two_beacons",
            Self::Core(CoreError::DataLengthInvalid(_)) => "data_length_invalid",
            Self::Core(CoreError::ValueOutOfRange) => "value_out_of_range",
            Self::Core(_) => "invalid_input",
        }
    }
}

pub type FeedResult<T> = Result<T, FeedError>;
