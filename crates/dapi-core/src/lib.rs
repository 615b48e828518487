//! Core domain types for the dAPI data feed server.
//!
//! This crate provides the types shared by every component:
//! - `DataFeedId`, `TemplateId`, `DapiName`: content-derived identifiers
//! - `FeedValue`: the int224 value domain
//! - `DataFeed`: `(value, timestamp)` as stored
//! - `SignedData`: an Airnode-signed update
//! - `Clock` and the external collaborator traits

pub mod clock;
pub mod data_feed;
pub mod error;
pub mod external;
pub mod ids;
pub mod signed;
pub mod value;

pub use clock::{Clock, ManualClock, SystemClock};
pub use data_feed::DataFeed;
pub use error::{CoreError, Result};
pub use external::{AccessControl, BeneficiaryResolver, Role, TransferError, ValueTransfer};
pub use ids::{DapiName, DapiNameHash, DataFeedId, SubscriptionId, TemplateId, UpdateId};
pub use signed::{message_hash, SignedData};
pub use value::{decode_int_word, uint_word, FeedValue, WORD_SIZE};
