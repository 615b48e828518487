//! Data feed storage and the signed-update pipeline.
//!
//! - `FeedStore`: monotonic `(value, timestamp)` store, generic over its key
//!   so the OEV overlay can reuse it
//! - `SignedDataVerifier`: freshness, payload, signature and range checks
//! - `aggregator`: median of Beacons into a Beacon set

pub mod aggregator;
pub mod error;
pub mod store;
pub mod verifier;

pub use aggregator::{
    aggregate, aggregate_beacons, median_timestamp, median_value, update_beacon_set,
};
pub use error::{FeedError, FeedResult};
pub use store::FeedStore;
pub use verifier::{recover_signer, FreshnessWindow, SignedDataVerifier, VerifiedUpdate};
