//! Publish-subscribe protocol (PSP) support.
//!
//! The delivery layer stores subscriptions and relays fulfilments; this
//! crate holds what the data feed server needs from that protocol:
//! - `ConditionParameters`: the 96-byte condition encoding
//! - `condition`: whether a push update is due (deviation or heartbeat)
//! - `SubscriptionRegistry`: registered update subscriptions

pub mod condition;
pub mod error;
pub mod subscription;

pub use condition::{
    calculate_deviation, condition_beacon_set_update, condition_beacon_update, is_update_due,
    ConditionParameters, CONDITION_PARAMETERS_LENGTH, HUNDRED_PERCENT,
};
pub use error::{PspError, PspResult};
pub use subscription::{Subscription, SubscriptionRegistry, UpdateTarget};
