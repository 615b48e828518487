//! The `(value, timestamp)` pair every feed store holds.

use crate::value::FeedValue;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Latest value of a data feed.
///
/// A feed is initialized iff `timestamp != 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DataFeed {
    pub value: FeedValue,
    /// Unix seconds.
    pub timestamp: u32,
}

impl DataFeed {
    pub fn new(value: FeedValue, timestamp: u32) -> Self {
        Self { value, timestamp }
    }

    pub fn is_initialized(&self) -> bool {
        self.timestamp != 0
    }
}

impl fmt::Display for DataFeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.value, self.timestamp)
    }
}
