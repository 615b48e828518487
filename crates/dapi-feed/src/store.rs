//! Fixed-range numeric store.
//!
//! Maps a key to its latest `DataFeed`. Writes are accepted only when the
//! new timestamp is strictly greater than the stored one; that single rule
//! is what resolves racing updates. Unknown keys read as the zero feed.

use crate::error::{FeedError, FeedResult};
use dapi_core::{DataFeed, DataFeedId};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Monotonic data feed store.
#[derive(Debug, Clone)]
pub struct FeedStore<K = DataFeedId> {
    feeds: HashMap<K, DataFeed>,
}

impl<K> Default for FeedStore<K> {
    fn default() -> Self {
        Self {
            feeds: HashMap::new(),
        }
    }
}

impl<K> FeedStore<K>
where
    K: Copy + Eq + Hash + Debug,
{
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored feed, or the zero feed if never written.
    #[must_use]
    pub fn get(&self, key: &K) -> DataFeed {
        self.feeds.get(key).copied().unwrap_or_default()
    }

    /// Stored feed, failing if it was never initialized.
    pub fn read(&self, key: &K) -> FeedResult<DataFeed> {
        let feed = self.get(key);
        if !feed.is_initialized() {
            return Err(FeedError::DataFeedNotInitialized);
        }
        Ok(feed)
    }

    /// Check that `timestamp` would advance the feed at `key`.
    pub fn ensure_newer(&self, key: &K, timestamp: u32) -> FeedResult<()> {
        let stored = self.get(key).timestamp;
        if timestamp <= stored {
            return Err(FeedError::TimestampNotNewer {
                stored,
                proposed: timestamp,
            });
        }
        Ok(())
    }

    /// Write `feed` at `key` if it is newer than what is stored.
    pub fn update(&mut self, key: K, feed: DataFeed) -> FeedResult<()> {
        self.ensure_newer(&key, feed.timestamp)?;
        self.feeds.insert(key, feed);
        Ok(())
    }

    /// Number of initialized feeds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.feeds.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.feeds.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &DataFeed)> {
        self.feeds.iter()
    }
}
