//! Median aggregation of Beacons into a Beacon set.
//!
//! Value and timestamp medians are computed independently. For an even
//! number of inputs the two middle elements are averaged with truncation
//! toward zero, so `[-1, -2]` yields `-1`.
//!
//! Uninitialized Beacons read as `(0, 0)` and take part in the median like
//! any reported value. Consumers relying on Beacon sets must make sure their
//! constituents have reported.

use crate::error::{FeedError, FeedResult};
use crate::store::FeedStore;
use alloy::primitives::{I256, U256};
use dapi_core::{DataFeed, DataFeedId, FeedValue};
use tracing::debug;

const TWO: I256 = I256::from_raw(U256::from_limbs([2, 0, 0, 0]));

/// Median of feed values, `None` for an empty slice.
pub fn median_value(values: &[FeedValue]) -> Option<FeedValue> {
    let mut sorted: Vec<I256> = values.iter().map(|v| v.inner()).collect();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    let median = match sorted.len() {
        0 => return None,
        n if n % 2 == 1 => sorted[mid],
        // int224 operands cannot overflow int256; `/` truncates toward zero.
        _ => (sorted[mid - 1] + sorted[mid]) / TWO,
    };
    FeedValue::new(median).ok()
}

/// Median of timestamps, `None` for an empty slice.
pub fn median_timestamp(timestamps: &[u32]) -> Option<u32> {
    let mut sorted = timestamps.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    match sorted.len() {
        0 => None,
        n if n % 2 == 1 => Some(sorted[mid]),
        _ => {
            let sum = u64::from(sorted[mid - 1]) + u64::from(sorted[mid]);
            u32::try_from(sum / 2).ok()
        }
    }
}

/// Aggregate at least two feeds into one.
pub fn aggregate(feeds: &[DataFeed]) -> FeedResult<DataFeed> {
    if feeds.len() < 2 {
        return Err(FeedError::LessThanTwoBeacons(feeds.len()));
    }
    let values: Vec<FeedValue> = feeds.iter().map(|f| f.value).collect();
    let timestamps: Vec<u32> = feeds.iter().map(|f| f.timestamp).collect();

    let value = median_value(&values).ok_or(FeedError::LessThanTwoBeacons(feeds.len()))?;
    let timestamp =
        median_timestamp(&timestamps).ok_or(FeedError::LessThanTwoBeacons(feeds.len()))?;
    Ok(DataFeed::new(value, timestamp))
}

/// Aggregate the currently stored state of `beacon_ids`.
pub fn aggregate_beacons(store: &FeedStore, beacon_ids: &[DataFeedId]) -> FeedResult<DataFeed> {
    let feeds: Vec<DataFeed> = beacon_ids.iter().map(|id| store.get(id)).collect();
    aggregate(&feeds)
}

/// Recompute the Beacon set of `beacon_ids` and write it if newer.
///
/// Returns the Beacon set id and the written feed.
pub fn update_beacon_set(
    store: &mut FeedStore,
    beacon_ids: &[DataFeedId],
) -> FeedResult<(DataFeedId, DataFeed)> {
    let feed = aggregate_beacons(store, beacon_ids)?;
    let beacon_set_id = DataFeedId::beacon_set(beacon_ids);
    store.update(beacon_set_id, feed)?;
    debug!(
        beacon_set_id = %beacon_set_id,
        beacons = beacon_ids.len(),
        value = %feed.value,
        timestamp = feed.timestamp,
        "Beacon set aggregated"
    );
    Ok((beacon_set_id, feed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::B256;

    fn values(raw: &[i64]) -> Vec<FeedValue> {
        raw.iter()
            .map(|v| FeedValue::try_from(*v).unwrap())
            .collect()
    }

    fn v(raw: i64) -> FeedValue {
        FeedValue::try_from(raw).unwrap()
    }

    fn id(byte: u8) -> DataFeedId {
        DataFeedId(B256::repeat_byte(byte))
    }

    #[test]
    fn test_median_odd() {
        assert_eq!(median_value(&values(&[5, 1, 9])), Some(v(5)));
        assert_eq!(median_value(&values(&[7])), Some(v(7)));
    }

    #[test]
    fn test_median_even_truncates_toward_zero() {
        assert_eq!(median_value(&values(&[-1, -2])), Some(v(-1)));
        assert_eq!(median_value(&values(&[3, 4])), Some(v(3)));
        assert_eq!(median_value(&values(&[-3, 4])), Some(v(0)));
        assert_eq!(median_value(&values(&[10, -1, -2, 20])), Some(v(4)));
    }

    #[test]
    fn test_median_extremes_do_not_overflow() {
        let extremes = [FeedValue::MAX, FeedValue::MAX];
        assert_eq!(median_value(&extremes), Some(FeedValue::MAX));

        let extremes = [FeedValue::MIN, FeedValue::MIN];
        assert_eq!(median_value(&extremes), Some(FeedValue::MIN));
    }

    #[test]
    fn test_median_empty() {
        assert_eq!(median_value(&[]), None);
        assert_eq!(median_timestamp(&[]), None);
    }

    #[test]
    fn test_median_timestamp() {
        assert_eq!(median_timestamp(&[300, 100, 200]), Some(200));
        assert_eq!(median_timestamp(&[101, 100]), Some(100));
        assert_eq!(median_timestamp(&[u32::MAX, u32::MAX]), Some(u32::MAX));
    }

    #[test]
    fn test_aggregate_requires_two() {
        assert_eq!(
            aggregate(&[DataFeed::default()]),
            Err(FeedError::LessThanTwoBeacons(1))
        );
    }

    #[test]
    fn test_uninitialized_beacons_participate() {
        let mut store = FeedStore::new();
        store.update(id(1), DataFeed::new(v(100), 1000)).unwrap();
        store.update(id(2), DataFeed::new(v(200), 1002)).unwrap();

        // id(3) never reported: (0, 0) is the median's lowest element.
        let feed = aggregate_beacons(&store, &[id(1), id(2), id(3)]).unwrap();
        assert_eq!(feed, DataFeed::new(v(100), 1000));
    }

    #[test]
    fn test_update_beacon_set_writes_set_id() {
        let mut store = FeedStore::new();
        store.update(id(1), DataFeed::new(v(5), 100)).unwrap();
        store.update(id(2), DataFeed::new(v(1), 200)).unwrap();
        store.update(id(3), DataFeed::new(v(9), 300)).unwrap();

        let ids = [id(1), id(2), id(3)];
        let (set_id, feed) = update_beacon_set(&mut store, &ids).unwrap();

        assert_eq!(set_id, DataFeedId::beacon_set(&ids));
        assert_eq!(feed, DataFeed::new(v(5), 200));
        assert_eq!(store.get(&set_id), feed);
    }

    #[test]
    fn test_update_beacon_set_not_newer() {
        let mut store = FeedStore::new();
        store.update(id(1), DataFeed::new(v(5), 100)).unwrap();
        store.update(id(2), DataFeed::new(v(1), 200)).unwrap();
        let ids = [id(1), id(2)];

        update_beacon_set(&mut store, &ids).unwrap();
        assert_eq!(
            update_beacon_set(&mut store, &ids),
            Err(FeedError::TimestampNotNewer {
                stored: 150,
                proposed: 150
            })
        );
    }

    #[test]
    fn test_all_uninitialized_set_is_not_written() {
        let mut store = FeedStore::new();
        assert!(matches!(
            update_beacon_set(&mut store, &[id(1), id(2)]),
            Err(FeedError::TimestampNotNewer { .. })
        ));
    }
}
