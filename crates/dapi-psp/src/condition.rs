//! Push-update condition evaluation.
//!
//! An update is due when the candidate deviates from the stored value by at
//! least the threshold, or when the stored value is older than the heartbeat
//! interval. Deviation is measured relative to the distance between the
//! stored value and a deviation reference:
//!
//! ```text
//! |candidate - stored| * HUNDRED_PERCENT / |stored - reference|
//! ```
//!
//! When `stored == reference` the deviation is treated as infinite. The
//! evaluator never mutates state.

use crate::error::PspResult;
use alloy::primitives::U256;
use dapi_core::{CoreError, DataFeed, DataFeedId, FeedValue, WORD_SIZE};
use dapi_feed::{aggregate_beacons, FeedStore};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Deviation thresholds are expressed in hundred-millionths.
pub const HUNDRED_PERCENT: u64 = 100_000_000;

/// Encoded length of `ConditionParameters`.
pub const CONDITION_PARAMETERS_LENGTH: usize = 3 * WORD_SIZE;

/// Decoded condition parameters of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionParameters {
    /// In hundred-millionths, e.g. `10_000_000` for 10%.
    pub deviation_threshold: U256,
    pub deviation_reference: FeedValue,
    /// Seconds.
    pub heartbeat_interval: u32,
}

impl ConditionParameters {
    /// Decode `word(threshold) ‖ word(int224 reference) ‖ word(uint32 heartbeat)`.
    pub fn decode(bytes: &[u8]) -> PspResult<Self> {
        if bytes.len() != CONDITION_PARAMETERS_LENGTH {
            return Err(CoreError::IncorrectParameterLength {
                expected: CONDITION_PARAMETERS_LENGTH,
                actual: bytes.len(),
            }
            .into());
        }
        let (threshold, rest) = bytes.split_at(WORD_SIZE);
        let (reference, heartbeat) = rest.split_at(WORD_SIZE);

        Ok(Self {
            deviation_threshold: U256::from_be_slice(threshold),
            deviation_reference: FeedValue::from_data(reference)?,
            heartbeat_interval: decode_u32_word(heartbeat)?,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(CONDITION_PARAMETERS_LENGTH);
        out.extend_from_slice(&self.deviation_threshold.to_be_bytes::<WORD_SIZE>());
        out.extend_from_slice(&self.deviation_reference.to_word());
        out.extend_from_slice(&dapi_core::uint_word(self.heartbeat_interval));
        out
    }
}

fn decode_u32_word(word: &[u8]) -> PspResult<u32> {
    let (high, low) = word.split_at(WORD_SIZE - 4);
    let invalid = || CoreError::IncorrectParameterLength {
        expected: 4,
        actual: WORD_SIZE - high.iter().take_while(|b| **b == 0).count(),
    };
    if high.iter().any(|b| *b != 0) {
        return Err(invalid().into());
    }
    let low: [u8; 4] = low.try_into().map_err(|_| invalid())?;
    Ok(u32::from_be_bytes(low))
}

/// Relative deviation of `updated` from `initial`, in hundred-millionths.
///
/// Returns `U256::MAX` when `initial` equals `reference`.
pub fn calculate_deviation(initial: FeedValue, updated: FeedValue, reference: FeedValue) -> U256 {
    if initial == reference {
        return U256::MAX;
    }
    let delta = (updated.inner() - initial.inner()).unsigned_abs();
    let base = (initial.inner() - reference.inner()).unsigned_abs();
    delta.saturating_mul(U256::from(HUNDRED_PERCENT)) / base
}

/// Whether replacing `current` with `candidate` is due under `params`.
pub fn is_update_due(
    current: &DataFeed,
    candidate: &DataFeed,
    params: &ConditionParameters,
    now: u32,
) -> bool {
    if !current.is_initialized() {
        return candidate.is_initialized();
    }
    let deviation = calculate_deviation(current.value, candidate.value, params.deviation_reference);
    if deviation >= params.deviation_threshold {
        return true;
    }
    u64::from(now) >= u64::from(current.timestamp) + u64::from(params.heartbeat_interval)
}

/// Condition for a Beacon subscription; `data` is the candidate payload.
pub fn condition_beacon_update(
    store: &FeedStore,
    beacon_id: DataFeedId,
    data: &[u8],
    params: &ConditionParameters,
    now: u32,
) -> PspResult<bool> {
    let candidate = DataFeed::new(FeedValue::from_data(data)?, now);
    let current = store.get(&beacon_id);
    let due = is_update_due(&current, &candidate, params, now);
    debug!(
        beacon_id = %beacon_id,
        current = %current,
        candidate = %candidate,
        due,
        "Beacon update condition evaluated"
    );
    Ok(due)
}

/// Condition for a Beacon set subscription; the candidate is the current aggregate.
pub fn condition_beacon_set_update(
    store: &FeedStore,
    beacon_ids: &[DataFeedId],
    params: &ConditionParameters,
    now: u32,
) -> PspResult<bool> {
    let candidate = aggregate_beacons(store, beacon_ids)?;
    let beacon_set_id = DataFeedId::beacon_set(beacon_ids);
    let current = store.get(&beacon_set_id);
    let due = is_update_due(&current, &candidate, params, now);
    debug!(
        beacon_set_id = %beacon_set_id,
        current = %current,
        candidate = %candidate,
        due,
        "Beacon set update condition evaluated"
    );
    Ok(due)
}
