//! Signed-update verification.
//!
//! Checks run in a fixed order so that callers see a deterministic reason:
//! 1. timestamp inside the freshness window
//! 2. payload is exactly one 32-byte word
//! 3. signature recovers to the claimed Airnode
//! 4. decoded value fits in int224
//!
//! Monotonicity is checked by the store at write time.

use crate::error::{FeedError, FeedResult};
use alloy::primitives::{Address, PrimitiveSignature, B256};
use dapi_core::{decode_int_word, DataFeed, DataFeedId, FeedValue, SignedData};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Acceptance range for update timestamps: `[now - max_age, now + max_lead]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreshnessWindow {
    /// How far in the past a timestamp may be (seconds). Default: 3600.
    #[serde(default = "default_max_age_secs")]
    pub max_age_secs: u32,
    /// How far in the future a timestamp may be (seconds). Default: 900.
    #[serde(default = "default_max_lead_secs")]
    pub max_lead_secs: u32,
}

fn default_max_age_secs() -> u32 {
    3600
}

fn default_max_lead_secs() -> u32 {
    900
}

impl Default for FreshnessWindow {
    fn default() -> Self {
        Self {
            max_age_secs: default_max_age_secs(),
            max_lead_secs: default_max_lead_secs(),
        }
    }
}

impl FreshnessWindow {
    pub fn check(&self, timestamp: u32, now: u32) -> FeedResult<()> {
        let ts = u64::from(timestamp);
        let now64 = u64::from(now);
        if ts + u64::from(self.max_age_secs) < now64 || ts > now64 + u64::from(self.max_lead_secs)
        {
            return Err(FeedError::TimestampInvalid { timestamp, now });
        }
        Ok(())
    }
}

/// A signed update that passed every check except monotonicity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifiedUpdate {
    pub beacon_id: DataFeedId,
    pub feed: DataFeed,
}

/// Stateless verifier for Airnode-signed data.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignedDataVerifier {
    window: FreshnessWindow,
}

impl SignedDataVerifier {
    #[must_use]
    pub fn new(window: FreshnessWindow) -> Self {
        Self { window }
    }

    /// Verify a plain signed update.
    pub fn verify(&self, signed: &SignedData, now: u32) -> FeedResult<VerifiedUpdate> {
        self.verify_prehashed(signed, signed.message_hash(), now)
    }

    /// Verify `signed` against a caller-computed message hash.
    ///
    /// Used where the signed message binds more than the payload, such as
    /// OEV updates.
    pub fn verify_prehashed(
        &self,
        signed: &SignedData,
        message_hash: B256,
        now: u32,
    ) -> FeedResult<VerifiedUpdate> {
        self.window.check(signed.timestamp, now)?;
        let raw = decode_int_word(&signed.data)?;

        let recovered = recover_signer(message_hash, &signed.signature)?;
        if recovered != signed.airnode {
            warn!(
                airnode = %signed.airnode,
                recovered = %recovered,
                "Signature does not match Airnode"
            );
            return Err(FeedError::SignatureInvalid);
        }

        let value = FeedValue::new(raw)?;
        Ok(VerifiedUpdate {
            beacon_id: signed.beacon_id(),
            feed: DataFeed::new(value, signed.timestamp),
        })
    }
}

/// Recover the address that signed `message_hash` as an EIP-191 message.
pub fn recover_signer(message_hash: B256, signature: &[u8]) -> FeedResult<Address> {
    let signature =
        PrimitiveSignature::from_raw(signature).map_err(|_| FeedError::SignatureInvalid)?;
    signature
        .recover_address_from_msg(message_hash.as_slice())
        .map_err(|_| FeedError::SignatureInvalid)
}
