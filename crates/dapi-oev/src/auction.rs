//! OEV shadow-feed updates.
//!
//! The auction winner submits a batch of signed entries for one feed and
//! pays a bid. A single entry updates a Beacon; several entries must line up
//! with the constituents of a Beacon set, where placeholders stand in for
//! Beacons the winner has no fresh signature for and take their currently
//! stored base value. The result is written to the proxy's overlay only, and
//! the bid is escrowed for the proxy's beneficiary.

use crate::error::{OevError, OevResult};
use crate::escrow::{EscrowBook, Withdrawal};
use crate::overlay::{OverlayKey, OverlayStore};
use crate::signed::{oev_message_hash, OevBid};
use alloy::primitives::{Address, U256};
use dapi_core::{BeneficiaryResolver, DataFeed, DataFeedId, SignedData, UpdateId, ValueTransfer};
use dapi_feed::{aggregate, FeedStore, SignedDataVerifier};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::info;

/// One OEV update call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OevUpdateRequest {
    pub oev_proxy: Address,
    pub update_id: UpdateId,
    /// Number of placeholder entries the caller declares.
    #[serde(default)]
    pub placeholder_count: usize,
    pub entries: Vec<SignedData>,
}

/// Result of a committed OEV update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OevUpdate {
    pub key: OverlayKey,
    pub feed: DataFeed,
    /// Escrow balance of the proxy after the bid was credited.
    pub balance: U256,
}

/// Overlay feeds and escrow, the state the auction owns.
#[derive(Debug, Clone, Default)]
pub struct OevLedger {
    overlay: OverlayStore,
    escrow: EscrowBook,
}

impl OevLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overlay feed of `oev_proxy` for `data_feed_id` (zero if never written).
    #[must_use]
    pub fn overlay_feed(&self, oev_proxy: Address, data_feed_id: DataFeedId) -> DataFeed {
        self.overlay.get(&OverlayKey::new(oev_proxy, data_feed_id))
    }

    #[must_use]
    pub fn balance(&self, oev_proxy: &Address) -> U256 {
        self.escrow.balance(oev_proxy)
    }

    /// Verify, aggregate and commit an OEV update.
    ///
    /// Nothing is written unless every check passes.
    pub fn update(
        &mut self,
        base: &FeedStore,
        verifier: &SignedDataVerifier,
        request: &OevUpdateRequest,
        bid: &OevBid,
        now: u32,
    ) -> OevResult<OevUpdate> {
        if request.oev_proxy.is_zero() {
            return Err(OevError::OevProxyAddressZero);
        }
        let (data_feed_id, feed) = match request.entries.as_slice() {
            [] => return Err(OevError::EmptyBatch),
            [entry] => {
                if entry.signature.is_empty() {
                    return Err(OevError::MissingSignature);
                }
                check_placeholder_count(request.placeholder_count, 0)?;
                let feed = verify_entry(verifier, request, bid, entry, now)?;
                (entry.beacon_id(), feed)
            }
            entries => {
                let placeholders = entries.iter().filter(|e| e.is_placeholder()).count();
                check_placeholder_count(request.placeholder_count, placeholders)?;

                let mut beacon_ids = Vec::with_capacity(entries.len());
                let mut feeds = Vec::with_capacity(entries.len());
                for entry in entries {
                    let beacon_id = entry.beacon_id();
                    let feed = if entry.is_placeholder() {
                        base.get(&beacon_id)
                    } else {
                        verify_entry(verifier, request, bid, entry, now)?
                    };
                    beacon_ids.push(beacon_id);
                    feeds.push(feed);
                }
                (DataFeedId::beacon_set(&beacon_ids), aggregate(&feeds)?)
            }
        };

        let key = OverlayKey::new(request.oev_proxy, data_feed_id);
        self.overlay.ensure_newer(&key, feed.timestamp)?;
        let balance = self.escrow.balance_after_credit(&request.oev_proxy, bid.amount)?;

        self.overlay.update(key, feed)?;
        self.escrow.credit(request.oev_proxy, bid.amount)?;

        info!(
            oev_proxy = %request.oev_proxy,
            data_feed_id = %data_feed_id,
            update_id = %request.update_id,
            updater = %bid.updater,
            bid = %bid.amount,
            value = %feed.value,
            timestamp = feed.timestamp,
            "OEV overlay updated"
        );
        Ok(OevUpdate { key, feed, balance })
    }

    /// Pay out the escrow of `oev_proxy`.
    pub fn withdraw(
        &mut self,
        oev_proxy: Address,
        beneficiaries: &dyn BeneficiaryResolver,
        transfer: &dyn ValueTransfer,
    ) -> OevResult<Withdrawal> {
        self.escrow.withdraw(oev_proxy, beneficiaries, transfer)
    }
}

fn check_placeholder_count(declared: usize, placeholders: usize) -> OevResult<()> {
    match placeholders.cmp(&declared) {
        Ordering::Equal => Ok(()),
        Ordering::Greater => Err(OevError::MoreSignaturesThanStated {
            declared,
            placeholders,
        }),
        Ordering::Less => Err(OevError::LessSignaturesThanStated {
            declared,
            placeholders,
        }),
    }
}

fn verify_entry(
    verifier: &SignedDataVerifier,
    request: &OevUpdateRequest,
    bid: &OevBid,
    entry: &SignedData,
    now: u32,
) -> OevResult<DataFeed> {
    let hash = oev_message_hash(
        request.oev_proxy,
        request.update_id,
        bid,
        entry.template_id,
        entry.timestamp,
        &entry.data,
    );
    Ok(verifier.verify_prehashed(entry, hash, now)?.feed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signed::sign_oev_update;
    use alloy::primitives::B256;
    use alloy::signers::local::PrivateKeySigner;
    use dapi_core::{FeedValue, TemplateId};
    use dapi_feed::FeedError;

    const NOW: u32 = 1_700_000_000;
    const KEYS: [&str; 3] = [
        "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
        "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d",
        "5de4111afa1a4b94908f83103eb1f1706367c2e68ca870fc3fb9a804cdab365a",
    ];

    fn signers() -> Vec<PrivateKeySigner> {
        KEYS.iter()
            .map(|k| PrivateKeySigner::from_slice(&hex::decode(k).unwrap()).unwrap())
            .collect()
    }

    fn template() -> TemplateId {
        TemplateId(B256::repeat_byte(0x33))
    }

    fn proxy() -> Address {
        Address::repeat_byte(0x0e)
    }

    fn bid() -> OevBid {
        OevBid::new(Address::repeat_byte(0x5e), U256::from(1_000u64))
    }

    fn v(raw: i64) -> FeedValue {
        FeedValue::try_from(raw).unwrap()
    }

    fn request(
        update_id: UpdateId,
        placeholder_count: usize,
        entries: Vec<SignedData>,
    ) -> OevUpdateRequest {
        OevUpdateRequest {
            oev_proxy: proxy(),
            update_id,
            placeholder_count,
            entries,
        }
    }

    fn entry(
        signer: &PrivateKeySigner,
        update_id: UpdateId,
        timestamp: u32,
        value: i64,
    ) -> SignedData {
        sign_oev_update(signer, proxy(), update_id, &bid(), template(), timestamp, v(value))
            .unwrap()
    }

    fn beacon_ids(signers: &[PrivateKeySigner]) -> Vec<DataFeedId> {
        signers
            .iter()
            .map(|s| DataFeedId::beacon(s.address(), template()))
            .collect()
    }

    #[test]
    fn test_single_beacon_update_credits_bid() {
        let signers = signers();
        let base = FeedStore::new();
        let mut ledger = OevLedger::new();
        let update_id = UpdateId(B256::repeat_byte(1));

        let req = request(update_id, 0, vec![entry(&signers[0], update_id, NOW, 77)]);
        let update = ledger
            .update(&base, &SignedDataVerifier::default(), &req, &bid(), NOW)
            .unwrap();

        let beacon_id = beacon_ids(&signers)[0];
        assert_eq!(update.key, OverlayKey::new(proxy(), beacon_id));
        assert_eq!(update.feed, DataFeed::new(v(77), NOW));
        assert_eq!(ledger.overlay_feed(proxy(), beacon_id), update.feed);
        assert_eq!(ledger.balance(&proxy()), U256::from(1_000u64));
        assert!(!base.get(&beacon_id).is_initialized());
    }

    #[test]
    fn test_single_entry_must_be_signed() {
        let signers = signers();
        let mut ledger = OevLedger::new();
        let req = request(
            UpdateId::ZERO,
            1,
            vec![SignedData::placeholder(signers[0].address(), template())],
        );
        assert_eq!(
            ledger.update(&FeedStore::new(), &SignedDataVerifier::default(), &req, &bid(), NOW),
            Err(OevError::MissingSignature)
        );
    }

    #[test]
    fn test_signature_bound_to_bid() {
        let signers = signers();
        let mut ledger = OevLedger::new();
        let req = request(UpdateId::ZERO, 0, vec![entry(&signers[0], UpdateId::ZERO, NOW, 1)]);
        let lower_bid = OevBid::new(bid().updater, U256::from(1u64));

        assert_eq!(
            ledger.update(&FeedStore::new(), &SignedDataVerifier::default(), &req, &lower_bid, NOW),
            Err(OevError::Feed(FeedError::SignatureInvalid))
        );
        assert_eq!(ledger.balance(&proxy()), U256::ZERO);
    }

    #[test]
    fn test_signature_bound_to_update_id() {
        let signers = signers();
        let mut ledger = OevLedger::new();
        let signed_for = UpdateId(B256::repeat_byte(1));
        let replayed_in = UpdateId(B256::repeat_byte(2));
        let req = request(replayed_in, 0, vec![entry(&signers[0], signed_for, NOW, 1)]);

        assert_eq!(
            ledger.update(&FeedStore::new(), &SignedDataVerifier::default(), &req, &bid(), NOW),
            Err(OevError::Feed(FeedError::SignatureInvalid))
        );
    }

    #[test]
    fn test_beacon_set_with_placeholder_uses_base_value() {
        let signers = signers();
        let ids = beacon_ids(&signers);
        let mut base = FeedStore::new();
        base.update(ids[1], DataFeed::new(v(50), NOW - 100)).unwrap();

        let update_id = UpdateId(B256::repeat_byte(7));
        let req = request(
            update_id,
            1,
            vec![
                entry(&signers[0], update_id, NOW, 10),
                SignedData::placeholder(signers[1].address(), template()),
                entry(&signers[2], update_id, NOW - 10, 90),
            ],
        );

        let mut ledger = OevLedger::new();
        let update = ledger
            .update(&base, &SignedDataVerifier::default(), &req, &bid(), NOW)
            .unwrap();

        assert_eq!(update.key.data_feed_id, DataFeedId::beacon_set(&ids));
        assert_eq!(update.feed, DataFeed::new(v(50), NOW - 10));
    }

    #[test]
    fn test_placeholder_count_mismatch() {
        let signers = signers();
        let update_id = UpdateId::ZERO;
        let mut ledger = OevLedger::new();
        let verifier = SignedDataVerifier::default();

        let two_placeholders = request(
            update_id,
            1,
            vec![
                entry(&signers[0], update_id, NOW, 10),
                SignedData::placeholder(signers[1].address(), template()),
                SignedData::placeholder(signers[2].address(), template()),
            ],
        );
        assert_eq!(
            ledger.update(&FeedStore::new(), &verifier, &two_placeholders, &bid(), NOW),
            Err(OevError::MoreSignaturesThanStated {
                declared: 1,
                placeholders: 2
            })
        );

        let no_placeholders = request(
            update_id,
            1,
            vec![
                entry(&signers[0], update_id, NOW, 10),
                entry(&signers[1], update_id, NOW, 20),
                entry(&signers[2], update_id, NOW, 30),
            ],
        );
        assert_eq!(
            ledger.update(&FeedStore::new(), &verifier, &no_placeholders, &bid(), NOW),
            Err(OevError::LessSignaturesThanStated {
                declared: 1,
                placeholders: 0
            })
        );
    }

    #[test]
    fn test_signed_entries_still_need_fresh_timestamps() {
        let signers = signers();
        let update_id = UpdateId::ZERO;
        let req = request(
            update_id,
            0,
            vec![
                entry(&signers[0], update_id, NOW, 10),
                entry(&signers[1], update_id, NOW - 3601, 20),
            ],
        );
        let mut ledger = OevLedger::new();
        assert!(matches!(
            ledger.update(&FeedStore::new(), &SignedDataVerifier::default(), &req, &bid(), NOW),
            Err(OevError::Feed(FeedError::TimestampInvalid { .. }))
        ));
    }

    #[test]
    fn test_stale_overlay_update_rejected_without_credit() {
        let signers = signers();
        let mut ledger = OevLedger::new();
        let verifier = SignedDataVerifier::default();
        let base = FeedStore::new();

        let first = request(UpdateId::ZERO, 0, vec![entry(&signers[0], UpdateId::ZERO, NOW, 1)]);
        ledger.update(&base, &verifier, &first, &bid(), NOW).unwrap();

        let update_id = UpdateId(B256::repeat_byte(1));
        let stale = request(update_id, 0, vec![entry(&signers[0], update_id, NOW - 1, 2)]);
        assert!(matches!(
            ledger.update(&base, &verifier, &stale, &bid(), NOW),
            Err(OevError::Feed(FeedError::TimestampNotNewer { .. }))
        ));
        assert_eq!(ledger.balance(&proxy()), U256::from(1_000u64));
    }

    #[test]
    fn test_rejects_zero_proxy_and_empty_batch() {
        let mut ledger = OevLedger::new();
        let verifier = SignedDataVerifier::default();
        let mut req = request(UpdateId::ZERO, 0, vec![]);
        assert_eq!(
            ledger.update(&FeedStore::new(), &verifier, &req, &bid(), NOW),
            Err(OevError::EmptyBatch)
        );
        req.oev_proxy = Address::ZERO;
        assert_eq!(
            ledger.update(&FeedStore::new(), &verifier, &req, &bid(), NOW),
            Err(OevError::OevProxyAddressZero)
        );
    }
}
