//! OEV-bound signed data.
//!
//! An Airnode signing for an OEV update commits to the proxy, the batch id,
//! the winning updater and the bid amount in addition to the payload, so the
//! signature is only usable for that one auction win.

use alloy::primitives::{keccak256, Address, Bytes, B256, U256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use dapi_core::{uint_word, FeedValue, SignedData, TemplateId, UpdateId};
use serde::{Deserialize, Serialize};

/// The bid attached to an OEV update call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OevBid {
    /// Caller submitting the update (the auction winner).
    pub updater: Address,
    /// Native value sent with the call.
    pub amount: U256,
}

impl OevBid {
    pub fn new(updater: Address, amount: U256) -> Self {
        Self { updater, amount }
    }
}

/// `keccak256(oevProxy ‖ updateId ‖ templateId ‖ uint256(timestamp) ‖ data ‖ updater ‖
/// uint256(bid))`.
pub fn oev_message_hash(
    oev_proxy: Address,
    update_id: UpdateId,
    bid: &OevBid,
    template_id: TemplateId,
    timestamp: u32,
    data: &[u8],
) -> B256 {
    let mut buf = Vec::with_capacity(20 + 32 * 4 + data.len() + 20);
    buf.extend_from_slice(oev_proxy.as_slice());
    buf.extend_from_slice(update_id.0.as_slice());
    buf.extend_from_slice(template_id.0.as_slice());
    buf.extend_from_slice(&uint_word(timestamp));
    buf.extend_from_slice(data);
    buf.extend_from_slice(bid.updater.as_slice());
    buf.extend_from_slice(&bid.amount.to_be_bytes::<32>());
    keccak256(buf)
}

/// Sign `value` for an OEV update as an Airnode would.
pub fn sign_oev_update(
    signer: &PrivateKeySigner,
    oev_proxy: Address,
    update_id: UpdateId,
    bid: &OevBid,
    template_id: TemplateId,
    timestamp: u32,
    value: FeedValue,
) -> alloy::signers::Result<SignedData> {
    let data = Bytes::copy_from_slice(&value.to_word());
    let hash = oev_message_hash(oev_proxy, update_id, bid, template_id, timestamp, &data);
    let signature = signer.sign_message_sync(hash.as_slice())?;
    Ok(SignedData {
        airnode: signer.address(),
        template_id,
        timestamp,
        data,
        signature: Bytes::copy_from_slice(&signature.as_bytes()),
    })
}
