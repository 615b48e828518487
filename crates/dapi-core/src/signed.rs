//! Signed data as produced by an Airnode.

use crate::ids::{DataFeedId, TemplateId};
use crate::value::{uint_word, FeedValue};
use alloy::primitives::{keccak256, Address, Bytes, B256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use serde::{Deserialize, Serialize};

/// One signed update: `(airnode, templateId, timestamp, data, signature)`.
///
/// An entry with both `data` and `signature` empty is a placeholder that
/// stands in for a Beacon in a batch without carrying new data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedData {
    pub airnode: Address,
    pub template_id: TemplateId,
    pub timestamp: u32,
    #[serde(default)]
    pub data: Bytes,
    #[serde(default)]
    pub signature: Bytes,
}

impl SignedData {
    /// Placeholder entry for the Beacon of `airnode` and `template_id`.
    pub fn placeholder(airnode: Address, template_id: TemplateId) -> Self {
        Self {
            airnode,
            template_id,
            timestamp: 0,
            data: Bytes::new(),
            signature: Bytes::new(),
        }
    }

    /// Sign `value` at `timestamp` the way an Airnode does.
    pub fn sign(
        signer: &PrivateKeySigner,
        template_id: TemplateId,
        timestamp: u32,
        value: FeedValue,
    ) -> alloy::signers::Result<Self> {
        let data = Bytes::copy_from_slice(&value.to_word());
        let hash = message_hash(template_id, timestamp, &data);
        let signature = signer.sign_message_sync(hash.as_slice())?;
        Ok(Self {
            airnode: signer.address(),
            template_id,
            timestamp,
            data,
            signature: Bytes::copy_from_slice(&signature.as_bytes()),
        })
    }

    pub fn beacon_id(&self) -> DataFeedId {
        DataFeedId::beacon(self.airnode, self.template_id)
    }

    pub fn is_placeholder(&self) -> bool {
        self.signature.is_empty() && self.data.is_empty()
    }

    /// Hash the Airnode signs (before EIP-191 prefixing).
    pub fn message_hash(&self) -> B256 {
        message_hash(self.template_id, self.timestamp, &self.data)
    }
}

/// `keccak256(templateId ‖ uint256(timestamp) ‖ data)`.
pub fn message_hash(template_id: TemplateId, timestamp: u32, data: &[u8]) -> B256 {
    let mut buf = Vec::with_capacity(64 + data.len());
    buf.extend_from_slice(template_id.0.as_slice());
    buf.extend_from_slice(&uint_word(timestamp));
    buf.extend_from_slice(data);
    keccak256(buf)
}
