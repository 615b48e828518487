//! Content-derived identifiers.
//!
//! Beacon and Beacon set ids are never issued; they are keccak-256 hashes of
//! the material that defines the feed. The hash is an opaque key.

use crate::error::{CoreError, Result};
use crate::value::{uint_word, WORD_SIZE};
use alloy::primitives::{keccak256, Address, B256};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! hash_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            Default,
            Serialize,
            Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub B256);

        impl $name {
            pub const ZERO: Self = Self(B256::ZERO);

            pub fn new(hash: B256) -> Self {
                Self(hash)
            }

            pub fn is_zero(&self) -> bool {
                self.0.is_zero()
            }
        }

        impl From<B256> for $name {
            fn from(hash: B256) -> Self {
                Self(hash)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self> {
                B256::from_str(s)
                    .map(Self)
                    .map_err(|e| CoreError::InvalidHex(e.to_string()))
            }
        }
    };
}

hash_id!(
    /// Beacon id or Beacon set id.
    DataFeedId
);

hash_id!(
    /// `keccak256(endpointId ‖ parameters)`.
    TemplateId
);

hash_id!(
    /// Identifier of a registered PSP subscription.
    SubscriptionId
);

hash_id!(
    /// `keccak256(dapiName)`, the key aliases are read by.
    DapiNameHash
);

hash_id!(
    /// Caller-chosen identifier binding an OEV batch to one bid.
    UpdateId
);

impl TemplateId {
    /// Derive a template id from an endpoint id and its encoded parameters.
    pub fn derive(endpoint_id: B256, parameters: &[u8]) -> Self {
        let mut buf = Vec::with_capacity(WORD_SIZE + parameters.len());
        buf.extend_from_slice(endpoint_id.as_slice());
        buf.extend_from_slice(parameters);
        Self(keccak256(buf))
    }
}

impl DataFeedId {
    /// `keccak256(airnode ‖ templateId)`.
    pub fn beacon(airnode: Address, template_id: TemplateId) -> Self {
        let mut buf = [0u8; 20 + WORD_SIZE];
        buf[..20].copy_from_slice(airnode.as_slice());
        buf[20..].copy_from_slice(template_id.0.as_slice());
        Self(keccak256(buf))
    }

    /// `keccak256(abi.encode(bytes32[] beaconIds))`.
    ///
    /// The ordering of `beacon_ids` is significant.
    pub fn beacon_set(beacon_ids: &[DataFeedId]) -> Self {
        let mut buf = Vec::with_capacity(WORD_SIZE * (2 + beacon_ids.len()));
        buf.extend_from_slice(&uint_word(WORD_SIZE as u64));
        buf.extend_from_slice(&uint_word(beacon_ids.len() as u64));
        for id in beacon_ids {
            buf.extend_from_slice(id.0.as_slice());
        }
        Self(keccak256(buf))
    }
}

/// Human-readable alias for a data feed, right-padded to 32 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DapiName(pub B256);

impl DapiName {
    pub const ZERO: Self = Self(B256::ZERO);

    /// Encode a string such as `"ETH/USD"`.
    pub fn new(name: &str) -> Result<Self> {
        let bytes = name.as_bytes();
        if bytes.len() > WORD_SIZE {
            return Err(CoreError::DapiNameTooLong(bytes.len()));
        }
        let mut word = [0u8; WORD_SIZE];
        word[..bytes.len()].copy_from_slice(bytes);
        Ok(Self(B256::from(word)))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Hash used as the read-side key.
    pub fn hash(&self) -> DapiNameHash {
        DapiNameHash(keccak256(self.0))
    }

    /// The name as text, if the word is UTF-8 followed only by zero padding.
    pub fn as_text(&self) -> Option<&str> {
        let bytes = self.0.as_slice();
        let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
        if bytes[end..].iter().any(|b| *b != 0) {
            return None;
        }
        std::str::from_utf8(&bytes[..end]).ok()
    }
}

/// Text names print as text; any other word prints as `0x` hex.
impl fmt::Display for DapiName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_text() {
            Some(s) => write!(f, "{s}"),
            None => write!(f, "{}", self.0),
        }
    }
}

/// Accepts a text name of at most 32 bytes, or the `0x` hex form of a raw
/// 32-byte word. A 66-character hex string cannot be a text name.
impl FromStr for DapiName {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        if s.len() == 2 + 2 * WORD_SIZE && s.starts_with("0x") {
            return B256::from_str(s)
                .map(Self)
                .map_err(|_| CoreError::DapiNameTooLong(s.len()));
        }
        Self::new(s)
    }
}

impl TryFrom<String> for DapiName {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<DapiName> for String {
    fn from(value: DapiName) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    #[test]
    fn test_beacon_id_is_packed_hash() {
        let airnode = address!("70997970C51812dc3A010C7d01b50e0d17dc79C8");
        let template_id = TemplateId(B256::repeat_byte(0x11));

        let mut packed = Vec::new();
        packed.extend_from_slice(airnode.as_slice());
        packed.extend_from_slice(template_id.0.as_slice());

        assert_eq!(
            DataFeedId::beacon(airnode, template_id).0,
            keccak256(&packed)
        );
    }

    #[test]
    fn test_beacon_set_id_depends_on_order() {
        let a = DataFeedId(B256::repeat_byte(1));
        let b = DataFeedId(B256::repeat_byte(2));

        assert_ne!(DataFeedId::beacon_set(&[a, b]), DataFeedId::beacon_set(&[b, a]));
        assert_eq!(DataFeedId::beacon_set(&[a, b]), DataFeedId::beacon_set(&[a, b]));
    }

    #[test]
    fn test_beacon_set_id_abi_layout() {
        let a = DataFeedId(B256::repeat_byte(1));
        let b = DataFeedId(B256::repeat_byte(2));

        let mut encoded = vec![0u8; 64];
        encoded[31] = 0x20;
        encoded[63] = 2;
        encoded.extend_from_slice(a.0.as_slice());
        encoded.extend_from_slice(b.0.as_slice());

        assert_eq!(DataFeedId::beacon_set(&[a, b]).0, keccak256(&encoded));
    }

    #[test]
    fn test_dapi_name_padding_and_display() {
        let name = DapiName::new("ETH/USD").unwrap();
        assert_eq!(&name.0[..7], b"ETH/USD");
        assert!(name.0[7..].iter().all(|b| *b == 0));
        assert_eq!(name.to_string(), "ETH/USD");
        assert_eq!(name.hash().0, keccak256(name.0));
    }

    #[test]
    fn test_dapi_name_too_long() {
        let long = "x".repeat(33);
        assert_eq!(DapiName::new(&long), Err(CoreError::DapiNameTooLong(33)));
        assert!(DapiName::new(&"x".repeat(32)).is_ok());
    }

    #[test]
    fn test_dapi_name_raw_word_survives_serde() {
        let mut word = [0u8; WORD_SIZE];
        word[0] = 0xff;
        let non_utf8 = DapiName(B256::from(word));
        let interior_nul = DapiName::new("ETH\0USD").unwrap();
        assert_eq!(interior_nul.as_text(), None);

        for name in [non_utf8, interior_nul, DapiName::new("BTC/USD").unwrap()] {
            let json = serde_json::to_string(&name).unwrap();
            assert_eq!(serde_json::from_str::<DapiName>(&json).unwrap(), name);
        }
        assert_eq!(
            serde_json::to_string(&non_utf8).unwrap(),
            format!("\"0xff{}\"", "00".repeat(31))
        );
    }

    #[test]
    fn test_id_from_str() {
        let hex = format!("0x{}", "ab".repeat(32));
        let id: DataFeedId = hex.parse().unwrap();
        assert_eq!(id.0, B256::repeat_byte(0xab));
        assert!("0x12".parse::<DataFeedId>().is_err());
    }
}
