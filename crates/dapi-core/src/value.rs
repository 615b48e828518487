//! Bounded numeric domain for data feed values.
//!
//! Feed values are signed 224-bit integers carried inside a 256-bit word.
//! Anything outside `[-2^223, 2^223 - 1]` is rejected at the boundary, so a
//! `FeedValue` that exists is always in range.

use crate::error::{CoreError, Result};
use alloy::primitives::{I256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Size of an ABI word in bytes.
pub const WORD_SIZE: usize = 32;

/// `2^223 - 1`, the largest int224.
const INT224_MAX: I256 = I256::from_raw(U256::from_limbs([
    u64::MAX,
    u64::MAX,
    u64::MAX,
    (1u64 << 31) - 1,
]));

/// `-2^223`, the smallest int224 (two's complement).
const INT224_MIN: I256 = I256::from_raw(U256::from_limbs([0, 0, 0, !((1u64 << 31) - 1)]));

/// A data feed value in the int224 domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "I256", into = "I256")]
pub struct FeedValue(I256);

impl FeedValue {
    /// Zero, the value of an uninitialized feed.
    pub const ZERO: Self = Self(I256::ZERO);
    /// Largest representable value (`2^223 - 1`).
    pub const MAX: Self = Self(INT224_MAX);
    /// Smallest representable value (`-2^223`).
    pub const MIN: Self = Self(INT224_MIN);

    /// Range-check a 256-bit signed integer.
    pub fn new(value: I256) -> Result<Self> {
        if value < INT224_MIN || value > INT224_MAX {
            return Err(CoreError::ValueOutOfRange);
        }
        Ok(Self(value))
    }

    /// Decode an ABI-encoded `int256` payload and range-check it.
    pub fn from_data(data: &[u8]) -> Result<Self> {
        Self::new(decode_int_word(data)?)
    }

    /// Inner 256-bit representation.
    pub fn inner(&self) -> I256 {
        self.0
    }

    /// ABI word encoding (two's complement, big-endian).
    pub fn to_word(&self) -> [u8; WORD_SIZE] {
        self.0.into_raw().to_be_bytes::<WORD_SIZE>()
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl TryFrom<I256> for FeedValue {
    type Error = CoreError;

    fn try_from(value: I256) -> Result<Self> {
        Self::new(value)
    }
}

impl From<FeedValue> for I256 {
    fn from(value: FeedValue) -> Self {
        value.0
    }
}

impl TryFrom<i64> for FeedValue {
    type Error = CoreError;

    fn try_from(value: i64) -> Result<Self> {
        // Every i64 fits in int224.
        I256::try_from(value)
            .map_err(|_| CoreError::ValueOutOfRange)
            .and_then(Self::new)
    }
}

impl fmt::Display for FeedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Decode exactly one 32-byte word as a two's complement `int256`.
pub fn decode_int_word(data: &[u8]) -> Result<I256> {
    if data.len() != WORD_SIZE {
        return Err(CoreError::DataLengthInvalid(data.len()));
    }
    Ok(I256::from_raw(U256::from_be_slice(data)))
}

/// Encode an unsigned integer as a 32-byte big-endian word.
pub fn uint_word(value: impl Into<u64>) -> [u8; WORD_SIZE] {
    U256::from(value.into()).to_be_bytes::<WORD_SIZE>()
}
