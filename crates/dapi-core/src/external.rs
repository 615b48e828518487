//! Interfaces of the collaborators the server calls out to.
//!
//! The permission registry, the OEV proxies and the native value ledger live
//! outside this workspace; the server only sees them through these traits.

use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Privileged operations gated by the permission registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// May assign dAPI names.
    DapiNameSetter,
    /// May register PSP update subscriptions.
    SubscriptionRegistrar,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DapiNameSetter => write!(f, "dAPI name setter"),
            Self::SubscriptionRegistrar => write!(f, "subscription registrar"),
        }
    }
}

/// Opaque role oracle.
///
/// Implementors answer `true` for the manager regardless of `role`.
pub trait AccessControl: Send + Sync {
    fn has_role(&self, role: Role, principal: Address) -> bool;
}

/// Capability every OEV proxy exposes: the address its escrow is paid to.
pub trait BeneficiaryResolver: Send + Sync {
    /// Returns `Address::ZERO` when the proxy declares no beneficiary.
    fn oev_beneficiary(&self, oev_proxy: Address) -> Address;
}

/// Failed native value transfer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Transfer of {amount} to {to} reverted: {reason}")]
pub struct TransferError {
    pub to: Address,
    pub amount: U256,
    pub reason: String,
}

/// Native value ledger used to pay out escrow.
pub trait ValueTransfer: Send + Sync {
    fn transfer(&self, to: Address, amount: U256) -> Result<(), TransferError>;
}
