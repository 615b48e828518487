//! Shared fixtures for the server integration tests.

#![allow(dead_code)]

use alloy::primitives::{Address, B256, U256};
use alloy::signers::local::PrivateKeySigner;
use dapi_core::{
    AccessControl, BeneficiaryResolver, DataFeedId, FeedValue, ManualClock, Role, SignedData,
    TemplateId, TransferError, ValueTransfer,
};
use dapi_server::{Collaborators, DapiServer, ServerConfig};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

pub const NOW: u32 = 1_700_000_000;

/// Anvil development keys.
pub const KEYS: [&str; 3] = [
    "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
    "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d",
    "5de4111afa1a4b94908f83103eb1f1706367c2e68ca870fc3fb9a804cdab365a",
];

pub fn manager() -> Address {
    Address::repeat_byte(0x4d)
}

pub fn stranger() -> Address {
    Address::repeat_byte(0x55)
}

pub fn proxy() -> Address {
    Address::repeat_byte(0x0e)
}

pub fn beneficiary() -> Address {
    Address::repeat_byte(0xbe)
}

pub fn template() -> TemplateId {
    TemplateId::derive(B256::repeat_byte(0x11), b"ETH/USD")
}

pub fn signer(index: usize) -> PrivateKeySigner {
    PrivateKeySigner::from_slice(&hex::decode(KEYS[index]).unwrap()).unwrap()
}

pub fn signers() -> Vec<PrivateKeySigner> {
    (0..KEYS.len()).map(signer).collect()
}

pub fn beacon_id(signer: &PrivateKeySigner) -> DataFeedId {
    DataFeedId::beacon(signer.address(), template())
}

pub fn v(raw: i64) -> FeedValue {
    FeedValue::try_from(raw).unwrap()
}

pub fn signed(signer: &PrivateKeySigner, timestamp: u32, value: i64) -> SignedData {
    SignedData::sign(signer, template(), timestamp, v(value)).unwrap()
}

/// Grants every role to the manager and to explicitly listed principals.
#[derive(Default)]
pub struct StaticAccess {
    grants: HashSet<(Role, Address)>,
}

impl StaticAccess {
    pub fn grant(mut self, role: Role, principal: Address) -> Self {
        self.grants.insert((role, principal));
        self
    }
}

impl AccessControl for StaticAccess {
    fn has_role(&self, role: Role, principal: Address) -> bool {
        principal == manager() || self.grants.contains(&(role, principal))
    }
}

#[derive(Default)]
pub struct Beneficiaries {
    declared: HashMap<Address, Address>,
}

impl Beneficiaries {
    pub fn declare(mut self, oev_proxy: Address, beneficiary: Address) -> Self {
        self.declared.insert(oev_proxy, beneficiary);
        self
    }
}

impl BeneficiaryResolver for Beneficiaries {
    fn oev_beneficiary(&self, oev_proxy: Address) -> Address {
        self.declared.get(&oev_proxy).copied().unwrap_or(Address::ZERO)
    }
}

/// Records transfers; rejects every transfer while `reverting` is set.
#[derive(Default)]
pub struct RecordingTransfer {
    pub paid: Mutex<Vec<(Address, U256)>>,
    pub reverting: Mutex<bool>,
}

impl ValueTransfer for RecordingTransfer {
    fn transfer(&self, to: Address, amount: U256) -> Result<(), TransferError> {
        if *self.reverting.lock() {
            return Err(TransferError {
                to,
                amount,
                reason: "receiver reverted".to_string(),
            });
        }
        self.paid.lock().push((to, amount));
        Ok(())
    }
}

pub struct Harness {
    pub server: DapiServer,
    pub clock: Arc<ManualClock>,
    pub transfer: Arc<RecordingTransfer>,
}

pub fn harness() -> Harness {
    harness_with(StaticAccess::default())
}

pub fn harness_with(access: StaticAccess) -> Harness {
    let clock = ManualClock::new_shared(NOW);
    let transfer = Arc::new(RecordingTransfer::default());
    let server = DapiServer::new(
        &ServerConfig::default(),
        Collaborators {
            clock: clock.clone(),
            access: Arc::new(access),
            beneficiaries: Arc::new(Beneficiaries::default().declare(proxy(), beneficiary())),
            transfer: transfer.clone(),
        },
    );
    Harness {
        server,
        clock,
        transfer,
    }
}
