//! Configuration-backed collaborators.
//!
//! The node has no permission registry, proxy contracts or native value
//! ledger to talk to, so it answers those queries from its configuration and
//! keeps paid-out value in memory.

use crate::config::NodeConfig;
use alloy::primitives::{Address, U256};
use dapi_core::{AccessControl, BeneficiaryResolver, Role, TransferError, ValueTransfer};
use dashmap::DashMap;
use std::collections::{HashMap, HashSet};

/// Roles granted by configuration. The manager holds every role.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredAccess {
    manager: Address,
    grants: HashSet<(Role, Address)>,
}

impl ConfiguredAccess {
    pub fn from_config(config: &NodeConfig) -> Self {
        let setters = config
            .dapi_name_setters
            .iter()
            .map(|a| (Role::DapiNameSetter, *a));
        let registrars = config
            .subscription_registrars
            .iter()
            .map(|a| (Role::SubscriptionRegistrar, *a));
        Self {
            manager: config.manager,
            grants: setters.chain(registrars).collect(),
        }
    }
}

impl AccessControl for ConfiguredAccess {
    fn has_role(&self, role: Role, principal: Address) -> bool {
        if principal.is_zero() {
            return false;
        }
        principal == self.manager || self.grants.contains(&(role, principal))
    }
}

/// Beneficiaries declared per OEV proxy.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredBeneficiaries {
    beneficiaries: HashMap<Address, Address>,
}

impl ConfiguredBeneficiaries {
    pub fn from_config(config: &NodeConfig) -> Self {
        Self {
            beneficiaries: config
                .oev_beneficiaries
                .iter()
                .map(|b| (b.oev_proxy, b.beneficiary))
                .collect(),
        }
    }
}

impl BeneficiaryResolver for ConfiguredBeneficiaries {
    fn oev_beneficiary(&self, oev_proxy: Address) -> Address {
        self.beneficiaries
            .get(&oev_proxy)
            .copied()
            .unwrap_or(Address::ZERO)
    }
}

/// In-memory native value ledger.
#[derive(Debug, Default)]
pub struct InMemoryTransfer {
    balances: DashMap<Address, U256>,
}

impl InMemoryTransfer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, account: &Address) -> U256 {
        self.balances
            .get(account)
            .map(|b| *b)
            .unwrap_or(U256::ZERO)
    }
}

impl ValueTransfer for InMemoryTransfer {
    fn transfer(&self, to: Address, amount: U256) -> Result<(), TransferError> {
        if to.is_zero() {
            return Err(TransferError {
                to,
                amount,
                reason: "transfer to zero address".to_string(),
            });
        }
        let mut balance = self.balances.entry(to).or_insert(U256::ZERO);
        *balance = balance.checked_add(amount).ok_or_else(|| TransferError {
            to,
            amount,
            reason: "balance overflow".to_string(),
        })?;
        Ok(())
    }
}
