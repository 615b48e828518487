//! Escrowed OEV bids and their withdrawal.
//!
//! Credits are increments performed together with the overlay write that
//! earned them. A withdrawal drains the whole balance to the beneficiary the
//! proxy declares: the balance is zeroed before the transfer is attempted and
//! restored if the transfer reverts, so a balance is paid out at most once.

use crate::error::{OevError, OevResult};
use alloy::primitives::{Address, U256};
use dapi_core::{BeneficiaryResolver, ValueTransfer};
use std::collections::HashMap;
use tracing::{info, warn};

/// Completed withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Withdrawal {
    pub oev_proxy: Address,
    pub beneficiary: Address,
    pub amount: U256,
}

/// Per-proxy accumulated bids.
#[derive(Debug, Clone, Default)]
pub struct EscrowBook {
    balances: HashMap<Address, U256>,
}

impl EscrowBook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn balance(&self, oev_proxy: &Address) -> U256 {
        self.balances.get(oev_proxy).copied().unwrap_or(U256::ZERO)
    }

    /// Balance after crediting `amount`, without applying it.
    pub fn balance_after_credit(&self, oev_proxy: &Address, amount: U256) -> OevResult<U256> {
        self.balance(oev_proxy)
            .checked_add(amount)
            .ok_or(OevError::EscrowOverflow)
    }

    /// Credit `amount` to `oev_proxy`, returning the new balance.
    pub fn credit(&mut self, oev_proxy: Address, amount: U256) -> OevResult<U256> {
        let balance = self.balance_after_credit(&oev_proxy, amount)?;
        self.balances.insert(oev_proxy, balance);
        Ok(balance)
    }

    /// Pay the full balance of `oev_proxy` to its declared beneficiary.
    pub fn withdraw(
        &mut self,
        oev_proxy: Address,
        beneficiaries: &dyn BeneficiaryResolver,
        transfer: &dyn ValueTransfer,
    ) -> OevResult<Withdrawal> {
        let amount = self.balance(&oev_proxy);
        if amount.is_zero() {
            return Err(OevError::OevProxyBalanceZero);
        }
        let beneficiary = beneficiaries.oev_beneficiary(oev_proxy);
        if beneficiary.is_zero() {
            return Err(OevError::BeneficiaryAddressZero);
        }

        self.balances.remove(&oev_proxy);
        if let Err(e) = transfer.transfer(beneficiary, amount) {
            warn!(
                oev_proxy = %oev_proxy,
                beneficiary = %beneficiary,
                amount = %amount,
                error = %e,
                "OEV withdrawal reverted, balance restored"
            );
            self.balances.insert(oev_proxy, amount);
            return Err(OevError::WithdrawalReverted(e));
        }

        info!(
            oev_proxy = %oev_proxy,
            beneficiary = %beneficiary,
            amount = %amount,
            "OEV proceeds withdrawn"
        );
        Ok(Withdrawal {
            oev_proxy,
            beneficiary,
            amount,
        })
    }
}
