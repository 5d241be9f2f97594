//! In-memory asset custody implementing `AssetTransfer`
//!
//! `AssetBank` keeps per-account balances for every asset, token allowances
//! granted to the escrow, and the escrow's own holdings. It is the settlement
//! backend used by the command-replay tool and by tests.
//!
//! # Thread Safety
//!
//! A transfer touches several entries at once (source balance, allowance,
//! escrow holding), so all state sits behind one `parking_lot::Mutex`. Each
//! operation validates first and writes only once every check has passed.

use crate::core::traits::AssetTransfer;
use crate::types::{AccountId, Asset, LedgerError, Operation};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::HashMap;

#[derive(Debug, Default)]
struct BankState {
    balances: HashMap<(AccountId, Asset), Decimal>,
    /// (owner, token) -> amount the escrow may pull
    allowances: HashMap<(AccountId, AccountId), Decimal>,
    escrow: HashMap<Asset, Decimal>,
    supply: HashMap<Asset, Decimal>,
}

impl BankState {
    fn balance(&self, account: AccountId, asset: Asset) -> Decimal {
        self.balances
            .get(&(account, asset))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    fn allowance(&self, owner: AccountId, token: AccountId) -> Decimal {
        self.allowances
            .get(&(owner, token))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    fn escrow(&self, asset: Asset) -> Decimal {
        self.escrow.get(&asset).copied().unwrap_or(Decimal::ZERO)
    }
}

/// A balance held by one account, as reported by [`AssetBank::balances`]
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceEntry {
    pub account: AccountId,
    pub asset: Asset,
    pub balance: Decimal,
}

/// In-memory custody of native currency and tokens
#[derive(Debug, Default)]
pub struct AssetBank {
    state: Mutex<BankState>,
}

impl AssetBank {
    /// Create an empty bank with no balances and nothing in escrow
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit fresh supply of `asset` to `account`
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` for a non-positive amount
    /// - `InvalidAddress` for the zero account
    /// - `ArithmeticOverflow` if the balance or supply would overflow
    pub fn mint(
        &self,
        account: AccountId,
        asset: Asset,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::invalid_amount(Operation::Mint, amount));
        }
        if account.is_zero() {
            return Err(LedgerError::invalid_address(
                Operation::Mint,
                "account",
                account,
            ));
        }

        let mut state = self.state.lock();
        let new_balance = state
            .balance(account, asset)
            .checked_add(amount)
            .ok_or_else(|| LedgerError::arithmetic_overflow("mint"))?;
        let new_supply = state
            .supply
            .get(&asset)
            .copied()
            .unwrap_or(Decimal::ZERO)
            .checked_add(amount)
            .ok_or_else(|| LedgerError::arithmetic_overflow("mint"))?;

        state.balances.insert((account, asset), new_balance);
        state.supply.insert(asset, new_supply);
        tracing::debug!(%account, %asset, %amount, "minted");
        Ok(())
    }

    /// Set the amount of `token` the escrow may pull from `owner`
    ///
    /// Replaces any previous allowance, like an ERC-20 `approve`.
    pub fn approve(
        &self,
        owner: AccountId,
        token: AccountId,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        if amount < Decimal::ZERO {
            return Err(LedgerError::invalid_amount(Operation::Approve, amount));
        }
        if owner.is_zero() {
            return Err(LedgerError::invalid_address(
                Operation::Approve,
                "owner",
                owner,
            ));
        }
        if token.is_zero() {
            return Err(LedgerError::invalid_address(
                Operation::Approve,
                "token",
                token,
            ));
        }

        let mut state = self.state.lock();
        if amount.is_zero() {
            state.allowances.remove(&(owner, token));
        } else {
            state.allowances.insert((owner, token), amount);
        }
        tracing::debug!(%owner, %token, %amount, "allowance set");
        Ok(())
    }

    /// Balance of `asset` held by `account`
    pub fn balance_of(&self, account: AccountId, asset: Asset) -> Decimal {
        self.state.lock().balance(account, asset)
    }

    /// Remaining amount of `token` the escrow may pull from `owner`
    pub fn allowance(&self, owner: AccountId, token: AccountId) -> Decimal {
        self.state.lock().allowance(owner, token)
    }

    /// Total amount of `asset` ever minted
    ///
    /// Transfers never change it: supply equals all balances plus escrow.
    pub fn total_supply(&self, asset: Asset) -> Decimal {
        self.state
            .lock()
            .supply
            .get(&asset)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Snapshot of every non-zero balance, sorted by account then asset
    pub fn balances(&self) -> Vec<BalanceEntry> {
        let state = self.state.lock();
        let mut entries: Vec<BalanceEntry> = state
            .balances
            .iter()
            .filter(|(_, balance)| !balance.is_zero())
            .map(|((account, asset), balance)| BalanceEntry {
                account: *account,
                asset: *asset,
                balance: *balance,
            })
            .collect();
        entries.sort_by(|a, b| (a.account, a.asset).cmp(&(b.account, b.asset)));
        entries
    }
}

impl AssetTransfer for AssetBank {
    fn pull_in(
        &self,
        asset: Asset,
        source: AccountId,
        amount: Decimal,
        attached: Option<Decimal>,
    ) -> Result<(), LedgerError> {
        let mut state = self.state.lock();

        match asset {
            Asset::Native => {
                let attached = attached.unwrap_or(Decimal::ZERO);
                if attached < amount {
                    return Err(LedgerError::insufficient_funds(
                        source, asset, attached, amount,
                    ));
                }
                if attached > amount {
                    return Err(LedgerError::invalid_amount(Operation::Deposit, attached));
                }
            }
            Asset::Token(token) => {
                if let Some(value) = attached.filter(|value| !value.is_zero()) {
                    return Err(LedgerError::invalid_amount(Operation::Deposit, value));
                }
                let allowance = state.allowance(source, token);
                if allowance < amount {
                    return Err(LedgerError::insufficient_allowance(
                        source, token, allowance, amount,
                    ));
                }
            }
        }

        let balance = state.balance(source, asset);
        if balance < amount {
            return Err(LedgerError::insufficient_funds(
                source, asset, balance, amount,
            ));
        }

        let new_escrow = state
            .escrow(asset)
            .checked_add(amount)
            .ok_or_else(|| LedgerError::arithmetic_overflow("pull_in"))?;

        // All checks passed; apply every write together
        state.balances.insert((source, asset), balance - amount);
        state.escrow.insert(asset, new_escrow);
        if let Asset::Token(token) = asset {
            let remaining = state.allowance(source, token) - amount;
            if remaining.is_zero() {
                state.allowances.remove(&(source, token));
            } else {
                state.allowances.insert((source, token), remaining);
            }
        }

        Ok(())
    }

    fn push_out(
        &self,
        asset: Asset,
        destination: AccountId,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        let mut state = self.state.lock();

        let held = state.escrow(asset);
        if held < amount {
            tracing::error!(%asset, %held, %amount, "escrow holds less than it owes");
            return Err(LedgerError::escrow_shortfall(asset, held, amount));
        }

        let new_balance = state
            .balance(destination, asset)
            .checked_add(amount)
            .ok_or_else(|| LedgerError::arithmetic_overflow("push_out"))?;

        state.escrow.insert(asset, held - amount);
        state.balances.insert((destination, asset), new_balance);
        Ok(())
    }

    fn escrow_balance(&self, asset: Asset) -> Decimal {
        self.state.lock().escrow(asset)
    }
}
