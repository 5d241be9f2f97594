//! Incrementally maintained ledger statistics and party indexes
//!
//! The ledger reports each registration, deposit and payment here as it
//! happens, so aggregate queries never scan the invoice map.

use crate::types::{AccountId, Asset, InvoiceHash, LedgerError};
use dashmap::DashMap;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time view of the aggregate counters
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct StatisticsSnapshot {
    /// Invoices ever registered
    pub total_invoices: u64,

    /// Invoices that reached `Paid`, by release or off-ledger settlement
    pub total_paid_invoices: u64,

    /// Sum of every amount ever deposited into escrow, across assets
    pub total_escrow_volume: Decimal,

    /// Deposited volume broken down per asset
    pub escrow_volume_by_asset: BTreeMap<Asset, Decimal>,
}

#[derive(Debug, Default)]
struct Volume {
    total: Decimal,
    by_asset: BTreeMap<Asset, Decimal>,
}

/// Aggregate counters plus per-party invoice indexes
#[derive(Debug, Default)]
pub struct Statistics {
    total_invoices: AtomicU64,
    total_paid: AtomicU64,
    volume: Mutex<Volume>,
    by_freelancer: DashMap<AccountId, Vec<InvoiceHash>>,
    by_employer: DashMap<AccountId, Vec<InvoiceHash>>,
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a registration and index it under both parties
    pub fn record_registration(
        &self,
        invoice: InvoiceHash,
        freelancer: AccountId,
        employer: AccountId,
    ) {
        self.total_invoices.fetch_add(1, Ordering::SeqCst);
        self.by_freelancer.entry(freelancer).or_default().push(invoice);
        self.by_employer.entry(employer).or_default().push(invoice);
    }

    /// Add a deposit to the cumulative escrow volume once `transfer` succeeds
    ///
    /// The volume lock is held across `transfer`: a deposit that would overflow
    /// the volume fails with `ArithmeticOverflow` before any funds move, and a
    /// failed transfer leaves the volume untouched.
    pub fn record_deposit<F>(
        &self,
        asset: Asset,
        amount: Decimal,
        transfer: F,
    ) -> Result<(), LedgerError>
    where
        F: FnOnce() -> Result<(), LedgerError>,
    {
        let mut volume = self.volume.lock();
        let overflow = || LedgerError::arithmetic_overflow("escrow volume");

        let total = volume.total.checked_add(amount).ok_or_else(overflow)?;
        let per_asset = volume
            .by_asset
            .get(&asset)
            .copied()
            .unwrap_or(Decimal::ZERO)
            .checked_add(amount)
            .ok_or_else(overflow)?;

        transfer()?;

        volume.total = total;
        volume.by_asset.insert(asset, per_asset);
        Ok(())
    }

    /// Count an invoice reaching `Paid`
    pub fn record_paid(&self) {
        self.total_paid.fetch_add(1, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> StatisticsSnapshot {
        let volume = self.volume.lock();
        StatisticsSnapshot {
            total_invoices: self.total_invoices.load(Ordering::SeqCst),
            total_paid_invoices: self.total_paid.load(Ordering::SeqCst),
            total_escrow_volume: volume.total,
            escrow_volume_by_asset: volume.by_asset.clone(),
        }
    }

    /// Invoices where `party` is the freelancer, in registration order
    pub fn freelancer_invoices(&self, party: AccountId) -> Vec<InvoiceHash> {
        self.by_freelancer
            .get(&party)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Invoices where `party` is the employer, in registration order
    pub fn employer_invoices(&self, party: AccountId) -> Vec<InvoiceHash> {
        self.by_employer
            .get(&party)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }
}
