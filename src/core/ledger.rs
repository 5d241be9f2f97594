//! Invoice escrow ledger
//!
//! This module provides `InvoiceLedger`, the state machine that registers
//! invoices, enforces who may move them through their lifecycle, and custodies
//! payment in escrow until release or refund.
//!
//! # Lifecycle
//!
//! | From      | Operation      | Caller                     | To        |
//! |-----------|----------------|----------------------------|-----------|
//! | —         | register       | backend service            | Pending   |
//! | Pending   | accept         | employer                   | Accepted  |
//! | Pending   | reject         | employer                   | Rejected  |
//! | Pending   | cancel         | freelancer                 | Cancelled |
//! | Accepted  | deposit        | employer                   | Deposited |
//! | Deposited | release        | employer                   | Paid      |
//! | Deposited | refund         | employer                   | Refunded  |
//! | Accepted  | mark as paid   | employer or backend service| Paid      |
//!
//! # Atomicity
//!
//! Each invoice operation runs while holding that invoice's map entry, which
//! serializes operations on the same hash and lets different hashes proceed
//! in parallel. The operation works on a copy of the record; the copy is
//! written back, statistics updated and events emitted only after every check
//! and the asset transfer have succeeded. A returned error therefore means
//! nothing changed.
//!
//! # Check Order
//!
//! paused → record exists → caller authorized → source state → transfer.

use crate::config::LedgerConfig;
use crate::core::access_control::AccessControl;
use crate::core::asset_bank::AssetBank;
use crate::core::events::EventLog;
use crate::core::statistics::{Statistics, StatisticsSnapshot};
use crate::core::traits::AssetTransfer;
use crate::types::{
    AccountId, Asset, DomainId, EventKind, Invoice, InvoiceHash, InvoiceState, LedgerError,
    LedgerEvent, Operation, Role,
};
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Which side of an invoice an operation must come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Party {
    Freelancer,
    Employer,
}

/// The invoice escrow ledger
///
/// Owns invoice records, the role registry, statistics and the event journal,
/// and moves funds through an [`AssetTransfer`] implementation.
#[derive(Debug)]
pub struct InvoiceLedger<T: AssetTransfer = AssetBank> {
    invoices: DashMap<InvoiceHash, Invoice>,
    access: AccessControl,
    assets: Arc<T>,
    statistics: Statistics,
    events: EventLog,
}

impl InvoiceLedger<AssetBank> {
    /// Build a ledger backed by a fresh in-memory `AssetBank`
    ///
    /// Seeds the role registry with the configured administrators and backend
    /// services.
    pub fn from_config(config: &LedgerConfig) -> Self {
        InvoiceLedger::new(
            AccessControl::with_members(
                config.administrators.iter().copied(),
                config.backend_services.iter().copied(),
            ),
            Arc::new(AssetBank::new()),
            EventLog::new(config.event_capacity),
        )
    }

    /// Credit fresh supply to `account`; administrators only
    pub fn mint(
        &self,
        caller: AccountId,
        account: AccountId,
        asset: Asset,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        self.access
            .require_role(Role::Administrator, caller, Operation::Mint)?;
        self.assets.mint(account, asset, amount)
    }

    /// Let the escrow pull up to `amount` of `token` from `caller`
    pub fn approve(
        &self,
        caller: AccountId,
        token: AccountId,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        self.assets.approve(caller, token, amount)
    }
}

impl<T: AssetTransfer> InvoiceLedger<T> {
    /// Create a ledger from its collaborators
    pub fn new(access: AccessControl, assets: Arc<T>, events: EventLog) -> Self {
        Self {
            invoices: DashMap::new(),
            access,
            assets,
            statistics: Statistics::new(),
            events,
        }
    }

    /// Register a new invoice in `Pending` state
    ///
    /// # Errors
    ///
    /// - `SystemPaused` while paused
    /// - `UnauthorizedAccess` unless `caller` is a backend service
    /// - `InvalidAddress` for a zero party, or freelancer equal to employer
    /// - `InvalidAmount` for a non-positive amount
    /// - `InvoiceAlreadyExists` if the hash is taken
    #[allow(clippy::too_many_arguments)]
    pub fn register_invoice(
        &self,
        caller: AccountId,
        hash: InvoiceHash,
        freelancer: AccountId,
        employer: AccountId,
        amount: Decimal,
        asset: Asset,
        domain_id: DomainId,
    ) -> Result<Invoice, LedgerError> {
        let operation = Operation::Register;
        let _running = self.access.enter(operation)?;
        self.access
            .require_role(Role::BackendService, caller, operation)?;

        if freelancer.is_zero() {
            return Err(LedgerError::invalid_address(
                operation,
                "freelancer",
                freelancer,
            ));
        }
        if employer.is_zero() {
            return Err(LedgerError::invalid_address(operation, "employer", employer));
        }
        if freelancer == employer {
            return Err(LedgerError::invalid_address(operation, "employer", employer));
        }
        if amount <= Decimal::ZERO {
            return Err(LedgerError::invalid_amount(operation, amount));
        }

        match self.invoices.entry(hash) {
            Entry::Occupied(_) => Err(LedgerError::already_exists(hash)),
            Entry::Vacant(vacant) => {
                let invoice = Invoice::new(
                    hash, freelancer, employer, amount, asset, domain_id,
                    Utc::now(),
                );
                // Hold the new entry until indexes and journal agree with it
                let _entry = vacant.insert(invoice.clone());
                self.statistics
                    .record_registration(hash, freelancer, employer);
                self.events.emit(EventKind::InvoiceRegistered {
                    invoice: hash,
                    freelancer,
                    employer,
                    amount,
                    asset,
                    domain_id,
                });
                tracing::debug!(invoice = %hash, %freelancer, %employer, %amount, %asset, "invoice registered");
                Ok(invoice)
            }
        }
    }

    /// Employer accepts a pending invoice
    pub fn accept_invoice(
        &self,
        caller: AccountId,
        hash: InvoiceHash,
    ) -> Result<Invoice, LedgerError> {
        self.transition(caller, hash, Operation::Accept, |invoice| {
            Self::require_party(invoice, caller, Party::Employer, Operation::Accept)?;
            Self::require_state(invoice, InvoiceState::Pending, Operation::Accept)?;

            invoice.state = InvoiceState::Accepted;
            invoice.responded_at = Some(Utc::now());
            Ok(vec![status_changed(invoice, InvoiceState::Pending)])
        })
    }

    /// Employer rejects a pending invoice, giving a reason
    pub fn reject_invoice(
        &self,
        caller: AccountId,
        hash: InvoiceHash,
        reason: impl Into<String>,
    ) -> Result<Invoice, LedgerError> {
        let reason = reason.into();
        self.transition(caller, hash, Operation::Reject, |invoice| {
            Self::require_party(invoice, caller, Party::Employer, Operation::Reject)?;
            Self::require_state(invoice, InvoiceState::Pending, Operation::Reject)?;

            invoice.state = InvoiceState::Rejected;
            invoice.rejection_reason = Some(reason);
            invoice.responded_at = Some(Utc::now());
            Ok(vec![status_changed(invoice, InvoiceState::Pending)])
        })
    }

    /// Freelancer withdraws an invoice the employer has not answered yet
    pub fn cancel_invoice(
        &self,
        caller: AccountId,
        hash: InvoiceHash,
    ) -> Result<Invoice, LedgerError> {
        self.transition(caller, hash, Operation::Cancel, |invoice| {
            Self::require_party(invoice, caller, Party::Freelancer, Operation::Cancel)?;
            Self::require_state(invoice, InvoiceState::Pending, Operation::Cancel)?;

            invoice.state = InvoiceState::Cancelled;
            invoice.responded_at = Some(Utc::now());
            Ok(vec![status_changed(invoice, InvoiceState::Pending)])
        })
    }

    /// Employer pays an accepted invoice into escrow
    ///
    /// For native invoices `attached` is the value sent with the call and must
    /// equal the invoice amount; token invoices are pulled using the
    /// employer's allowance to the escrow.
    ///
    /// # Errors
    ///
    /// Besides the common lifecycle errors: `InsufficientFunds`,
    /// `InsufficientAllowance` or `InvalidAmount` from the asset transfer.
    pub fn deposit_payment(
        &self,
        caller: AccountId,
        hash: InvoiceHash,
        attached: Option<Decimal>,
    ) -> Result<Invoice, LedgerError> {
        self.transition(caller, hash, Operation::Deposit, |invoice| {
            Self::require_party(invoice, caller, Party::Employer, Operation::Deposit)?;
            Self::require_state(invoice, InvoiceState::Accepted, Operation::Deposit)?;
            self.statistics.record_deposit(invoice.asset, invoice.amount, || {
                self.assets
                    .pull_in(invoice.asset, invoice.employer, invoice.amount, attached)
            })?;

            invoice.state = InvoiceState::Deposited;
            invoice.escrow_balance = invoice.amount;
            invoice.deposited_at = Some(Utc::now());

            Ok(vec![
                EventKind::PaymentDeposited {
                    invoice: invoice.hash,
                    employer: invoice.employer,
                    amount: invoice.amount,
                    asset: invoice.asset,
                },
                status_changed(invoice, InvoiceState::Accepted),
            ])
        })
    }

    /// Employer releases escrowed funds to the freelancer
    pub fn release_payment(
        &self,
        caller: AccountId,
        hash: InvoiceHash,
    ) -> Result<Invoice, LedgerError> {
        self.transition(caller, hash, Operation::Release, |invoice| {
            Self::require_party(invoice, caller, Party::Employer, Operation::Release)?;
            Self::require_state(invoice, InvoiceState::Deposited, Operation::Release)?;

            let amount = invoice.escrow_balance;
            self.assets
                .push_out(invoice.asset, invoice.freelancer, amount)?;

            invoice.state = InvoiceState::Paid;
            invoice.escrow_balance = Decimal::ZERO;
            invoice.settled_at = Some(Utc::now());
            self.statistics.record_paid();

            Ok(vec![
                EventKind::PaymentReleased {
                    invoice: invoice.hash,
                    freelancer: invoice.freelancer,
                    amount,
                    asset: invoice.asset,
                },
                status_changed(invoice, InvoiceState::Deposited),
            ])
        })
    }

    /// Employer takes escrowed funds back
    pub fn refund_payment(
        &self,
        caller: AccountId,
        hash: InvoiceHash,
    ) -> Result<Invoice, LedgerError> {
        self.transition(caller, hash, Operation::Refund, |invoice| {
            Self::require_party(invoice, caller, Party::Employer, Operation::Refund)?;
            Self::require_state(invoice, InvoiceState::Deposited, Operation::Refund)?;

            let amount = invoice.escrow_balance;
            self.assets
                .push_out(invoice.asset, invoice.employer, amount)?;

            invoice.state = InvoiceState::Refunded;
            invoice.escrow_balance = Decimal::ZERO;
            invoice.settled_at = Some(Utc::now());

            Ok(vec![
                EventKind::PaymentRefunded {
                    invoice: invoice.hash,
                    employer: invoice.employer,
                    amount,
                    asset: invoice.asset,
                },
                status_changed(invoice, InvoiceState::Deposited),
            ])
        })
    }

    /// Record an accepted invoice as settled outside the ledger
    ///
    /// Allowed for the employer and for backend services. No funds move.
    pub fn mark_as_paid(
        &self,
        caller: AccountId,
        hash: InvoiceHash,
    ) -> Result<Invoice, LedgerError> {
        self.transition(caller, hash, Operation::MarkPaid, |invoice| {
            if caller != invoice.employer
                && !self.access.has_role(Role::BackendService, caller)
            {
                return Err(LedgerError::unauthorized(caller, Operation::MarkPaid));
            }
            Self::require_state(invoice, InvoiceState::Accepted, Operation::MarkPaid)?;

            invoice.state = InvoiceState::Paid;
            invoice.settled_at = Some(Utc::now());
            self.statistics.record_paid();
            Ok(vec![status_changed(invoice, InvoiceState::Accepted)])
        })
    }

    /// Suspend all mutating invoice operations; administrators only
    pub fn pause(&self, caller: AccountId) -> Result<(), LedgerError> {
        if self.access.pause(caller)? {
            self.events.emit(EventKind::Paused { account: caller });
            tracing::info!(account = %caller, "ledger paused");
        }
        Ok(())
    }

    /// Resume mutating invoice operations; administrators only
    pub fn unpause(&self, caller: AccountId) -> Result<(), LedgerError> {
        if self.access.unpause(caller)? {
            self.events.emit(EventKind::Unpaused { account: caller });
            tracing::info!(account = %caller, "ledger unpaused");
        }
        Ok(())
    }

    /// Grant a global role; administrators only
    pub fn grant_role(
        &self,
        caller: AccountId,
        role: Role,
        account: AccountId,
    ) -> Result<(), LedgerError> {
        if self.access.grant_role(caller, role, account)? {
            self.events.emit(EventKind::RoleGranted {
                role,
                account,
                sender: caller,
            });
            tracing::info!(%role, %account, sender = %caller, "role granted");
        }
        Ok(())
    }

    /// Revoke a global role; administrators only
    pub fn revoke_role(
        &self,
        caller: AccountId,
        role: Role,
        account: AccountId,
    ) -> Result<(), LedgerError> {
        if self.access.revoke_role(caller, role, account)? {
            self.events.emit(EventKind::RoleRevoked {
                role,
                account,
                sender: caller,
            });
            tracing::info!(%role, %account, sender = %caller, "role revoked");
        }
        Ok(())
    }

    /// Snapshot of one invoice record
    pub fn get_invoice(&self, hash: InvoiceHash) -> Option<Invoice> {
        self.invoices.get(&hash).map(|entry| entry.value().clone())
    }

    pub fn invoice_exists(&self, hash: InvoiceHash) -> bool {
        self.invoices.contains_key(&hash)
    }

    /// Snapshot of every invoice, sorted by hash
    pub fn invoices(&self) -> Vec<Invoice> {
        let mut invoices: Vec<Invoice> = self
            .invoices
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        invoices.sort_by_key(|invoice| invoice.hash);
        invoices
    }

    pub fn get_statistics(&self) -> StatisticsSnapshot {
        self.statistics.snapshot()
    }

    /// Invoices naming `party` as freelancer, in registration order
    pub fn get_freelancer_invoices(&self, party: AccountId) -> Vec<InvoiceHash> {
        self.statistics.freelancer_invoices(party)
    }

    /// Invoices naming `party` as employer, in registration order
    pub fn get_employer_invoices(&self, party: AccountId) -> Vec<InvoiceHash> {
        self.statistics.employer_invoices(party)
    }

    /// Full event history, oldest first
    pub fn events(&self) -> Vec<LedgerEvent> {
        self.events.events()
    }

    /// Receive every event emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.events.subscribe()
    }

    /// The event journal, for per-invoice history
    pub fn event_log(&self) -> &EventLog {
        &self.events
    }

    pub fn access(&self) -> &AccessControl {
        &self.access
    }

    /// The asset transfer backend
    pub fn assets(&self) -> &Arc<T> {
        &self.assets
    }

    pub fn is_paused(&self) -> bool {
        self.access.is_paused()
    }

    /// Run one lifecycle operation against a copy of the record
    ///
    /// `apply` authorizes, validates, moves funds and edits the copy, and
    /// returns the events to emit. The copy replaces the stored record only if
    /// `apply` succeeds; the entry stays locked throughout.
    fn transition<F>(
        &self,
        caller: AccountId,
        hash: InvoiceHash,
        operation: Operation,
        apply: F,
    ) -> Result<Invoice, LedgerError>
    where
        F: FnOnce(&mut Invoice) -> Result<Vec<EventKind>, LedgerError>,
    {
        let _running = self.access.enter(operation)?;

        let mut entry = self
            .invoices
            .get_mut(&hash)
            .ok_or_else(|| LedgerError::not_found(hash))?;

        let mut updated = entry.value().clone();
        let events = apply(&mut updated)?;
        *entry.value_mut() = updated.clone();

        for kind in events {
            self.events.emit(kind);
        }
        tracing::debug!(invoice = %hash, %caller, %operation, state = %updated.state, terminal = updated.state.is_terminal(), "invoice updated");
        Ok(updated)
    }

    fn require_party(
        invoice: &Invoice,
        caller: AccountId,
        party: Party,
        operation: Operation,
    ) -> Result<(), LedgerError> {
        let expected = match party {
            Party::Freelancer => invoice.freelancer,
            Party::Employer => invoice.employer,
        };
        if caller == expected {
            Ok(())
        } else {
            Err(LedgerError::unauthorized(caller, operation))
        }
    }

    fn require_state(
        invoice: &Invoice,
        expected: InvoiceState,
        operation: Operation,
    ) -> Result<(), LedgerError> {
        if invoice.state == expected {
            Ok(())
        } else {
            Err(LedgerError::invalid_transition(
                invoice.hash,
                invoice.state,
                operation,
            ))
        }
    }
}

fn status_changed(invoice: &Invoice, from: InvoiceState) -> EventKind {
    EventKind::StatusChanged {
        invoice: invoice.hash,
        from,
        to: invoice.state,
        reason: invoice.rejection_reason.clone(),
    }
}
