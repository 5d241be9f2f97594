//! Audit events emitted by the ledger
//!
//! Every successful mutating operation appends one event. External observers
//! (notification senders, indexers) consume them from the event journal.

use super::account::{AccountId, Asset};
use super::command::Role;
use super::invoice::{DomainId, InvoiceHash, InvoiceState};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// What happened
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    InvoiceRegistered {
        invoice: InvoiceHash,
        freelancer: AccountId,
        employer: AccountId,
        amount: Decimal,
        asset: Asset,
        domain_id: DomainId,
    },
    StatusChanged {
        invoice: InvoiceHash,
        from: InvoiceState,
        to: InvoiceState,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    PaymentDeposited {
        invoice: InvoiceHash,
        employer: AccountId,
        amount: Decimal,
        asset: Asset,
    },
    PaymentReleased {
        invoice: InvoiceHash,
        freelancer: AccountId,
        amount: Decimal,
        asset: Asset,
    },
    PaymentRefunded {
        invoice: InvoiceHash,
        employer: AccountId,
        amount: Decimal,
        asset: Asset,
    },
    RoleGranted {
        role: Role,
        account: AccountId,
        sender: AccountId,
    },
    RoleRevoked {
        role: Role,
        account: AccountId,
        sender: AccountId,
    },
    Paused {
        account: AccountId,
    },
    Unpaused {
        account: AccountId,
    },
}

impl EventKind {
    /// The invoice the event concerns, if any
    pub fn invoice(&self) -> Option<InvoiceHash> {
        match self {
            EventKind::InvoiceRegistered { invoice, .. }
            | EventKind::StatusChanged { invoice, .. }
            | EventKind::PaymentDeposited { invoice, .. }
            | EventKind::PaymentReleased { invoice, .. }
            | EventKind::PaymentRefunded { invoice, .. } => Some(*invoice),
            EventKind::RoleGranted { .. }
            | EventKind::RoleRevoked { .. }
            | EventKind::Paused { .. }
            | EventKind::Unpaused { .. } => None,
        }
    }
}

/// A journal entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEvent {
    /// Position in the journal, strictly increasing from 1
    pub sequence: u64,

    pub timestamp: DateTime<Utc>,

    #[serde(flatten)]
    pub kind: EventKind,
}
