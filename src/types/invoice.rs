//! Invoice record types for the escrow ledger
//!
//! This module defines the invoice hash that keys every record, the lifecycle
//! states an invoice moves through, and the record itself.

use super::account::{AccountId, Asset};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Number of bytes in an invoice hash
pub const INVOICE_HASH_LEN: usize = 32;

/// Settlement network/domain tag carried by an invoice
pub type DomainId = u64;

/// Unique content-derived identifier of an invoice record
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InvoiceHash([u8; INVOICE_HASH_LEN]);

impl InvoiceHash {
    /// Wrap raw hash bytes
    pub const fn new(bytes: [u8; INVOICE_HASH_LEN]) -> Self {
        InvoiceHash(bytes)
    }

    /// Derive the hash of arbitrary invoice content (SHA-256)
    pub fn digest(content: impl AsRef<[u8]>) -> Self {
        let digest = Sha256::digest(content.as_ref());
        let mut bytes = [0u8; INVOICE_HASH_LEN];
        bytes.copy_from_slice(&digest);
        InvoiceHash(bytes)
    }

    /// Parse a hex hash, or hash the text itself when it is not one
    ///
    /// Command scripts name invoices either by their `0x`-prefixed 64-digit
    /// hash or by a free-form label.
    pub fn from_label(label: &str) -> Self {
        label
            .parse()
            .unwrap_or_else(|_| InvoiceHash::digest(label.trim()))
    }
}

impl fmt::Display for InvoiceHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for InvoiceHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InvoiceHash({})", self)
    }
}

impl FromStr for InvoiceHash {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim();
        let digits = digits
            .strip_prefix("0x")
            .or_else(|| digits.strip_prefix("0X"))
            .unwrap_or(digits);

        if digits.len() != INVOICE_HASH_LEN * 2 {
            return Err(format!(
                "Invalid invoice hash '{}': expected {} hex digits",
                s,
                INVOICE_HASH_LEN * 2
            ));
        }

        let mut bytes = [0u8; INVOICE_HASH_LEN];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|e| format!("Invalid invoice hash '{}': {}", s, e))?;
        Ok(InvoiceHash(bytes))
    }
}

impl TryFrom<String> for InvoiceHash {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<InvoiceHash> for String {
    fn from(value: InvoiceHash) -> Self {
        value.to_string()
    }
}

/// Lifecycle state of an invoice
///
/// ```text
/// Pending ──accept──▶ Accepted ──deposit──▶ Deposited ──release──▶ Paid
///    │                   │                      │
///    ├──reject──▶ Rejected                      └──refund──▶ Refunded
///    └──cancel──▶ Cancelled   Accepted ──mark_as_paid──▶ Paid
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceState {
    /// Registered by the backend, awaiting the employer's response
    Pending,

    /// Accepted by the employer, awaiting payment
    Accepted,

    /// Rejected by the employer
    Rejected,

    /// Payment held in escrow
    Deposited,

    /// Freelancer paid, either from escrow or off-ledger
    Paid,

    /// Withdrawn by the freelancer before the employer responded
    Cancelled,

    /// Escrowed payment returned to the employer
    Refunded,
}

impl InvoiceState {
    /// Returns true when no further transition leaves this state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            InvoiceState::Paid
                | InvoiceState::Cancelled
                | InvoiceState::Refunded
                | InvoiceState::Rejected
        )
    }

    /// Lowercase state name, as written to output
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceState::Pending => "pending",
            InvoiceState::Accepted => "accepted",
            InvoiceState::Rejected => "rejected",
            InvoiceState::Deposited => "deposited",
            InvoiceState::Paid => "paid",
            InvoiceState::Cancelled => "cancelled",
            InvoiceState::Refunded => "refunded",
        }
    }
}

impl fmt::Display for InvoiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Invoice record held by the ledger
///
/// Created by registration and only ever changed through the ledger's
/// lifecycle operations. Records are never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    /// Unique key of the record
    pub hash: InvoiceHash,

    /// Party doing the work and receiving payment
    pub freelancer: AccountId,

    /// Party paying for the work
    pub employer: AccountId,

    /// Amount owed; fixed at registration
    pub amount: Decimal,

    /// Asset the invoice settles in
    pub asset: Asset,

    /// Settlement network/domain tag (informational)
    pub domain_id: DomainId,

    /// Current lifecycle state
    pub state: InvoiceState,

    /// Reason given by the employer, set only on rejection
    pub rejection_reason: Option<String>,

    /// Funds currently held in escrow for this invoice
    ///
    /// Non-zero only while the invoice is `Deposited`.
    pub escrow_balance: Decimal,

    pub registered_at: DateTime<Utc>,

    /// Acceptance, rejection or cancellation time
    pub responded_at: Option<DateTime<Utc>>,

    pub deposited_at: Option<DateTime<Utc>>,

    /// Payment, release or refund time
    pub settled_at: Option<DateTime<Utc>>,
}

impl Invoice {
    /// Create a freshly registered, pending invoice with an empty escrow
    pub fn new(
        hash: InvoiceHash,
        freelancer: AccountId,
        employer: AccountId,
        amount: Decimal,
        asset: Asset,
        domain_id: DomainId,
        registered_at: DateTime<Utc>,
    ) -> Self {
        Invoice {
            hash,
            freelancer,
            employer,
            amount,
            asset,
            domain_id,
            state: InvoiceState::Pending,
            rejection_reason: None,
            escrow_balance: Decimal::ZERO,
            registered_at,
            responded_at: None,
            deposited_at: None,
            settled_at: None,
        }
    }
}
