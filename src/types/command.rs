//! Command types for driving the invoice ledger
//!
//! This module defines the administrative roles, the set of operations the
//! ledger exposes, and `LedgerCommand` — one decoded request from a
//! collaborator (a row of a command script).

use super::account::{AccountId, Asset};
use super::invoice::{DomainId, InvoiceHash};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Globally granted roles
///
/// Freelancer and employer are per-invoice roles taken from the record
/// itself and are not represented here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Manages roles and the paused flag
    Administrator,

    /// Sole registrant of new invoices
    BackendService,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Administrator => f.write_str("administrator"),
            Role::BackendService => f.write_str("backend_service"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" | "administrator" => Ok(Role::Administrator),
            "backend" | "backend_service" | "backend-service" => Ok(Role::BackendService),
            other => Err(format!("Invalid role '{}'", other)),
        }
    }
}

/// Operations accepted by the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Register,
    Accept,
    Reject,
    Cancel,
    Deposit,
    Release,
    Refund,
    MarkPaid,
    Pause,
    Unpause,
    GrantRole,
    RevokeRole,
    Mint,
    Approve,
}

impl Operation {
    /// Script keyword for this operation
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Register => "register",
            Operation::Accept => "accept",
            Operation::Reject => "reject",
            Operation::Cancel => "cancel",
            Operation::Deposit => "deposit",
            Operation::Release => "release",
            Operation::Refund => "refund",
            Operation::MarkPaid => "mark_paid",
            Operation::Pause => "pause",
            Operation::Unpause => "unpause",
            Operation::GrantRole => "grant",
            Operation::RevokeRole => "revoke",
            Operation::Mint => "mint",
            Operation::Approve => "approve",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let op = match s.trim().to_lowercase().as_str() {
            "register" => Operation::Register,
            "accept" => Operation::Accept,
            "reject" => Operation::Reject,
            "cancel" => Operation::Cancel,
            "deposit" => Operation::Deposit,
            "release" => Operation::Release,
            "refund" => Operation::Refund,
            "mark_paid" | "mark_as_paid" => Operation::MarkPaid,
            "pause" => Operation::Pause,
            "unpause" => Operation::Unpause,
            "grant" | "grant_role" => Operation::GrantRole,
            "revoke" | "revoke_role" => Operation::RevokeRole,
            "mint" => Operation::Mint,
            "approve" => Operation::Approve,
            _ => return Err(format!("Invalid operation '{}'", s.trim())),
        };
        Ok(op)
    }
}

/// A single request submitted to the ledger
///
/// Every command names its caller; authorization is decided by the ledger
/// from the caller's roles and, for invoice operations, the record's parties.
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerCommand {
    Register {
        caller: AccountId,
        invoice: InvoiceHash,
        freelancer: AccountId,
        employer: AccountId,
        amount: Decimal,
        asset: Asset,
        domain_id: DomainId,
    },
    Accept {
        caller: AccountId,
        invoice: InvoiceHash,
    },
    Reject {
        caller: AccountId,
        invoice: InvoiceHash,
        reason: String,
    },
    Cancel {
        caller: AccountId,
        invoice: InvoiceHash,
    },
    /// `attached` is the native value sent along with the call
    Deposit {
        caller: AccountId,
        invoice: InvoiceHash,
        attached: Option<Decimal>,
    },
    Release {
        caller: AccountId,
        invoice: InvoiceHash,
    },
    Refund {
        caller: AccountId,
        invoice: InvoiceHash,
    },
    MarkPaid {
        caller: AccountId,
        invoice: InvoiceHash,
    },
    Pause {
        caller: AccountId,
    },
    Unpause {
        caller: AccountId,
    },
    GrantRole {
        caller: AccountId,
        role: Role,
        account: AccountId,
    },
    RevokeRole {
        caller: AccountId,
        role: Role,
        account: AccountId,
    },
    /// Credit fresh supply to an account (funding for scripts and tests)
    Mint {
        caller: AccountId,
        account: AccountId,
        asset: Asset,
        amount: Decimal,
    },
    /// Allow the escrow to pull `amount` of `token` from the caller
    Approve {
        caller: AccountId,
        token: AccountId,
        amount: Decimal,
    },
}

impl LedgerCommand {
    /// The operation this command invokes
    pub fn operation(&self) -> Operation {
        match self {
            LedgerCommand::Register { .. } => Operation::Register,
            LedgerCommand::Accept { .. } => Operation::Accept,
            LedgerCommand::Reject { .. } => Operation::Reject,
            LedgerCommand::Cancel { .. } => Operation::Cancel,
            LedgerCommand::Deposit { .. } => Operation::Deposit,
            LedgerCommand::Release { .. } => Operation::Release,
            LedgerCommand::Refund { .. } => Operation::Refund,
            LedgerCommand::MarkPaid { .. } => Operation::MarkPaid,
            LedgerCommand::Pause { .. } => Operation::Pause,
            LedgerCommand::Unpause { .. } => Operation::Unpause,
            LedgerCommand::GrantRole { .. } => Operation::GrantRole,
            LedgerCommand::RevokeRole { .. } => Operation::RevokeRole,
            LedgerCommand::Mint { .. } => Operation::Mint,
            LedgerCommand::Approve { .. } => Operation::Approve,
        }
    }

    /// The account submitting the command
    pub fn caller(&self) -> AccountId {
        match self {
            LedgerCommand::Register { caller, .. }
            | LedgerCommand::Accept { caller, .. }
            | LedgerCommand::Reject { caller, .. }
            | LedgerCommand::Cancel { caller, .. }
            | LedgerCommand::Deposit { caller, .. }
            | LedgerCommand::Release { caller, .. }
            | LedgerCommand::Refund { caller, .. }
            | LedgerCommand::MarkPaid { caller, .. }
            | LedgerCommand::Pause { caller }
            | LedgerCommand::Unpause { caller }
            | LedgerCommand::GrantRole { caller, .. }
            | LedgerCommand::RevokeRole { caller, .. }
            | LedgerCommand::Mint { caller, .. }
            | LedgerCommand::Approve { caller, .. } => *caller,
        }
    }

    /// The invoice this command acts on, if any
    ///
    /// Commands without an invoice touch shared state (roles, paused flag,
    /// balances) and are replayed as ordering barriers.
    pub fn invoice(&self) -> Option<InvoiceHash> {
        match self {
            LedgerCommand::Register { invoice, .. }
            | LedgerCommand::Accept { invoice, .. }
            | LedgerCommand::Reject { invoice, .. }
            | LedgerCommand::Cancel { invoice, .. }
            | LedgerCommand::Deposit { invoice, .. }
            | LedgerCommand::Release { invoice, .. }
            | LedgerCommand::Refund { invoice, .. }
            | LedgerCommand::MarkPaid { invoice, .. } => Some(*invoice),
            _ => None,
        }
    }
}
