//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `account`: Party and asset identifiers
//! - `invoice`: Invoice hash, lifecycle state and record
//! - `command`: Roles, operations and ledger commands
//! - `event`: Audit events
//! - `error`: Error types for the ledger

pub mod account;
pub mod command;
pub mod error;
pub mod event;
pub mod invoice;

pub use account::{AccountId, Asset};
pub use command::{LedgerCommand, Operation, Role};
pub use error::LedgerError;
pub use event::{EventKind, LedgerEvent};
pub use invoice::{DomainId, Invoice, InvoiceHash, InvoiceState};
