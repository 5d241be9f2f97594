//! Core business logic module
//!
//! This module contains the escrow ledger and its collaborators:
//! - `traits` - Trait abstraction for interchangeable asset backends
//! - `asset_bank` - In-memory balances, allowances and escrow custody
//! - `access_control` - Global roles and the pause switch
//! - `statistics` - Aggregate counters and per-party invoice indexes
//! - `events` - Append-only event journal with live subscription
//! - `ledger` - Invoice lifecycle state machine
//! - `processor` - Routes commands to ledger operations
//! - `batch_processor` - Concurrent replay partitioned by invoice

pub mod access_control;
pub mod asset_bank;
pub mod batch_processor;
pub mod events;
pub mod ledger;
pub mod processor;
pub mod statistics;
pub mod traits;

pub use access_control::AccessControl;
pub use asset_bank::{AssetBank, BalanceEntry};
pub use batch_processor::{BatchProcessor, ProcessingResult};
pub use events::{EventLog, DEFAULT_EVENT_CAPACITY};
pub use ledger::InvoiceLedger;
pub use processor::CommandProcessor;
pub use statistics::{Statistics, StatisticsSnapshot};
pub use traits::AssetTransfer;
