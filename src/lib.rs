//! Invoice Escrow Ledger Library
//! # Overview
//!
//! This library provides an invoice escrow ledger: a state machine that
//! registers work invoices between a freelancer and an employer, enforces who
//! may move each invoice through its lifecycle, and holds payment in escrow
//! until it is released or refunded. A replay tool drives the ledger from CSV
//! command scripts using either a sequential or a concurrent strategy.
//!
//! # Architecture
//!
//! - [`types`] - Identifiers, invoice records, commands, events and errors
//! - [`core`] - Business logic components:
//!   - [`core::ledger`] - Invoice lifecycle and escrow custody
//!   - [`core::access_control`] - Global roles and the pause switch
//!   - [`core::asset_bank`] - Native and token balances behind [`core::AssetTransfer`]
//!   - [`core::statistics`] - Aggregate counters and per-party indexes
//!   - [`core::events`] - Event journal with live subscription
//!   - [`core::batch_processor`] - Concurrent replay partitioned by shared parties
//! - [`io`] - CSV command scripts and ledger output
//! - [`strategy`] - Sequential and concurrent replay pipelines
//! - [`config`] - TOML ledger bootstrap configuration
//! - [`cli`] - CLI arguments parsing
//!
//! # Invoice Lifecycle
//!
//! ```text
//! Pending ──accept──▶ Accepted ──deposit──▶ Deposited ──release──▶ Paid
//!    │                   │                      │
//!    ├──reject──▶ Rejected                      └──refund──▶ Refunded
//!    └──cancel──▶ Cancelled   └──mark as paid──▶ Paid
//! ```
//!
//! `Paid`, `Rejected`, `Cancelled` and `Refunded` are terminal.
//!
//! # Example
//!
//! ```
//! use invoice_escrow_ledger::{AccountId, Asset, InvoiceHash, InvoiceLedger, InvoiceState, LedgerConfig};
//! use rust_decimal::Decimal;
//!
//! let config = LedgerConfig::default();
//! let admin = config.administrators[0];
//! let backend = config.backend_services[0];
//! let freelancer = AccountId::from_low_u64(0xf1);
//! let employer = AccountId::from_low_u64(0xe1);
//! let invoice = InvoiceHash::digest("website redesign");
//!
//! let ledger = InvoiceLedger::from_config(&config);
//! ledger.mint(admin, employer, Asset::Native, Decimal::TEN).unwrap();
//! ledger
//!     .register_invoice(backend, invoice, freelancer, employer, Decimal::TEN, Asset::Native, 1)
//!     .unwrap();
//! ledger.accept_invoice(employer, invoice).unwrap();
//! ledger.deposit_payment(employer, invoice, Some(Decimal::TEN)).unwrap();
//! let paid = ledger.release_payment(employer, invoice).unwrap();
//!
//! assert_eq!(paid.state, InvoiceState::Paid);
//! assert_eq!(ledger.assets().balance_of(freelancer, Asset::Native), Decimal::TEN);
//! ```

// Module declarations
pub mod cli;
pub mod config;
pub mod core;
pub mod io;
pub mod strategy;
pub mod types;

pub use config::{ConfigError, LedgerConfig};
pub use core::{
    AccessControl, AssetBank, AssetTransfer, CommandProcessor, EventLog, InvoiceLedger,
    StatisticsSnapshot,
};
pub use io::write_invoices_csv;
pub use types::{
    AccountId, Asset, DomainId, EventKind, Invoice, InvoiceHash, InvoiceState, LedgerCommand,
    LedgerError, LedgerEvent, Operation, Role,
};
