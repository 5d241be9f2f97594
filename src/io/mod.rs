//! I/O module
//!
//! Handles command script parsing and ledger output.
//!
//! # Components
//!
//! - `command_format` - CSV command format (row conversion, output serialization)
//! - `sync_reader` - Synchronous script reader with iterator interface
//! - `async_reader` - Asynchronous script reader with batch reading interface

pub mod async_reader;
pub mod command_format;
pub mod sync_reader;

pub use async_reader::AsyncReader;
pub use command_format::{
    convert_csv_command, write_balances_csv, write_events_jsonl, write_invoices_csv, CsvCommand,
};
pub use sync_reader::SyncReader;
