//! Processing strategy module for command replay
//!
//! This module defines the Strategy pattern for complete replay pipelines,
//! covering script parsing, ledger execution and output. Different
//! implementations (sequential, concurrent batch) can be selected at runtime
//! and must produce the same invoice table and balances for the same script.
//! The event journal keeps every invoice's events in script order under both;
//! the concurrent strategy may interleave events of unrelated invoices
//! differently.

use crate::cli::StrategyType;
use crate::config::LedgerConfig;
use crate::core::InvoiceLedger;
use crate::io::{write_balances_csv, write_events_jsonl, write_invoices_csv};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub mod r#async;
pub mod sync;

pub use self::r#async::{AsyncProcessingStrategy, BatchConfig};
pub use sync::SyncProcessingStrategy;

/// Processing strategy trait for complete replay pipelines
pub trait ProcessingStrategy: Send + Sync {
    /// Replay the script at `input_path` and write the invoice table to `output`
    ///
    /// Rejected commands are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns `Err(String)` on fatal errors only: unreadable script, I/O
    /// failure while writing any output.
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), String>;
}

/// Everything a replay needs besides the script itself
#[derive(Debug, Clone, Default)]
pub struct ReplayOptions {
    /// Roles and journal sizing for the fresh ledger
    pub ledger: LedgerConfig,

    /// Where to write final wallet balances, if anywhere
    pub balances_path: Option<PathBuf>,

    /// Where to write the event journal as JSON lines, if anywhere
    pub events_path: Option<PathBuf>,
}

/// Counts of replayed commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub applied: usize,
    pub rejected: usize,
}

impl ReplaySummary {
    fn record<E: std::fmt::Display>(&mut self, result: &Result<(), E>) {
        match result {
            Ok(()) => self.applied += 1,
            Err(_) => self.rejected += 1,
        }
    }
}

/// Write the invoice table and any requested side outputs
pub(crate) fn write_outputs(
    ledger: &InvoiceLedger,
    options: &ReplayOptions,
    summary: ReplaySummary,
    output: &mut dyn Write,
) -> Result<(), String> {
    let invoices = ledger.invoices();
    write_invoices_csv(&invoices, output)?;

    if let Some(path) = &options.balances_path {
        let mut file = create_output(path)?;
        write_balances_csv(&ledger.assets().balances(), &mut file)?;
    }

    if let Some(path) = &options.events_path {
        let mut file = create_output(path)?;
        write_events_jsonl(&ledger.events(), &mut file)?;
    }

    let statistics = ledger.get_statistics();
    let settled = invoices
        .iter()
        .filter(|invoice| invoice.state.is_terminal())
        .count();
    tracing::info!(
        applied = summary.applied,
        rejected = summary.rejected,
        invoices = statistics.total_invoices,
        settled,
        paid = statistics.total_paid_invoices,
        escrow_volume = %statistics.total_escrow_volume,
        "replay complete"
    );

    Ok(())
}

fn create_output(path: &Path) -> Result<BufWriter<File>, String> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| format!("Failed to create file '{}': {}", path.display(), e))
}

/// Create a processing strategy
///
/// `config` tunes the async strategy and is ignored by the sync one.
pub fn create_strategy(
    strategy_type: StrategyType,
    config: Option<BatchConfig>,
    options: ReplayOptions,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncProcessingStrategy::new(options)),
        StrategyType::Async => {
            let config = config.unwrap_or_default();
            Box::new(AsyncProcessingStrategy::new(config, options))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SCRIPT: &str = "op,caller,invoice,freelancer,employer,amount,asset,domain,reason,role,account\n\
        mint,0x00000000000000000000000000000000000000a1,,,,10,native,,,,0x00000000000000000000000000000000000000e1\n\
        register,0x00000000000000000000000000000000000000b1,inv-1,0x00000000000000000000000000000000000000f1,0x00000000000000000000000000000000000000e1,4,native,1,,,\n\
        accept,0x00000000000000000000000000000000000000e1,inv-1,,,,,,,,\n\
        deposit,0x00000000000000000000000000000000000000e1,inv-1,,,4,,,,,\n\
        release,0x00000000000000000000000000000000000000e1,inv-1,,,,,,,,\n";

    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    #[rstest]
    #[case::sync(StrategyType::Sync)]
    #[case::async_strategy(StrategyType::Async)]
    fn test_strategies_write_side_outputs(#[case] strategy_type: StrategyType) {
        let script = create_temp_csv(SCRIPT);
        let dir = tempfile::tempdir().unwrap();
        let options = ReplayOptions {
            balances_path: Some(dir.path().join("balances.csv")),
            events_path: Some(dir.path().join("events.jsonl")),
            ..ReplayOptions::default()
        };

        let strategy = create_strategy(strategy_type, None, options.clone());
        let mut output = Vec::new();
        strategy.process(script.path(), &mut output).unwrap();

        let table = String::from_utf8(output).unwrap();
        assert!(table.contains(",paid,0,"));

        let balances = std::fs::read_to_string(options.balances_path.unwrap()).unwrap();
        assert!(balances.contains("0x00000000000000000000000000000000000000e1,native,6"));
        assert!(balances.contains("0x00000000000000000000000000000000000000f1,native,4"));

        let events = std::fs::read_to_string(options.events_path.unwrap()).unwrap();
        assert_eq!(events.lines().count(), 6);
    }

    #[test]
    fn test_summary_counts_results() {
        let mut summary = ReplaySummary::default();
        summary.record::<String>(&Ok(()));
        summary.record(&Err("boom".to_string()));
        summary.record::<String>(&Ok(()));

        assert_eq!(
            summary,
            ReplaySummary {
                applied: 2,
                rejected: 1
            }
        );
    }
}
