//! Sequential replay strategy
//!
//! Reads the script row by row with `SyncReader` and applies each command to
//! the ledger on the calling thread, in script order.

use crate::core::{CommandProcessor, InvoiceLedger};
use crate::io::sync_reader::SyncReader;
use crate::strategy::{write_outputs, ProcessingStrategy, ReplayOptions, ReplaySummary};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

/// Single-threaded, streaming replay
#[derive(Debug, Clone, Default)]
pub struct SyncProcessingStrategy {
    options: ReplayOptions,
}

impl SyncProcessingStrategy {
    pub fn new(options: ReplayOptions) -> Self {
        Self { options }
    }
}

impl ProcessingStrategy for SyncProcessingStrategy {
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), String> {
        let ledger = Arc::new(InvoiceLedger::from_config(&self.options.ledger));
        let processor = CommandProcessor::new(Arc::clone(&ledger));
        let reader = SyncReader::new(input_path)?;
        let mut summary = ReplaySummary::default();

        for (index, item) in reader.enumerate() {
            match item {
                Ok(command) => {
                    let result = processor.process(&command);
                    if let Err(e) = &result {
                        tracing::warn!(index, operation = %command.operation(), error = %e, "command rejected");
                    }
                    summary.record(&result);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "skipping invalid command");
                }
            }
        }

        write_outputs(&ledger, &self.options, summary, output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "op,caller,invoice,freelancer,employer,amount,asset,domain,reason,role,account\n";

    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    fn run(script: &str) -> Result<String, String> {
        let file = create_temp_csv(script);
        let strategy = SyncProcessingStrategy::default();
        let mut output = Vec::new();
        strategy.process(file.path(), &mut output)?;
        Ok(String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_sync_strategy_registers_invoice() {
        let script = format!(
            "{}register,0x00000000000000000000000000000000000000b1,inv-1,0x00000000000000000000000000000000000000f1,0x00000000000000000000000000000000000000e1,2.5,,9,,,\n",
            HEADER
        );

        let output = run(&script).unwrap();

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].ends_with(",2.5,native,9,pending,0,"));
    }

    #[test]
    fn test_sync_strategy_skips_rejected_and_invalid_rows() {
        let script = format!(
            "{}register,0x00000000000000000000000000000000000000e1,inv-1,0x00000000000000000000000000000000000000f1,0x00000000000000000000000000000000000000e1,1,,,,,\n\
             nonsense,,,,,,,,,,\n",
            HEADER
        );

        let output = run(&script).unwrap();

        assert_eq!(output.lines().count(), 1);
    }

    #[test]
    fn test_sync_strategy_handles_missing_file() {
        let strategy = SyncProcessingStrategy::default();
        let mut output = Vec::new();

        let result = strategy.process(Path::new("nonexistent.csv"), &mut output);

        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Failed to open file"));
    }
}
