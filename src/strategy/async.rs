//! Concurrent batch replay strategy
//!
//! Reads the script in batches with `AsyncReader` and hands each batch to the
//! `BatchProcessor`, which runs different invoices on separate tokio tasks.
//! Batches are processed one after another, so an invoice whose commands span
//! several batches still sees them in script order.

use crate::core::{BatchProcessor, CommandProcessor, InvoiceLedger};
use crate::io::async_reader::AsyncReader;
use crate::strategy::{write_outputs, ProcessingStrategy, ReplayOptions, ReplaySummary};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

/// Tuning for the concurrent strategy
#[derive(Clone, Debug)]
pub struct BatchConfig {
    /// Commands read per batch
    pub batch_size: usize,

    /// Runtime worker threads
    pub max_concurrent_batches: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_concurrent_batches: num_cpus::get(),
        }
    }
}

impl BatchConfig {
    /// Build a config, replacing zero values with defaults
    pub fn new(batch_size: usize, max_concurrent_batches: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            tracing::warn!(
                batch_size,
                default = default.batch_size,
                "invalid batch size, using default"
            );
            default.batch_size
        } else {
            batch_size
        };

        let max_concurrent_batches = if max_concurrent_batches == 0 {
            tracing::warn!(
                max_concurrent_batches,
                default = default.max_concurrent_batches,
                "invalid concurrency, using default"
            );
            default.max_concurrent_batches
        } else {
            max_concurrent_batches
        };

        Self {
            batch_size,
            max_concurrent_batches,
        }
    }
}

/// Multi-threaded replay partitioned by shared parties
#[derive(Debug, Clone)]
pub struct AsyncProcessingStrategy {
    config: BatchConfig,
    options: ReplayOptions,
}

impl AsyncProcessingStrategy {
    pub fn new(config: BatchConfig, options: ReplayOptions) -> Self {
        Self { config, options }
    }
}

impl ProcessingStrategy for AsyncProcessingStrategy {
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), String> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.max_concurrent_batches)
            .build()
            .map_err(|e| format!("Failed to create tokio runtime: {}", e))?;

        let ledger = Arc::new(InvoiceLedger::from_config(&self.options.ledger));

        let summary = runtime.block_on(async {
            let processor = BatchProcessor::new(CommandProcessor::new(Arc::clone(&ledger)));

            let file = tokio::fs::File::open(input_path)
                .await
                .map_err(|e| format!("Failed to open file '{}': {}", input_path.display(), e))?;
            let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);
            let mut reader = AsyncReader::new(compat_file);
            let mut summary = ReplaySummary::default();

            loop {
                let batch = reader.read_batch(self.config.batch_size).await;
                if batch.is_empty() {
                    break;
                }

                for processed in processor.process_batch(batch).await {
                    if let Err(e) = &processed.result {
                        tracing::warn!(
                            operation = %processed.command.operation(),
                            error = %e,
                            "command rejected"
                        );
                    }
                    summary.record(&processed.result);
                }
            }

            Ok::<_, String>(summary)
        })?;

        write_outputs(&ledger, &self.options, summary, output)
    }
}
