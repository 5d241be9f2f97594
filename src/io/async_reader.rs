//! Asynchronous command script reader
//!
//! `AsyncReader` pulls a CSV command script from any `futures::io::AsyncRead`
//! in fixed-size batches for the concurrent replay strategy. Rows that fail
//! to parse are logged and skipped so one bad line does not stop the replay.

use crate::io::command_format::{convert_csv_command, CsvCommand};
use crate::types::LedgerCommand;
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;

/// Batch reader over an async CSV command source
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
    line_num: usize,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self {
            csv_reader,
            line_num: 0,
        }
    }

    /// Read up to `batch_size` valid commands
    ///
    /// Returns an empty batch once the source is exhausted.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<LedgerCommand> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut rows = self.csv_reader.deserialize::<CsvCommand>();

        while batch.len() < batch_size {
            let Some(row) = rows.next().await else {
                break;
            };
            self.line_num += 1;
            let line = self.line_num + 1;

            match row {
                Ok(csv_command) => match convert_csv_command(csv_command) {
                    Ok(command) => batch.push(command),
                    Err(e) => tracing::warn!(line, error = %e, "skipping invalid command"),
                },
                Err(e) => tracing::warn!(line, error = %e, "CSV parse error"),
            }
        }

        batch
    }
}
