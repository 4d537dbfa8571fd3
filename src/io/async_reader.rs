//! Asynchronous CSV reader with batch interface
//!
//! Reads submit requests from any `futures::io::AsyncRead` source in batches,
//! for the concurrent replay strategy. Malformed rows are logged and skipped.
//! Rows with an invalid amount never reach the engine, so the reader logs and
//! counts them as rejections itself.

use crate::io::csv_format::{convert_csv_command, CsvCommand, RowError};
use crate::types::SubmitRequest;
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;
use tracing::warn;

/// Asynchronous CSV reader
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
    line_num: usize,
    skipped: usize,
    rejected: usize,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self {
            csv_reader,
            line_num: 1,
            skipped: 0,
            rejected: 0,
        }
    }

    /// Read up to `batch_size` valid requests
    ///
    /// Returns an empty vector at end of input.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<SubmitRequest> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut rows = self.csv_reader.deserialize::<CsvCommand>();

        while batch.len() < batch_size {
            let Some(row) = rows.next().await else {
                break;
            };
            self.line_num += 1;

            let converted = row
                .map_err(|e| RowError::Malformed(format!("CSV parse error: {}", e)))
                .and_then(convert_csv_command);

            match converted {
                Ok(request) => batch.push(request),
                Err(RowError::Rejected { kind, reason }) => {
                    self.rejected += 1;
                    warn!(line = self.line_num, kind = %kind, reason = %reason, "Submission rejected");
                }
                Err(RowError::Malformed(e)) => {
                    self.skipped += 1;
                    warn!(line = self.line_num, error = %e, "Skipping input row");
                }
            }
        }

        batch
    }

    /// Number of rows skipped so far
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Number of rows rejected for an invalid amount so far
    pub fn rejected(&self) -> usize {
        self.rejected
    }
}
