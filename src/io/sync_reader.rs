//! Synchronous CSV reader with iterator interface
//!
//! Streams submit requests from a `type,amount` CSV file one row at a time.
//! Format concerns are delegated to the csv_format module.
//!
//! ```no_run
//! use balance_ledger::io::sync_reader::SyncReader;
//! use std::path::Path;
//!
//! let reader = SyncReader::new(Path::new("commands.csv")).unwrap();
//! for result in reader {
//!     match result {
//!         Ok(request) => println!("Submitting: {:?}", request),
//!         Err(e) => eprintln!("Not submitted: {}", e),
//!     }
//! }
//! ```
//!
//! # Error Handling
//!
//! - A missing input file is returned from `new()`
//! - Malformed rows are yielded as `RowError::Malformed` with the line number
//! - Rows with a known type but an unusable amount are yielded as
//!   `RowError::Rejected`, so callers can count them as ledger rejections

use crate::io::csv_format::{convert_csv_command, CsvCommand, RowError};
use crate::types::{LedgerError, SubmitRequest};
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

/// Synchronous CSV reader
///
/// Yields one `Result<SubmitRequest, RowError>` per data row, in file order.
#[derive(Debug)]
pub struct SyncReader {
    reader: csv::Reader<File>,
    line_num: usize,
}

impl SyncReader {
    /// Open a command file for streaming
    ///
    /// Fields are trimmed and rows may omit the amount column.
    pub fn new(path: &Path) -> Result<Self, LedgerError> {
        let file = File::open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => LedgerError::file_not_found(path.display().to_string()),
            _ => LedgerError::from(e),
        })?;

        let reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .buffer_capacity(8 * 1024)
            .from_reader(file);

        Ok(Self {
            reader,
            line_num: 1,
        })
    }
}

impl Iterator for SyncReader {
    type Item = Result<SubmitRequest, RowError>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.reader.deserialize::<CsvCommand>().next()?;
        self.line_num += 1;

        let converted = match row {
            Ok(command) => convert_csv_command(command),
            Err(e) => Err(RowError::Malformed(format!("CSV parse error: {}", e))),
        };
        Some(converted.map_err(|e| e.at_line(self.line_num)))
    }
}
