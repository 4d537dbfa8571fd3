//! Durable, file-backed ledger store
//!
//! Entries are kept in a CSV append log with the columns
//! `sequence,kind,amount,balance,timestamp`, one row per committed entry.
//!
//! # Durability
//!
//! Each append writes exactly one row, then flushes and `sync_data`s the file
//! before the entry is reported as committed. If any step fails the file is
//! truncated back to its length before the append, so a failed append never
//! leaves a partial row behind, and the error is surfaced as
//! [`StoreError::Unavailable`]. If the truncation itself fails, the tail of
//! the file is unknown and the store refuses every later append.
//!
//! # Recovery
//!
//! [`FileLedgerStore::open`] replays the whole log and checks every row against
//! its predecessor (sequence continuity and the balance recurrence). A log that
//! fails the check is reported as [`StoreError::Corrupt`] and is not opened.

use crate::core::traits::LedgerStore;
use crate::types::{check_continuity, EntryKind, LedgerEntry, Sequence, StoreError};
use chrono::{DateTime, SecondsFormat, Utc};
use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, error, info};

const HEADER: [&str; 5] = ["sequence", "kind", "amount", "balance", "timestamp"];

/// Raw persisted row
///
/// Decimals and timestamps are read as text and parsed explicitly so that no
/// value goes through a lossy numeric type on the way in.
#[derive(Debug, Deserialize)]
struct StoredRow {
    sequence: Sequence,
    kind: String,
    amount: String,
    balance: String,
    timestamp: String,
}

impl StoredRow {
    fn into_entry(self) -> Result<LedgerEntry, String> {
        let kind = EntryKind::from_str(&self.kind)?;
        let amount = Decimal::from_str(&self.amount)
            .map_err(|e| format!("invalid amount '{}': {}", self.amount, e))?;
        let balance = Decimal::from_str(&self.balance)
            .map_err(|e| format!("invalid balance '{}': {}", self.balance, e))?;
        let timestamp = DateTime::parse_from_rfc3339(&self.timestamp)
            .map_err(|e| format!("invalid timestamp '{}': {}", self.timestamp, e))?
            .with_timezone(&Utc);

        Ok(LedgerEntry {
            sequence: self.sequence,
            kind,
            amount,
            balance,
            timestamp,
        })
    }
}

/// Ledger store persisted to a CSV append log
///
/// Keeps an in-memory copy of the log so reads and the current balance never
/// touch the disk. The copy is only extended after a row is durable.
#[derive(Debug)]
pub struct FileLedgerStore {
    path: PathBuf,
    file: File,
    entries: Vec<LedgerEntry>,

    /// Set when a failed append could not be rolled back
    poisoned: bool,
}

impl FileLedgerStore {
    /// Open (or create) the ledger log at `path`
    ///
    /// A missing file is created with a header row. An existing file is
    /// replayed and verified.
    ///
    /// # Errors
    ///
    /// * `StoreError::Unavailable` - The file cannot be created, opened or read
    /// * `StoreError::Corrupt` - A row is malformed or breaks the ledger invariants
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&path)
            .map_err(|e| {
                StoreError::unavailable(format!("cannot open '{}': {}", path.display(), e))
            })?;

        if file.metadata()?.len() == 0 {
            file.write_all(&encode_record(&HEADER)?)?;
            file.sync_data()?;
            debug!(path = %path.display(), "Created ledger log");
        }

        let entries = load_entries(&path)?;
        info!(
            path = %path.display(),
            entries = entries.len(),
            "Opened ledger log"
        );

        Ok(Self {
            path,
            file,
            entries,
            poisoned: false,
        })
    }

    fn write_row(&mut self, entry: &LedgerEntry) -> std::io::Result<()> {
        let row = encode_record(&[
            entry.sequence.to_string(),
            entry.kind.to_string(),
            entry.amount.to_string(),
            entry.balance.to_string(),
            entry
                .timestamp
                .to_rfc3339_opts(SecondsFormat::AutoSi, true),
        ])?;
        self.file.write_all(&row)?;
        self.file.flush()?;
        self.file.sync_data()
    }
}

impl LedgerStore for FileLedgerStore {
    fn append(&mut self, entry: LedgerEntry) -> Result<LedgerEntry, StoreError> {
        if self.poisoned {
            return Err(StoreError::unavailable(format!(
                "'{}' has an unrecovered partial row; reopen the ledger",
                self.path.display()
            )));
        }
        self.check_sequence(&entry)?;

        let committed_len = self.file.metadata()?.len();
        if let Err(e) = self.write_row(&entry) {
            // Drop whatever part of the row reached the file
            if let Err(truncate_err) = self.file.set_len(committed_len) {
                error!(
                    path = %self.path.display(),
                    error = %truncate_err,
                    "Failed to roll back partial ledger row, refusing further appends"
                );
                self.poisoned = true;
            }
            return Err(StoreError::unavailable(format!(
                "cannot append to '{}': {}",
                self.path.display(),
                e
            )));
        }

        self.entries.push(entry.clone());
        Ok(entry)
    }

    fn read_all(&self) -> Result<Vec<LedgerEntry>, StoreError> {
        Ok(self.entries.clone())
    }

    fn current_balance(&self) -> Decimal {
        self.entries
            .last()
            .map_or(Decimal::ZERO, |entry| entry.balance)
    }

    fn last_sequence(&self) -> Option<Sequence> {
        self.entries.last().map(|entry| entry.sequence)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Encode one CSV record, quoted as needed, terminated by a newline
fn encode_record<I, T>(fields: I) -> std::io::Result<Vec<u8>>
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(fields)?;
    writer
        .into_inner()
        .map_err(|e| std::io::Error::other(e.to_string()))
}

/// Replay and verify every row of the log
fn load_entries(path: &Path) -> Result<Vec<LedgerEntry>, StoreError> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .from_path(path)
        .map_err(|e| StoreError::unavailable(format!("cannot read '{}': {}", path.display(), e)))?;

    let corrupt = |e: csv::Error| {
        let line = e.position().map(|pos| pos.line());
        StoreError::corrupt(line, e.to_string())
    };
    let headers = reader.headers().map_err(corrupt)?.clone();

    let mut entries: Vec<LedgerEntry> = Vec::new();
    let mut record = StringRecord::new();
    while reader.read_record(&mut record).map_err(corrupt)? {
        let line = record.position().map(|pos| pos.line());
        let row: StoredRow = record
            .deserialize(Some(&headers))
            .map_err(|e| StoreError::corrupt(line, e.to_string()))?;
        let entry = row
            .into_entry()
            .map_err(|message| StoreError::corrupt(line, message))?;
        check_continuity(entries.last(), &entry)
            .map_err(|message| StoreError::corrupt(line, message))?;
        entries.push(entry);
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn entry(sequence: Sequence, kind: EntryKind, amount: i64, balance: i64) -> LedgerEntry {
        LedgerEntry {
            sequence,
            kind,
            amount: Decimal::from(amount),
            balance: Decimal::from(balance),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_open_creates_log_with_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.csv");

        let store = FileLedgerStore::open(&path).unwrap();

        assert!(store.is_empty());
        assert_eq!(store.current_balance(), Decimal::ZERO);
        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "sequence,kind,amount,balance,timestamp\n");
    }

    #[test]
    fn test_entries_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.csv");

        let first = entry(1, EntryKind::Credit, 100, 100);
        let second = LedgerEntry {
            amount: Decimal::new(4025, 2),
            balance: Decimal::new(5975, 2),
            ..entry(2, EntryKind::Debit, 0, 0)
        };
        {
            let mut store = FileLedgerStore::open(&path).unwrap();
            store.append(first.clone()).unwrap();
            store.append(second.clone()).unwrap();
        }

        let reopened = FileLedgerStore::open(&path).unwrap();
        let entries = reopened.read_all().unwrap();
        assert_eq!(entries, vec![first, second]);
        assert_eq!(reopened.current_balance(), Decimal::new(5975, 2));
        assert_eq!(reopened.next_sequence(), 3);
    }

    #[test]
    fn test_append_rejects_sequence_gap_without_writing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.csv");
        let mut store = FileLedgerStore::open(&path).unwrap();

        let result = store.append(entry(2, EntryKind::Credit, 1, 1));

        assert_eq!(result, Err(StoreError::sequence_gap(1, 2)));
        assert_eq!(
            fs::read_to_string(&path).unwrap().lines().count(),
            1,
            "only the header should be present"
        );
    }

    #[test]
    fn test_open_detects_broken_recurrence() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.csv");
        fs::write(
            &path,
            "sequence,kind,amount,balance,timestamp\n\
             1,Credit,100,100,2024-01-01T00:00:00Z\n\
             2,Debit,40,70,2024-01-01T00:00:01Z\n",
        )
        .unwrap();

        let err = FileLedgerStore::open(&path).unwrap_err();
        assert!(
            matches!(err, StoreError::Corrupt { line: Some(3), .. }),
            "unexpected error: {:?}",
            err
        );
    }

    #[test]
    fn test_open_detects_sequence_gap() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.csv");
        fs::write(
            &path,
            "sequence,kind,amount,balance,timestamp\n\
             1,Credit,100,100,2024-01-01T00:00:00Z\n\
             3,Credit,1,101,2024-01-01T00:00:01Z\n",
        )
        .unwrap();

        let err = FileLedgerStore::open(&path).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn test_open_detects_malformed_row() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.csv");
        fs::write(
            &path,
            "sequence,kind,amount,balance,timestamp\n\
             1,Refund,100,100,2024-01-01T00:00:00Z\n",
        )
        .unwrap();

        let err = FileLedgerStore::open(&path).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { line: Some(2), .. }));
    }

    #[test]
    fn test_corrupt_line_counts_blank_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.csv");
        fs::write(
            &path,
            "sequence,kind,amount,balance,timestamp\n\
             1,Credit,100,100,2024-01-01T00:00:00Z\n\
             \n\
             \n\
             2,Debit,40,70,2024-01-01T00:00:01Z\n",
        )
        .unwrap();

        let err = FileLedgerStore::open(&path).unwrap_err();
        assert!(
            matches!(err, StoreError::Corrupt { line: Some(5), .. }),
            "unexpected error: {:?}",
            err
        );
    }

    #[test]
    fn test_failed_rollback_refuses_later_appends() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.csv");
        let mut store = FileLedgerStore::open(&path).unwrap();
        store.append(entry(1, EntryKind::Credit, 10, 10)).unwrap();

        // A read-only handle fails both the write and the truncate
        store.file = File::open(&path).unwrap();
        let failed = store.append(entry(2, EntryKind::Credit, 5, 15));
        assert!(matches!(failed, Err(StoreError::Unavailable { .. })));
        assert_eq!(store.len(), 1);

        // Even with a usable handle again, the store stays closed for writes
        store.file = OpenOptions::new().append(true).open(&path).unwrap();
        let refused = store.append(entry(2, EntryKind::Credit, 5, 15));
        assert!(matches!(refused, Err(StoreError::Unavailable { .. })));
        assert_eq!(store.current_balance(), Decimal::from(10));

        let reopened = FileLedgerStore::open(&path).unwrap();
        assert_eq!(reopened.read_all().unwrap(), store.read_all().unwrap());
    }

    #[test]
    fn test_open_unwritable_location_is_unavailable() {
        let dir = TempDir::new().unwrap();

        // A directory cannot be opened as a log file
        let err = FileLedgerStore::open(dir.path()).unwrap_err();
        assert!(matches!(err, StoreError::Unavailable { .. }));
    }

    #[test]
    fn test_timestamps_round_trip_exactly() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.csv");
        let original = entry(1, EntryKind::Credit, 3, 3);
        {
            let mut store = FileLedgerStore::open(&path).unwrap();
            store.append(original.clone()).unwrap();
        }

        let reopened = FileLedgerStore::open(&path).unwrap();
        assert_eq!(reopened.read_all().unwrap()[0].timestamp, original.timestamp);
    }
}
