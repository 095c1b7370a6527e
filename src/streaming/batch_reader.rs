//! Batched, record-aware reading of the blocklist CSV.
//!
//! Uses the `csv` crate so quoted fields with embedded commas or newlines
//! never split a record. Only the key column is kept from each record, and
//! at most `batch_size` of them are held in memory at a time.

use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::path::Path;

use csv::{Reader, ReaderBuilder, StringRecord};

use crate::config::{DEFAULT_BATCH_SIZE, DEFAULT_KEY_COLUMN};
use crate::error::FilterError;

/// Options for reading the blocklist.
#[derive(Debug, Clone)]
pub struct ReaderOptions {
    /// Maximum records per batch.
    pub batch_size: usize,
    /// Field delimiter byte.
    pub delimiter: u8,
    /// Header name of the column to extract.
    pub key_column: String,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            delimiter: b',',
            key_column: DEFAULT_KEY_COLUMN.to_string(),
        }
    }
}

impl ReaderOptions {
    /// Sets the batch_size limit.
    pub fn batch_size(mut self, rows: usize) -> Self {
        self.batch_size = rows;
        self
    }

    /// Sets the field delimiter.
    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Sets the key column name.
    pub fn key_column(mut self, column: impl Into<String>) -> Self {
        self.key_column = column.into();
        self
    }
}

/// Key values of consecutive input records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// Zero-based position of this batch in the input.
    pub index: u64,
    /// Key column value of each record, in input order.
    pub keys: Vec<String>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Streams the blocklist in batches of key values.
pub struct BatchReader {
    reader: Reader<BufReader<File>>,
    key_index: usize,
    column_count: usize,
    key_column: String,
    batch_size: usize,
    record: StringRecord,
    batches_read: u64,
    rows_read: u64,
    done: bool,
}

impl BatchReader {
    /// Opens the blocklist and locates the key column in its header.
    ///
    /// # Errors
    ///
    /// - `FilterError::SourceNotFound` if `path` does not exist.
    /// - `FilterError::NoHeader` if the file is empty.
    /// - `FilterError::MissingColumn` if the header lacks the key column.
    pub fn open(path: impl AsRef<Path>, options: ReaderOptions) -> Result<Self, FilterError> {
        let path = path.as_ref();
        if options.batch_size == 0 {
            return Err(FilterError::InvalidConfig(
                "batch_size must be greater than zero".to_string(),
            ));
        }

        let file = File::open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => FilterError::SourceNotFound(path.to_path_buf()),
            _ => FilterError::Io(format!("Failed to open {}: {}", path.display(), e)),
        })?;

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .delimiter(options.delimiter)
            .from_reader(BufReader::new(file));

        let headers = reader
            .headers()
            .map_err(|e| FilterError::CsvRead(format!("Failed to read CSV headers: {}", e)))?;

        if headers.is_empty() {
            return Err(FilterError::NoHeader);
        }

        let key_index = headers
            .iter()
            .position(|name| name.trim_start_matches('\u{feff}') == options.key_column)
            .ok_or_else(|| FilterError::MissingColumn {
                column: options.key_column.clone(),
            })?;

        let column_count = headers.len();

        #[cfg(debug_assertions)]
        tracing::debug!(
            source = %path.display(),
            columns = column_count,
            key_index,
            "Opened blocklist"
        );

        Ok(Self {
            reader,
            key_index,
            column_count,
            key_column: options.key_column,
            batch_size: options.batch_size,
            record: StringRecord::new(),
            batches_read: 0,
            rows_read: 0,
            done: false,
        })
    }

    /// Name of the key column, as written to the output header.
    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    /// Total data records read so far.
    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }

    /// Number of batches produced so far.
    pub fn batches_read(&self) -> u64 {
        self.batches_read
    }

    /// Reads up to `batch_size` records. Returns `None` once the input is
    /// exhausted; a batch is never empty.
    pub fn next_batch(&mut self) -> Result<Option<Batch>, FilterError> {
        if self.done {
            return Ok(None);
        }

        let mut keys = Vec::with_capacity(self.batch_size.min(64 * 1024));
        while keys.len() < self.batch_size {
            let more = self.reader.read_record(&mut self.record).map_err(|e| {
                self.done = true;
                FilterError::CsvRead(e.to_string())
            })?;
            if !more {
                self.done = true;
                break;
            }
            // Short rows are padded like missing values; long rows are a
            // tokenizing error.
            if self.record.len() > self.column_count {
                self.done = true;
                let line = self.record.position().map(|p| p.line()).unwrap_or(0);
                return Err(FilterError::CsvRead(format!(
                    "line {}: expected at most {} fields, found {}",
                    line,
                    self.column_count,
                    self.record.len()
                )));
            }
            keys.push(self.record.get(self.key_index).unwrap_or("").to_string());
        }

        if keys.is_empty() {
            return Ok(None);
        }

        let batch = Batch {
            index: self.batches_read,
            keys,
        };
        self.batches_read += 1;
        self.rows_read += batch.len() as u64;
        Ok(Some(batch))
    }
}

impl Iterator for BatchReader {
    type Item = Result<Batch, FilterError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_batch().transpose()
    }
}
