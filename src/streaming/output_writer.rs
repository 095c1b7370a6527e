//! Single-column output writer with a lazily written header.
//!
//! The header is emitted right before the first non-empty batch, so the
//! output holds exactly one header line no matter how the input was
//! batched. In direct mode every batch is flushed to disk as soon as it is
//! written. In atomic mode rows go to a temp file next to the destination
//! that is renamed over it in `finish()`; dropping the writer early removes
//! the temp file and leaves any previous output alone.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use csv::{Terminator, Writer, WriterBuilder};
use tempfile::NamedTempFile;

use crate::config::LineTerminator;
use crate::error::FilterError;

/// Options for creating the output file.
#[derive(Debug, Clone, Copy, Default)]
pub struct WriterOptions {
    pub line_terminator: LineTerminator,
    /// Persist through a temp file instead of writing in place.
    pub atomic: bool,
}

enum Sink {
    Direct(Writer<BufWriter<File>>),
    Atomic(Writer<BufWriter<NamedTempFile>>),
}

/// Appends filtered batches to the output CSV.
pub struct OutputWriter {
    sink: Sink,
    path: PathBuf,
    header_written: bool,
    rows_written: u64,
    batches_written: u64,
}

impl OutputWriter {
    /// Creates the output. In direct mode an existing file is truncated
    /// immediately; in atomic mode only the temp file is created.
    pub fn create(path: impl AsRef<Path>, options: WriterOptions) -> Result<Self, FilterError> {
        let path = path.as_ref().to_path_buf();
        let terminator: Terminator = options.line_terminator.into();

        let sink = if options.atomic {
            // Same directory as the destination so the rename stays on one
            // filesystem.
            let dir = match path.parent() {
                Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
                _ => PathBuf::from("."),
            };
            let temp = NamedTempFile::new_in(&dir).map_err(|e| {
                FilterError::CsvWrite(format!(
                    "Failed to create temporary file in {}: {}",
                    dir.display(),
                    e
                ))
            })?;
            Sink::Atomic(csv_writer(temp, terminator))
        } else {
            let file = File::create(&path).map_err(|e| {
                FilterError::CsvWrite(format!("Failed to create {}: {}", path.display(), e))
            })?;
            Sink::Direct(csv_writer(file, terminator))
        };

        Ok(Self {
            sink,
            path,
            header_written: false,
            rows_written: 0,
            batches_written: 0,
        })
    }

    pub fn header_written(&self) -> bool {
        self.header_written
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    pub fn batches_written(&self) -> u64 {
        self.batches_written
    }

    /// Writes one batch of surviving values. Empty batches are skipped and
    /// return `false`.
    pub fn write_batch(&mut self, header: &str, values: &[String]) -> Result<bool, FilterError> {
        if values.is_empty() {
            return Ok(false);
        }

        let write_header = !self.header_written;
        let writer_result = match &mut self.sink {
            Sink::Direct(writer) => write_rows(writer, write_header, header, values)
                .and_then(|_| writer.flush().map_err(|e| e.into())),
            Sink::Atomic(writer) => write_rows(writer, write_header, header, values),
        };
        writer_result.map_err(|e| {
            FilterError::CsvWrite(format!("{}: {}", self.path.display(), e))
        })?;

        self.header_written = true;
        self.rows_written += values.len() as u64;
        self.batches_written += 1;
        Ok(true)
    }

    /// Flushes the output, renaming the temp file into place in atomic mode.
    pub fn finish(self) -> Result<PathBuf, FilterError> {
        match self.sink {
            Sink::Direct(writer) => {
                into_file(writer)?;
            }
            Sink::Atomic(writer) => {
                into_file(writer)?.persist(&self.path).map_err(|e| {
                    FilterError::CsvWrite(format!(
                        "Failed to persist file to {}: {}",
                        self.path.display(),
                        e.error
                    ))
                })?;
            }
        }
        Ok(self.path)
    }
}

fn csv_writer<W: Write>(inner: W, terminator: Terminator) -> Writer<BufWriter<W>> {
    WriterBuilder::new()
        .has_headers(false)
        .terminator(terminator)
        .from_writer(BufWriter::new(inner))
}

/// Flushes both buffer layers and hands back the underlying file.
fn into_file<W: Write>(writer: Writer<BufWriter<W>>) -> Result<W, FilterError> {
    let buf_writer = writer.into_inner().map_err(|e| {
        FilterError::CsvWrite(format!("Failed to flush CSV writer: {}", e.error()))
    })?;
    buf_writer.into_inner().map_err(|e| {
        FilterError::CsvWrite(format!("Failed to flush buffer: {}", e.error()))
    })
}

fn write_rows<W: Write>(
    writer: &mut Writer<W>,
    write_header: bool,
    header: &str,
    values: &[String],
) -> Result<(), csv::Error> {
    if write_header {
        writer.write_record([header])?;
    }
    for value in values {
        writer.write_record([value])?;
    }
    Ok(())
}
