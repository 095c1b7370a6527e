//! The filter pipeline: load exclusions, stream the blocklist, write
//! survivors.

use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::FilterConfig;
use crate::error::FilterError;
use crate::exclusion::ExclusionSet;
use crate::streaming::{BatchReader, OutputWriter, ReaderOptions, WriterOptions};

/// Counters describing a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterSummary {
    pub exclusion_keys: usize,
    pub rows_read: u64,
    pub rows_excluded: u64,
    pub rows_written: u64,
    pub batches_read: u64,
    pub batches_written: u64,
    pub header_written: bool,
    pub output_path: PathBuf,
}

/// Keeps the values not present in `exclusions`, in order, duplicates
/// included.
pub fn filter_batch(values: Vec<String>, exclusions: &ExclusionSet) -> Vec<String> {
    if exclusions.is_empty() {
        return values;
    }
    values
        .into_iter()
        .filter(|value| !exclusions.contains(value))
        .collect()
}

/// Runs the whole pipeline for a validated configuration.
///
/// The blocklist is opened and its header checked before the output is
/// created, so a bad input never truncates a previous output. Once writing
/// has started, an error stops the run; in direct mode the batches flushed
/// so far stay on disk.
pub fn run(config: &FilterConfig) -> Result<FilterSummary, FilterError> {
    config.validate()?;

    let exclusions = ExclusionSet::load(&config.exclusion_path, config.exclusion_delimiter)?;
    info!(keys = exclusions.len(), "Exclusion set ready");

    let mut reader = open_blocklist(config)?;

    let mut output = OutputWriter::create(
        &config.output_path,
        WriterOptions {
            line_terminator: config.line_terminator,
            atomic: config.atomic_output,
        },
    )?;

    info!(
        source = %config.blocklist_path.display(),
        batch_size = config.batch_size,
        "Processing blocklist"
    );

    let header = reader.key_column().to_string();
    let mut rows_excluded: u64 = 0;

    while let Some(batch) = reader.next_batch()? {
        let index = batch.index;
        let read = batch.len();
        let survivors = filter_batch(batch.keys, &exclusions);
        rows_excluded += (read - survivors.len()) as u64;

        output.write_batch(&header, &survivors)?;

        debug!(
            batch = index,
            rows = read,
            kept = survivors.len(),
            "Processed batch"
        );
    }

    let summary = FilterSummary {
        exclusion_keys: exclusions.len(),
        rows_read: reader.rows_read(),
        rows_excluded,
        rows_written: output.rows_written(),
        batches_read: reader.batches_read(),
        batches_written: output.batches_written(),
        header_written: output.header_written(),
        output_path: output.finish()?,
    };

    info!(
        rows_read = summary.rows_read,
        rows_excluded = summary.rows_excluded,
        rows_written = summary.rows_written,
        output = %summary.output_path.display(),
        "Finished processing"
    );

    Ok(summary)
}

/// Checks that every input is usable without creating the output.
/// Returns the number of exclusion keys loaded.
pub fn dry_run(config: &FilterConfig) -> Result<usize, FilterError> {
    config.validate()?;
    let exclusions = ExclusionSet::load(&config.exclusion_path, config.exclusion_delimiter)?;
    let reader = open_blocklist(config)?;
    info!(
        exclusion_keys = exclusions.len(),
        key_column = reader.key_column(),
        "Inputs are valid"
    );
    Ok(exclusions.len())
}

fn open_blocklist(config: &FilterConfig) -> Result<BatchReader, FilterError> {
    let options = ReaderOptions::default()
        .batch_size(config.batch_size)
        .delimiter(config.blocklist_delimiter_byte()?)
        .key_column(config.key_column.clone());
    BatchReader::open(&config.blocklist_path, options)
}
