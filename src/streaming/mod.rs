//! Streaming utilities for processing large files.
//!
//! This module provides record-aware batched CSV reading so the blocklist is
//! never loaded whole, and a single-column output writer that can write in
//! place or atomically through a temp file.

mod batch_reader;
mod output_writer;

pub use batch_reader::{Batch, BatchReader, ReaderOptions};
pub use output_writer::{OutputWriter, WriterOptions};
