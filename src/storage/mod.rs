//! Storage module for persisting extracted records
//!
//! This module handles everything between a worker producing a record and
//! that record landing on disk:
//! - Run-wide deduplication by natural key
//! - Size-triggered batching with a single writer at a time
//! - Append-only CSV output with a header written exactly once

mod csv_sink;
mod pipeline;
mod traits;

pub use csv_sink::CsvSink;
pub use pipeline::{AddOutcome, StoragePipeline};
pub use traits::{RecordSink, StorageError, StorageResult};
