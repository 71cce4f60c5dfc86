//! Storage traits and error types
//!
//! This module defines the trait interface for durable record destinations
//! and associated error types.

use crate::record::Record;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to persist a batch of {} records: {source}", .keys.len())]
    BatchLost {
        /// Natural keys of every record in the failed batch
        keys: Vec<String>,
        source: Box<StorageError>,
    },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A durable destination for records
///
/// Implementations are only ever driven by one flusher at a time; the
/// [`StoragePipeline`](crate::storage::StoragePipeline) serializes access.
pub trait RecordSink<R: Record>: Send {
    /// Appends a batch of records, in order, to the destination
    fn write_batch(&mut self, batch: &[R]) -> StorageResult<()>;

    /// Called once the pipeline has drained; flushes anything still pending
    fn finish(&mut self) -> StorageResult<()> {
        Ok(())
    }
}
