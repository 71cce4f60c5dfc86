//! Deduplicating, batching storage pipeline
//!
//! Every worker hands its records to one shared [`StoragePipeline`]. Records
//! are deduplicated by natural key for the whole run, buffered, and written to
//! the sink in batches once the buffer reaches the flush threshold.
//!
//! # Locking
//!
//! The buffer, the seen-key set and the `flushing` flag live behind one mutex.
//! A flush claims the buffer and sets `flushing` while holding that mutex,
//! then releases it before touching the sink, so other producers keep
//! buffering into a fresh batch during the write. When the write ends, even
//! by a panic in the sink, `flushing` is cleared and the `flush_done` condvar
//! wakes anyone waiting in [`StoragePipeline::flush`] or
//! [`StoragePipeline::close`].

use crate::record::Record;
use crate::storage::traits::{RecordSink, StorageError, StorageResult};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// What happened to a record handed to [`StoragePipeline::add`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// Buffered for a later flush
    Buffered,
    /// Buffered, and the caller flushed a batch of this many records
    Flushed(usize),
    /// Its natural key was already seen; the record was dropped
    Duplicate,
}

struct QueueState<R> {
    buffer: Vec<R>,
    seen: HashSet<String>,
    flushing: bool,
}

/// Shared record pipeline in front of a [`RecordSink`]
pub struct StoragePipeline<R: Record> {
    state: Mutex<QueueState<R>>,
    flush_done: Condvar,
    sink: Mutex<Box<dyn RecordSink<R>>>,
    flush_threshold: usize,
    stored: AtomicU64,
    duplicates: AtomicU64,
    flushes: AtomicU64,
}

impl<R: Record> StoragePipeline<R> {
    /// Creates a pipeline writing to `sink`; a threshold of 0 is treated as 1
    pub fn new(sink: impl RecordSink<R> + 'static, flush_threshold: usize) -> Self {
        Self {
            state: Mutex::new(QueueState {
                buffer: Vec::new(),
                seen: HashSet::new(),
                flushing: false,
            }),
            flush_done: Condvar::new(),
            sink: Mutex::new(Box::new(sink)),
            flush_threshold: flush_threshold.max(1),
            stored: AtomicU64::new(0),
            duplicates: AtomicU64::new(0),
            flushes: AtomicU64::new(0),
        }
    }

    /// Adds a record, flushing on the caller's thread when the threshold is hit
    ///
    /// Duplicates are reported through [`AddOutcome::Duplicate`] and a warning,
    /// never as an error. An error means the batch this call tried to flush
    /// could not be written.
    pub fn add(&self, record: R) -> StorageResult<AddOutcome> {
        let mut state = self.lock_state();

        if !state.seen.insert(record.natural_key().to_string()) {
            self.duplicates.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                "Duplicate item found: {}. Item dropped.",
                record.natural_key()
            );
            return Ok(AddOutcome::Duplicate);
        }

        state.buffer.push(record);

        if state.buffer.len() >= self.flush_threshold && !state.flushing {
            let batch = Self::claim(&mut state);
            drop(state);
            let written = self.write_claimed(batch)?;
            return Ok(AddOutcome::Flushed(written));
        }

        Ok(AddOutcome::Buffered)
    }

    /// Writes everything buffered so far, returning the number of records written
    ///
    /// Waits for a flush started by another caller to finish first, so batches
    /// reach the sink in the order they were claimed.
    pub fn flush(&self) -> StorageResult<usize> {
        let mut state = self.wait_until_idle(self.lock_state());
        if state.buffer.is_empty() {
            return Ok(0);
        }

        let batch = Self::claim(&mut state);
        drop(state);
        self.write_claimed(batch)
    }

    /// Drains the buffer and finalizes the sink
    ///
    /// Returns only once no flush is in flight and nothing is left buffered.
    pub fn close(&self) -> StorageResult<()> {
        while self.flush()? > 0 {}

        self.lock_sink().finish()?;

        tracing::info!(
            "Storage pipeline closed: {} records stored in {} flushes, {} duplicates dropped",
            self.stored_count(),
            self.flush_count(),
            self.duplicate_count()
        );
        Ok(())
    }

    /// Number of records buffered and not yet claimed by a flush
    pub fn pending(&self) -> usize {
        self.lock_state().buffer.len()
    }

    /// Number of distinct natural keys seen so far
    pub fn seen_count(&self) -> usize {
        self.lock_state().seen.len()
    }

    /// Number of records successfully written to the sink
    pub fn stored_count(&self) -> u64 {
        self.stored.load(Ordering::Relaxed)
    }

    /// Number of records dropped as duplicates
    pub fn duplicate_count(&self) -> u64 {
        self.duplicates.load(Ordering::Relaxed)
    }

    /// Number of successful non-empty flushes
    pub fn flush_count(&self) -> u64 {
        self.flushes.load(Ordering::Relaxed)
    }

    fn claim(state: &mut QueueState<R>) -> Vec<R> {
        state.flushing = true;
        std::mem::take(&mut state.buffer)
    }

    fn write_claimed(&self, batch: Vec<R>) -> StorageResult<usize> {
        let result = {
            let _flushing = FlushGuard { pipeline: self };
            let mut sink = self.lock_sink();
            sink.write_batch(&batch)
        };

        match result {
            Ok(()) => {
                self.flushes.fetch_add(1, Ordering::Relaxed);
                self.stored
                    .fetch_add(batch.len() as u64, Ordering::Relaxed);
                tracing::debug!("Flushed {} records", batch.len());
                Ok(batch.len())
            }
            Err(e) => {
                let keys: Vec<String> = batch
                    .iter()
                    .map(|record| record.natural_key().to_string())
                    .collect();
                tracing::error!(
                    "Failed to write batch of {} records ({}): {}",
                    keys.len(),
                    keys.join(", "),
                    e
                );
                Err(StorageError::BatchLost {
                    keys,
                    source: Box::new(e),
                })
            }
        }
    }

    fn wait_until_idle<'a>(
        &self,
        guard: MutexGuard<'a, QueueState<R>>,
    ) -> MutexGuard<'a, QueueState<R>> {
        self.flush_done
            .wait_while(guard, |state| state.flushing)
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_state(&self) -> MutexGuard<'_, QueueState<R>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_sink(&self) -> MutexGuard<'_, Box<dyn RecordSink<R>>> {
        self.sink.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Clears the `flushing` flag and wakes waiters when a write ends
struct FlushGuard<'a, R: Record> {
    pipeline: &'a StoragePipeline<R>,
}

impl<R: Record> Drop for FlushGuard<'_, R> {
    fn drop(&mut self) {
        self.pipeline.lock_state().flushing = false;
        self.pipeline.flush_done.notify_all();
    }
}
