//! CSV file destination
//!
//! Each batch is appended to the file. The header row is derived from the
//! record's serde field names and is only written when the file is missing or
//! empty at the moment the batch is written.

use crate::record::Record;
use crate::storage::traits::{RecordSink, StorageResult};
use std::fs::OpenOptions;
use std::path::PathBuf;

/// Append-only CSV destination
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    /// Creates a sink for the given file; nothing is touched until the first batch
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn is_empty_or_missing(&self) -> bool {
        std::fs::metadata(&self.path)
            .map(|meta| meta.len() == 0)
            .unwrap_or(true)
    }
}

impl<R: Record> RecordSink<R> for CsvSink {
    fn write_batch(&mut self, batch: &[R]) -> StorageResult<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let write_header = self.is_empty_or_missing();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(write_header)
            .from_writer(file);

        for record in batch {
            writer.serialize(record)?;
        }
        writer.flush()?;

        tracing::debug!(
            "Appended {} rows to {}",
            batch.len(),
            self.path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use crate::record::SearchRecord;
    use tempfile::TempDir;

    fn read(path: &Path) -> String {
        std::fs::read_to_string(path).unwrap()
    }

    #[test]
    fn test_header_written_once_across_batches() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        let mut sink = CsvSink::new(&path);

        sink.write_batch(&[SearchRecord::new("A", 1.0, 1.5, 10)])
            .unwrap();
        sink.write_batch(&[SearchRecord::new("B", 2.0, 2.5, 20)])
            .unwrap();

        assert_eq!(
            read(&path),
            "name,stars,rating,num_reviews\nA,1.0,1.5,10\nB,2.0,2.5,20\n"
        );
    }

    #[test]
    fn test_existing_file_gets_no_new_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        std::fs::write(&path, "name,stars,rating,num_reviews\nA,1.0,1.0,1\n").unwrap();

        let mut sink = CsvSink::new(&path);
        sink.write_batch(&[SearchRecord::new("B", 2.0, 2.0, 2)])
            .unwrap();

        assert_eq!(
            read(&path),
            "name,stars,rating,num_reviews\nA,1.0,1.0,1\nB,2.0,2.0,2\n"
        );
    }

    #[test]
    fn test_empty_existing_file_gets_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        std::fs::write(&path, "").unwrap();

        let mut sink = CsvSink::new(&path);
        sink.write_batch(&[SearchRecord::new("A", 1.0, 1.0, 1)])
            .unwrap();

        assert!(read(&path).starts_with("name,stars,rating,num_reviews\n"));
    }

    #[test]
    fn test_empty_batch_creates_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        let mut sink = CsvSink::new(&path);

        RecordSink::<SearchRecord>::write_batch(&mut sink, &[]).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_unwritable_destination_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing-dir").join("out.csv");
        let mut sink = CsvSink::new(path);

        let result = sink.write_batch(&[SearchRecord::new("A", 1.0, 1.0, 1)]);
        assert!(result.is_err());
    }
}
