//! File sink shared by all workers of a run.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::counters::DeliveryOutcome;
use crate::error::SinkError;
use crate::{Delivery, DeliveryMode, LineSink, LogRecord};

/// An output file created (or truncated) once per run.
#[derive(Debug, Clone)]
pub struct SharedFile {
    path: PathBuf,
    writer: Arc<Mutex<BufWriter<File>>>,
}

impl SharedFile {
    pub fn create(path: &Path) -> Result<Self, SinkError> {
        let file = File::create(path).map_err(|source| SinkError::OpenFile {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!("Writing generated lines to {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            writer: Arc::new(Mutex::new(BufWriter::new(file))),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sink(&self) -> FileSink {
        FileSink {
            file: self.clone(),
        }
    }

    fn write_line(&self, line: &str) -> Result<(), SinkError> {
        let mut writer = self.writer.lock().map_err(|_| SinkError::Poisoned)?;
        writer.write_all(line.as_bytes())?;
        Ok(())
    }

    fn flush(&self) -> Result<(), SinkError> {
        let mut writer = self.writer.lock().map_err(|_| SinkError::Poisoned)?;
        writer.flush()?;
        Ok(())
    }
}

/// One worker's handle on a [`SharedFile`].
#[derive(Debug)]
pub struct FileSink {
    file: SharedFile,
}

#[async_trait::async_trait]
impl LineSink for FileSink {
    fn mode(&self) -> DeliveryMode {
        DeliveryMode::Sync
    }

    async fn deliver(&mut self, record: LogRecord) -> Result<Delivery, SinkError> {
        self.file.write_line(&record.line)?;
        Ok(Delivery::Acked(DeliveryOutcome::Succeeded { id: None }))
    }

    async fn close(self: Box<Self>) -> Result<(), SinkError> {
        self.file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(identity: &str, seq: u64) -> LogRecord {
        LogRecord {
            identity: Arc::from(identity),
            seq,
            line: format!("{identity} {seq}\n"),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_workers_share_one_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.log");
        let shared = SharedFile::create(&path).unwrap();

        let mut a: Box<dyn LineSink> = Box::new(shared.sink());
        let mut b: Box<dyn LineSink> = Box::new(shared.sink());
        for seq in 0..3 {
            a.deliver(record("a", seq)).await.unwrap();
            b.deliver(record("b", seq)).await.unwrap();
        }
        a.close().await.unwrap();
        b.close().await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 6);
        assert!(contents.contains("a 2\n"));
        assert!(contents.contains("b 0\n"));
    }

    #[tokio::test]
    async fn test_existing_file_is_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.log");
        std::fs::write(&path, "stale\n").unwrap();

        let shared = SharedFile::create(&path).unwrap();
        let mut sink: Box<dyn LineSink> = Box::new(shared.sink());
        let delivery = sink.deliver(record("w", 0)).await.unwrap();
        assert_eq!(
            delivery,
            Delivery::Acked(DeliveryOutcome::Succeeded { id: None })
        );
        sink.close().await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "w 0\n");
    }

    #[test]
    fn test_unwritable_path() {
        let err = SharedFile::create(Path::new("/nonexistent-dir/out.log")).unwrap_err();
        assert!(matches!(err, SinkError::OpenFile { .. }));
    }
}
