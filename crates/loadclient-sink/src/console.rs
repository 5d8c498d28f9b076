//! Standard output sink.

use std::io::Write;

use crate::counters::DeliveryOutcome;
use crate::error::SinkError;
use crate::{Delivery, DeliveryMode, LineSink, LogRecord};

/// Writes each line to stdout under the stdout lock, so lines from
/// concurrent workers never interleave.
#[derive(Debug, Default)]
pub struct StdoutSink;

#[async_trait::async_trait]
impl LineSink for StdoutSink {
    fn mode(&self) -> DeliveryMode {
        DeliveryMode::Sync
    }

    async fn deliver(&mut self, record: LogRecord) -> Result<Delivery, SinkError> {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(record.line.as_bytes())?;
        Ok(Delivery::Acked(DeliveryOutcome::Succeeded { id: None }))
    }

    async fn close(self: Box<Self>) -> Result<(), SinkError> {
        std::io::stdout().lock().flush()?;
        Ok(())
    }
}
