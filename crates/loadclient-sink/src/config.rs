//! Sink selection and per-run preparation.

use std::path::PathBuf;
use std::sync::Arc;

use clap::ValueEnum;

use crate::batch::BatchingSink;
use crate::console::StdoutSink;
use crate::counters::DeliveryCounters;
use crate::elasticsearch::{recreate_index, ElasticsearchConfig, ElasticsearchTransport};
use crate::error::SinkError;
use crate::file::SharedFile;
use crate::loki::{LokiConfig, LokiTransport};
use crate::{DeliveryMode, LineSink};

/// Destination names accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SinkKind {
    #[default]
    Stdout,
    File,
    Loki,
    Elasticsearch,
}

/// A fully specified destination.
#[derive(Debug, Clone)]
pub enum SinkConfig {
    Stdout,
    File { path: PathBuf },
    Loki(LokiConfig),
    Elasticsearch(ElasticsearchConfig),
}

impl SinkConfig {
    pub fn kind(&self) -> SinkKind {
        match self {
            SinkConfig::Stdout => SinkKind::Stdout,
            SinkConfig::File { .. } => SinkKind::File,
            SinkConfig::Loki(_) => SinkKind::Loki,
            SinkConfig::Elasticsearch(_) => SinkKind::Elasticsearch,
        }
    }

    pub fn mode(&self) -> DeliveryMode {
        match self {
            SinkConfig::Stdout | SinkConfig::File { .. } => DeliveryMode::Sync,
            SinkConfig::Loki(_) | SinkConfig::Elasticsearch(_) => DeliveryMode::Async,
        }
    }

    /// One-time setup shared by every worker of a run.
    ///
    /// Opens (and truncates) the output file, builds HTTP clients, and
    /// recreates the Elasticsearch index.
    pub async fn prepare(&self) -> Result<PreparedSink, SinkError> {
        match self {
            SinkConfig::Stdout => Ok(PreparedSink::Stdout),
            SinkConfig::File { path } => Ok(PreparedSink::File(SharedFile::create(path)?)),
            SinkConfig::Loki(config) => {
                validate_url(&config.url)?;
                let client = config.http.build_client()?;
                tracing::info!("Pushing to Loki at {}", config.url);
                Ok(PreparedSink::Loki {
                    client,
                    config: config.clone(),
                })
            }
            SinkConfig::Elasticsearch(config) => {
                validate_url(&config.url)?;
                if config.index.is_empty() {
                    return Err(SinkError::Config("Elasticsearch index name is empty".into()));
                }
                let client = config.http.build_client()?;
                recreate_index(&client, &config.url, &config.index).await?;
                Ok(PreparedSink::Elasticsearch {
                    client,
                    config: config.clone(),
                })
            }
        }
    }
}

fn validate_url(url: &str) -> Result<(), SinkError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(SinkError::Config(format!(
            "destination URL must start with http:// or https://, got '{url}'"
        )))
    }
}

/// Shared state produced by [`SinkConfig::prepare`].
#[derive(Debug, Clone)]
pub enum PreparedSink {
    Stdout,
    File(SharedFile),
    Loki {
        client: reqwest::Client,
        config: LokiConfig,
    },
    Elasticsearch {
        client: reqwest::Client,
        config: ElasticsearchConfig,
    },
}

impl PreparedSink {
    pub fn mode(&self) -> DeliveryMode {
        match self {
            PreparedSink::Stdout | PreparedSink::File(_) => DeliveryMode::Sync,
            PreparedSink::Loki { .. } | PreparedSink::Elasticsearch { .. } => DeliveryMode::Async,
        }
    }

    /// Build one worker's sink. Async sinks spawn their batching task on the
    /// current runtime and report into `counters`.
    pub fn for_worker(&self, counters: &Arc<DeliveryCounters>) -> Box<dyn LineSink> {
        match self {
            PreparedSink::Stdout => Box::new(StdoutSink),
            PreparedSink::File(file) => Box::new(file.sink()),
            PreparedSink::Loki { client, config } => Box::new(BatchingSink::spawn(
                LokiTransport::new(client.clone(), config),
                config.batch,
                Arc::clone(counters),
            )),
            PreparedSink::Elasticsearch { client, config } => Box::new(BatchingSink::spawn(
                ElasticsearchTransport::new(client.clone(), config),
                config.batch,
                Arc::clone(counters),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rejects_bad_url() {
        let config = SinkConfig::Loki(LokiConfig::new("loki:3100"));
        let err = config.prepare().await.unwrap_err();
        assert!(matches!(err, SinkError::Config(_)));
    }

    #[tokio::test]
    async fn test_modes() {
        assert_eq!(SinkConfig::Stdout.mode(), DeliveryMode::Sync);
        let loki = SinkConfig::Loki(LokiConfig::new("http://localhost:3100"));
        assert_eq!(loki.mode(), DeliveryMode::Async);
        assert_eq!(loki.kind(), SinkKind::Loki);

        let prepared = loki.prepare().await.unwrap();
        assert_eq!(prepared.mode(), DeliveryMode::Async);
        let sink = prepared.for_worker(&Arc::new(DeliveryCounters::new()));
        assert_eq!(sink.mode(), DeliveryMode::Async);
        sink.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_file_sink_prepared_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lines.log");
        let prepared = SinkConfig::File { path: path.clone() }.prepare().await.unwrap();
        assert!(path.exists());

        let counters = Arc::new(DeliveryCounters::new());
        let first = prepared.for_worker(&counters);
        let second = prepared.for_worker(&counters);
        assert_eq!(first.mode(), DeliveryMode::Sync);
        first.close().await.unwrap();
        second.close().await.unwrap();
    }
}
