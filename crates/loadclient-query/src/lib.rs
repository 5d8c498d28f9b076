//! Query replay against log backends.
//!
//! A [`QueryTarget`] describes a backend; [`QueryTarget::connect`] turns it
//! into a shared [`QueryClient`]. Workers pick queries from a [`QueryPool`]
//! and report each [`QueryOutcome`].

pub mod elasticsearch;
pub mod error;
pub mod loki;
pub mod pool;

use std::sync::Arc;
use std::time::Duration;

use clap::ValueEnum;
use loadclient_generator::SystemClock;

pub use elasticsearch::{ElasticsearchQueryClient, ElasticsearchQueryConfig};
pub use error::QueryError;
pub use loki::{LokiQueryClient, LokiQueryConfig};
pub use pool::QueryPool;

/// Result of one executed query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOutcome {
    /// Lines or hits returned.
    pub result_count: u64,
    /// Wall time of the request as seen by the client.
    pub elapsed: Duration,
    /// Execution time reported by the backend, when it reports one.
    pub backend_time: Option<Duration>,
}

#[async_trait::async_trait]
pub trait QueryClient: Send + Sync {
    fn name(&self) -> &'static str;

    async fn execute(&self, query: &str) -> Result<QueryOutcome, QueryError>;
}

/// Backend names accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum QueryTargetKind {
    Loki,
    Elasticsearch,
}

#[derive(Debug, Clone)]
pub enum QueryTarget {
    Loki(LokiQueryConfig),
    Elasticsearch(ElasticsearchQueryConfig),
}

impl QueryTarget {
    pub fn kind(&self) -> QueryTargetKind {
        match self {
            QueryTarget::Loki(_) => QueryTargetKind::Loki,
            QueryTarget::Elasticsearch(_) => QueryTargetKind::Elasticsearch,
        }
    }

    /// Build the client shared by all query workers.
    pub fn connect(&self) -> Result<Arc<dyn QueryClient>, QueryError> {
        match self {
            QueryTarget::Loki(config) => {
                validate_url(&config.url)?;
                let client = config.http.build_client()?;
                Ok(Arc::new(LokiQueryClient::new(
                    client,
                    config.clone(),
                    Arc::new(SystemClock),
                )))
            }
            QueryTarget::Elasticsearch(config) => {
                validate_url(&config.url)?;
                let client = config.http.build_client()?;
                Ok(Arc::new(ElasticsearchQueryClient::new(client, config)))
            }
        }
    }
}

fn validate_url(url: &str) -> Result<(), QueryError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(QueryError::Config(format!(
            "destination URL must start with http:// or https://, got '{url}'"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_validates_url() {
        let target = QueryTarget::Loki(LokiQueryConfig::new("localhost:3100"));
        assert!(matches!(target.connect(), Err(QueryError::Config(_))));

        let target = QueryTarget::Elasticsearch(ElasticsearchQueryConfig::new("http://es:9200"));
        assert_eq!(target.kind(), QueryTargetKind::Elasticsearch);
        assert_eq!(target.connect().unwrap().name(), "elasticsearch");
    }
}
