//! Elasticsearch bulk index transport.

use std::time::Duration;

use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use loadclient_generator::labels::line_key;
use loadclient_generator::{Component, Level, Service};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::batch::{BatchOptions, BatchTransport, TransportError};
use crate::counters::DeliveryOutcome;
use crate::error::SinkError;
use crate::http::{join_url, HttpOptions};
use crate::LogRecord;

/// Index written to unless configured otherwise.
pub const DEFAULT_INDEX: &str = "logger";

/// Flush threshold for pending line bytes.
pub const BATCH_BYTES: usize = 5_000_000;

/// Periodic flush interval.
pub const BATCH_WAIT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct ElasticsearchConfig {
    /// Base URL, e.g. `http://elasticsearch:9200`.
    pub url: String,
    pub index: String,
    pub http: HttpOptions,
    pub batch: BatchOptions,
}

impl ElasticsearchConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            index: DEFAULT_INDEX.to_string(),
            http: HttpOptions::default(),
            batch: BatchOptions::new(BATCH_BYTES, BATCH_WAIT),
        }
    }
}

/// Indexed document body.
#[derive(Debug, Serialize, PartialEq)]
pub struct LogDocument<'a> {
    pub hostname: &'a str,
    pub service: &'static str,
    pub level: &'static str,
    pub component: &'static str,
    pub body: &'a str,
    pub created_at: DateTime<Utc>,
}

impl<'a> LogDocument<'a> {
    pub fn from_record(record: &'a LogRecord) -> Self {
        let key = line_key(&record.identity, record.seq);
        Self {
            hostname: &record.identity,
            service: Service::from_key(key).as_str(),
            level: Level::from_key(key >> 16).as_str(),
            component: Component::from_key(key >> 32).as_str(),
            body: record.body(),
            created_at: record
                .created_at
                .duration_round(TimeDelta::seconds(1))
                .unwrap_or(record.created_at),
        }
    }
}

#[derive(Debug, Deserialize)]
struct BulkResponse {
    #[serde(default)]
    items: Vec<std::collections::HashMap<String, BulkItem>>,
}

#[derive(Debug, Deserialize)]
struct BulkItem {
    #[serde(rename = "_id")]
    id: Option<String>,
    status: u16,
    error: Option<serde_json::Value>,
}

/// Drop and recreate `index`. A missing index is not an error.
pub async fn recreate_index(
    client: &reqwest::Client,
    base_url: &str,
    index: &str,
) -> Result<(), SinkError> {
    let url = join_url(base_url, index);

    let response = client
        .delete(&url)
        .send()
        .await
        .map_err(|source| SinkError::Request {
            url: url.clone(),
            source,
        })?;
    let status = response.status();
    if !status.is_success() && status != StatusCode::NOT_FOUND {
        return Err(SinkError::Status {
            operation: format!("DELETE {url}"),
            status: status.as_u16(),
            body: response.text().await.unwrap_or_default(),
        });
    }

    let response = client
        .put(&url)
        .send()
        .await
        .map_err(|source| SinkError::Request {
            url: url.clone(),
            source,
        })?;
    let status = response.status();
    if !status.is_success() {
        return Err(SinkError::Status {
            operation: format!("PUT {url}"),
            status: status.as_u16(),
            body: response.text().await.unwrap_or_default(),
        });
    }

    tracing::info!("Recreated Elasticsearch index {}", index);
    Ok(())
}

/// Sends NDJSON `_bulk` requests to one index.
pub struct ElasticsearchTransport {
    client: reqwest::Client,
    bulk_url: String,
    index: String,
}

impl ElasticsearchTransport {
    pub fn new(client: reqwest::Client, config: &ElasticsearchConfig) -> Self {
        Self {
            client,
            bulk_url: join_url(&config.url, "_bulk"),
            index: config.index.clone(),
        }
    }

    fn body(&self, batch: &[LogRecord]) -> Result<String, serde_json::Error> {
        let action = serde_json::to_string(&serde_json::json!({ "index": { "_index": self.index } }))?;
        let mut body = String::new();
        for record in batch {
            body.push_str(&action);
            body.push('\n');
            body.push_str(&serde_json::to_string(&LogDocument::from_record(record))?);
            body.push('\n');
        }
        Ok(body)
    }
}

fn is_retryable(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 502 | 503 | 504)
}

#[async_trait::async_trait]
impl BatchTransport for ElasticsearchTransport {
    fn name(&self) -> &'static str {
        "elasticsearch"
    }

    async fn send(&self, batch: &[LogRecord]) -> Result<Vec<DeliveryOutcome>, TransportError> {
        let body = self
            .body(batch)
            .map_err(|e| TransportError::Fatal(format!("encoding failed: {e}")))?;

        let response = self
            .client
            .post(&self.bulk_url)
            .header(reqwest::header::CONTENT_TYPE, "application/x-ndjson")
            .body(body)
            .send()
            .await
            .map_err(|e| TransportError::Retryable(format!("bulk request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let detail = format!("HTTP {}: {}", status.as_u16(), text.trim());
            return Err(if is_retryable(status) {
                TransportError::Retryable(detail)
            } else {
                TransportError::Fatal(detail)
            });
        }

        let parsed: BulkResponse = response
            .json()
            .await
            .map_err(|e| TransportError::Fatal(format!("invalid bulk response: {e}")))?;

        Ok(parsed
            .items
            .into_iter()
            .filter_map(|mut item| item.remove("index"))
            .map(|item| {
                if (200..300).contains(&item.status) {
                    DeliveryOutcome::Succeeded { id: item.id }
                } else {
                    DeliveryOutcome::Failed {
                        detail: item
                            .error
                            .map(|e| e.to_string())
                            .unwrap_or_else(|| format!("status {}", item.status)),
                    }
                }
            })
            .collect())
    }
}
