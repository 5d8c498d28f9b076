//! Loki push API transport.
//!
//! Records are grouped into streams by label set and posted as JSON to
//! `/loki/api/v1/push`:
//!
//! ```json
//! {"streams":[{"stream":{"client":"promtail"},"values":[["<unix ns>","<line>"]]}]}
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use clap::ValueEnum;
use loadclient_generator::labels::line_key;
use loadclient_generator::{Component, Level, Service};
use serde_json::json;

use crate::batch::{BatchOptions, BatchTransport, TransportError};
use crate::counters::DeliveryOutcome;
use crate::http::{join_url, HttpOptions};
use crate::LogRecord;

pub const PUSH_PATH: &str = "/loki/api/v1/push";

/// Flush threshold for pending line bytes (about 1 MiB).
pub const BATCH_BYTES: usize = 1024 * 1024;

/// Maximum time a line waits before being pushed.
pub const BATCH_WAIT: Duration = Duration::from_secs(1);

const CLIENT_LABEL: &str = "promtail";

/// Which labels are attached to pushed streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LokiLabels {
    /// Only `client`.
    #[default]
    Client,
    /// `client` and `hostname`.
    ClientHost,
    /// `client`, `hostname`, and a spread of `service`, `level` and `component`.
    All,
}

impl LokiLabels {
    /// Label set for one record, sorted by name.
    pub fn for_record(&self, record: &LogRecord) -> BTreeMap<&'static str, String> {
        let mut labels = BTreeMap::new();
        labels.insert("client", CLIENT_LABEL.to_string());
        if matches!(self, LokiLabels::ClientHost | LokiLabels::All) {
            labels.insert("hostname", record.identity.to_string());
        }
        if matches!(self, LokiLabels::All) {
            let key = line_key(&record.identity, record.seq);
            labels.insert("service", Service::from_key(key).as_str().to_string());
            labels.insert("level", Level::from_key(key >> 16).as_str().to_string());
            labels.insert(
                "component",
                Component::from_key(key >> 32).as_str().to_string(),
            );
        }
        labels
    }
}

#[derive(Debug, Clone)]
pub struct LokiConfig {
    /// Base URL, e.g. `http://loki:3100`.
    pub url: String,
    /// Sent as `X-Scope-OrgID` when set.
    pub tenant_id: Option<String>,
    pub labels: LokiLabels,
    pub http: HttpOptions,
    pub batch: BatchOptions,
}

impl LokiConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            tenant_id: None,
            labels: LokiLabels::default(),
            http: HttpOptions::default(),
            batch: BatchOptions::new(BATCH_BYTES, BATCH_WAIT),
        }
    }
}

/// Pushes batches to one Loki endpoint.
pub struct LokiTransport {
    client: reqwest::Client,
    push_url: String,
    tenant_id: Option<String>,
    labels: LokiLabels,
}

impl LokiTransport {
    pub fn new(client: reqwest::Client, config: &LokiConfig) -> Self {
        Self {
            client,
            push_url: join_url(&config.url, PUSH_PATH),
            tenant_id: config.tenant_id.clone(),
            labels: config.labels,
        }
    }

    fn payload(&self, batch: &[LogRecord]) -> serde_json::Value {
        let mut streams: BTreeMap<BTreeMap<&'static str, String>, Vec<[String; 2]>> =
            BTreeMap::new();
        for record in batch {
            let ts = record
                .created_at
                .timestamp_nanos_opt()
                .unwrap_or_default()
                .to_string();
            streams
                .entry(self.labels.for_record(record))
                .or_default()
                .push([ts, record.body().to_string()]);
        }

        let streams: Vec<_> = streams
            .into_iter()
            .map(|(stream, values)| json!({ "stream": stream, "values": values }))
            .collect();
        json!({ "streams": streams })
    }
}

#[async_trait::async_trait]
impl BatchTransport for LokiTransport {
    fn name(&self) -> &'static str {
        "loki"
    }

    async fn send(&self, batch: &[LogRecord]) -> Result<Vec<DeliveryOutcome>, TransportError> {
        let mut request = self.client.post(&self.push_url).json(&self.payload(batch));
        if let Some(tenant) = &self.tenant_id {
            request = request.header("X-Scope-OrgID", tenant);
        }

        let response = request
            .send()
            .await
            .map_err(|e| TransportError::Retryable(format!("push failed: {e}")))?;

        let status = response.status();
        if status.is_success() {
            return Ok(vec![DeliveryOutcome::Succeeded { id: None }; batch.len()]);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = format!("HTTP {}: {}", status.as_u16(), body.trim());
        if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            Err(TransportError::Retryable(detail))
        } else {
            Err(TransportError::Fatal(detail))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    fn record(identity: &str, seq: u64) -> LogRecord {
        LogRecord {
            identity: Arc::from(identity),
            seq,
            line: format!("goloader seq - {identity} - {seq:010} - hi\n"),
            created_at: Utc.timestamp_opt(1_700_000_000, 5).unwrap(),
        }
    }

    #[test]
    fn test_label_sets() {
        let r = record("node.0.ABC", 1);
        let client = LokiLabels::Client.for_record(&r);
        assert_eq!(client.len(), 1);
        assert_eq!(client["client"], "promtail");

        let host = LokiLabels::ClientHost.for_record(&r);
        assert_eq!(host["hostname"], "node.0.ABC");

        let all = LokiLabels::All.for_record(&r);
        assert_eq!(all.len(), 5);
        assert!(Service::ALL.iter().any(|s| s.as_str() == all["service"]));
        assert!(Level::ALL.iter().any(|l| l.as_str() == all["level"]));
        assert!(Component::ALL.iter().any(|c| c.as_str() == all["component"]));
    }

    #[test]
    fn test_payload_groups_streams() {
        let mut config = LokiConfig::new("http://loki:3100/");
        config.labels = LokiLabels::ClientHost;
        let transport = LokiTransport::new(reqwest::Client::new(), &config);
        assert_eq!(transport.push_url, "http://loki:3100/loki/api/v1/push");

        let batch = vec![record("a", 0), record("b", 0), record("a", 1)];
        let payload = transport.payload(&batch);
        let streams = payload["streams"].as_array().unwrap();
        assert_eq!(streams.len(), 2);

        let a = &streams[0];
        assert_eq!(a["stream"]["hostname"], "a");
        assert_eq!(a["values"].as_array().unwrap().len(), 2);
        assert_eq!(a["values"][0][0], "1700000000000000005");
        assert_eq!(a["values"][0][1], "goloader seq - a - 0000000000 - hi");
    }
}
