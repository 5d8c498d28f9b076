//! Loki `query_range` client.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::TimeDelta;
use loadclient_generator::Clock;
use loadclient_sink::http::join_url;
use loadclient_sink::HttpOptions;
use serde::Deserialize;

use crate::error::QueryError;
use crate::{QueryClient, QueryOutcome};

pub const QUERY_RANGE_PATH: &str = "/loki/api/v1/query_range";

/// Maximum entries requested per query.
pub const DEFAULT_LIMIT: u32 = 4000;

/// Lookback window when none is configured.
pub const DEFAULT_RANGE: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone)]
pub struct LokiQueryConfig {
    pub url: String,
    pub tenant_id: Option<String>,
    /// Queries cover `[now - range, now]`.
    pub range: Duration,
    pub limit: u32,
    pub http: HttpOptions,
}

impl LokiQueryConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            tenant_id: None,
            range: DEFAULT_RANGE,
            limit: DEFAULT_LIMIT,
            http: HttpOptions::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct QueryRangeResponse {
    data: QueryRangeData,
}

#[derive(Debug, Deserialize)]
struct QueryRangeData {
    #[serde(default)]
    result: Vec<ResultEntry>,
    #[serde(default)]
    stats: Option<Stats>,
}

#[derive(Debug, Deserialize)]
struct ResultEntry {
    #[serde(default)]
    values: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Stats {
    summary: Option<Summary>,
}

#[derive(Debug, Deserialize)]
struct Summary {
    #[serde(rename = "execTime")]
    exec_time: Option<f64>,
}

pub struct LokiQueryClient {
    client: reqwest::Client,
    url: String,
    config: LokiQueryConfig,
    clock: Arc<dyn Clock>,
}

impl LokiQueryClient {
    pub fn new(client: reqwest::Client, config: LokiQueryConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            client,
            url: join_url(&config.url, QUERY_RANGE_PATH),
            config,
            clock,
        }
    }

    /// Query parameters for a request issued now.
    fn params(&self, query: &str) -> Vec<(&'static str, String)> {
        let end = self.clock.now();
        let range = TimeDelta::from_std(self.config.range).unwrap_or(TimeDelta::MAX);
        let start = end.checked_sub_signed(range).unwrap_or(chrono::DateTime::UNIX_EPOCH);
        vec![
            ("query", query.to_string()),
            ("limit", self.config.limit.to_string()),
            ("start", nanos(start)),
            ("end", nanos(end)),
            ("direction", "forward".to_string()),
        ]
    }
}

fn nanos(ts: chrono::DateTime<chrono::Utc>) -> String {
    ts.timestamp_nanos_opt().unwrap_or_default().max(0).to_string()
}

#[async_trait::async_trait]
impl QueryClient for LokiQueryClient {
    fn name(&self) -> &'static str {
        "loki"
    }

    async fn execute(&self, query: &str) -> Result<QueryOutcome, QueryError> {
        let mut request = self.client.get(&self.url).query(&self.params(query));
        if let Some(tenant) = &self.config.tenant_id {
            request = request.header("X-Scope-OrgID", tenant);
        }

        let started = Instant::now();
        let response = request.send().await.map_err(|source| QueryError::Request {
            url: self.url.clone(),
            source,
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(QueryError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        let parsed: QueryRangeResponse = response
            .json()
            .await
            .map_err(|e| QueryError::Decode(e.to_string()))?;
        let elapsed = started.elapsed();

        let result_count: u64 = parsed
            .data
            .result
            .iter()
            .map(|entry| entry.values.len() as u64)
            .sum();
        let backend_time = parsed
            .data
            .stats
            .and_then(|s| s.summary)
            .and_then(|s| s.exec_time)
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok());
        tracing::debug!(
            "Loki returned {} streams with {} entries in {:?}",
            parsed.data.result.len(),
            result_count,
            elapsed
        );

        Ok(QueryOutcome {
            result_count,
            elapsed,
            backend_time,
        })
    }
}
