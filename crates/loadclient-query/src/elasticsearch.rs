//! Elasticsearch `_search` client.

use std::time::{Duration, Instant};

use loadclient_sink::elasticsearch::DEFAULT_INDEX;
use loadclient_sink::http::join_url;
use loadclient_sink::HttpOptions;
use serde::Deserialize;

use crate::error::QueryError;
use crate::{QueryClient, QueryOutcome};

#[derive(Debug, Clone)]
pub struct ElasticsearchQueryConfig {
    pub url: String,
    pub index: String,
    pub http: HttpOptions,
}

impl ElasticsearchQueryConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            index: DEFAULT_INDEX.to_string(),
            http: HttpOptions::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    took: Option<u64>,
    hits: Hits,
}

#[derive(Debug, Deserialize)]
struct Hits {
    total: Total,
}

/// `hits.total` is a bare number before 7.x and an object after.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Total {
    Count(u64),
    Object { value: u64 },
}

impl Total {
    fn value(&self) -> u64 {
        match self {
            Total::Count(n) | Total::Object { value: n } => *n,
        }
    }
}

pub struct ElasticsearchQueryClient {
    client: reqwest::Client,
    url: String,
}

impl ElasticsearchQueryClient {
    pub fn new(client: reqwest::Client, config: &ElasticsearchQueryConfig) -> Self {
        Self {
            client,
            url: join_url(&config.url, &format!("{}/_search", config.index)),
        }
    }
}

#[async_trait::async_trait]
impl QueryClient for ElasticsearchQueryClient {
    fn name(&self) -> &'static str {
        "elasticsearch"
    }

    async fn execute(&self, query: &str) -> Result<QueryOutcome, QueryError> {
        let started = Instant::now();
        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(query.to_string())
            .send()
            .await
            .map_err(|source| QueryError::Request {
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
        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| QueryError::Decode(e.to_string()))?;
        tracing::debug!(
            "Search on {} matched {} documents (took {:?}ms)",
            self.url,
            parsed.hits.total.value(),
            parsed.took
        );

        Ok(QueryOutcome {
            result_count: parsed.hits.total.value(),
            elapsed: started.elapsed(),
            backend_time: parsed.took.map(Duration::from_millis),
        })
    }
}
